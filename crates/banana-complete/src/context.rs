//! Cursor context classification
//!
//! Decides which kind of completion applies from the raw text before the
//! cursor. Classification is pattern based and local: only the cursor's
//! line is looked at and the document is never parsed.
//!
//! The three patterns are tried in a fixed order, first match wins:
//!
//! 1. dotted path (`src.params.`)
//! 2. call argument (`ldp = JsonLDP(sleep=0.1, `)
//! 3. post assignment (`sink = `)

use regex::Regex;
use std::sync::LazyLock;

/// A run of identifier characters, blanks and dots ending in a dot at the
/// cursor (group 1). The run starts on an identifier character at the
/// line start or after a character that cannot belong to a path, so a
/// digit or a stray dot never lets the match begin part-way through.
static DOTTED_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^A-Za-z0-9_$.])([A-Za-z_$][A-Za-z_$ .]*\.)$").expect("dotted path pattern")
});

/// `<target> = <Name>(<args>` with the parenthesis still open
static CALL_ARGUMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^=]+=\s*([A-Za-z_$]+) *\(([^)]*)$").expect("call argument pattern"));

/// `<target> = <something>` where no call has started
static POST_ASSIGNMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^=]+=[^(\n\r]+$").expect("post assignment pattern"));

/// Kind of completion requested at the cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionContext {
    /// Member access on a variable; `path` is everything typed so far,
    /// final dot included
    DottedPath { path: String },
    /// Inside the argument list of a component call
    CallArgument { component: String, args: String },
    /// Right hand side of an assignment, before any call
    PostAssignment,
    /// Nothing to complete
    None,
}

impl CompletionContext {
    pub fn is_none(&self) -> bool {
        matches!(self, CompletionContext::None)
    }
}

/// Returns the part of `text` on the cursor's line
pub fn cursor_line(text: &str) -> &str {
    match text.rfind('\n') {
        Some(index) => &text[index + 1..],
        None => text,
    }
}

/// Classifies the text immediately preceding the cursor
pub fn classify(text_before_cursor: &str) -> CompletionContext {
    let line = cursor_line(text_before_cursor);

    let context = if let Some(path) = DOTTED_PATH.captures(line).and_then(|c| c.get(1)) {
        CompletionContext::DottedPath {
            path: path.as_str().to_string(),
        }
    } else if let Some(captures) = CALL_ARGUMENT.captures(line) {
        CompletionContext::CallArgument {
            component: captures[1].to_string(),
            args: captures[2].to_string(),
        }
    } else if POST_ASSIGNMENT.is_match(line) {
        CompletionContext::PostAssignment
    } else {
        CompletionContext::None
    };

    tracing::trace!(?context, "classified completion context");
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dotted(path: &str) -> CompletionContext {
        CompletionContext::DottedPath {
            path: path.to_string(),
        }
    }

    #[test]
    fn test_dotted_path() {
        assert_eq!(classify("x."), dotted("x."));
        assert_eq!(classify("x.a."), dotted("x.a."));
        assert_eq!(classify("src -> ldp.params."), dotted("ldp.params."));
    }

    #[test]
    fn test_dotted_path_drops_leading_blanks() {
        assert_eq!(classify("   x.a."), dotted("x.a."));
    }

    #[test]
    fn test_dotted_path_needs_final_dot() {
        assert_eq!(classify("x.a"), CompletionContext::None);
        assert_eq!(classify("."), CompletionContext::None);
        assert_eq!(classify("  ."), CompletionContext::None);
    }

    #[test]
    fn test_dotted_path_cannot_start_mid_run() {
        // The digit belongs to `src1`, so `a.` is not a path of its own
        assert_eq!(classify("x = src1.a."), CompletionContext::PostAssignment);
        assert_eq!(classify("y = .a."), CompletionContext::PostAssignment);
        assert_eq!(classify("2a."), CompletionContext::None);
        assert_eq!(classify("(src."), dotted("src."));
    }

    #[test]
    fn test_call_argument() {
        assert_eq!(
            classify("y = Foo(p1=1,"),
            CompletionContext::CallArgument {
                component: "Foo".to_string(),
                args: "p1=1,".to_string(),
            }
        );
        assert_eq!(
            classify("y =Foo ("),
            CompletionContext::CallArgument {
                component: "Foo".to_string(),
                args: String::new(),
            }
        );
    }

    #[test]
    fn test_closed_call_is_not_an_argument() {
        assert_eq!(classify("y = Foo(p1=1)"), CompletionContext::None);
    }

    #[test]
    fn test_post_assignment() {
        assert_eq!(classify("z = "), CompletionContext::PostAssignment);
        assert_eq!(classify("z = Ht"), CompletionContext::PostAssignment);
    }

    #[test]
    fn test_bare_assignment_is_nothing() {
        assert_eq!(classify("z ="), CompletionContext::None);
        assert_eq!(classify(""), CompletionContext::None);
        assert_eq!(classify("src -> sink"), CompletionContext::None);
    }

    #[test]
    fn test_dotted_path_wins_over_assignment() {
        // Matches the post-assignment pattern as well
        assert_eq!(classify("y = x.a."), dotted("x.a."));
        assert_eq!(classify("y = Foo(src."), dotted("src."));
    }

    #[test]
    fn test_only_cursor_line_counts() {
        assert_eq!(classify("a = Foo(\nb"), CompletionContext::None);
        assert_eq!(classify("x.\nz = "), CompletionContext::PostAssignment);
        assert!(classify("z = 1\n").is_none());
    }

    #[test]
    fn test_cursor_line() {
        assert_eq!(cursor_line("a\nb = "), "b = ");
        assert_eq!(cursor_line("single"), "single");
        assert_eq!(cursor_line("trailing\n"), "");
    }
}
