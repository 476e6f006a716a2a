//! Highlighter for the banana language
//!
//! Runs a [`TokenizerGrammar`] over source text the way the editor does:
//! line by line, trying the rules of the current state in order at the
//! current position, first match wins. The state stack is shared by all
//! lines of a source. Root never leaves a string open at a line end,
//! because an unterminated string is consumed whole as `string.invalid`.

use crate::grammar::{Action, Rule, State, TokenizerGrammar};
use crate::token::{HighlightToken, TokenClass};
use crate::{GrammarError, Result};
use banana_error::span::{Position, Span};
use fancy_regex::{Captures, Regex};
use std::collections::HashMap;

/// A rule whose pattern has been expanded and compiled
#[derive(Debug)]
struct CompiledRule {
    regex: Regex,
    action: Action,
}

/// Grammar compiled for matching
#[derive(Debug)]
pub struct Highlighter {
    grammar: TokenizerGrammar,
    states: HashMap<State, Vec<CompiledRule>>,
}

impl Highlighter {
    /// Compiles every state of the grammar, flattening includes
    pub fn new(grammar: &TokenizerGrammar) -> Result<Self> {
        let mut states = HashMap::new();
        for &state in grammar.tokenizer.keys() {
            let mut rules = Vec::new();
            let mut visiting = vec![state];
            flatten(grammar, grammar.rules(state), &mut visiting, &mut rules)?;
            let compiled = rules
                .into_iter()
                .map(|rule| compile_rule(grammar, rule))
                .collect::<Result<Vec<_>>>()?;
            states.insert(state, compiled);
        }

        if !states.contains_key(&State::Root) {
            return Err(GrammarError::UnknownState(State::Root));
        }

        Ok(Self {
            grammar: grammar.clone(),
            states,
        })
    }

    pub fn grammar(&self) -> &TokenizerGrammar {
        &self.grammar
    }

    /// Highlights the whole source
    pub fn highlight(&self, source: &str) -> Vec<HighlightToken> {
        let mut stack = vec![State::Root];
        let mut tokens = Vec::new();
        let mut line_offset = 0;

        for (index, line) in source.split('\n').enumerate() {
            let mut lexer = LineLexer {
                highlighter: self,
                line,
                line_number: index as u32 + 1,
                line_offset,
                pos: 0,
                stack: &mut stack,
            };
            lexer.tokenize(&mut tokens);
            line_offset += line.len() + 1;
        }

        tokens
    }
}

/// Appends the rules of `rules` to `out`, replacing includes by the
/// rules of the included state
fn flatten<'g>(
    grammar: &'g TokenizerGrammar,
    rules: &'g [Rule],
    visiting: &mut Vec<State>,
    out: &mut Vec<&'g Rule>,
) -> Result<()> {
    for rule in rules {
        match &rule.action {
            Action::Include(state) => {
                if visiting.contains(state) {
                    return Err(GrammarError::IncludeCycle(*state));
                }
                if !grammar.tokenizer.contains_key(state) {
                    return Err(GrammarError::UnknownState(*state));
                }
                visiting.push(*state);
                flatten(grammar, grammar.rules(*state), visiting, out)?;
                visiting.pop();
            }
            _ => out.push(rule),
        }
    }
    Ok(())
}

fn compile_rule(grammar: &TokenizerGrammar, rule: &Rule) -> Result<CompiledRule> {
    if let Action::Push { next, .. } = &rule.action {
        if !grammar.tokenizer.contains_key(next) {
            return Err(GrammarError::UnknownState(*next));
        }
    }

    let expanded = rule
        .regex
        .replace("@symbols", &format!("(?:{})", grammar.symbols))
        .replace("@escapes", &format!("(?:{})", grammar.escapes));
    let anchored = format!("^(?:{})", expanded);

    let regex = Regex::new(&anchored).map_err(|e| GrammarError::Pattern {
        pattern: rule.regex.clone(),
        message: e.to_string(),
    })?;

    Ok(CompiledRule {
        regex,
        action: rule.action.clone(),
    })
}

/// Tokenizes a single line, sharing the state stack with its neighbours
struct LineLexer<'a> {
    highlighter: &'a Highlighter,
    /// Line being analyzed, without its newline
    line: &'a str,
    /// Current line (1-indexed)
    line_number: u32,
    /// Byte offset of the line in the source
    line_offset: usize,
    /// Byte position within the line
    pos: usize,
    stack: &'a mut Vec<State>,
}

impl<'a> LineLexer<'a> {
    fn tokenize(&mut self, tokens: &mut Vec<HighlightToken>) {
        while self.pos < self.line.len() {
            if !self.apply_first_rule(tokens) {
                self.invalid_char(tokens);
            }
        }
    }

    fn current_state(&self) -> State {
        self.stack.last().copied().unwrap_or(State::Root)
    }

    /// Creates a position at a byte index of the line
    fn position_at(&self, pos: usize) -> Position {
        let column = self.line[..pos].chars().count() as u32 + 1;
        Position::new(self.line_number, column, self.line_offset + pos)
    }

    fn push_token(&self, tokens: &mut Vec<HighlightToken>, class: TokenClass, start: usize, end: usize) {
        if start < end {
            let span = Span::new(self.position_at(start), self.position_at(end));
            tokens.push(HighlightToken::new(class, span));
        }
    }

    /// Tries the rules of the current state; returns whether one matched
    fn apply_first_rule(&mut self, tokens: &mut Vec<HighlightToken>) -> bool {
        let highlighter = self.highlighter;
        let Some(rules) = highlighter.states.get(&self.current_state()) else {
            return false;
        };
        let line = self.line;
        let rest = &line[self.pos..];

        for rule in rules {
            let captures = match rule.regex.captures(rest) {
                Ok(Some(captures)) => captures,
                Ok(None) => continue,
                Err(err) => {
                    tracing::trace!(%err, "rule gave up while matching");
                    continue;
                }
            };
            let Some(whole) = captures.get(0) else {
                continue;
            };
            if whole.end() == 0 {
                continue;
            }

            let start = self.pos;
            let end = start + whole.end();
            self.apply_action(&rule.action, &captures, whole.as_str(), start, end, tokens);
            self.pos = end;
            return true;
        }

        false
    }

    fn apply_action(
        &mut self,
        action: &Action,
        captures: &Captures<'_>,
        text: &str,
        start: usize,
        end: usize,
        tokens: &mut Vec<HighlightToken>,
    ) {
        let highlighter = self.highlighter;
        let grammar = &highlighter.grammar;
        match action {
            Action::Token(class) => self.push_token(tokens, *class, start, end),
            Action::Cases {
                set,
                matched,
                default,
            } => {
                let class = if grammar.keyword_set_contains(*set, text) {
                    *matched
                } else {
                    *default
                };
                self.push_token(tokens, class, start, end);
            }
            Action::Brackets => {
                let class = text
                    .chars()
                    .next()
                    .and_then(|ch| grammar.bracket_class(ch))
                    .unwrap_or(TokenClass::DelimiterAngle);
                self.push_token(tokens, class, start, end);
            }
            Action::Groups(classes) => {
                for (index, class) in classes.iter().enumerate() {
                    if let Some(group) = captures.get(index + 1) {
                        self.push_token(tokens, *class, start + group.start(), start + group.end());
                    }
                }
            }
            Action::Push { token, next } => {
                self.push_token(tokens, *token, start, end);
                self.stack.push(*next);
            }
            Action::Pop { token } => {
                self.push_token(tokens, *token, start, end);
                if self.stack.len() > 1 {
                    self.stack.pop();
                }
            }
            // Includes are flattened when the highlighter is built
            Action::Include(_) => {}
        }
    }

    /// Emits the grammar's default token for one character
    fn invalid_char(&mut self, tokens: &mut Vec<HighlightToken>) {
        let width = self.line[self.pos..]
            .chars()
            .next()
            .map(char::len_utf8)
            .unwrap_or(1);
        let class = self.highlighter.grammar.default_token;
        self.push_token(tokens, class, self.pos, self.pos + width);
        self.pos += width;
    }
}

/// Compiles the grammar and highlights `source` in one go
pub fn highlight(grammar: &TokenizerGrammar, source: &str) -> Result<Vec<HighlightToken>> {
    Ok(Highlighter::new(grammar)?.highlight(source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::compile;
    use banana_schema::Component;
    use pretty_assertions::assert_eq;

    fn highlighter() -> Highlighter {
        let catalog = vec![
            Component::new("MonascaMarkovChainSource", "source"),
            Component::new("HttpSink", "sink"),
        ];
        Highlighter::new(&compile(&catalog)).unwrap()
    }

    /// (class, text) pairs without whitespace
    fn lex(source: &str) -> Vec<(&'static str, String)> {
        highlighter()
            .highlight(source)
            .into_iter()
            .filter(|t| t.class != TokenClass::White)
            .map(|t| (t.class.as_str(), t.text(source).to_string()))
            .collect()
    }

    fn pairs(expected: &[(&'static str, &str)]) -> Vec<(&'static str, String)> {
        expected.iter().map(|(c, t)| (*c, t.to_string())).collect()
    }

    #[test]
    fn test_component_names_are_type_keywords() {
        assert_eq!(
            lex("Src = HttpSink(port=9091)"),
            pairs(&[
                ("identifier", "Src"),
                ("operator", "="),
                ("keyword.type.identifier", "HttpSink"),
                ("delimiter.parenthesis", "("),
                ("identifier.type", "port"),
                ("operator", "="),
                ("number.integer", "9091"),
                ("delimiter.parenthesis", ")"),
            ])
        );
    }

    #[test]
    fn test_lowercase_identifiers_take_trailing_blanks() {
        assert_eq!(
            lex("src -> ldp1.out"),
            pairs(&[
                ("identifier.type", "src "),
                ("operator", "->"),
                ("identifier.type", "ldp1.out"),
            ])
        );
    }

    #[test]
    fn test_numbers_float_before_int() {
        assert_eq!(
            lex("(0.8, .5, 1.5e-3, 42)"),
            pairs(&[
                ("delimiter.parenthesis", "("),
                ("number.float", "0.8"),
                ("operator", ","),
                ("number.float", ".5"),
                ("operator", ","),
                ("number.float", "1.5e-3"),
                ("operator", ","),
                ("number.integer", "42"),
                ("delimiter.parenthesis", ")"),
            ])
        );
    }

    #[test]
    fn test_strings_and_escapes() {
        assert_eq!(
            lex(r#""a\tb\qc""#),
            pairs(&[
                ("string.quote", "\""),
                ("string", "a"),
                ("string.escape", r"\t"),
                ("string", "b"),
                ("string.escape.invalid", r"\q"),
                ("string", "c"),
                ("string.quote", "\""),
            ])
        );
    }

    #[test]
    fn test_hex_and_unicode_escapes() {
        let source = "\"\\x41\u{e9}\\u00e9\\U0001F600\\x12345\"";
        assert_eq!(
            lex(source),
            pairs(&[
                ("string.quote", "\""),
                ("string.escape", r"\x41"),
                ("string", "\u{e9}"),
                ("string.escape", r"\u00e9"),
                ("string.escape", r"\U0001F600"),
                // At most four hex digits after `\x`
                ("string.escape", r"\x1234"),
                ("string", "5"),
                ("string.quote", "\""),
            ])
        );
    }

    #[test]
    fn test_unterminated_string_does_not_leak_into_next_line() {
        assert_eq!(
            lex("a = \"open\nb"),
            pairs(&[
                ("identifier.type", "a "),
                ("operator", "="),
                ("string.invalid", "\"open"),
                ("identifier.type", "b"),
            ])
        );
    }

    #[test]
    fn test_unterminated_string_is_invalid() {
        assert_eq!(
            lex(r#"x = "open"#),
            pairs(&[
                ("identifier.type", "x "),
                ("operator", "="),
                ("string.invalid", "\"open"),
            ])
        );
    }

    #[test]
    fn test_character_literals() {
        assert_eq!(
            lex(r"'a' '\n' '"),
            pairs(&[
                ("string", "'a'"),
                ("string", "'"),
                ("string.escape", r"\n"),
                ("string", "'"),
                ("string.invalid", "'"),
            ])
        );
    }

    #[test]
    fn test_comments_and_brackets() {
        assert_eq!(
            lex("[{}] # trailing comment"),
            pairs(&[
                ("delimiter.array", "["),
                ("delimiter.bracket", "{"),
                ("delimiter.bracket", "}"),
                ("delimiter.array", "]"),
                ("comment", "# trailing comment"),
            ])
        );
    }

    #[test]
    fn test_symbols_that_are_not_operators() {
        assert_eq!(
            lex("a == b"),
            pairs(&[
                ("identifier.type", "a "),
                ("", "=="),
                ("identifier.type", "b"),
            ])
        );
        // A comma glued to another symbol is part of the run
        assert_eq!(
            lex("x =,"),
            pairs(&[("identifier.type", "x "), ("", "=,")])
        );
        assert_eq!(lex(","), pairs(&[("operator", ",")]));
    }

    #[test]
    fn test_lone_angle_bracket() {
        assert_eq!(
            lex("< 1"),
            pairs(&[("delimiter.angle", "<"), ("number.integer", "1")])
        );
    }

    #[test]
    fn test_invalid_characters_use_default_token() {
        assert_eq!(lex("`"), pairs(&[("invalid", "`")]));
    }

    #[test]
    fn test_spans_are_line_and_column_based() {
        let source = "a = 1\nHttpSink";
        let tokens = highlighter().highlight(source);
        let sink = tokens.last().unwrap();
        assert_eq!(sink.class, TokenClass::KeywordTypeIdentifier);
        assert_eq!(sink.span.start.line, 2);
        assert_eq!(sink.span.start.column, 1);
        assert_eq!(sink.span.start.offset, 6);
        assert_eq!(sink.span.end.column, 9);
        assert_eq!(sink.text(source), "HttpSink");
    }

    #[test]
    fn test_grammar_recompile_changes_keywords_only() {
        let before = Highlighter::new(&compile(&[])).unwrap();
        let tokens = before.highlight("HttpSink");
        assert_eq!(tokens[0].class, TokenClass::Identifier);

        let tokens = highlighter().highlight("HttpSink");
        assert_eq!(tokens[0].class, TokenClass::KeywordTypeIdentifier);
    }

    #[test]
    fn test_include_cycle_is_rejected() {
        let mut grammar = compile(&[]);
        grammar
            .tokenizer
            .get_mut(&State::Whitespace)
            .unwrap()
            .push(Rule::include(State::Root));
        let err = Highlighter::new(&grammar).unwrap_err();
        assert!(matches!(err, GrammarError::IncludeCycle(State::Root)));
    }

    #[test]
    fn test_bad_pattern_is_reported() {
        let mut grammar = compile(&[]);
        grammar
            .tokenizer
            .get_mut(&State::Root)
            .unwrap()
            .insert(0, Rule::token("(unclosed", TokenClass::Comment));
        let err = Highlighter::new(&grammar).unwrap_err();
        assert!(matches!(err, GrammarError::Pattern { .. }));
    }
}
