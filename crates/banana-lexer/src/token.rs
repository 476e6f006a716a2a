//! Token classes for the banana language
//!
//! Defines every class the highlighter can assign. The string form of a
//! class is the token name understood by the host editor's theme.

use banana_error::span::{Span, Spanned};
use serde::{Serialize, Serializer};
use std::fmt;

/// All token classes produced by the banana grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenClass {
    // =========================================
    // Identifiers
    // =========================================
    /// Capitalized identifier naming a catalog component: `HttpSink`
    KeywordTypeIdentifier,
    /// Any other capitalized identifier
    Identifier,
    /// Lowercase-leading, possibly dotted identifier: `src`, `ldp.params`
    IdentifierType,

    // =========================================
    // Literals
    // =========================================
    /// `3.14`, `.5`, `1.0e10`
    NumberFloat,
    /// `42`
    NumberInteger,
    /// Body of a string or a character literal
    String,
    /// `"` opening or closing a string
    StringQuote,
    /// `\n`, `\x41`, `\u00e9`
    StringEscape,
    /// Unknown escape: `\q`
    StringEscapeInvalid,
    /// Non-terminated string or stray `'`
    StringInvalid,

    // =========================================
    // Punctuation
    // =========================================
    /// `(` `)`
    DelimiterParenthesis,
    /// `[` `]`
    DelimiterArray,
    /// `{` `}`
    DelimiterBracket,
    /// `<` `>` standing alone
    DelimiterAngle,
    /// One of the language operators: `=`, `->`, `,` ...
    Operator,
    /// Symbol run that is not an operator
    Unclassified,

    // =========================================
    // Trivia
    // =========================================
    /// Spaces and tabs
    White,
    /// `# ...` until end of line
    Comment,

    /// Character no rule accepts
    Invalid,
}

impl TokenClass {
    /// Returns the editor token name
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenClass::KeywordTypeIdentifier => "keyword.type.identifier",
            TokenClass::Identifier => "identifier",
            TokenClass::IdentifierType => "identifier.type",
            TokenClass::NumberFloat => "number.float",
            TokenClass::NumberInteger => "number.integer",
            TokenClass::String => "string",
            TokenClass::StringQuote => "string.quote",
            TokenClass::StringEscape => "string.escape",
            TokenClass::StringEscapeInvalid => "string.escape.invalid",
            TokenClass::StringInvalid => "string.invalid",
            TokenClass::DelimiterParenthesis => "delimiter.parenthesis",
            TokenClass::DelimiterArray => "delimiter.array",
            TokenClass::DelimiterBracket => "delimiter.bracket",
            TokenClass::DelimiterAngle => "delimiter.angle",
            TokenClass::Operator => "operator",
            TokenClass::Unclassified => "",
            TokenClass::White => "white",
            TokenClass::Comment => "comment",
            TokenClass::Invalid => "invalid",
        }
    }

    /// Returns true for whitespace and comments
    pub fn is_trivia(&self) -> bool {
        matches!(self, TokenClass::White | TokenClass::Comment)
    }
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for TokenClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A highlighted region of the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightToken {
    /// Token class
    pub class: TokenClass,
    /// Location in source code
    pub span: Span,
}

impl HighlightToken {
    pub fn new(class: TokenClass, span: Span) -> Self {
        Self { class, span }
    }

    /// Returns the highlighted text
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.slice(source).unwrap_or("")
    }
}

impl Spanned for HighlightToken {
    fn span(&self) -> Span {
        self.span
    }
}

impl fmt::Display for HighlightToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at {}:{}",
            self.class, self.span.start.line, self.span.start.column
        )
    }
}
