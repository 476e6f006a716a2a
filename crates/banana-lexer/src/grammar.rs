//! Grammar compiler
//!
//! Turns the component catalog served by the backend into a tokenizer
//! description. Only the set of type keywords depends on the catalog;
//! operators, symbols, escapes and the lexical rules are fixed.
//!
//! The grammar is plain data. It is installed into the editor every time
//! the catalog changes, so [`compile`] must be deterministic: the same
//! catalog always yields an identical grammar.

use crate::token::TokenClass;
use banana_schema::Component;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Operators of the pipeline language
pub const OPERATORS: [&str; 9] = ["=", ">", "<", "+", "-", "*", "/", "->", ","];

/// Runs of symbol characters, classified against [`OPERATORS`].
///
/// `,` is one of the operators, so it is a symbol character too; without
/// it a lone comma would fall to the default `invalid` token. The price is
/// that runs such as `=,` are a single non-operator symbol.
pub const SYMBOLS: &str = r"[=><!~?:&|+\-*/\^%,]+";

/// Escape sequences accepted in strings and character literals
pub const ESCAPES: &str = r#"\\(?:[abfnrtv\\"']|x[0-9A-Fa-f]{1,4}|u[0-9A-Fa-f]{4}|U[0-9A-Fa-f]{8})"#;

/// Tokenizer states
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    /// Top level of a line
    Root,
    /// Blanks and comments, included from other states
    Whitespace,
    /// Inside a double-quoted string
    String,
}

/// Keyword sets a rule can dispatch on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum KeywordSet {
    TypeKeywords,
    Operators,
}

/// What a rule does with the text it matched
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    /// Emit one token of this class
    Token(TokenClass),
    /// `matched` if the text is in `set`, `default` otherwise
    Cases {
        set: KeywordSet,
        matched: TokenClass,
        default: TokenClass,
    },
    /// Classify through the grammar's bracket pairs
    Brackets,
    /// One token per capture group
    Groups(Vec<TokenClass>),
    /// Emit a token and enter a state
    Push { token: TokenClass, next: State },
    /// Emit a token and return to the previous state
    Pop { token: TokenClass },
    /// Try the rules of another state in place
    Include(State),
}

/// A lexical rule: a pattern anchored at the current position
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rule {
    /// Pattern; `@symbols` and `@escapes` refer to the grammar's regexes
    pub regex: String,
    pub action: Action,
}

impl Rule {
    pub fn new(regex: impl Into<String>, action: Action) -> Self {
        Self {
            regex: regex.into(),
            action,
        }
    }

    pub fn token(regex: impl Into<String>, class: TokenClass) -> Self {
        Self::new(regex, Action::Token(class))
    }

    pub fn include(state: State) -> Self {
        Self::new("", Action::Include(state))
    }
}

/// A pair of matching brackets
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BracketPair {
    pub open: char,
    pub close: char,
    pub token: TokenClass,
}

impl BracketPair {
    fn new(open: char, close: char, token: TokenClass) -> Self {
        Self { open, close, token }
    }
}

/// Tokenizer description consumed by the editor and by
/// [`Highlighter`](crate::Highlighter)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenizerGrammar {
    pub default_token: TokenClass,
    pub operators: Vec<String>,
    pub keywords: Vec<String>,
    /// Component names, highlighted as type references
    pub type_keywords: Vec<String>,
    pub symbols: String,
    pub escapes: String,
    pub brackets: Vec<BracketPair>,
    pub tokenizer: BTreeMap<State, Vec<Rule>>,
    pub token_postfix: String,
}

impl TokenizerGrammar {
    pub fn is_type_keyword(&self, word: &str) -> bool {
        self.type_keywords.iter().any(|k| k == word)
    }

    pub fn is_operator(&self, word: &str) -> bool {
        self.operators.iter().any(|op| op == word)
    }

    pub fn keyword_set_contains(&self, set: KeywordSet, word: &str) -> bool {
        match set {
            KeywordSet::TypeKeywords => self.is_type_keyword(word),
            KeywordSet::Operators => self.is_operator(word),
        }
    }

    /// Returns the class of a single bracket character
    pub fn bracket_class(&self, ch: char) -> Option<TokenClass> {
        self.brackets
            .iter()
            .find(|pair| pair.open == ch || pair.close == ch)
            .map(|pair| pair.token)
    }

    pub fn rules(&self, state: State) -> &[Rule] {
        self.tokenizer.get(&state).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Compiles the catalog into a tokenizer grammar
pub fn compile(components: &[Component]) -> TokenizerGrammar {
    let mut seen = HashSet::new();
    let type_keywords: Vec<String> = components
        .iter()
        .filter(|c| seen.insert(c.name.as_str()))
        .map(|c| c.name.clone())
        .collect();

    tracing::debug!(type_keywords = type_keywords.len(), "compiled banana grammar");

    TokenizerGrammar {
        default_token: TokenClass::Invalid,
        operators: OPERATORS.iter().map(|op| op.to_string()).collect(),
        keywords: Vec::new(),
        type_keywords,
        symbols: SYMBOLS.to_string(),
        escapes: ESCAPES.to_string(),
        brackets: vec![
            BracketPair::new('(', ')', TokenClass::DelimiterParenthesis),
            BracketPair::new('[', ']', TokenClass::DelimiterArray),
            BracketPair::new('{', '}', TokenClass::DelimiterBracket),
        ],
        tokenizer: lexical_rules(),
        token_postfix: String::new(),
    }
}

/// The fixed, catalog-independent rules of every state
fn lexical_rules() -> BTreeMap<State, Vec<Rule>> {
    let root = vec![
        // Identifiers and component names
        Rule::new(
            r"[A-Z][A-Za-z0-9_$]*",
            Action::Cases {
                set: KeywordSet::TypeKeywords,
                matched: TokenClass::KeywordTypeIdentifier,
                default: TokenClass::Identifier,
            },
        ),
        Rule::token(r"[a-z_$][.A-Za-z0-9_$]*(?:[ \t\r\n]*)", TokenClass::IdentifierType),
        // Numbers, float before int
        Rule::token(r"[0-9]*\.[0-9]+(?:[eE][\-+]?[0-9]+)?", TokenClass::NumberFloat),
        Rule::token(r"[0-9]+", TokenClass::NumberInteger),
        Rule::include(State::Whitespace),
        // Delimiters and operators
        Rule::new(r"[{}()\[\]]", Action::Brackets),
        Rule::new(r"[<>](?!@symbols)", Action::Brackets),
        Rule::new(
            "@symbols",
            Action::Cases {
                set: KeywordSet::Operators,
                matched: TokenClass::Operator,
                default: TokenClass::Unclassified,
            },
        ),
        // Strings
        Rule::token(r#""(?:[^"\\]|\\.)*$"#, TokenClass::StringInvalid),
        Rule::new(
            "\"",
            Action::Push {
                token: TokenClass::StringQuote,
                next: State::String,
            },
        ),
        // Characters
        Rule::token(r"'[^\\']'", TokenClass::String),
        Rule::new(
            "(')(@escapes)(')",
            Action::Groups(vec![
                TokenClass::String,
                TokenClass::StringEscape,
                TokenClass::String,
            ]),
        ),
        Rule::token("'", TokenClass::StringInvalid),
    ];

    let whitespace = vec![
        Rule::token(r"[ \t\r\n]+", TokenClass::White),
        Rule::token(r"#.*$", TokenClass::Comment),
    ];

    let string = vec![
        Rule::token(r#"[^\\"]+"#, TokenClass::String),
        Rule::token("@escapes", TokenClass::StringEscape),
        Rule::token(r"\\.", TokenClass::StringEscapeInvalid),
        Rule::new(
            "\"",
            Action::Pop {
                token: TokenClass::StringQuote,
            },
        ),
    ];

    BTreeMap::from([
        (State::Root, root),
        (State::Whitespace, whitespace),
        (State::String, string),
    ])
}

/// Editor settings registered alongside the grammar
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageConfiguration {
    pub line_comment: String,
    pub auto_closing_pairs: Vec<(char, char)>,
    /// Characters that end a word when navigating or completing
    pub word_separators: String,
}

impl Default for LanguageConfiguration {
    fn default() -> Self {
        Self {
            line_comment: "#".to_string(),
            auto_closing_pairs: vec![('(', ')')],
            word_separators: r#"~!@#$%^&*()-=+[{]}\|;:'",<>/?"#.to_string(),
        }
    }
}

impl LanguageConfiguration {
    /// Checks if `ch` separates words
    pub fn is_word_separator(&self, ch: char) -> bool {
        ch.is_whitespace() || self.word_separators.contains(ch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn catalog(names: &[&str]) -> Vec<Component> {
        names
            .iter()
            .map(|name| Component::new(*name, format!("{} component", name)))
            .collect()
    }

    #[test]
    fn test_compile_is_deterministic() {
        let components = catalog(&["MonascaMarkovChainSource", "HttpSink", "JsonLDP"]);
        let first = compile(&components);
        let second = compile(&components);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_type_keywords_are_component_names() {
        let grammar = compile(&catalog(&["Foo", "Bar", "Foo"]));
        assert_eq!(grammar.type_keywords, vec!["Foo".to_string(), "Bar".to_string()]);
        assert!(grammar.is_type_keyword("Bar"));
        assert!(!grammar.is_type_keyword("bar"));
    }

    #[test]
    fn test_only_keywords_depend_on_catalog() {
        let empty = compile(&[]);
        let full = compile(&catalog(&["HttpSink"]));
        assert!(empty.type_keywords.is_empty());
        assert_eq!(empty.operators, full.operators);
        assert_eq!(empty.tokenizer, full.tokenizer);
        assert_eq!(empty.symbols, full.symbols);
        assert_eq!(empty.escapes, full.escapes);
        assert_eq!(empty.brackets, full.brackets);
    }

    #[test]
    fn test_fixed_operator_set() {
        let grammar = compile(&[]);
        assert_eq!(grammar.operators, OPERATORS.map(String::from).to_vec());
        assert!(grammar.is_operator("->"));
        assert!(!grammar.is_operator("=="));
        assert!(grammar.keywords.is_empty());
    }

    #[test]
    fn test_grammar_json_shape() {
        let grammar = compile(&catalog(&["HttpSink"]));
        let json = serde_json::to_value(&grammar).unwrap();
        assert_eq!(json["defaultToken"], "invalid");
        assert_eq!(json["typeKeywords"], serde_json::json!(["HttpSink"]));
        assert_eq!(json["tokenizer"]["whitespace"][1]["action"]["token"], "comment");
        assert_eq!(json["tokenizer"]["string"][3]["action"]["pop"]["token"], "string.quote");
        assert_eq!(json["brackets"][0]["token"], "delimiter.parenthesis");
    }

    #[test]
    fn test_bracket_class() {
        let grammar = compile(&[]);
        assert_eq!(grammar.bracket_class(']'), Some(TokenClass::DelimiterArray));
        assert_eq!(grammar.bracket_class('{'), Some(TokenClass::DelimiterBracket));
        assert_eq!(grammar.bracket_class('<'), None);
    }

    #[test]
    fn test_language_configuration() {
        let config = LanguageConfiguration::default();
        assert_eq!(config.line_comment, "#");
        assert!(config.is_word_separator('('));
        assert!(config.is_word_separator(' '));
        assert!(!config.is_word_separator('_'));
        assert!(!config.is_word_separator('.'));
    }
}
