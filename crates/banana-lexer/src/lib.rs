//! banana-lexer - Grammar compiler and highlighter for the banana language
//!
//! This crate turns the component catalog into a tokenizer grammar and
//! runs that grammar over source text.
//!
//! # Features
//!
//! - Component names highlighted as type references
//! - Dotted lowercase identifiers (`src.params.alpha`)
//! - Literals: integers, floats, strings with escapes, characters
//! - `#` line comments
//!
//! # Example
//!
//! ```rust
//! use banana_lexer::{compile, Highlighter, TokenClass};
//! use banana_schema::Component;
//!
//! let catalog = vec![Component::new("HttpSink", "Serves data over HTTP")];
//! let grammar = compile(&catalog);
//!
//! let highlighter = Highlighter::new(&grammar).unwrap();
//! let tokens = highlighter.highlight("sink = HttpSink(port=9091)");
//!
//! assert!(tokens.iter().any(|t| t.class == TokenClass::KeywordTypeIdentifier));
//! ```

pub mod grammar;
pub mod lexer;
pub mod token;

pub use grammar::{compile, LanguageConfiguration, Rule, State, TokenizerGrammar};
pub use lexer::{highlight, Highlighter};
pub use token::{HighlightToken, TokenClass};

use thiserror::Error;

/// Errors raised while turning a grammar into a highlighter
#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("invalid pattern `{pattern}`: {message}")]
    Pattern { pattern: String, message: String },
    #[error("grammar references unknown state {0:?}")]
    UnknownState(State),
    #[error("state {0:?} includes itself")]
    IncludeCycle(State),
}

/// Default Result type for grammar operations
pub type Result<T> = std::result::Result<T, GrammarError>;
