//! banana-complete - Autocompletion for the banana language
//!
//! Completion works on the raw text before the cursor, a snapshot of the
//! type table and the component catalog. It never touches the network
//! and never fails: misses resolve to an empty list.
//!
//! # Example
//!
//! ```rust
//! use banana_complete::resolve;
//! use banana_schema::{Component, TypeTable};
//!
//! let catalog = vec![Component::new("HttpSink", "Serves data over HTTP")];
//! let candidates = resolve("sink = ", &TypeTable::new(), &catalog);
//!
//! assert_eq!(candidates[0].insert_text, "HttpSink({{}})");
//! ```

pub mod candidate;
pub mod context;
pub mod resolver;

pub use candidate::{CandidateKind, CompletionCandidate};
pub use context::{classify, CompletionContext};
pub use resolver::{line_prefix, resolve, resolve_path};
