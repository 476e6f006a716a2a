//! banana-schema - Schema model of the banana language
//!
//! Holds the immutable description of what the backend offers:
//! - The component catalog and component parameters
//! - The recursive type language (any, string, number, enum, object, component)
//! - The type table mapping in-scope variables to their types
//!
//! # Example
//!
//! ```rust
//! use banana_schema::{Type, TypeTable};
//!
//! let table: TypeTable = serde_json::from_str(r#"{"x": {"id": "number"}}"#).unwrap();
//! assert_eq!(table.lookup("x"), Some(&Type::Number));
//! ```

pub mod component;
pub mod table;
pub mod types;

pub use component::{Catalog, Component, Param};
pub use table::TypeTable;
pub use types::Type;
