//! banana-error - Locations and diagnostics for the banana language
//!
//! This crate provides source spans, the wire format of type-check
//! reports returned by the banana backend, and a terminal renderer
//! for the resulting editor markers.
//!
//! # Example
//!
//! ```rust
//! use banana_error::{BananaReport, DiagnosticRenderer, SourceFile};
//!
//! let report: BananaReport = Default::default();
//! let file = SourceFile::new("pipeline.banana", "src = Source()");
//!
//! let renderer = DiagnosticRenderer::new(&file).without_colors();
//! println!("{}", renderer.render_all(&report.markers()));
//! ```

pub mod diagnostic;
pub mod report;
pub mod span;

pub use diagnostic::{DiagnosticRenderer, Level, Marker, SourceFile};
pub use report::{Annotation, BananaReport};
pub use span::{Position, Span, Spanned};
