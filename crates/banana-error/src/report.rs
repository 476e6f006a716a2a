//! Type-check reports as returned by the banana backend
//!
//! The backend answers both `/banana/typeck` and `/banana` with a
//! [`BananaReport`]: two lists of [`Annotation`]s, using 1-based
//! line/column coordinates and a half-open byte range.

use crate::diagnostic::{Level, Marker};
use crate::span::{Position, Span, Spanned};
use serde::{Deserialize, Serialize};

/// A single error or warning produced by the type checker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Annotation {
    pub start_line_number: u32,
    pub start_column: u32,
    pub end_line_number: u32,
    pub end_column: u32,
    /// Half-open byte range `[start, end)` into the checked source
    pub byte_range: (usize, usize),
    pub message: String,
}

impl Spanned for Annotation {
    fn span(&self) -> Span {
        Span::new(
            Position::new(self.start_line_number, self.start_column, self.byte_range.0),
            Position::new(self.end_line_number, self.end_column, self.byte_range.1),
        )
    }
}

/// Result of type-checking or submitting a banana program
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BananaReport {
    #[serde(default)]
    pub errors: Vec<Annotation>,
    #[serde(default)]
    pub warnings: Vec<Annotation>,
}

impl BananaReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// Converts the report into editor markers, warnings first then errors
    pub fn markers(&self) -> Vec<Marker> {
        let warnings = self
            .warnings
            .iter()
            .map(|a| Marker::from_annotation(Level::Warning, a));
        let errors = self
            .errors
            .iter()
            .map(|a| Marker::from_annotation(Level::Error, a));
        warnings.chain(errors).collect()
    }
}
