//! Diagnostic - editor markers and their terminal rendering
//!
//! A [`Marker`] is what the editor shows for one annotation of a
//! type-check report. [`DiagnosticRenderer`] prints markers in the
//! Rust compiler style:
//! - Severity and message
//! - Precise location
//! - Source code snippet with an underline

use crate::report::Annotation;
use crate::span::{Span, Spanned};
use std::fmt;

/// Marker severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Type error reported by the checker
    Error,
    /// Warning - does not prevent submission
    Warning,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warning => "warning",
        }
    }

    /// Returns the ANSI code for coloring (if terminal supports it)
    pub fn color_code(&self) -> &'static str {
        match self {
            Level::Error => "\x1b[1;31m",   // Bold Red
            Level::Warning => "\x1b[1;33m", // Bold Yellow
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An annotation placed on the source, ready for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub level: Level,
    pub span: Span,
    pub message: String,
}

impl Marker {
    pub fn from_annotation(level: Level, annotation: &Annotation) -> Self {
        Self {
            level,
            span: annotation.span(),
            message: annotation.message.clone(),
        }
    }
}

impl Spanned for Marker {
    fn span(&self) -> Span {
        self.span
    }
}

/// A named source text with a line index
#[derive(Debug)]
pub struct SourceFile {
    pub name: String,
    pub source: String,
    /// Offset of each line (for fast lookup)
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        let source = source.into();
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        Self {
            name: name.into(),
            source,
            line_starts,
        }
    }

    /// Returns the line of code (0-indexed internally, but line is 1-indexed)
    pub fn get_line(&self, line: u32) -> Option<&str> {
        let line_idx = line.checked_sub(1)? as usize;
        let start = *self.line_starts.get(line_idx)?;
        let end = self
            .line_starts
            .get(line_idx + 1)
            .map(|&e| e.saturating_sub(1))
            .unwrap_or(self.source.len());

        self.source.get(start..end)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

/// Renders markers for display
pub struct DiagnosticRenderer<'a> {
    file: &'a SourceFile,
    use_colors: bool,
}

impl<'a> DiagnosticRenderer<'a> {
    pub fn new(file: &'a SourceFile) -> Self {
        Self {
            file,
            use_colors: true,
        }
    }

    pub fn without_colors(mut self) -> Self {
        self.use_colors = false;
        self
    }

    /// Renders the marker as a string
    pub fn render(&self, marker: &Marker) -> String {
        let mut output = String::new();

        let reset = if self.use_colors { "\x1b[0m" } else { "" };
        let color = if self.use_colors {
            marker.level.color_code()
        } else {
            ""
        };
        let bold = if self.use_colors { "\x1b[1m" } else { "" };
        let blue = if self.use_colors { "\x1b[1;34m" } else { "" };

        // Line 1: error: message
        output.push_str(color);
        output.push_str(marker.level.as_str());
        output.push_str(reset);
        output.push_str(bold);
        output.push_str(": ");
        output.push_str(&marker.message);
        output.push_str(reset);
        output.push('\n');

        // --> file:line:column
        let start = marker.span.start;
        output.push_str(&format!(
            " {}-->{} {}:{}:{}\n",
            blue, reset, self.file.name, start.line, start.column
        ));

        if let Some(line_content) = self.file.get_line(start.line) {
            let line_num_width = start.line.to_string().len();
            let padding = " ".repeat(line_num_width);

            output.push_str(&format!(" {} {}|{}\n", padding, blue, reset));
            output.push_str(&format!(
                " {}{}{} |{} {}\n",
                blue, start.line, reset, reset, line_content
            ));

            let col_start = start.column.max(1) as usize;
            let end = marker.span.end;
            let underline_len = if marker.span.is_single_line() {
                end.column.saturating_sub(start.column).max(1) as usize
            } else {
                line_content.len().saturating_sub(col_start - 1).max(1)
            };

            let spaces = " ".repeat(col_start - 1);
            let underline = "^".repeat(underline_len);

            output.push_str(&format!(
                " {} {}|{} {}{}{}{}\n",
                padding, blue, reset, spaces, color, underline, reset
            ));
        }

        output
    }

    /// Renders every marker, separated by blank lines
    pub fn render_all(&self, markers: &[Marker]) -> String {
        markers
            .iter()
            .map(|m| self.render(m))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
