//! Span - Source code location
//!
//! A Span represents a region in the source code, used to locate
//! highlighted tokens and type-check annotations.

/// Represents a position in the source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// Line (1-indexed)
    pub line: u32,
    /// Column (1-indexed)
    pub column: u32,
    /// Byte offset from the beginning of the source
    pub offset: usize,
}

impl Position {
    pub fn new(line: u32, column: u32, offset: usize) -> Self {
        Self { line, column, offset }
    }
}

/// Represents a region in the source code (start to end, end exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Start position
    pub start: Position,
    /// End position
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Checks if the span starts and ends on the same line
    pub fn is_single_line(&self) -> bool {
        self.start.line == self.end.line
    }

    /// Returns the length in bytes
    pub fn len(&self) -> usize {
        self.end.offset.saturating_sub(self.start.offset)
    }

    /// Checks if the span is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the covered slice of `source`, if the offsets are in range
    pub fn slice<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.start.offset..self.end.offset)
    }
}

/// Trait for types that have a location in the code
pub trait Spanned {
    fn span(&self) -> Span;
}
