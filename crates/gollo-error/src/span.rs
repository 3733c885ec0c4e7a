//! Span - Source code location
//!
//! Every token and every IR operation remembers where it came from so
//! that errors, even runtime ones, can point back at the source.

use serde::Serialize;
use std::fmt;

/// A position in a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Position {
    /// Line (1-indexed)
    pub line: u32,
    /// Column (1-indexed, counted in characters)
    pub column: u32,
    /// Byte offset from the beginning of the file
    pub offset: usize,
}

impl Position {
    pub fn new(line: u32, column: u32, offset: usize) -> Self {
        Self { line, column, offset }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A region of one source file (start inclusive, end exclusive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
    /// Source file ID, see [`crate::SourceCache`]
    pub file_id: u32,
}

impl Span {
    pub fn new(start: Position, end: Position, file_id: u32) -> Self {
        Self { start, end, file_id }
    }

    /// A span that never leaves one line.
    ///
    /// `column` and `offset` describe the first character, `width` is the
    /// number of characters and `bytes` the number of bytes covered.
    pub fn on_line(line: u32, column: u32, offset: usize, width: u32, bytes: usize, file_id: u32) -> Self {
        Self {
            start: Position::new(line, column, offset),
            end: Position::new(line, column + width, offset + bytes),
            file_id,
        }
    }

    /// Returns the length in bytes
    pub fn len(&self) -> usize {
        self.end.offset.saturating_sub(self.start.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Displays as `line:column` of the first character.
///
/// Use [`crate::SourceCache::locate`] for the `file:line:column` form.
impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.start.fmt(f)
    }
}

/// Trait for types that have a location in the code
pub trait Spanned {
    fn span(&self) -> Span;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_line() {
        let span = Span::on_line(3, 5, 40, 4, 4, 0);
        assert_eq!(span.start, Position::new(3, 5, 40));
        assert_eq!(span.end, Position::new(3, 9, 44));
        assert_eq!(span.len(), 4);
        assert_eq!(span.to_string(), "3:5");
    }

    #[test]
    fn test_multibyte_width() {
        // "ção" is 3 characters but 5 bytes
        let span = Span::on_line(1, 1, 0, 3, 5, 0);
        assert_eq!(span.end.column, 4);
        assert_eq!(span.len(), 5);
    }
}
