//! Source positions inside markup files.
//!
//! Provides [`Span`], used by the markup tokenizer, the binding lexer and every
//! diagnostic that points back into a view file.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A region of markup text, represented by its starting position.
///
/// Binding expressions are lexed from the middle of an attribute value, so
/// their spans are produced by [`Span::offset`] against the position of the
/// enclosing binding rather than from the start of the file.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, character-based).
    pub col: u32,
    /// Length in characters.
    pub len: u32,
}

impl Span {
    /// Create a new span from a line, column, and length.
    #[inline]
    pub fn new(line: u32, col: u32, len: u32) -> Self {
        Self { line, col, len }
    }

    /// Create a zero-length span at a position.
    #[inline]
    pub fn point(line: u32, col: u32) -> Self {
        Self { line, col, len: 0 }
    }

    /// Whether this span is empty (zero length).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The length of this span.
    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Translate a span measured relative to `base` into file coordinates.
    ///
    /// Spans on the first relative line continue the base column; later
    /// lines keep their own column.
    #[inline]
    pub fn offset(self, base: Span) -> Span {
        if self.line <= 1 {
            Span::new(base.line, base.col + self.col.saturating_sub(1), self.len)
        } else {
            Span::new(base.line + self.line - 1, self.col, self.len)
        }
    }

    /// Merge two spans into one that starts at the earlier span and covers both.
    ///
    /// Spans on different lines keep the first span's position and sum the lengths.
    #[inline]
    pub fn merge(self, other: Span) -> Span {
        if self.line == other.line {
            let start_col = self.col.min(other.col);
            let end_col = (other.col + other.len).max(self.col + self.len);
            Span {
                line: self.line,
                col: start_col,
                len: end_col - start_col,
            }
        } else {
            Span {
                line: self.line,
                col: self.col,
                len: self.len + other.len,
            }
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_display() {
        let span = Span::new(3, 15, 5);
        assert_eq!(format!("{}", span), "3:15");
    }

    #[test]
    fn span_merge_same_line() {
        let merged = Span::new(1, 5, 3).merge(Span::new(1, 10, 3));
        assert_eq!(merged, Span::new(1, 5, 8));
    }

    #[test]
    fn span_merge_reverse_order() {
        let merged = Span::new(1, 10, 3).merge(Span::new(1, 5, 3));
        assert_eq!(merged, Span::new(1, 5, 8));
    }

    #[test]
    fn span_merge_different_lines() {
        let merged = Span::new(1, 5, 10).merge(Span::new(3, 10, 5));
        assert_eq!(merged, Span::new(1, 5, 15));
    }

    #[test]
    fn offset_on_first_line_shifts_column() {
        let base = Span::new(4, 20, 0);
        assert_eq!(Span::new(1, 1, 3).offset(base), Span::new(4, 20, 3));
        assert_eq!(Span::new(1, 7, 2).offset(base), Span::new(4, 26, 2));
    }

    #[test]
    fn offset_on_later_line_keeps_column() {
        let base = Span::new(4, 20, 0);
        assert_eq!(Span::new(3, 2, 1).offset(base), Span::new(6, 2, 1));
    }
}
