//! # Source Span
//!
//! Positions and ranges in source text. Spans travel from the tokenizer
//! through the parser into evaluation diagnostics.
//!
//! Lines and columns are 1-based; byte offsets are 0-based.
//!
//! ## Usage
//!
//! ```rust
//! use openscad_ast::{Position, Span};
//!
//! let span = Span::new(Position::new(0, 1, 1), Position::new(4, 1, 5));
//! assert_eq!(span.len(), 4);
//! assert_eq!(span.start.line, 1);
//! ```

use serde::{Deserialize, Serialize};

// =============================================================================
// POSITION
// =============================================================================

/// A single location in source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Byte offset (0-based).
    pub byte: usize,
    /// Line number (1-based).
    pub line: usize,
    /// Column in characters (1-based).
    pub column: usize,
}

impl Position {
    /// Create a position.
    #[inline]
    pub const fn new(byte: usize, line: usize, column: usize) -> Self {
        Self { byte, line, column }
    }

    /// The first character of a source file.
    #[inline]
    pub const fn start() -> Self {
        Self::new(0, 1, 1)
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

// =============================================================================
// SPAN
// =============================================================================

/// A half-open range `[start, end)` in source text.
///
/// Nodes built programmatically (scripting front end) carry
/// [`Span::default`], which is [`Span::is_synthetic`].
///
/// # Example
///
/// ```rust
/// use openscad_ast::{Position, Span};
///
/// let a = Span::new(Position::new(0, 1, 1), Position::new(4, 1, 5));
/// let b = Span::new(Position::new(5, 1, 6), Position::new(9, 1, 10));
/// let merged = a.merge(b);
/// assert_eq!(merged.start.byte, 0);
/// assert_eq!(merged.end.byte, 9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Start position (inclusive).
    pub start: Position,
    /// End position (exclusive).
    pub end: Position,
}

impl Span {
    /// Create a span from two positions.
    #[inline]
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Zero-width span at a position.
    #[inline]
    pub const fn point(at: Position) -> Self {
        Self { start: at, end: at }
    }

    /// Length of the span in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.end.byte.saturating_sub(self.start.byte)
    }

    /// Returns true for zero-width spans.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True for spans that do not point into real source text.
    pub fn is_synthetic(&self) -> bool {
        *self == Self::default()
    }

    /// Smallest span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Slice the covered text out of `source`, if in bounds.
    pub fn text<'s>(&self, source: &'s str) -> Option<&'s str> {
        source.get(self.start.byte..self.end.byte)
    }
}

/// Anything that knows where it came from.
pub trait Spanned {
    /// Source range of this item.
    fn span(&self) -> Span;
}

impl Spanned for Span {
    fn span(&self) -> Span {
        *self
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_len_and_text() {
        let source = "cube(10);";
        let span = Span::new(Position::new(0, 1, 1), Position::new(4, 1, 5));
        assert_eq!(span.len(), 4);
        assert_eq!(span.text(source), Some("cube"));
    }

    #[test]
    fn test_default_span_is_synthetic() {
        assert!(Span::default().is_synthetic());
        let real = Span::new(Position::new(3, 1, 4), Position::new(5, 1, 6));
        assert!(!real.is_synthetic());
    }

    #[test]
    fn test_merge_is_order_independent() {
        let a = Span::new(Position::new(10, 2, 1), Position::new(12, 2, 3));
        let b = Span::new(Position::new(0, 1, 1), Position::new(3, 1, 4));
        assert_eq!(a.merge(b), b.merge(a));
        assert_eq!(a.merge(b).start.line, 1);
    }

    #[test]
    fn test_text_out_of_bounds() {
        let span = Span::new(Position::new(0, 1, 1), Position::new(100, 1, 101));
        assert_eq!(span.text("abc"), None);
    }
}
