//! Source location tracking for diagnostics.
//!
//! Every expression node carries a [`Span`] recording where it appeared in the
//! source file. The engine never re-parses text; spans are opaque positions
//! attached by the parser and threaded through diagnostics.

use std::fmt;

/// A span of source code, identified by its starting position.
///
/// Tracks the 1-indexed line and column where a construct starts plus its
/// byte length, enough for a diagnostic renderer to point at the offending
/// source.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, byte-based).
    pub col: u32,
    /// Length in bytes.
    pub len: u32,
}

impl Span {
    /// Create a span from a line, column, and length.
    #[inline]
    pub const fn new(line: u32, col: u32, len: u32) -> Self {
        Self { line, col, len }
    }

    /// Create a zero-length span at a position.
    #[inline]
    pub const fn point(line: u32, col: u32) -> Self {
        Self { line, col, len: 0 }
    }

    /// Whether this span covers no source text.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Extend this span to also cover `other`.
    ///
    /// Spans on different lines are approximated by the first span's position;
    /// the engine only needs a stable anchor for diagnostics, not exact
    /// multi-line extents.
    #[inline]
    pub fn to(self, other: Span) -> Span {
        if self.line == other.line {
            let start = self.col.min(other.col);
            let end = (self.col + self.len).max(other.col + other.len);
            Span {
                line: self.line,
                col: start,
                len: end - start,
            }
        } else {
            self
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
