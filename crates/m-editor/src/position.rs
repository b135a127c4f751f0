//! Cursor positions.
//!
//! All coordinates are **0-indexed**. `line` indexes the buffer's lines and
//! `col` is a char offset into that line, never a byte offset. Where the
//! cursor lands on screen after tab expansion is the job of [`columns`].
//!
//! [`columns`]: crate::columns

use std::fmt;

/// A logical position in a buffer: (line, column), both 0-indexed.
///
/// `col` may equal the line's char length, which is the end-of-line slot
/// only Insert mode can occupy.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    /// The origin: line 0, column 0.
    pub const ZERO: Self = Self { line: 0, col: 0 };

    #[inline]
    #[must_use]
    pub const fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

// Line first, then column.
impl Ord for Position {
    #[inline]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.line.cmp(&other.line).then(self.col.cmp(&other.col))
    }
}

impl PartialOrd for Position {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pos({}:{})", self.line, self.col)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 1-indexed for the status line.
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}
