//! Buffer coordinates — `Position` and half-open `Range`.
//!
//! All coordinates are **0-indexed**. Columns count Unicode scalar values
//! (chars), never bytes. The engine computes with these values and hands them
//! to the host through the [`TextBuffer`](crate::traits::TextBuffer) seam;
//! converting to 1-indexed display coordinates is the host's business.
//!
//! Motions that find nothing return `Option::None` rather than a sentinel
//! range, so an unresolvable target can never be mistaken for an edit at the
//! origin.

use std::fmt;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A caret position: (line, column), both 0-indexed.
///
/// `col` is a char offset into the line. Column `line_len` (one past the last
/// char) is a valid position in insert mode and as an exclusive range end.
///
/// Positions order lexicographically — line first, then column — so document
/// order and `Ord` agree everywhere.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    /// The origin — line 0, column 0.
    pub const ZERO: Self = Self { line: 0, col: 0 };

    /// Create a new position.
    #[inline]
    #[must_use]
    pub const fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }

    /// True when both line and col are zero.
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.line == 0 && self.col == 0
    }

    /// This position with a different column.
    #[inline]
    #[must_use]
    pub const fn with_col(self, col: usize) -> Self {
        Self {
            line: self.line,
            col,
        }
    }

    /// This position with a different line.
    #[inline]
    #[must_use]
    pub const fn with_line(self, line: usize) -> Self {
        Self {
            line,
            col: self.col,
        }
    }
}

impl Ord for Position {
    #[inline]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.line
            .cmp(&other.line)
            .then(self.col.cmp(&other.col))
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
        // 1-indexed, the way a status line reports `line:col`.
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}

// ---------------------------------------------------------------------------
// Range
// ---------------------------------------------------------------------------

/// A half-open span of buffer text: `[start, end)`.
///
/// `start` is inclusive, `end` exclusive; `start == end` is the empty range.
/// Ranges are always normalized (`start <= end`) — [`Range::new`] asserts it
/// in debug builds, [`Range::ordered`] swaps untrusted endpoints.
///
/// Operators receive ranges from motions and text objects already in this
/// exclusive form; inclusive motions (`e`, `f`, `$`) are widened by one char
/// during composition, before any operator sees them.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    /// A zero-width range at the origin.
    pub const ZERO: Self = Self {
        start: Position::ZERO,
        end: Position::ZERO,
    };

    /// Create a range. Panics in debug if `start > end`.
    #[inline]
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        debug_assert!(
            start.line < end.line || (start.line == end.line && start.col <= end.col),
            "Range::new requires start <= end"
        );
        Self { start, end }
    }

    /// Create a range from two arbitrary positions, swapping so `start <= end`.
    /// Selections built from anchor + head go through here, since the user may
    /// have extended backwards.
    #[inline]
    #[must_use]
    pub fn ordered(a: Position, b: Position) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// A zero-width range at the given position.
    #[inline]
    #[must_use]
    pub const fn point(pos: Position) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// True when the range spans zero characters.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.start.line == self.end.line && self.start.col == self.end.col
    }

    /// True when start and end sit on the same line.
    #[inline]
    #[must_use]
    pub const fn is_single_line(self) -> bool {
        self.start.line == self.end.line
    }

    /// True when the given position falls within `[start, end)`.
    #[inline]
    #[must_use]
    pub fn contains(self, pos: Position) -> bool {
        pos >= self.start && pos < self.end
    }

    /// True when `other` lies entirely within this range (endpoints may
    /// coincide). Expanding text objects use this to check that a repeated
    /// application strictly grew.
    #[inline]
    #[must_use]
    pub fn encloses(self, other: Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Number of lines this range touches. Empty and single-line ranges
    /// return 1.
    #[inline]
    #[must_use]
    pub const fn line_span(self) -> usize {
        self.end.line - self.start.line + 1
    }
}

impl fmt::Debug for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Range({}:{} .. {}:{})",
            self.start.line, self.start.col, self.end.line, self.end.col
        )
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
