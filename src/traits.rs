//! Host interfaces — the seams between the engine and its embedder.
//!
//! The engine owns interpretation, never storage or presentation. Three
//! traits cover everything it needs from outside:
//!
//! - [`TextBuffer`] — the document. Seven required methods; everything else
//!   is provided on top of them. [`ScratchBuffer`](crate::buffer::ScratchBuffer)
//!   is the bundled rope-backed implementation.
//! - [`SearchProvider`] — pattern matching. Returns every match in document
//!   order; the engine owns direction, wrap-around, and next/previous picks.
//!   [`RegexSearcher`](crate::search::RegexSearcher) is bundled.
//! - [`FeedbackSink`] — fire-and-forget notifications (transient highlights,
//!   "3 lines yanked", domain errors). Every method defaults to a no-op and
//!   correctness never depends on any of them being observed.
//!
//! The engine only requires buffer consistency *within one key event*: it
//! may interleave reads and queued writes freely while processing one key,
//! and re-reads anything it needs on the next.

use crate::error::VimError;
use crate::position::{Position, Range};

// ---------------------------------------------------------------------------
// TextBuffer
// ---------------------------------------------------------------------------

/// The document, as the engine sees it.
///
/// Coordinates are 0-indexed (line, char-column); offsets are absolute char
/// indices. Out-of-bounds positions clamp rather than fail — the engine
/// keeps its cursors in bounds, and a clamping seam means a momentarily
/// stale position can never panic the host.
///
/// A position with `col == line_len(line)` addresses the line's terminating
/// newline; `(line + 1, 0)` is the first char after it. Ranges spanning the
/// newline therefore delete or read it, which is how line-wise operations
/// are expressed.
pub trait TextBuffer {
    /// Total number of lines. Never 0 — an empty document has one empty line.
    fn line_count(&self) -> usize;

    /// The text of a line, without its trailing newline. Out-of-bounds lines
    /// return the empty string.
    fn line_text(&self, line: usize) -> String;

    /// The text covered by `range`, including any newlines inside it.
    fn text(&self, range: Range) -> String;

    /// Replace `range` with `text`. An empty range inserts; empty text
    /// deletes.
    fn replace(&mut self, range: Range, text: &str);

    /// Absolute char offset of a position (clamped to the document).
    fn offset_at(&self, pos: Position) -> usize;

    /// Position of an absolute char offset (clamped to the document).
    fn position_at(&self, offset: usize) -> Position;

    /// Total char count, newlines included.
    fn len_chars(&self) -> usize;

    // -- Provided ------------------------------------------------------------

    /// Chars in a line excluding its newline.
    fn line_len(&self, line: usize) -> usize {
        self.line_text(line).chars().count()
    }

    /// True when the document holds no text at all.
    fn is_empty(&self) -> bool {
        self.len_chars() == 0
    }

    /// Index of the last line.
    fn last_line(&self) -> usize {
        self.line_count().saturating_sub(1)
    }

    /// The char at an absolute offset, `None` past the end. Newlines are
    /// visible here — word scans depend on seeing them.
    fn char_at_offset(&self, offset: usize) -> Option<char> {
        if offset >= self.len_chars() {
            return None;
        }
        let range = Range::new(self.position_at(offset), self.position_at(offset + 1));
        self.text(range).chars().next()
    }

    /// The char at a position, `None` out of bounds.
    fn char_at(&self, pos: Position) -> Option<char> {
        if pos.line >= self.line_count() || pos.col > self.line_len(pos.line) {
            return None;
        }
        self.char_at_offset(self.offset_at(pos))
    }

    /// Greatest valid cursor column on a line. Normal-mode cursors rest ON
    /// a char; insert-mode (`past_end`) may sit one past the last.
    fn max_col(&self, line: usize, past_end: bool) -> usize {
        let len = self.line_len(line);
        if past_end {
            len
        } else {
            len.saturating_sub(1)
        }
    }

    /// Clamp a position to the nearest valid cursor position.
    fn clamp(&self, pos: Position, past_end: bool) -> Position {
        let line = pos.line.min(self.last_line());
        let col = pos.col.min(self.max_col(line, past_end));
        Position::new(line, col)
    }

    /// Column of the first non-blank char of a line (0 for blank lines).
    fn first_non_blank(&self, line: usize) -> usize {
        self.line_text(line)
            .chars()
            .position(|ch| !ch.is_whitespace())
            .unwrap_or(0)
    }

    /// The whole document as one string.
    fn contents(&self) -> String {
        let end = self.position_at(self.len_chars());
        self.text(Range::new(Position::ZERO, end))
    }
}

// ---------------------------------------------------------------------------
// SearchProvider
// ---------------------------------------------------------------------------

/// Pattern matching over the whole document.
///
/// Implementations return every match in document order, non-overlapping.
/// The engine interprets direction and wrap-around itself, so a provider
/// never needs cursor context. An unusable pattern (bad syntax) is reported
/// as a domain error of the provider's choosing.
pub trait SearchProvider {
    fn find_all(
        &self,
        buffer: &dyn TextBuffer,
        pattern: &str,
        ignore_case: bool,
    ) -> Result<Vec<Range>, VimError>;
}

// ---------------------------------------------------------------------------
// FeedbackSink
// ---------------------------------------------------------------------------

/// Fire-and-forget notifications from the engine to the host.
///
/// All methods default to doing nothing. The engine calls these for UX
/// niceties — it never reads anything back.
pub trait FeedbackSink {
    /// Briefly highlight these ranges (label-jump candidates, search hits).
    fn highlight(&mut self, ranges: &[Range]) {
        let _ = ranges;
    }

    /// A command touched this many lines ("5 lines yanked").
    fn lines_changed(&mut self, count: usize) {
        let _ = count;
    }

    /// A transient status message.
    fn message(&mut self, text: &str) {
        let _ = text;
    }

    /// A domain error to surface to the user.
    fn error(&mut self, err: &VimError) {
        let _ = err;
    }
}

/// A sink that discards everything — the default for a bare engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullFeedback;

impl FeedbackSink for NullFeedback {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
