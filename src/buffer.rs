//! `ScratchBuffer` — the bundled rope-backed [`TextBuffer`].
//!
//! Hosts embedding the engine implement [`TextBuffer`] over their own
//! storage; this implementation exists so the crate works out of the box
//! (and so the test suite has a document to edit). It wraps a
//! [`ropey::Rope`]: O(log n) edits anywhere, cheap line indexing, correct
//! char-vs-byte handling.
//!
//! Columns are char offsets. Column 3 of `"café"` is `'é'`, never a byte in
//! the middle of its encoding. Per the trait contract, all coordinate
//! conversions clamp instead of failing.

use ropey::Rope;

use crate::position::{Position, Range};
use crate::traits::TextBuffer;

/// An in-memory text document.
#[derive(Debug, Clone)]
pub struct ScratchBuffer {
    rope: Rope,
}

impl ScratchBuffer {
    /// An empty document (one empty line).
    #[must_use]
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    /// A document holding `text`.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// A document from one string per line (joined with `\n`, no trailing
    /// newline). Mirrors how tests state their fixtures.
    #[must_use]
    pub fn from_lines(lines: &[&str]) -> Self {
        Self::from_text(&lines.join("\n"))
    }

    /// The document as a vector of lines (without newlines). The inverse of
    /// [`from_lines`](Self::from_lines) for assertions.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        (0..self.line_count()).map(|i| self.line_text(i)).collect()
    }

    /// Clamped char offset for a position. A column past the line's content
    /// clamps to the content length (the terminator's offset), so an
    /// overlarge column never resolves onto the next line; a line past the
    /// end clamps to the document end.
    fn char_idx(&self, pos: Position) -> usize {
        if pos.line >= self.rope.len_lines() {
            return self.rope.len_chars();
        }
        let line_start = self.rope.line_to_char(pos.line);
        line_start + pos.col.min(self.line_len(pos.line))
    }
}

impl Default for ScratchBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextBuffer for ScratchBuffer {
    fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    fn line_text(&self, line: usize) -> String {
        if line >= self.rope.len_lines() {
            return String::new();
        }
        let slice = self.rope.line(line);
        let mut text = slice.to_string();
        // Strip the terminator; lines are reported bare.
        if text.ends_with('\n') {
            text.pop();
            if text.ends_with('\r') {
                text.pop();
            }
        } else if text.ends_with('\r') {
            text.pop();
        }
        text
    }

    fn text(&self, range: Range) -> String {
        let start = self.char_idx(range.start);
        let end = self.char_idx(range.end);
        if start >= end {
            return String::new();
        }
        self.rope.slice(start..end).to_string()
    }

    fn replace(&mut self, range: Range, text: &str) {
        let start = self.char_idx(range.start);
        let end = self.char_idx(range.end);
        if start < end {
            self.rope.remove(start..end);
        }
        if !text.is_empty() {
            self.rope.insert(start, text);
        }
    }

    fn offset_at(&self, pos: Position) -> usize {
        self.char_idx(pos)
    }

    fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.rope.len_chars());
        let line = self.rope.char_to_line(offset);
        let line_start = self.rope.line_to_char(line);
        Position::new(line, offset - line_start)
    }

    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    // Rope-native overrides of the provided defaults — same results, no
    // per-call String allocation.

    fn line_len(&self, line: usize) -> usize {
        if line >= self.rope.len_lines() {
            return 0;
        }
        let slice = self.rope.line(line);
        let total = slice.len_chars();
        if total == 0 {
            return 0;
        }
        match slice.char(total - 1) {
            '\n' => {
                if total >= 2 && slice.char(total - 2) == '\r' {
                    total - 2
                } else {
                    total - 1
                }
            }
            '\r' => total - 1,
            _ => total,
        }
    }

    fn char_at_offset(&self, offset: usize) -> Option<char> {
        if offset < self.rope.len_chars() {
            Some(self.rope.char(offset))
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
