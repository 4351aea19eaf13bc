//! Word and WORD scanning — the six fundamental word motions.
//!
//! | Motion | Key | Description |
//! |--------|-----|-------------|
//! | [`word_forward`] | `w` | start of next word |
//! | [`word_backward`] | `b` | start of previous word |
//! | [`word_end_forward`] | `e` | end of current/next word |
//! | [`big_word_forward`] | `W` | start of next WORD |
//! | [`big_word_backward`] | `B` | start of previous WORD |
//! | [`big_word_end_forward`] | `E` | end of current/next WORD |
//!
//! A **word** is a run of word chars (letters, digits, underscore) or a run
//! of other non-blank chars; `hello.world` is three words. A **WORD** is any
//! run of non-blank chars; `hello.world` is one WORD. An empty line counts
//! as a word for `w`/`b` (they stop there); `e` skips empty lines.
//!
//! Everything here scans char offsets through the buffer seam and never
//! mutates. Motions that cannot move return their input position — the
//! identity behavior the bounds property requires.

use crate::position::Position;
use crate::traits::TextBuffer;

// ---------------------------------------------------------------------------
// Character classification
// ---------------------------------------------------------------------------

/// Character class for word boundary detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CharClass {
    /// Letters, digits, underscore.
    Word,
    /// Non-blank, non-word characters.
    Punct,
    /// In-line whitespace.
    Blank,
    /// `\n` or `\r`.
    Newline,
}

/// Classify for small-word motions (`w`/`b`/`e`).
pub(crate) fn classify(ch: char) -> CharClass {
    if ch == '\n' || ch == '\r' {
        CharClass::Newline
    } else if ch.is_whitespace() {
        CharClass::Blank
    } else if ch.is_alphanumeric() || ch == '_' {
        CharClass::Word
    } else {
        CharClass::Punct
    }
}

/// Classify for WORD motions (`W`/`B`/`E`): blank vs non-blank only.
pub(crate) fn classify_big(ch: char) -> CharClass {
    if ch == '\n' || ch == '\r' {
        CharClass::Newline
    } else if ch.is_whitespace() {
        CharClass::Blank
    } else {
        CharClass::Word
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// `w` — forward to the start of the next word.
#[must_use]
pub fn word_forward(buf: &dyn TextBuffer, pos: Position) -> Position {
    forward_start(buf, pos, classify)
}

/// `b` — backward to the start of the previous word.
#[must_use]
pub fn word_backward(buf: &dyn TextBuffer, pos: Position) -> Position {
    backward_start(buf, pos, classify)
}

/// `e` — forward to the end of the current or next word.
#[must_use]
pub fn word_end_forward(buf: &dyn TextBuffer, pos: Position) -> Position {
    forward_end(buf, pos, classify)
}

/// `W` — forward to the start of the next WORD.
#[must_use]
pub fn big_word_forward(buf: &dyn TextBuffer, pos: Position) -> Position {
    forward_start(buf, pos, classify_big)
}

/// `B` — backward to the start of the previous WORD.
#[must_use]
pub fn big_word_backward(buf: &dyn TextBuffer, pos: Position) -> Position {
    backward_start(buf, pos, classify_big)
}

/// `E` — forward to the end of the current or next WORD.
#[must_use]
pub fn big_word_end_forward(buf: &dyn TextBuffer, pos: Position) -> Position {
    forward_end(buf, pos, classify_big)
}

// ---------------------------------------------------------------------------
// Core scans
// ---------------------------------------------------------------------------

fn class_at(buf: &dyn TextBuffer, idx: usize, classify_fn: fn(char) -> CharClass) -> CharClass {
    buf.char_at_offset(idx).map_or(CharClass::Newline, classify_fn)
}

/// Forward to the start of the next word/WORD.
///
/// 1. Skip the current token (same-class chars).
/// 2. Skip whitespace and newlines, stopping at empty lines.
/// 3. Land on the first char of the next token.
fn forward_start(
    buf: &dyn TextBuffer,
    pos: Position,
    classify_fn: fn(char) -> CharClass,
) -> Position {
    let total = buf.len_chars();
    let start_idx = buf.offset_at(pos);
    if total == 0 || start_idx >= total.saturating_sub(1) {
        return pos;
    }

    let mut idx = start_idx;
    let start_class = class_at(buf, idx, classify_fn);

    // Phase 1: leave the token under the cursor.
    if matches!(start_class, CharClass::Word | CharClass::Punct) {
        while idx < total && class_at(buf, idx, classify_fn) == start_class {
            idx += 1;
        }
    }

    // Phase 2: cross the gap, stopping at empty lines.
    while idx < total {
        match class_at(buf, idx, classify_fn) {
            CharClass::Word | CharClass::Punct => break,
            CharClass::Blank => idx += 1,
            CharClass::Newline => {
                let ch = buf.char_at_offset(idx);
                idx += 1;
                // \r\n is one newline.
                if ch == Some('\r') && buf.char_at_offset(idx) == Some('\n') {
                    idx += 1;
                }
                // Two newlines in a row mean an empty line — a word boundary.
                if idx < total && class_at(buf, idx, classify_fn) == CharClass::Newline {
                    break;
                }
            }
        }
    }

    if idx >= total {
        return pos; // no next word
    }
    buf.position_at(idx)
}

/// Backward to the start of the previous word/WORD.
///
/// 1. Step back one char.
/// 2. Skip whitespace/newlines backward, stopping at empty lines.
/// 3. Walk back through the word to its start.
fn backward_start(
    buf: &dyn TextBuffer,
    pos: Position,
    classify_fn: fn(char) -> CharClass,
) -> Position {
    let total = buf.len_chars();
    let start_idx = buf.offset_at(pos);
    if start_idx == 0 || total == 0 {
        return pos;
    }

    let mut idx = start_idx - 1;

    // Phase 1: cross the gap backwards.
    loop {
        match class_at(buf, idx, classify_fn) {
            CharClass::Word | CharClass::Punct => break,
            CharClass::Newline => {
                // An empty line is itself a stop.
                let line = buf.position_at(idx).line;
                if buf.line_len(line) == 0 {
                    return Position::new(line, 0);
                }
                if idx == 0 {
                    return Position::ZERO;
                }
                idx -= 1;
            }
            CharClass::Blank => {
                if idx == 0 {
                    return Position::ZERO;
                }
                idx -= 1;
            }
        }
    }

    // Phase 2: walk to the start of this word.
    let word_class = class_at(buf, idx, classify_fn);
    while idx > 0 && class_at(buf, idx - 1, classify_fn) == word_class {
        idx -= 1;
    }

    buf.position_at(idx)
}

/// Forward to the end of the current or next word/WORD.
///
/// 1. Advance one char (off a current word-end).
/// 2. Skip whitespace/newlines (no empty-line stop for `e`).
/// 3. Advance to the last char of the word.
fn forward_end(
    buf: &dyn TextBuffer,
    pos: Position,
    classify_fn: fn(char) -> CharClass,
) -> Position {
    let total = buf.len_chars();
    let start_idx = buf.offset_at(pos);
    let last = total.saturating_sub(1);
    if total == 0 || start_idx >= last {
        return pos;
    }

    let mut idx = start_idx + 1;

    // Phase 1: find the next word char.
    while idx < total {
        if matches!(
            class_at(buf, idx, classify_fn),
            CharClass::Word | CharClass::Punct
        ) {
            break;
        }
        idx += 1;
    }

    if idx >= total {
        return pos; // nothing but whitespace ahead
    }

    // Phase 2: run to the last char of this word.
    let word_class = class_at(buf, idx, classify_fn);
    while idx < last && class_at(buf, idx + 1, classify_fn) == word_class {
        idx += 1;
    }

    buf.position_at(idx)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ScratchBuffer;

    fn p(line: usize, col: usize) -> Position {
        Position::new(line, col)
    }

    // -- Classification -----------------------------------------------------

    #[test]
    fn classify_buckets() {
        assert_eq!(classify('a'), CharClass::Word);
        assert_eq!(classify('9'), CharClass::Word);
        assert_eq!(classify('_'), CharClass::Word);
        assert_eq!(classify('é'), CharClass::Word);
        assert_eq!(classify('.'), CharClass::Punct);
        assert_eq!(classify('('), CharClass::Punct);
        assert_eq!(classify(' '), CharClass::Blank);
        assert_eq!(classify('\t'), CharClass::Blank);
        assert_eq!(classify('\n'), CharClass::Newline);
    }

    #[test]
    fn classify_big_merges_punct() {
        assert_eq!(classify_big('.'), CharClass::Word);
        assert_eq!(classify_big('a'), CharClass::Word);
        assert_eq!(classify_big(' '), CharClass::Blank);
    }

    // -- w ---------------------------------------------------------------------

    #[test]
    fn w_to_next_word() {
        let buf = ScratchBuffer::from_text("one two three");
        assert_eq!(word_forward(&buf, p(0, 0)), p(0, 4));
        assert_eq!(word_forward(&buf, p(0, 4)), p(0, 8));
        // From mid-word.
        assert_eq!(word_forward(&buf, p(0, 1)), p(0, 4));
    }

    #[test]
    fn w_punctuation_is_its_own_word() {
        let buf = ScratchBuffer::from_text("hello.world");
        assert_eq!(word_forward(&buf, p(0, 0)), p(0, 5));
        assert_eq!(word_forward(&buf, p(0, 5)), p(0, 6));
    }

    #[test]
    fn w_crosses_lines() {
        let buf = ScratchBuffer::from_text("hello\nworld");
        assert_eq!(word_forward(&buf, p(0, 0)), p(1, 0));
    }

    #[test]
    fn w_stops_on_empty_line() {
        let buf = ScratchBuffer::from_text("hello\n\nworld");
        assert_eq!(word_forward(&buf, p(0, 0)), p(1, 0));
        assert_eq!(word_forward(&buf, p(1, 0)), p(2, 0));
    }

    #[test]
    fn w_skips_whitespace_only_line() {
        let buf = ScratchBuffer::from_text("hello\n   \nworld");
        assert_eq!(word_forward(&buf, p(0, 0)), p(2, 0));
    }

    #[test]
    fn w_identity_at_last_word() {
        let buf = ScratchBuffer::from_text("hello world");
        assert_eq!(word_forward(&buf, p(0, 6)), p(0, 6));
        assert_eq!(word_forward(&buf, p(0, 10)), p(0, 10));
    }

    #[test]
    fn w_empty_buffer() {
        let buf = ScratchBuffer::new();
        assert_eq!(word_forward(&buf, p(0, 0)), p(0, 0));
    }

    #[test]
    fn w_operator_groups() {
        let buf = ScratchBuffer::from_text("x:=y");
        assert_eq!(word_forward(&buf, p(0, 0)), p(0, 1)); // x → :=
        assert_eq!(word_forward(&buf, p(0, 1)), p(0, 3)); // := → y
    }

    // -- b ---------------------------------------------------------------------

    #[test]
    fn b_to_previous_word() {
        let buf = ScratchBuffer::from_text("one two three");
        assert_eq!(word_backward(&buf, p(0, 8)), p(0, 4));
        assert_eq!(word_backward(&buf, p(0, 4)), p(0, 0));
        // From mid-word: to this word's start.
        assert_eq!(word_backward(&buf, p(0, 6)), p(0, 4));
    }

    #[test]
    fn b_crosses_lines_and_stops_on_empty() {
        let buf = ScratchBuffer::from_text("hello\n\nworld");
        assert_eq!(word_backward(&buf, p(2, 0)), p(1, 0));
        assert_eq!(word_backward(&buf, p(1, 0)), p(0, 0));
    }

    #[test]
    fn b_identity_at_origin() {
        let buf = ScratchBuffer::from_text("hello");
        assert_eq!(word_backward(&buf, p(0, 0)), p(0, 0));
    }

    #[test]
    fn b_punctuation_boundary() {
        let buf = ScratchBuffer::from_text("hello.world");
        assert_eq!(word_backward(&buf, p(0, 6)), p(0, 5));
        assert_eq!(word_backward(&buf, p(0, 5)), p(0, 0));
    }

    // -- e ---------------------------------------------------------------------

    #[test]
    fn e_to_word_end() {
        let buf = ScratchBuffer::from_text("one two");
        assert_eq!(word_end_forward(&buf, p(0, 0)), p(0, 2));
        // Already at an end: the next word's end.
        assert_eq!(word_end_forward(&buf, p(0, 2)), p(0, 6));
    }

    #[test]
    fn e_skips_empty_lines() {
        let buf = ScratchBuffer::from_text("one\n\ntwo");
        assert_eq!(word_end_forward(&buf, p(0, 2)), p(2, 2));
    }

    #[test]
    fn e_identity_at_buffer_end() {
        let buf = ScratchBuffer::from_text("one");
        assert_eq!(word_end_forward(&buf, p(0, 2)), p(0, 2));
    }

    #[test]
    fn e_single_char_words() {
        let buf = ScratchBuffer::from_text("a b c");
        assert_eq!(word_end_forward(&buf, p(0, 0)), p(0, 2));
        assert_eq!(word_end_forward(&buf, p(0, 2)), p(0, 4));
    }

    // -- WORD variants ------------------------------------------------------------

    #[test]
    fn big_w_ignores_punctuation() {
        let buf = ScratchBuffer::from_text("hello.world next");
        assert_eq!(big_word_forward(&buf, p(0, 0)), p(0, 12));
        assert_eq!(big_word_backward(&buf, p(0, 12)), p(0, 0));
        assert_eq!(big_word_end_forward(&buf, p(0, 0)), p(0, 10));
    }

    #[test]
    fn big_w_stops_on_empty_line() {
        let buf = ScratchBuffer::from_text("a.b\n\nc.d");
        assert_eq!(big_word_forward(&buf, p(0, 0)), p(1, 0));
    }

    // -- Round trips -----------------------------------------------------------------

    #[test]
    fn w_then_b_returns_home() {
        let buf = ScratchBuffer::from_text("alpha beta gamma");
        let start = p(0, 0);
        let there = word_forward(&buf, start);
        assert_eq!(word_backward(&buf, there), start);
    }

    #[test]
    fn unicode_word_boundaries() {
        let buf = ScratchBuffer::from_text("café naïve");
        assert_eq!(word_forward(&buf, p(0, 0)), p(0, 5));
        assert_eq!(word_end_forward(&buf, p(0, 0)), p(0, 3));
        assert_eq!(word_backward(&buf, p(0, 5)), p(0, 0));
    }
}
