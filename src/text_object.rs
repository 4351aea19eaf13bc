//! Text objects — structural regions for the operator grammar.
//!
//! A text object names a region by structure instead of by movement:
//!
//! ```text
//! d + iw   delete inner word
//! c + i"   change inside quotes
//! y + a(   yank around parentheses
//! ```
//!
//! Every resolver takes the buffer and a cursor position and returns
//! `Option<Range>` with the half-open `[start, end)` region, `None` when the
//! object does not exist there (no enclosing pair, empty buffer).
//!
//! | Inner | Around | Region |
//! |-------|--------|--------|
//! | `iw` / `iW` | `aw` / `aW` | word / WORD, around adds whitespace |
//! | `i"` `i'` `` i` `` | `a"` `a'` `` a` `` | quoted span on the current line |
//! | `i(` `i[` `i{` `i<` | `a(` `a[` `a{` `a<` | bracket pair, nesting-aware |
//! | `ip` | `ap` | paragraph (whole lines) |
//!
//! Quote pairing is line-local and left-to-right (1st+2nd quote form a pair,
//! 3rd+4th the next). Bracket pairing is nesting-aware and crosses lines.
//! Paragraph objects return line-spanning ranges; the caller treats them as
//! line-wise.

use crate::position::{Position, Range};
use crate::traits::TextBuffer;
use crate::word::{classify, classify_big, CharClass};

// ---------------------------------------------------------------------------
// Word objects
// ---------------------------------------------------------------------------

/// `iw` — the run of same-class chars under the cursor. On whitespace,
/// the whitespace run. On a newline, just the newline.
#[must_use]
pub fn inner_word(buf: &dyn TextBuffer, pos: Position) -> Option<Range> {
    inner_word_impl(buf, pos, classify)
}

/// `aw` — the word plus trailing whitespace, or leading whitespace when no
/// trailing exists. On whitespace, the run plus the following word.
#[must_use]
pub fn a_word(buf: &dyn TextBuffer, pos: Position) -> Option<Range> {
    a_word_impl(buf, pos, classify)
}

/// `iW` — like `iw` with WORD boundaries (only whitespace separates).
#[must_use]
pub fn inner_big_word(buf: &dyn TextBuffer, pos: Position) -> Option<Range> {
    inner_word_impl(buf, pos, classify_big)
}

/// `aW` — like `aw` with WORD boundaries.
#[must_use]
pub fn a_big_word(buf: &dyn TextBuffer, pos: Position) -> Option<Range> {
    a_word_impl(buf, pos, classify_big)
}

fn inner_word_impl(
    buf: &dyn TextBuffer,
    pos: Position,
    classify_fn: fn(char) -> CharClass,
) -> Option<Range> {
    let total = buf.len_chars();
    let idx = buf.offset_at(pos);
    if total == 0 || idx >= total {
        return None;
    }

    let ch = buf.char_at_offset(idx)?;
    let class = classify_fn(ch);

    let (start, end) = match class {
        CharClass::Word | CharClass::Punct | CharClass::Blank => {
            let mut s = idx;
            while s > 0 && class_at(buf, s - 1, classify_fn) == class {
                s -= 1;
            }
            let mut e = idx + 1;
            while e < total && class_at(buf, e, classify_fn) == class {
                e += 1;
            }
            (s, e)
        }
        CharClass::Newline => {
            let mut e = idx + 1;
            // \r\n is one newline.
            if ch == '\r' && e < total && buf.char_at_offset(e) == Some('\n') {
                e += 1;
            }
            (idx, e)
        }
    };

    Some(Range::new(buf.position_at(start), buf.position_at(end)))
}

fn a_word_impl(
    buf: &dyn TextBuffer,
    pos: Position,
    classify_fn: fn(char) -> CharClass,
) -> Option<Range> {
    let total = buf.len_chars();
    let inner = inner_word_impl(buf, pos, classify_fn)?;
    let start_idx = buf.offset_at(inner.start);
    let end_idx = buf.offset_at(inner.end);

    let idx = buf.offset_at(pos);
    let class = class_at(buf, idx, classify_fn);

    match class {
        CharClass::Word | CharClass::Punct => {
            // Trailing whitespace first.
            let mut new_end = end_idx;
            while new_end < total && class_at(buf, new_end, classify_fn) == CharClass::Blank {
                new_end += 1;
            }
            if new_end > end_idx {
                return Some(Range::new(inner.start, buf.position_at(new_end)));
            }

            // None trailing — take leading instead.
            let mut new_start = start_idx;
            while new_start > 0 && class_at(buf, new_start - 1, classify_fn) == CharClass::Blank {
                new_start -= 1;
            }
            if new_start < start_idx {
                return Some(Range::new(buf.position_at(new_start), inner.end));
            }

            Some(inner)
        }
        CharClass::Blank => {
            // On whitespace: whitespace run plus the following word.
            let mut new_end = end_idx;
            if new_end < total {
                let next_class = class_at(buf, new_end, classify_fn);
                if matches!(next_class, CharClass::Word | CharClass::Punct) {
                    while new_end < total && class_at(buf, new_end, classify_fn) == next_class {
                        new_end += 1;
                    }
                }
            }
            Some(Range::new(inner.start, buf.position_at(new_end)))
        }
        CharClass::Newline => Some(inner),
    }
}

fn class_at(buf: &dyn TextBuffer, idx: usize, classify_fn: fn(char) -> CharClass) -> CharClass {
    buf.char_at_offset(idx).map_or(CharClass::Newline, classify_fn)
}

// ---------------------------------------------------------------------------
// Quote objects
// ---------------------------------------------------------------------------

/// `i"` / `i'` / `` i` `` — text between a quote pair on the current line,
/// excluding the quotes. Empty quotes yield a point range.
#[must_use]
pub fn inner_quote(buf: &dyn TextBuffer, pos: Position, quote: char) -> Option<Range> {
    let (open_col, close_col) = find_quote_pair(buf, pos, quote)?;
    let start = Position::new(pos.line, open_col + 1);
    let end = Position::new(pos.line, close_col);
    if start > end {
        return Some(Range::point(start));
    }
    Some(Range::new(start, end))
}

/// `a"` / `a'` / `` a` `` — the quote pair including both quotes.
#[must_use]
pub fn a_quote(buf: &dyn TextBuffer, pos: Position, quote: char) -> Option<Range> {
    let (open_col, close_col) = find_quote_pair(buf, pos, quote)?;
    Some(Range::new(
        Position::new(pos.line, open_col),
        Position::new(pos.line, close_col + 1),
    ))
}

/// Pair quotes on the cursor's line left-to-right and return the pair
/// containing the cursor, or the next pair forward when the cursor sits
/// before every pair.
fn find_quote_pair(buf: &dyn TextBuffer, pos: Position, quote: char) -> Option<(usize, usize)> {
    if pos.line >= buf.line_count() {
        return None;
    }
    let line = buf.line_text(pos.line);

    let quotes: Vec<usize> = line
        .chars()
        .enumerate()
        .filter_map(|(i, ch)| (ch == quote).then_some(i))
        .collect();
    if quotes.len() < 2 {
        return None;
    }

    let col = pos.col;
    for pair in quotes.chunks(2) {
        if let [open, close] = *pair {
            if col >= open && col <= close {
                return Some((open, close));
            }
        }
    }
    // Outside every pair — next pair forward.
    for pair in quotes.chunks(2) {
        if let [open, close] = *pair {
            if open > col {
                return Some((open, close));
            }
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Bracket objects
// ---------------------------------------------------------------------------

/// `i(` / `i[` / `i{` / `i<` — text between the innermost enclosing pair,
/// excluding the brackets. Nesting-aware, crosses lines.
#[must_use]
pub fn inner_bracket(
    buf: &dyn TextBuffer,
    pos: Position,
    open: char,
    close: char,
) -> Option<Range> {
    let (open_idx, close_idx) = find_bracket_pair(buf, pos, open, close)?;
    let start = open_idx + 1;
    if start >= close_idx {
        return Some(Range::point(buf.position_at(start)));
    }
    Some(Range::new(buf.position_at(start), buf.position_at(close_idx)))
}

/// `a(` / `a[` / `a{` / `a<` — the pair including both brackets.
#[must_use]
pub fn a_bracket(buf: &dyn TextBuffer, pos: Position, open: char, close: char) -> Option<Range> {
    let (open_idx, close_idx) = find_bracket_pair(buf, pos, open, close)?;
    Some(Range::new(
        buf.position_at(open_idx),
        buf.position_at(close_idx + 1),
    ))
}

/// Char offsets of the enclosing `(open_idx, close_idx)` pair, or `None`.
fn find_bracket_pair(
    buf: &dyn TextBuffer,
    pos: Position,
    open: char,
    close: char,
) -> Option<(usize, usize)> {
    let total = buf.len_chars();
    let cursor_idx = buf.offset_at(pos);
    if total == 0 || cursor_idx >= total {
        return None;
    }

    let cursor_char = buf.char_at_offset(cursor_idx)?;

    // On the open bracket: forward to its close.
    if cursor_char == open {
        let close_idx = find_closing(buf, cursor_idx, total, open, close)?;
        return Some((cursor_idx, close_idx));
    }
    // On the close bracket: backward to its open.
    if cursor_char == close {
        let open_idx = find_opening(buf, cursor_idx, open, close)?;
        return Some((open_idx, cursor_idx));
    }

    // Between: unmatched open behind us, then its close ahead.
    let open_idx = find_opening(buf, cursor_idx, open, close)?;
    let close_idx = find_closing(buf, open_idx, total, open, close)?;
    if cursor_idx > open_idx && cursor_idx < close_idx {
        Some((open_idx, close_idx))
    } else {
        None
    }
}

/// Backward from `start` (exclusive) to the nearest unmatched open bracket.
fn find_opening(buf: &dyn TextBuffer, start: usize, open: char, close: char) -> Option<usize> {
    let mut depth: usize = 0;
    let mut i = start;
    loop {
        if i == 0 {
            if depth == 0 && buf.char_at_offset(0) == Some(open) {
                return Some(0);
            }
            return None;
        }
        i -= 1;

        let ch = buf.char_at_offset(i)?;
        if ch == close {
            depth += 1;
        } else if ch == open {
            if depth == 0 {
                return Some(i);
            }
            depth -= 1;
        }
    }
}

/// Forward from `start` (exclusive) to the matching close bracket.
fn find_closing(
    buf: &dyn TextBuffer,
    start: usize,
    total: usize,
    open: char,
    close: char,
) -> Option<usize> {
    let mut depth: usize = 0;
    for i in (start + 1)..total {
        let ch = buf.char_at_offset(i)?;
        if ch == open {
            depth += 1;
        } else if ch == close {
            if depth == 0 {
                return Some(i);
            }
            depth -= 1;
        }
    }
    None
}

/// `%` — the partner of the bracket under (or after) the cursor.
///
/// Scans rightward on the cursor's line for the first `()[]{}` char, then
/// jumps to its nesting-aware partner anywhere in the buffer. `None` when the
/// line has no bracket from the cursor on, or the partner is missing.
#[must_use]
pub fn matching_bracket(buf: &dyn TextBuffer, pos: Position) -> Option<Position> {
    const PAIRS: [(char, char); 3] = [('(', ')'), ('[', ']'), ('{', '}')];

    let total = buf.len_chars();
    for col in pos.col..buf.line_len(pos.line) {
        let idx = buf.offset_at(Position::new(pos.line, col));
        let ch = buf.char_at_offset(idx)?;
        for (open, close) in PAIRS {
            if ch == open {
                return find_closing(buf, idx, total, open, close).map(|i| buf.position_at(i));
            }
            if ch == close {
                return find_opening(buf, idx, open, close).map(|i| buf.position_at(i));
            }
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Paragraph objects
// ---------------------------------------------------------------------------

/// `ip` — the contiguous block of non-blank lines around the cursor, or the
/// blank-line run when the cursor sits on one. Whole lines; callers treat
/// the result as line-wise.
#[must_use]
pub fn inner_paragraph(buf: &dyn TextBuffer, pos: Position) -> Option<Range> {
    let line_count = buf.line_count();
    if line_count == 0 || pos.line >= line_count {
        return None;
    }

    let on_blank = is_blank(buf, pos.line);
    let mut first = pos.line;
    while first > 0 && is_blank(buf, first - 1) == on_blank {
        first -= 1;
    }
    let mut last = pos.line;
    while last + 1 < line_count && is_blank(buf, last + 1) == on_blank {
        last += 1;
    }

    Some(line_block(buf, first, last))
}

/// `ap` — the paragraph plus the blank lines after it (or before it when
/// none follow). On a blank run, the run plus the following paragraph.
#[must_use]
pub fn a_paragraph(buf: &dyn TextBuffer, pos: Position) -> Option<Range> {
    let line_count = buf.line_count();
    if line_count == 0 || pos.line >= line_count {
        return None;
    }

    let on_blank = is_blank(buf, pos.line);
    let mut first = pos.line;
    while first > 0 && is_blank(buf, first - 1) == on_blank {
        first -= 1;
    }
    let mut last = pos.line;
    while last + 1 < line_count && is_blank(buf, last + 1) == on_blank {
        last += 1;
    }

    if on_blank {
        // Blank run plus the paragraph that follows it.
        while last + 1 < line_count && !is_blank(buf, last + 1) {
            last += 1;
        }
    } else {
        // Paragraph plus trailing blanks, else leading blanks.
        let end_before = last;
        while last + 1 < line_count && is_blank(buf, last + 1) {
            last += 1;
        }
        if last == end_before {
            while first > 0 && is_blank(buf, first - 1) {
                first -= 1;
            }
        }
    }

    Some(line_block(buf, first, last))
}

fn is_blank(buf: &dyn TextBuffer, line: usize) -> bool {
    buf.line_len(line) == 0
}

/// Whole-line range covering `first..=last`, spanning the trailing newline
/// when one exists.
fn line_block(buf: &dyn TextBuffer, first: usize, last: usize) -> Range {
    let start = Position::new(first, 0);
    let end = if last + 1 < buf.line_count() {
        Position::new(last + 1, 0)
    } else {
        Position::new(last, buf.line_len(last))
    };
    Range::new(start, end)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
