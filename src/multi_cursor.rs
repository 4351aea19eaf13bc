//! Deferred edits for multi-cursor commands.
//!
//! When a command runs once per cursor, each run computes its edit against
//! the buffer as it stood *before* any of them — then all edits apply in one
//! pass, in ascending document order, with every later edit and every landed
//! cursor shifted by the deltas of the edits applied before it. That keeps
//! per-cursor logic oblivious to its siblings: a cursor's delete never has to
//! know that another cursor three lines up just removed a word.
//!
//! Edits from distinct cursors are disjoint (the cursor set deduplicates
//! before commands run), so ascending application is well-defined.

use crate::position::{Position, Range};
use crate::traits::TextBuffer;

/// Where the producing cursor lands after its edit applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorTarget {
    /// The start of the replaced range (deletes, case changes).
    Start,
    /// One past the inserted text (insert-mode typing).
    InsertEnd,
    /// The last character of the inserted text (character-wise paste).
    InsertLast,
    /// An explicit position, given in the same pre-edit coordinates as the
    /// range; it rides the shifts of preceding edits but is *not* adjusted
    /// by this transform's own edit.
    At(Position),
}

/// One pending edit, tagged with the cursor that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transform {
    /// Index of the producing cursor in the cursor set.
    pub cursor: usize,
    /// What to replace, in pre-edit coordinates.
    pub range: Range,
    /// Replacement text (empty = delete).
    pub text: String,
    /// Where the producing cursor lands.
    pub target: CursorTarget,
}

/// Edits queued during a per-cursor pass, applied together afterwards.
#[derive(Debug, Default)]
pub struct TransformQueue {
    items: Vec<Transform>,
}

impl TransformQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, t: Transform) {
        self.items.push(t);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Apply every queued edit in ascending document order and return, per
    /// producing cursor index, the position that cursor should move to.
    ///
    /// After each edit applies, the ranges and explicit targets of all
    /// not-yet-applied edits and the positions of all already-landed cursors
    /// are shifted by that edit's delta.
    pub fn apply(mut self, buf: &mut dyn TextBuffer) -> Vec<(usize, Position)> {
        self.items
            .sort_by(|a, b| a.range.start.cmp(&b.range.start).then(a.cursor.cmp(&b.cursor)));

        let mut landed: Vec<(usize, Position)> = Vec::with_capacity(self.items.len());
        for i in 0..self.items.len() {
            let range = self.items[i].range;
            let text = std::mem::take(&mut self.items[i].text);
            buf.replace(range, &text);
            let ins_end = insert_end(range.start, &text);

            let pos = match self.items[i].target {
                CursorTarget::Start => range.start,
                CursorTarget::InsertEnd => ins_end,
                CursorTarget::InsertLast => {
                    if ins_end == range.start {
                        range.start
                    } else if ins_end.col > 0 {
                        ins_end.with_col(ins_end.col - 1)
                    } else {
                        // Insert ended right after a newline; land on the
                        // last char of the previous (inserted) line.
                        let line = ins_end.line - 1;
                        Position::new(line, buf.max_col(line, true))
                    }
                }
                CursorTarget::At(p) => p,
            };

            for (_, p) in &mut landed {
                *p = shift(*p, range, ins_end);
            }
            landed.push((self.items[i].cursor, pos));

            for later in &mut self.items[i + 1..] {
                later.range = Range::new(
                    shift(later.range.start, range, ins_end),
                    shift(later.range.end, range, ins_end),
                );
                if let CursorTarget::At(p) = &mut later.target {
                    *p = shift(*p, range, ins_end);
                }
            }
        }
        landed
    }
}

/// Position just past `text` inserted at `start`.
fn insert_end(start: Position, text: &str) -> Position {
    let newlines = text.matches('\n').count();
    if newlines == 0 {
        start.with_col(start.col + text.chars().count())
    } else {
        let tail = text.rsplit('\n').next().unwrap_or("").chars().count();
        Position::new(start.line + newlines, tail)
    }
}

/// Map a position through one replacement: `removed` was replaced by text
/// ending at `ins_end`. Positions before the removed span are untouched;
/// positions inside it collapse to the insert end; positions after it shift
/// by the edit's line/column delta.
fn shift(pos: Position, removed: Range, ins_end: Position) -> Position {
    if pos <= removed.start {
        return pos;
    }
    if pos < removed.end {
        return ins_end;
    }
    if pos.line == removed.end.line {
        Position::new(ins_end.line, ins_end.col + (pos.col - removed.end.col))
    } else {
        Position::new(pos.line - removed.end.line + ins_end.line, pos.col)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ScratchBuffer;

    fn t(cursor: usize, range: Range, text: &str, target: CursorTarget) -> Transform {
        Transform {
            cursor,
            range,
            text: text.to_string(),
            target,
        }
    }

    // -- insert_end / shift ---------------------------------------------------

    #[test]
    fn insert_end_single_line() {
        assert_eq!(insert_end(Position::new(2, 3), "abc"), Position::new(2, 6));
        assert_eq!(insert_end(Position::new(2, 3), ""), Position::new(2, 3));
    }

    #[test]
    fn insert_end_multi_line() {
        assert_eq!(insert_end(Position::new(2, 3), "a\nbc"), Position::new(3, 2));
        assert_eq!(insert_end(Position::new(0, 5), "\n"), Position::new(1, 0));
    }

    #[test]
    fn shift_before_edit_is_identity() {
        let removed = Range::new(Position::new(1, 2), Position::new(1, 5));
        let ins_end = Position::new(1, 2);
        assert_eq!(shift(Position::new(0, 9), removed, ins_end), Position::new(0, 9));
        assert_eq!(shift(Position::new(1, 2), removed, ins_end), Position::new(1, 2));
    }

    #[test]
    fn shift_inside_edit_collapses() {
        let removed = Range::new(Position::new(1, 2), Position::new(1, 5));
        assert_eq!(
            shift(Position::new(1, 3), removed, Position::new(1, 2)),
            Position::new(1, 2)
        );
    }

    #[test]
    fn shift_same_line_after_delete() {
        let removed = Range::new(Position::new(1, 2), Position::new(1, 5));
        // Three chars removed, nothing inserted: columns slide left by 3.
        assert_eq!(
            shift(Position::new(1, 8), removed, Position::new(1, 2)),
            Position::new(1, 5)
        );
    }

    #[test]
    fn shift_following_lines_after_line_delete() {
        // Delete lines 1-2 entirely.
        let removed = Range::new(Position::new(1, 0), Position::new(3, 0));
        let ins_end = Position::new(1, 0);
        assert_eq!(shift(Position::new(5, 4), removed, ins_end), Position::new(3, 4));
    }

    // -- apply ----------------------------------------------------------------

    #[test]
    fn two_inserts_on_one_line() {
        let mut buf = ScratchBuffer::from_text("ab cd");
        let mut q = TransformQueue::new();
        // Cursor 0 inserts at col 0, cursor 1 at col 3; queued out of order.
        q.push(t(1, Range::point(Position::new(0, 3)), "Y", CursorTarget::InsertEnd));
        q.push(t(0, Range::point(Position::new(0, 0)), "X", CursorTarget::InsertEnd));

        let landed = q.apply(&mut buf);
        assert_eq!(buf.contents(), "Xab Ycd");
        // Landed pairs come back in document order.
        assert_eq!(landed[0], (0, Position::new(0, 1)));
        assert_eq!(landed[1], (1, Position::new(0, 5)));
    }

    #[test]
    fn two_deletes_on_one_line() {
        let mut buf = ScratchBuffer::from_text("one two three");
        let mut q = TransformQueue::new();
        // Delete "one " and "two ".
        q.push(t(
            0,
            Range::new(Position::new(0, 0), Position::new(0, 4)),
            "",
            CursorTarget::Start,
        ));
        q.push(t(
            1,
            Range::new(Position::new(0, 4), Position::new(0, 8)),
            "",
            CursorTarget::Start,
        ));

        let landed = q.apply(&mut buf);
        assert_eq!(buf.contents(), "three");
        assert_eq!(landed[0], (0, Position::new(0, 0)));
        assert_eq!(landed[1], (1, Position::new(0, 0)));
    }

    #[test]
    fn line_deletes_shift_later_cursors() {
        let mut buf = ScratchBuffer::from_lines(&["a", "b", "c", "d"]);
        let mut q = TransformQueue::new();
        // Delete line 0 and line 2.
        q.push(t(
            0,
            Range::new(Position::new(0, 0), Position::new(1, 0)),
            "",
            CursorTarget::Start,
        ));
        q.push(t(
            1,
            Range::new(Position::new(2, 0), Position::new(3, 0)),
            "",
            CursorTarget::Start,
        ));

        let landed = q.apply(&mut buf);
        assert_eq!(buf.contents(), "b\nd");
        assert_eq!(landed[0], (0, Position::new(0, 0)));
        assert_eq!(landed[1], (1, Position::new(1, 0)));
    }

    #[test]
    fn multi_line_insert_lands_on_last_char() {
        let mut buf = ScratchBuffer::from_text("xy");
        let mut q = TransformQueue::new();
        q.push(t(
            0,
            Range::point(Position::new(0, 1)),
            "a\nbc",
            CursorTarget::InsertLast,
        ));
        let landed = q.apply(&mut buf);
        assert_eq!(buf.contents(), "xa\nbcy");
        assert_eq!(landed[0], (0, Position::new(1, 1)));
    }

    #[test]
    fn explicit_target_rides_earlier_shifts() {
        let mut buf = ScratchBuffer::from_lines(&["aaa", "bbb", "ccc"]);
        let mut q = TransformQueue::new();
        // Cursor 0 deletes line 0; cursor 1 edits line 2 and asks to land at
        // its own line start, expressed in pre-edit coordinates.
        q.push(t(
            0,
            Range::new(Position::new(0, 0), Position::new(1, 0)),
            "",
            CursorTarget::Start,
        ));
        q.push(t(
            1,
            Range::new(Position::new(2, 0), Position::new(2, 3)),
            "CCC",
            CursorTarget::At(Position::new(2, 0)),
        ));

        let landed = q.apply(&mut buf);
        assert_eq!(buf.contents(), "bbb\nCCC");
        assert_eq!(landed[1], (1, Position::new(1, 0)));
    }

    #[test]
    fn insert_last_on_empty_text_stays_put() {
        let mut buf = ScratchBuffer::from_text("abc");
        let mut q = TransformQueue::new();
        q.push(t(
            0,
            Range::new(Position::new(0, 1), Position::new(0, 2)),
            "",
            CursorTarget::InsertLast,
        ));
        let landed = q.apply(&mut buf);
        assert_eq!(buf.contents(), "ac");
        assert_eq!(landed[0], (0, Position::new(0, 1)));
    }
}
