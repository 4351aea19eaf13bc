//! Cursor — position tracking plus the multi-cursor set.
//!
//! A [`Cursor`] tracks a position, a sticky column for vertical movement,
//! and an optional selection anchor. It is a value type: it never owns or
//! references the buffer, which is passed to the few methods that need it.
//!
//! Motion algorithms do not live here — the composer resolves a motion to a
//! target position and the cursor just applies it. The split matters because
//! the same resolution feeds both plain movement and operator composition.
//!
//! # Sticky column
//!
//! Vertical movement remembers the column the cursor wants to be at. Moving
//! through a short line and back onto a long one snaps back to the remembered
//! column. Any horizontal movement resets it.
//!
//! # Multi-cursor
//!
//! [`CursorSet`] holds one or more cursors. Index 0 is the primary cursor —
//! it drives count and register decisions. After any mutation the set is
//! merged: sorted by document order and de-duplicated by identical
//! (anchor, position) pairs, so the primary is always the topmost cursor.

use crate::position::{Position, Range};
use crate::traits::TextBuffer;

// ---------------------------------------------------------------------------
// Cursor
// ---------------------------------------------------------------------------

/// A single cursor: position, sticky column, optional selection anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pos: Position,

    /// Remembered column for vertical movement.
    sticky_col: usize,

    /// The other end of the selection. Stays put while the cursor moves.
    anchor: Option<Position>,
}

impl Cursor {
    /// A cursor at the origin.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pos: Position::ZERO,
            sticky_col: 0,
            anchor: None,
        }
    }

    /// A cursor at a specific position.
    #[must_use]
    pub const fn at(pos: Position) -> Self {
        Self {
            pos,
            sticky_col: pos.col,
            anchor: None,
        }
    }

    // -- Accessors ----------------------------------------------------------

    #[inline]
    #[must_use]
    pub const fn position(&self) -> Position {
        self.pos
    }

    #[inline]
    #[must_use]
    pub const fn line(&self) -> usize {
        self.pos.line
    }

    #[inline]
    #[must_use]
    pub const fn col(&self) -> usize {
        self.pos.col
    }

    /// Desired column for vertical movement.
    #[inline]
    #[must_use]
    pub const fn sticky_col(&self) -> usize {
        self.sticky_col
    }

    #[inline]
    #[must_use]
    pub const fn anchor(&self) -> Option<Position> {
        self.anchor
    }

    #[inline]
    #[must_use]
    pub const fn has_selection(&self) -> bool {
        self.anchor.is_some()
    }

    /// The selected range, ordered start <= end, or `None` without an anchor.
    #[must_use]
    pub fn selection(&self) -> Option<Range> {
        self.anchor.map(|anchor| Range::ordered(anchor, self.pos))
    }

    // -- Selection control ----------------------------------------------------

    /// Anchor the selection at the current position.
    pub const fn set_anchor(&mut self) {
        self.anchor = Some(self.pos);
    }

    pub const fn set_anchor_at(&mut self, pos: Position) {
        self.anchor = Some(pos);
    }

    pub const fn clear_anchor(&mut self) {
        self.anchor = None;
    }

    /// Swap cursor and anchor ends of the selection. No-op without an anchor.
    /// This is `o` in visual mode.
    pub const fn swap_anchor(&mut self) {
        if let Some(anchor) = self.anchor {
            self.anchor = Some(self.pos);
            self.pos = anchor;
            self.sticky_col = self.pos.col;
        }
    }

    // -- Positioning ------------------------------------------------------------

    /// Move to an exact position, clamped to buffer bounds. Resets the sticky
    /// column. Does not touch the anchor.
    pub fn set_position(&mut self, pos: Position, buf: &dyn TextBuffer, past_end: bool) {
        self.pos = buf.clamp(pos, past_end);
        self.sticky_col = self.pos.col;
    }

    /// Apply a resolved motion target. Vertical motions pass
    /// `keeps_sticky = true` so the desired column survives short lines;
    /// everything else resets the sticky column to where it landed.
    pub fn apply_motion(
        &mut self,
        target: Position,
        keeps_sticky: bool,
        buf: &dyn TextBuffer,
        past_end: bool,
    ) {
        self.pos = buf.clamp(target, past_end);
        if !keeps_sticky {
            self.sticky_col = self.pos.col;
        }
    }

    /// Place the cursor without clamping. The caller guarantees validity —
    /// used when an edit has just produced the position.
    pub const fn set_position_unchecked(&mut self, pos: Position) {
        self.pos = pos;
        self.sticky_col = pos.col;
    }

    /// Re-clamp position and anchor after the buffer changed under us.
    pub fn clamp_to(&mut self, buf: &dyn TextBuffer, past_end: bool) {
        self.pos = buf.clamp(self.pos, past_end);
        if let Some(anchor) = &mut self.anchor {
            *anchor = buf.clamp(*anchor, past_end);
        }
    }

    /// Sort key for document order: selection start first, then position.
    fn order_key(&self) -> (Position, Position) {
        let start = self
            .anchor
            .map_or(self.pos, |anchor| anchor.min(self.pos));
        (start, self.pos)
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// CursorSet
// ---------------------------------------------------------------------------

/// One or more cursors, kept in document order. Never empty.
///
/// Index 0 is the primary cursor. Merging after mutations keeps the set
/// sorted and free of duplicates, so "primary" always means "topmost".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorSet {
    cursors: Vec<Cursor>,
}

impl CursorSet {
    /// A set containing a single cursor at the origin.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cursors: vec![Cursor::new()],
        }
    }

    /// A set containing one cursor at `pos`.
    #[must_use]
    pub fn single(pos: Position) -> Self {
        Self {
            cursors: vec![Cursor::at(pos)],
        }
    }

    // -- Access -----------------------------------------------------------------

    #[inline]
    #[must_use]
    pub fn primary(&self) -> &Cursor {
        &self.cursors[0]
    }

    #[inline]
    #[must_use]
    pub fn primary_mut(&mut self) -> &mut Cursor {
        &mut self.cursors[0]
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    /// Always false — the set holds at least one cursor.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    /// True when more than one cursor is active.
    #[inline]
    #[must_use]
    pub fn is_multi(&self) -> bool {
        self.cursors.len() > 1
    }

    #[must_use]
    pub fn get(&self, idx: usize) -> Option<&Cursor> {
        self.cursors.get(idx)
    }

    #[must_use]
    pub fn get_mut(&mut self, idx: usize) -> Option<&mut Cursor> {
        self.cursors.get_mut(idx)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Cursor> {
        self.cursors.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Cursor> {
        self.cursors.iter_mut()
    }

    /// Positions of all cursors, in set order.
    #[must_use]
    pub fn positions(&self) -> Vec<Position> {
        self.cursors.iter().map(Cursor::position).collect()
    }

    // -- Mutation ------------------------------------------------------------

    /// Add a cursor. Call [`merge`](Self::merge) afterwards to restore
    /// document order.
    pub fn push(&mut self, cursor: Cursor) {
        self.cursors.push(cursor);
    }

    /// Replace every cursor with a fresh set. `cursors` must be non-empty.
    pub fn replace_all(&mut self, cursors: Vec<Cursor>) {
        debug_assert!(!cursors.is_empty(), "CursorSet must hold at least one cursor");
        if !cursors.is_empty() {
            self.cursors = cursors;
        }
    }

    /// Sort by document order and drop cursors with identical
    /// (anchor, position) pairs. The topmost survivor becomes primary.
    pub fn merge(&mut self) {
        self.cursors.sort_by(|a, b| a.order_key().cmp(&b.order_key()));
        self.cursors
            .dedup_by(|a, b| a.position() == b.position() && a.anchor() == b.anchor());
    }

    /// Drop every cursor but the primary.
    pub fn collapse_to_primary(&mut self) {
        self.cursors.truncate(1);
    }

    /// Re-clamp all cursors after a buffer edit, then merge.
    pub fn clamp_all(&mut self, buf: &dyn TextBuffer, past_end: bool) {
        for cursor in &mut self.cursors {
            cursor.clamp_to(buf, past_end);
        }
        self.merge();
    }

    /// Clear every cursor's selection anchor.
    pub fn clear_anchors(&mut self) {
        for cursor in &mut self.cursors {
            cursor.clear_anchor();
        }
    }
}

impl Default for CursorSet {
    fn default() -> Self {
        Self::new()
    }
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

    // -- Cursor construction ----------------------------------------------------

    #[test]
    fn new_at_origin() {
        let c = Cursor::new();
        assert_eq!(c.position(), Position::ZERO);
        assert_eq!(c.sticky_col(), 0);
        assert!(!c.has_selection());
    }

    #[test]
    fn at_sets_sticky() {
        let c = Cursor::at(p(3, 7));
        assert_eq!(c.position(), p(3, 7));
        assert_eq!(c.sticky_col(), 7);
    }

    // -- Selection --------------------------------------------------------------

    #[test]
    fn anchor_lifecycle() {
        let mut c = Cursor::at(p(1, 3));
        c.set_anchor();
        assert_eq!(c.anchor(), Some(p(1, 3)));
        assert!(c.has_selection());

        c.clear_anchor();
        assert!(!c.has_selection());
        assert!(c.selection().is_none());
    }

    #[test]
    fn selection_is_ordered() {
        let mut c = Cursor::at(p(0, 2));
        c.set_anchor_at(p(3, 0));
        let sel = c.selection().unwrap();
        assert_eq!(sel.start, p(0, 2));
        assert_eq!(sel.end, p(3, 0));
    }

    #[test]
    fn swap_anchor_exchanges_ends() {
        let mut c = Cursor::at(p(2, 5));
        c.set_anchor_at(p(0, 1));

        c.swap_anchor();
        assert_eq!(c.position(), p(0, 1));
        assert_eq!(c.anchor(), Some(p(2, 5)));
        assert_eq!(c.sticky_col(), 1);
    }

    #[test]
    fn swap_anchor_without_selection_is_noop() {
        let mut c = Cursor::at(p(1, 1));
        c.swap_anchor();
        assert_eq!(c.position(), p(1, 1));
        assert!(c.anchor().is_none());
    }

    // -- Positioning -----------------------------------------------------------

    #[test]
    fn set_position_clamps_and_resets_sticky() {
        let buf = ScratchBuffer::from_text("hello\nhi");
        let mut c = Cursor::at(p(0, 4));

        c.set_position(p(1, 9), &buf, false);
        assert_eq!(c.position(), p(1, 1)); // "hi" max normal col = 1
        assert_eq!(c.sticky_col(), 1);
    }

    #[test]
    fn apply_motion_keeps_sticky_for_vertical() {
        let buf = ScratchBuffer::from_text("hello\nhi\nworld");
        let mut c = Cursor::at(p(0, 4));

        // Down through the short line: clamped, sticky retained.
        c.apply_motion(p(1, 4), true, &buf, false);
        assert_eq!(c.position(), p(1, 1));
        assert_eq!(c.sticky_col(), 4);

        // Down again: snaps back to the remembered column.
        c.apply_motion(p(2, c.sticky_col()), true, &buf, false);
        assert_eq!(c.position(), p(2, 4));
    }

    #[test]
    fn apply_motion_resets_sticky_for_horizontal() {
        let buf = ScratchBuffer::from_text("hello");
        let mut c = Cursor::at(p(0, 4));

        c.apply_motion(p(0, 1), false, &buf, false);
        assert_eq!(c.sticky_col(), 1);
    }

    #[test]
    fn clamp_to_fixes_pos_and_anchor() {
        let buf = ScratchBuffer::from_text("hello");
        let mut c = Cursor::at(p(9, 9));
        c.set_anchor_at(p(5, 5));

        c.clamp_to(&buf, false);
        assert_eq!(c.position(), p(0, 4));
        assert_eq!(c.anchor(), Some(p(0, 4)));
    }

    // -- CursorSet -------------------------------------------------------------

    #[test]
    fn set_starts_with_one_cursor() {
        let set = CursorSet::new();
        assert_eq!(set.len(), 1);
        assert!(!set.is_multi());
        assert_eq!(set.primary().position(), Position::ZERO);
    }

    #[test]
    fn merge_sorts_by_document_order() {
        let mut set = CursorSet::single(p(3, 0));
        set.push(Cursor::at(p(0, 2)));
        set.push(Cursor::at(p(1, 5)));

        set.merge();
        assert_eq!(set.positions(), vec![p(0, 2), p(1, 5), p(3, 0)]);
        assert_eq!(set.primary().position(), p(0, 2));
    }

    #[test]
    fn merge_drops_duplicates() {
        let mut set = CursorSet::single(p(1, 1));
        set.push(Cursor::at(p(1, 1)));
        set.push(Cursor::at(p(0, 0)));

        set.merge();
        assert_eq!(set.len(), 2);
        assert_eq!(set.positions(), vec![p(0, 0), p(1, 1)]);
    }

    #[test]
    fn merge_keeps_distinct_selections_at_same_pos() {
        let mut a = Cursor::at(p(1, 1));
        a.set_anchor_at(p(0, 0));
        let b = Cursor::at(p(1, 1)); // no anchor — not a duplicate of a

        let mut set = CursorSet::single(p(9, 9));
        set.replace_all(vec![a, b]);
        set.merge();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn collapse_keeps_primary_only() {
        let mut set = CursorSet::single(p(0, 0));
        set.push(Cursor::at(p(1, 0)));
        set.push(Cursor::at(p(2, 0)));
        set.merge();

        set.collapse_to_primary();
        assert_eq!(set.len(), 1);
        assert_eq!(set.primary().position(), p(0, 0));
    }

    #[test]
    fn clamp_all_after_edit() {
        let buf = ScratchBuffer::from_text("hello");
        let mut set = CursorSet::single(p(0, 2));
        set.push(Cursor::at(p(4, 4)));

        set.clamp_all(&buf, false);
        assert_eq!(set.positions(), vec![p(0, 2), p(0, 4)]);
    }

    #[test]
    fn clamp_all_merges_collisions() {
        let buf = ScratchBuffer::from_text("hi");
        let mut set = CursorSet::single(p(0, 1));
        set.push(Cursor::at(p(3, 3))); // clamps onto (0,1)

        set.clamp_all(&buf, false);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn clear_anchors_all() {
        let mut set = CursorSet::single(p(0, 0));
        set.primary_mut().set_anchor();
        set.push(Cursor::at(p(1, 0)));
        set.get_mut(1).unwrap().set_anchor();

        set.clear_anchors();
        assert!(set.iter().all(|c| !c.has_selection()));
    }
}
