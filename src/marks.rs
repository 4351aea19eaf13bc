//! Marks and the jump list.
//!
//! `m{a-z}` pins a position; `` `{mark} `` jumps to it exactly and `'{mark}`
//! to its line's first non-blank. Marks are plain recorded positions — edits
//! do not shift them, and a mark past the shrunken end of the buffer simply
//! clamps when jumped to.
//!
//! The jump list records positions before "large" motions (`G`, `gg`,
//! paragraph jumps, searches, mark jumps). `<C-o>` walks back, `<C-i>`
//! forward. Jumping somewhere new while rewound truncates the abandoned
//! forward tail, like a browser history.

use crate::position::Position;

// ---------------------------------------------------------------------------
// Marks
// ---------------------------------------------------------------------------

/// The 26 named mark slots.
#[derive(Debug, Default, Clone)]
pub struct MarkFile {
    slots: [Option<Position>; 26],
}

impl MarkFile {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a mark. Returns false (and stores nothing) for names outside
    /// `a-z`.
    pub fn set(&mut self, name: char, pos: Position) -> bool {
        if name.is_ascii_lowercase() {
            self.slots[(name as u8 - b'a') as usize] = Some(pos);
            true
        } else {
            false
        }
    }

    #[must_use]
    pub const fn get(&self, name: char) -> Option<Position> {
        if name.is_ascii_lowercase() {
            self.slots[(name as u8 - b'a') as usize]
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Jump list
// ---------------------------------------------------------------------------

/// Maximum remembered jumps; the oldest entry falls off first.
const MAX_JUMPS: usize = 100;

/// Browser-history style list of departure positions.
///
/// `index == entries.len()` means "at the live position", not inside the
/// list. Walking back from the live position first saves it, so `<C-i>` can
/// return all the way.
#[derive(Debug, Default, Clone)]
pub struct JumpList {
    entries: Vec<Position>,
    index: usize,
}

impl JumpList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the position being jumped *away from*. Discards any forward
    /// tail and collapses consecutive entries on the same line.
    pub fn push(&mut self, pos: Position) {
        self.entries.truncate(self.index);
        if self.entries.last().is_some_and(|p| p.line == pos.line) {
            self.entries.pop();
        }
        self.entries.push(pos);
        if self.entries.len() > MAX_JUMPS {
            self.entries.remove(0);
        }
        self.index = self.entries.len();
    }

    /// `<C-o>` — step back. `current` is the live position, saved on the
    /// first backward step so forward can return to it.
    pub fn back(&mut self, current: Position) -> Option<Position> {
        if self.index == 0 {
            return None;
        }
        if self.index == self.entries.len()
            && self.entries.last().is_none_or(|p| p.line != current.line)
        {
            self.entries.push(current);
        }
        self.index -= 1;
        Some(self.entries[self.index])
    }

    /// `<C-i>` — step forward after stepping back.
    pub fn forward(&mut self) -> Option<Position> {
        if self.index + 1 < self.entries.len() {
            self.index += 1;
            Some(self.entries[self.index])
        } else {
            None
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
