//! Repetition — the dot register and keyboard macros.
//!
//! Both work the same way underneath: a change is remembered as the key
//! sequence that produced it and repeating it replays those keys through the
//! normal dispatch path. The dot register holds exactly one change (the last
//! buffer-modifying command, including any insert-mode text up to the Escape
//! that ended it); macro registers hold arbitrary key runs bounded by
//! `q{reg}` … `q`.
//!
//! Recording is suspended while a replay is in flight, so `.` after `.`
//! repeats the original change and a macro that contains `.` does not
//! overwrite the dot register it is about to use.

use crate::key::KeyEvent;
use crate::mode::VisualKind;

// ---------------------------------------------------------------------------
// Dot register
// ---------------------------------------------------------------------------

/// The selection shape of a visual-mode change, remembered so `.` can re-form
/// an equivalent selection at the new cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualShape {
    pub kind: VisualKind,
    /// Lines spanned, anchor line through cursor line (1 = single line).
    pub lines: usize,
    /// For [`VisualKind::Char`]: columns past the start on the final line.
    /// For [`VisualKind::Block`]: the block width.
    pub cols: usize,
}

/// One remembered change, ready to replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastChange {
    /// The keys that produced the change, count and register prefixes
    /// stripped.
    pub keys: Vec<KeyEvent>,
    /// The effective count the change ran with, if any was given.
    pub count: Option<usize>,
    /// The register prefix the change ran with, if any was given.
    pub register: Option<char>,
    /// Present when the change was a visual-mode operator.
    pub shape: Option<VisualShape>,
}

#[derive(Debug, Clone)]
struct Recording {
    keys: Vec<KeyEvent>,
    count: Option<usize>,
    register: Option<char>,
    shape: Option<VisualShape>,
}

/// Records the in-flight change and remembers the completed one.
///
/// All mutators are no-ops while [`set_replaying`](Self::set_replaying) is in
/// effect, so a replayed change never re-records itself.
#[derive(Debug, Default, Clone)]
pub struct DotRecorder {
    active: Option<Recording>,
    last: Option<LastChange>,
    replaying: bool,
}

impl DotRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start recording a change whose command keys are already known (the
    /// matched sequence that triggered it).
    pub fn begin(&mut self, keys: Vec<KeyEvent>) {
        if !self.replaying {
            self.active = Some(Recording {
                keys,
                count: None,
                register: None,
                shape: None,
            });
        }
    }

    /// Append one key to the in-flight change (insert-mode text, the closing
    /// Escape, a single-char argument).
    pub fn push(&mut self, key: KeyEvent) {
        if let Some(rec) = &mut self.active {
            rec.keys.push(key);
        }
    }

    /// Append the keys of a motion that completed an operator.
    pub fn extend(&mut self, keys: &[KeyEvent]) {
        if let Some(rec) = &mut self.active {
            rec.keys.extend_from_slice(keys);
        }
    }

    pub fn set_count(&mut self, count: Option<usize>) {
        if let Some(rec) = &mut self.active {
            rec.count = count;
        }
    }

    pub fn set_register(&mut self, register: Option<char>) {
        if let Some(rec) = &mut self.active {
            rec.register = register;
        }
    }

    pub fn set_shape(&mut self, shape: VisualShape) {
        if let Some(rec) = &mut self.active {
            rec.shape = Some(shape);
        }
    }

    /// Commit the in-flight change as the new dot register.
    pub fn finish(&mut self) {
        if let Some(rec) = self.active.take() {
            self.last = Some(LastChange {
                keys: rec.keys,
                count: rec.count,
                register: rec.register,
                shape: rec.shape,
            });
        }
    }

    /// Drop the in-flight change, keeping the previous dot register (an
    /// aborted command repeats nothing new).
    pub fn cancel(&mut self) {
        self.active = None;
    }

    /// Record a completed single-key change directly, bypassing the
    /// begin/finish pair (`x`, `p`, `J` and friends commit atomically).
    pub fn record_immediate(
        &mut self,
        keys: Vec<KeyEvent>,
        count: Option<usize>,
        register: Option<char>,
    ) {
        if !self.replaying {
            self.active = None;
            self.last = Some(LastChange {
                keys,
                count,
                register,
                shape: None,
            });
        }
    }

    #[must_use]
    pub const fn last(&self) -> Option<&LastChange> {
        self.last.as_ref()
    }

    #[must_use]
    pub const fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    pub const fn set_replaying(&mut self, replaying: bool) {
        self.replaying = replaying;
    }

    #[must_use]
    pub const fn is_replaying(&self) -> bool {
        self.replaying
    }
}

// ---------------------------------------------------------------------------
// Macros
// ---------------------------------------------------------------------------

/// Replays may nest (a macro playing a macro) only this deep.
const MAX_REPLAY_DEPTH: usize = 16;

/// The 26 macro registers and the `q` recording state.
#[derive(Debug, Default, Clone)]
pub struct MacroRecorder {
    slots: [Vec<KeyEvent>; 26],
    recording: Option<(usize, Vec<KeyEvent>)>,
    last_played: Option<char>,
    depth: usize,
}

impl MacroRecorder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `q{reg}` — begin recording. Lowercase starts fresh; uppercase appends
    /// to the same slot. Other names are rejected.
    pub fn start(&mut self, name: char) -> bool {
        let (slot, append) = match name {
            'a'..='z' => ((name as u8 - b'a') as usize, false),
            'A'..='Z' => ((name as u8 - b'A') as usize, true),
            _ => return false,
        };
        let seed = if append {
            self.slots[slot].clone()
        } else {
            Vec::new()
        };
        self.recording = Some((slot, seed));
        true
    }

    /// Append a key to the recording in progress.
    pub fn push(&mut self, key: KeyEvent) {
        if let Some((_, keys)) = &mut self.recording {
            keys.push(key);
        }
    }

    /// `q` while recording — commit to the slot. Returns the register name.
    pub fn stop(&mut self) -> Option<char> {
        let (slot, keys) = self.recording.take()?;
        self.slots[slot] = keys;
        Some((b'a' + slot as u8) as char)
    }

    #[must_use]
    pub const fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// The keys stored under `name` (case-insensitive). Empty slot or bad
    /// name yields `None`.
    #[must_use]
    pub fn get(&self, name: char) -> Option<&[KeyEvent]> {
        let slot = match name {
            'a'..='z' => (name as u8 - b'a') as usize,
            'A'..='Z' => (name as u8 - b'A') as usize,
            _ => return None,
        };
        if self.slots[slot].is_empty() {
            None
        } else {
            Some(&self.slots[slot])
        }
    }

    #[must_use]
    pub const fn last_played(&self) -> Option<char> {
        self.last_played
    }

    pub const fn set_last_played(&mut self, name: char) {
        self.last_played = Some(name);
    }

    /// Enter one level of replay; false when the nesting cap is hit.
    pub const fn enter_replay(&mut self) -> bool {
        if self.depth >= MAX_REPLAY_DEPTH {
            return false;
        }
        self.depth += 1;
        true
    }

    pub const fn exit_replay(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    #[must_use]
    pub const fn is_replaying(&self) -> bool {
        self.depth > 0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
