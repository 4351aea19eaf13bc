//! Vim-style modal state.
//!
//! The engine is always in exactly one [`Mode`]. Each mode changes how a key
//! is interpreted:
//!
//! | Mode      | Keys are…                 | Cursor limit        |
//! |-----------|---------------------------|---------------------|
//! | Normal    | commands                  | `0..content_len-1`  |
//! | Insert    | text input                | `0..content_len`    |
//! | Visual    | commands over a selection | `0..content_len-1`  |
//! | Replace   | overtyping text           | `0..content_len`    |
//!
//! Operator-pending is not a `Mode` variant: it is the interval where
//! `Pending::operator` is set while the mode stays Normal or Visual. The
//! label-jump overlay and single-char argument collection are likewise
//! engine sub-states layered over the current mode, not modes of their own.

use std::fmt;

use bitflags::bitflags;

// ---------------------------------------------------------------------------
// VisualKind
// ---------------------------------------------------------------------------

/// The sub-mode of visual selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualKind {
    /// `v` — character-wise selection.
    Char,
    /// `V` — line-wise selection (always full lines).
    Line,
    /// `Ctrl-V` — block (column) selection.
    Block,
}

impl fmt::Display for VisualKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char => f.write_str("VISUAL"),
            Self::Line => f.write_str("VISUAL LINE"),
            Self::Block => f.write_str("VISUAL BLOCK"),
        }
    }
}

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// The current editing mode.
///
/// A pure data type: it records what we are doing right now, not the logic
/// for doing it. Transitions live in the engine; the rules are simple enough
/// to state here:
///
/// - operators return to Normal unless they are change-class (enter Insert);
/// - visual sub-modes toggle on their own activation key and switch between
///   each other;
/// - Escape from anywhere returns to Normal and discards pending state.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Default mode. Keys are commands, not text.
    #[default]
    Normal,
    /// Text entry. Keys produce characters at every cursor.
    Insert,
    /// Selection mode. Motions extend the selection.
    Visual(VisualKind),
    /// `R` — continuous overwrite until Escape. (Single-char `r` is a
    /// normal-mode command, not this mode.)
    Replace,
}

impl Mode {
    /// Human-readable name, the way a status line would show it.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Insert => "INSERT",
            Self::Visual(kind) => match kind {
                VisualKind::Char => "VISUAL",
                VisualKind::Line => "VISUAL LINE",
                VisualKind::Block => "VISUAL BLOCK",
            },
            Self::Replace => "REPLACE",
        }
    }

    /// True if the cursor can sit one-past-the-last-char of a line.
    /// Normal and visual cursors must rest ON a character.
    #[inline]
    #[must_use]
    pub const fn cursor_past_end(self) -> bool {
        matches!(self, Self::Insert | Self::Replace)
    }

    /// True if keys are text input rather than commands.
    #[inline]
    #[must_use]
    pub const fn is_input(self) -> bool {
        matches!(self, Self::Insert | Self::Replace)
    }

    /// True in any visual sub-mode.
    #[inline]
    #[must_use]
    pub const fn is_visual(self) -> bool {
        matches!(self, Self::Visual(_))
    }

    /// The visual sub-mode, if any.
    #[inline]
    #[must_use]
    pub const fn visual_kind(self) -> Option<VisualKind> {
        match self {
            Self::Visual(kind) => Some(kind),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

// ---------------------------------------------------------------------------
// ModeSet — binding eligibility
// ---------------------------------------------------------------------------

bitflags! {
    /// The matcher contexts a key binding applies in.
    ///
    /// `PENDING` is the operator-pending context (an operator is set while
    /// the mode is Normal or Visual); text objects match only there and in
    /// visual mode, so `i`/`a` in plain Normal still mean insert/append.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ModeSet: u8 {
        const NORMAL  = 0b001;
        const VISUAL  = 0b010;
        const PENDING = 0b100;
    }
}

impl ModeSet {
    /// Motions are valid everywhere commands are.
    pub const MOTION: Self = Self::NORMAL.union(Self::VISUAL).union(Self::PENDING);
    /// Text objects need an operator or a selection to act on.
    pub const OBJECT: Self = Self::VISUAL.union(Self::PENDING);
    /// Commands that act immediately in Normal and Visual.
    pub const COMMAND: Self = Self::NORMAL.union(Self::VISUAL);

    /// The context for the current mode + operator-pending flag.
    #[must_use]
    pub fn current(mode: Mode, operator_pending: bool) -> Self {
        if operator_pending {
            Self::PENDING
        } else if mode.is_visual() {
            Self::VISUAL
        } else {
            Self::NORMAL
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- Display --------------------------------------------------------------

    #[test]
    fn mode_display_names() {
        assert_eq!(Mode::Normal.display_name(), "NORMAL");
        assert_eq!(Mode::Insert.display_name(), "INSERT");
        assert_eq!(Mode::Visual(VisualKind::Char).display_name(), "VISUAL");
        assert_eq!(Mode::Visual(VisualKind::Line).display_name(), "VISUAL LINE");
        assert_eq!(
            Mode::Visual(VisualKind::Block).display_name(),
            "VISUAL BLOCK"
        );
        assert_eq!(Mode::Replace.display_name(), "REPLACE");
    }

    #[test]
    fn visual_kind_display() {
        assert_eq!(format!("{}", VisualKind::Line), "VISUAL LINE");
    }

    // -- Cursor rules -----------------------------------------------------------

    #[test]
    fn cursor_past_end_only_while_typing() {
        assert!(Mode::Insert.cursor_past_end());
        assert!(Mode::Replace.cursor_past_end());
        assert!(!Mode::Normal.cursor_past_end());
        assert!(!Mode::Visual(VisualKind::Block).cursor_past_end());
    }

    #[test]
    fn input_modes() {
        assert!(Mode::Insert.is_input());
        assert!(Mode::Replace.is_input());
        assert!(!Mode::Normal.is_input());
        assert!(!Mode::Visual(VisualKind::Char).is_input());
    }

    // -- Visual queries -----------------------------------------------------------

    #[test]
    fn visual_kind_accessor() {
        assert_eq!(Mode::Normal.visual_kind(), None);
        assert_eq!(
            Mode::Visual(VisualKind::Block).visual_kind(),
            Some(VisualKind::Block)
        );
    }

    #[test]
    fn default_is_normal() {
        assert_eq!(Mode::default(), Mode::Normal);
    }

    // -- ModeSet ------------------------------------------------------------------

    #[test]
    fn current_context_tracks_pending_flag() {
        assert_eq!(ModeSet::current(Mode::Normal, false), ModeSet::NORMAL);
        assert_eq!(ModeSet::current(Mode::Normal, true), ModeSet::PENDING);
        assert_eq!(
            ModeSet::current(Mode::Visual(VisualKind::Char), false),
            ModeSet::VISUAL
        );
        assert_eq!(
            ModeSet::current(Mode::Visual(VisualKind::Line), true),
            ModeSet::PENDING
        );
    }

    #[test]
    fn object_bindings_never_match_plain_normal() {
        assert!(!ModeSet::OBJECT.intersects(ModeSet::NORMAL));
        assert!(ModeSet::OBJECT.contains(ModeSet::PENDING));
        assert!(ModeSet::MOTION.contains(ModeSet::NORMAL));
    }
}
