//! Actions — the closed catalog of things a key sequence can mean.
//!
//! Every binding in the keymap resolves to one [`Action`]: a motion, an
//! operator, a text object, or a standalone command. Motions move cursors
//! and double as operator targets. Operators wait for a target (or act on
//! the visual selection immediately). Text objects only ever serve as
//! operator/visual targets. Commands are everything else.
//!
//! Arguments collected through placeholder pattern slots (the `{char}` in
//! `f{char}`, `r{char}`, `m{char}`, …) are not stored in the enum — the
//! matcher captures them and hands them to the executor alongside the
//! action.

use bitflags::bitflags;

// ---------------------------------------------------------------------------
// Motions
// ---------------------------------------------------------------------------

/// A cursor movement. Standalone it moves every cursor; after an operator it
/// defines the operand range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    /// `0` — column zero. Only reachable when no count is accumulating.
    LineStart,
    /// `^` — first non-blank of the line.
    FirstNonBlank,
    /// `$` — last character of the line.
    LineEnd,
    WordForward,
    WordBackward,
    WordEndForward,
    BigWordForward,
    BigWordBackward,
    BigWordEndForward,
    /// `gg` — first line (or line `count`).
    FirstLine,
    /// `G` — last line (or line `count`).
    LastLine,
    /// `}` — next paragraph boundary.
    ParagraphForward,
    /// `{` — previous paragraph boundary.
    ParagraphBackward,
    /// `%` — matching bracket under or after the cursor.
    MatchPair,
    /// `f{char}` — onto the next occurrence on this line.
    FindForward,
    /// `F{char}` — onto the previous occurrence on this line.
    FindBackward,
    /// `t{char}` — till before the next occurrence.
    TillForward,
    /// `T{char}` — till after the previous occurrence.
    TillBackward,
    /// `;` — repeat the last f/F/t/T.
    RepeatFind,
    /// `,` — repeat the last f/F/t/T, reversed.
    RepeatFindReverse,
    /// `n` — next search match.
    SearchNext,
    /// `N` — previous search match.
    SearchPrev,
    /// `*` — search forward for the word under the cursor.
    SearchWordForward,
    /// `#` — search backward for the word under the cursor.
    SearchWordBackward,
    /// `` `{mark} `` — exact mark position.
    GotoMark,
    /// `'{mark}` — first non-blank of the mark's line.
    GotoMarkLine,
}

impl Motion {
    /// Vertical motions keep the sticky column so the cursor snaps back to
    /// its desired column after crossing short lines.
    #[must_use]
    pub const fn keeps_sticky(self) -> bool {
        matches!(self, Self::Up | Self::Down | Self::FirstLine | Self::LastLine)
    }

    /// True when the motion needs one captured character (`f`, `t`, marks).
    #[must_use]
    pub const fn takes_char(self) -> bool {
        matches!(
            self,
            Self::FindForward
                | Self::FindBackward
                | Self::TillForward
                | Self::TillBackward
                | Self::GotoMark
                | Self::GotoMarkLine
        )
    }
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

/// An edit verb. Composed with a motion or text object, or applied to the
/// visual selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `d` — delete into a register.
    Delete,
    /// `c` — delete into a register, then enter Insert.
    Change,
    /// `y` — copy into a register.
    Yank,
    /// `>` — indent lines.
    Indent,
    /// `<` — outdent lines.
    Outdent,
    /// `gu` — lowercase.
    Lowercase,
    /// `gU` — uppercase.
    Uppercase,
    /// `g~` — toggle case.
    ToggleCase,
    /// `gq` — reflow lines to the configured text width.
    Reflow,
}

impl Operator {
    /// Operators that leave the edited text in a register.
    #[must_use]
    pub const fn writes_register(self) -> bool {
        matches!(self, Self::Delete | Self::Change | Self::Yank)
    }

    /// Change-class operators request Insert mode after running.
    #[must_use]
    pub const fn enters_insert(self) -> bool {
        matches!(self, Self::Change)
    }

    /// Operators that always widen their operand to whole lines.
    #[must_use]
    pub const fn forces_linewise(self) -> bool {
        matches!(self, Self::Indent | Self::Outdent | Self::Reflow)
    }
}

// ---------------------------------------------------------------------------
// Text objects
// ---------------------------------------------------------------------------

/// A structural operand: `i`/`a` plus what to select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextObject {
    Word { around: bool },
    BigWord { around: bool },
    Quote { delim: char, around: bool },
    Bracket { open: char, close: char, around: bool },
    Paragraph { around: bool },
}

impl TextObject {
    /// Paragraph objects take whole lines; everything else is character-wise.
    #[must_use]
    pub const fn is_linewise(self) -> bool {
        matches!(self, Self::Paragraph { .. })
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// A standalone command — neither operand nor operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `i` — insert before the cursor.
    InsertBefore,
    /// `a` — insert after the cursor.
    InsertAfter,
    /// `I` — insert at the first non-blank of the line.
    InsertLineStart,
    /// `A` — insert at the end of the line.
    InsertLineEnd,
    /// `o` — open a line below and insert.
    OpenBelow,
    /// `O` — open a line above and insert.
    OpenAbove,
    /// `x` — delete the character under the cursor.
    DeleteCharForward,
    /// `X` — delete the character before the cursor.
    DeleteCharBackward,
    /// `D` — delete to the end of the line.
    DeleteToLineEnd,
    /// `C` — change to the end of the line.
    ChangeToLineEnd,
    /// `S` — change whole lines.
    ChangeLine,
    /// `s` — substitute the character under the cursor.
    SubstituteChar,
    /// `r{char}` — replace the character under the cursor.
    ReplaceChar,
    /// `R` — enter Replace mode.
    EnterReplace,
    /// `~` — toggle case of the character under the cursor and advance.
    ToggleCaseChar,
    /// `p` — paste after the cursor (or below, line-wise).
    PasteAfter,
    /// `P` — paste before the cursor (or above, line-wise).
    PasteBefore,
    /// `J` — join lines with a single space.
    JoinLines,
    /// `v` — toggle character-wise Visual.
    VisualChar,
    /// `V` — toggle line-wise Visual.
    VisualLine,
    /// `<C-v>` — toggle block-wise Visual.
    VisualBlock,
    /// `o` in Visual — swap cursor and anchor.
    SwapVisualEnds,
    /// `m{char}` — set a mark.
    SetMark,
    /// `q{char}` — start recording a macro (`q` again stops).
    RecordMacro,
    /// `@{char}` — play a macro.
    PlayMacro,
    /// `@@` — replay the last played macro.
    RepeatLastMacro,
    /// `.` — repeat the last change.
    RepeatChange,
    /// `/` — incremental search forward.
    SearchForward,
    /// `?` — incremental search backward.
    SearchBackward,
    /// `<C-o>` — jump back in the jump list.
    JumpBack,
    /// `<C-i>` — jump forward in the jump list.
    JumpForward,
    /// `gb` — add a cursor at the next occurrence of the word under the
    /// primary cursor.
    AddCursorAtNextMatch,
    /// `gs` — label jump: overlay labels on visible words, then jump to the
    /// uniquely selected one.
    LabelJump,
}

impl Command {
    /// Commands that need one captured character.
    #[must_use]
    pub const fn takes_char(self) -> bool {
        matches!(
            self,
            Self::ReplaceChar | Self::SetMark | Self::RecordMacro | Self::PlayMacro
        )
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// What a completed key sequence resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Motion(Motion),
    Operator(Operator),
    Object(TextObject),
    Command(Command),
}

bitflags! {
    /// Per-binding execution flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BindingFlags: u8 {
        /// Run exactly once for the whole cursor set instead of once per
        /// cursor. Coordination commands (macros, repeat, search, jumps)
        /// carry this.
        const RUNS_ONCE = 1 << 0;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
