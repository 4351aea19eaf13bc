//! Key bindings and the sequence matcher.
//!
//! The catalog is a flat table of [`Binding`]s: a key pattern, the matcher
//! contexts it applies in, and the [`Action`] it resolves to. Patterns are
//! literal keys plus [`Pat::Any`] placeholder slots; a placeholder consumes
//! exactly one key event, special keys included (`f<Tab>` finds a tab).
//!
//! [`lookup`] classifies the keys typed since the last completed command:
//!
//! - **Unique** — exactly one best full-length match. When several patterns
//!   cover the same keys, the more specific wins (fewer placeholders); ties
//!   fall back to table order, first entry wins. `@@` beats `@{register}`
//!   this way.
//! - **Partial** — no full match yet, but at least one pattern could still
//!   complete. The caller keeps accumulating keys.
//! - **NoMatch** — nothing can complete. The caller discards the sequence
//!   silently and starts over.
//!
//! A full match executes immediately — there is no timeout waiting for a
//! longer alternative, so the table must never contain a binding whose
//! pattern extends another binding active in the same context.
//! [`table_is_prefix_free`] checks that invariant; the engine asserts it in
//! debug builds and a test pins it.
//!
//! Count digits and the `"{register}` prefix never reach this table — the
//! engine strips them while accumulating (`0` counts as the line-start
//! motion only when no count is in progress).
//!
//! Doubled operators (`dd`, `yy`, `gugu`) are not table entries either: the
//! engine detects "operator key repeated while that operator is pending"
//! and runs the line-wise form.

use crate::action::{Action, BindingFlags, Command, Motion, Operator, TextObject};
use crate::key::{KeyCode, KeyEvent};
use crate::mode::ModeSet;

// ---------------------------------------------------------------------------
// Patterns and bindings
// ---------------------------------------------------------------------------

/// One slot of a key pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pat {
    /// Matches exactly this key event.
    Key(KeyEvent),
    /// Matches any single key event, capturing it for the action.
    Any,
}

/// A key pattern bound to an action in some matcher contexts.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub seq: &'static [Pat],
    pub modes: ModeSet,
    pub action: Action,
    pub flags: BindingFlags,
}

/// How far a typed sequence agrees with a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SeqMatch {
    No,
    /// Every typed key fits, but the pattern wants more.
    Prefix,
    /// Same length, every slot satisfied.
    Full,
}

impl Binding {
    pub(crate) fn matches(&self, keys: &[KeyEvent]) -> SeqMatch {
        if keys.len() > self.seq.len() {
            return SeqMatch::No;
        }
        for (pat, key) in self.seq.iter().zip(keys) {
            match pat {
                Pat::Any => {}
                Pat::Key(want) if want == key => {}
                Pat::Key(_) => return SeqMatch::No,
            }
        }
        if self.seq.len() == keys.len() {
            SeqMatch::Full
        } else {
            SeqMatch::Prefix
        }
    }

    /// Keys consumed by placeholder slots, in pattern order.
    pub(crate) fn captures(&self, keys: &[KeyEvent]) -> Vec<KeyEvent> {
        self.seq
            .iter()
            .zip(keys)
            .filter(|(pat, _)| matches!(pat, Pat::Any))
            .map(|(_, key)| *key)
            .collect()
    }

    fn placeholder_count(&self) -> usize {
        self.seq.iter().filter(|p| matches!(p, Pat::Any)).count()
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Outcome of matching the typed keys against the catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult<'a> {
    /// Nothing can complete — discard the sequence.
    NoMatch,
    /// Keep accumulating keys.
    Partial,
    /// One best binding, with the keys its placeholders captured.
    Unique {
        binding: &'a Binding,
        captures: Vec<KeyEvent>,
    },
}

/// Match `keys` against the default catalog in the given context.
#[must_use]
pub fn lookup(keys: &[KeyEvent], context: ModeSet) -> MatchResult<'static> {
    lookup_in(BINDINGS, keys, context)
}

/// Match against an explicit table. Split out for tests.
#[must_use]
pub fn lookup_in<'a>(
    table: &'a [Binding],
    keys: &[KeyEvent],
    context: ModeSet,
) -> MatchResult<'a> {
    if keys.is_empty() {
        return MatchResult::NoMatch;
    }

    let mut best: Option<(&Binding, usize)> = None;
    let mut extendable = false;

    for binding in table {
        if !binding.modes.intersects(context) {
            continue;
        }
        match binding.matches(keys) {
            SeqMatch::Full => {
                let specificity = binding.placeholder_count();
                // Strict < keeps the earliest entry on ties.
                if best.is_none_or(|(_, s)| specificity < s) {
                    best = Some((binding, specificity));
                }
            }
            SeqMatch::Prefix => extendable = true,
            SeqMatch::No => {}
        }
    }

    if let Some((binding, _)) = best {
        MatchResult::Unique {
            binding,
            captures: binding.captures(keys),
        }
    } else if extendable {
        MatchResult::Partial
    } else {
        MatchResult::NoMatch
    }
}

/// True when no binding's pattern can extend another binding active in an
/// overlapping context. The matcher's execute-immediately rule is only
/// correct under this invariant.
#[must_use]
pub fn table_is_prefix_free(table: &[Binding]) -> bool {
    for (i, shorter) in table.iter().enumerate() {
        for (j, longer) in table.iter().enumerate() {
            if i == j
                || shorter.seq.len() >= longer.seq.len()
                || !shorter.modes.intersects(longer.modes)
            {
                continue;
            }
            let compatible = shorter
                .seq
                .iter()
                .zip(longer.seq)
                .all(|(a, b)| match (a, b) {
                    (Pat::Any, _) | (_, Pat::Any) => true,
                    (Pat::Key(x), Pat::Key(y)) => x == y,
                });
            if compatible {
                return false;
            }
        }
    }
    true
}

/// The default catalog, used by [`lookup`].
#[must_use]
pub fn bindings() -> &'static [Binding] {
    BINDINGS
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

const fn key(ch: char) -> Pat {
    Pat::Key(KeyEvent::char(ch))
}

const fn ctrl(ch: char) -> Pat {
    Pat::Key(KeyEvent::ctrl(ch))
}

const fn named(code: KeyCode) -> Pat {
    Pat::Key(KeyEvent::new(code))
}

const fn motion(seq: &'static [Pat], m: Motion) -> Binding {
    Binding {
        seq,
        modes: ModeSet::MOTION,
        action: Action::Motion(m),
        flags: BindingFlags::empty(),
    }
}

const fn operator(seq: &'static [Pat], op: Operator) -> Binding {
    Binding {
        seq,
        modes: ModeSet::COMMAND,
        action: Action::Operator(op),
        flags: BindingFlags::empty(),
    }
}

const fn visual_op(seq: &'static [Pat], op: Operator) -> Binding {
    Binding {
        seq,
        modes: ModeSet::VISUAL,
        action: Action::Operator(op),
        flags: BindingFlags::empty(),
    }
}

const fn object(seq: &'static [Pat], obj: TextObject) -> Binding {
    Binding {
        seq,
        modes: ModeSet::OBJECT,
        action: Action::Object(obj),
        flags: BindingFlags::empty(),
    }
}

const fn command(seq: &'static [Pat], modes: ModeSet, cmd: Command) -> Binding {
    Binding {
        seq,
        modes,
        action: Action::Command(cmd),
        flags: BindingFlags::empty(),
    }
}

const fn command_once(seq: &'static [Pat], modes: ModeSet, cmd: Command) -> Binding {
    Binding {
        seq,
        modes,
        action: Action::Command(cmd),
        flags: BindingFlags::RUNS_ONCE,
    }
}

const N: ModeSet = ModeSet::NORMAL;
const V: ModeSet = ModeSet::VISUAL;
const NV: ModeSet = ModeSet::COMMAND;

static BINDINGS: &[Binding] = &[
    // -- Character and line motions ---------------------------------------
    motion(&[key('h')], Motion::Left),
    motion(&[named(KeyCode::Left)], Motion::Left),
    motion(&[key('l')], Motion::Right),
    motion(&[named(KeyCode::Right)], Motion::Right),
    motion(&[key('j')], Motion::Down),
    motion(&[named(KeyCode::Down)], Motion::Down),
    motion(&[key('k')], Motion::Up),
    motion(&[named(KeyCode::Up)], Motion::Up),
    motion(&[key('0')], Motion::LineStart),
    motion(&[named(KeyCode::Home)], Motion::LineStart),
    motion(&[key('^')], Motion::FirstNonBlank),
    motion(&[key('$')], Motion::LineEnd),
    motion(&[named(KeyCode::End)], Motion::LineEnd),
    // -- Word motions -------------------------------------------------------
    motion(&[key('w')], Motion::WordForward),
    motion(&[key('b')], Motion::WordBackward),
    motion(&[key('e')], Motion::WordEndForward),
    motion(&[key('W')], Motion::BigWordForward),
    motion(&[key('B')], Motion::BigWordBackward),
    motion(&[key('E')], Motion::BigWordEndForward),
    // -- File and paragraph motions -------------------------------------------
    motion(&[key('g'), key('g')], Motion::FirstLine),
    motion(&[key('G')], Motion::LastLine),
    motion(&[key('{')], Motion::ParagraphBackward),
    motion(&[key('}')], Motion::ParagraphForward),
    motion(&[key('%')], Motion::MatchPair),
    // -- Char find ---------------------------------------------------------------
    motion(&[key('f'), Pat::Any], Motion::FindForward),
    motion(&[key('F'), Pat::Any], Motion::FindBackward),
    motion(&[key('t'), Pat::Any], Motion::TillForward),
    motion(&[key('T'), Pat::Any], Motion::TillBackward),
    motion(&[key(';')], Motion::RepeatFind),
    motion(&[key(',')], Motion::RepeatFindReverse),
    // -- Search motions ------------------------------------------------------------
    motion(&[key('n')], Motion::SearchNext),
    motion(&[key('N')], Motion::SearchPrev),
    motion(&[key('*')], Motion::SearchWordForward),
    motion(&[key('#')], Motion::SearchWordBackward),
    // -- Marks ------------------------------------------------------------------
    motion(&[key('`'), Pat::Any], Motion::GotoMark),
    motion(&[key('\''), Pat::Any], Motion::GotoMarkLine),
    // -- Operators ---------------------------------------------------------------
    operator(&[key('d')], Operator::Delete),
    operator(&[key('c')], Operator::Change),
    operator(&[key('y')], Operator::Yank),
    operator(&[key('>')], Operator::Indent),
    operator(&[key('<')], Operator::Outdent),
    operator(&[key('g'), key('u')], Operator::Lowercase),
    operator(&[key('g'), key('U')], Operator::Uppercase),
    operator(&[key('g'), key('~')], Operator::ToggleCase),
    operator(&[key('g'), key('q')], Operator::Reflow),
    // Visual aliases.
    visual_op(&[key('x')], Operator::Delete),
    visual_op(&[key('s')], Operator::Change),
    visual_op(&[key('~')], Operator::ToggleCase),
    visual_op(&[key('u')], Operator::Lowercase),
    visual_op(&[key('U')], Operator::Uppercase),
    // -- Text objects ---------------------------------------------------------------
    object(&[key('i'), key('w')], TextObject::Word { around: false }),
    object(&[key('a'), key('w')], TextObject::Word { around: true }),
    object(&[key('i'), key('W')], TextObject::BigWord { around: false }),
    object(&[key('a'), key('W')], TextObject::BigWord { around: true }),
    object(&[key('i'), key('"')], TextObject::Quote { delim: '"', around: false }),
    object(&[key('a'), key('"')], TextObject::Quote { delim: '"', around: true }),
    object(&[key('i'), key('\'')], TextObject::Quote { delim: '\'', around: false }),
    object(&[key('a'), key('\'')], TextObject::Quote { delim: '\'', around: true }),
    object(&[key('i'), key('`')], TextObject::Quote { delim: '`', around: false }),
    object(&[key('a'), key('`')], TextObject::Quote { delim: '`', around: true }),
    object(&[key('i'), key('(')], TextObject::Bracket { open: '(', close: ')', around: false }),
    object(&[key('i'), key(')')], TextObject::Bracket { open: '(', close: ')', around: false }),
    object(&[key('i'), key('b')], TextObject::Bracket { open: '(', close: ')', around: false }),
    object(&[key('a'), key('(')], TextObject::Bracket { open: '(', close: ')', around: true }),
    object(&[key('a'), key(')')], TextObject::Bracket { open: '(', close: ')', around: true }),
    object(&[key('a'), key('b')], TextObject::Bracket { open: '(', close: ')', around: true }),
    object(&[key('i'), key('[')], TextObject::Bracket { open: '[', close: ']', around: false }),
    object(&[key('i'), key(']')], TextObject::Bracket { open: '[', close: ']', around: false }),
    object(&[key('a'), key('[')], TextObject::Bracket { open: '[', close: ']', around: true }),
    object(&[key('a'), key(']')], TextObject::Bracket { open: '[', close: ']', around: true }),
    object(&[key('i'), key('{')], TextObject::Bracket { open: '{', close: '}', around: false }),
    object(&[key('i'), key('}')], TextObject::Bracket { open: '{', close: '}', around: false }),
    object(&[key('i'), key('B')], TextObject::Bracket { open: '{', close: '}', around: false }),
    object(&[key('a'), key('{')], TextObject::Bracket { open: '{', close: '}', around: true }),
    object(&[key('a'), key('}')], TextObject::Bracket { open: '{', close: '}', around: true }),
    object(&[key('a'), key('B')], TextObject::Bracket { open: '{', close: '}', around: true }),
    object(&[key('i'), key('<')], TextObject::Bracket { open: '<', close: '>', around: false }),
    object(&[key('i'), key('>')], TextObject::Bracket { open: '<', close: '>', around: false }),
    object(&[key('a'), key('<')], TextObject::Bracket { open: '<', close: '>', around: true }),
    object(&[key('a'), key('>')], TextObject::Bracket { open: '<', close: '>', around: true }),
    object(&[key('i'), key('p')], TextObject::Paragraph { around: false }),
    object(&[key('a'), key('p')], TextObject::Paragraph { around: true }),
    // -- Insert-entering commands ---------------------------------------------------
    command(&[key('i')], N, Command::InsertBefore),
    command(&[key('a')], N, Command::InsertAfter),
    command(&[key('I')], N, Command::InsertLineStart),
    command(&[key('A')], N, Command::InsertLineEnd),
    command(&[key('o')], N, Command::OpenBelow),
    command(&[key('O')], N, Command::OpenAbove),
    // -- Single-shot edits ------------------------------------------------------------
    command(&[key('x')], N, Command::DeleteCharForward),
    command(&[named(KeyCode::Delete)], N, Command::DeleteCharForward),
    command(&[key('X')], N, Command::DeleteCharBackward),
    command(&[key('D')], N, Command::DeleteToLineEnd),
    command(&[key('C')], N, Command::ChangeToLineEnd),
    command(&[key('S')], N, Command::ChangeLine),
    command(&[key('s')], N, Command::SubstituteChar),
    command(&[key('r'), Pat::Any], N, Command::ReplaceChar),
    command(&[key('R')], N, Command::EnterReplace),
    command(&[key('~')], N, Command::ToggleCaseChar),
    command(&[key('p')], NV, Command::PasteAfter),
    command(&[key('P')], NV, Command::PasteBefore),
    command(&[key('J')], NV, Command::JoinLines),
    // -- Visual mode -------------------------------------------------------------------
    command_once(&[key('v')], NV, Command::VisualChar),
    command_once(&[key('V')], NV, Command::VisualLine),
    command_once(&[ctrl('v')], NV, Command::VisualBlock),
    command(&[key('o')], V, Command::SwapVisualEnds),
    // -- Marks, macros, repeat ------------------------------------------------------------
    command_once(&[key('m'), Pat::Any], N, Command::SetMark),
    command_once(&[key('q'), Pat::Any], N, Command::RecordMacro),
    command_once(&[key('@'), key('@')], N, Command::RepeatLastMacro),
    command_once(&[key('@'), Pat::Any], N, Command::PlayMacro),
    command_once(&[key('.')], N, Command::RepeatChange),
    // -- Search and jumps ----------------------------------------------------------------
    command_once(&[key('/')], ModeSet::MOTION, Command::SearchForward),
    command_once(&[key('?')], ModeSet::MOTION, Command::SearchBackward),
    command_once(&[ctrl('o')], N, Command::JumpBack),
    command_once(&[ctrl('i')], N, Command::JumpForward),
    // -- Multi-cursor and label jump ----------------------------------------------------
    command_once(&[key('g'), key('b')], NV, Command::AddCursorAtNextMatch),
    command_once(&[key('g'), key('s')], N, Command::LabelJump),
];

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
