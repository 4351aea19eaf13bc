//! Composition — turning a motion or text object into an operator operand.
//!
//! Operators never see raw motion targets. A resolved target first passes
//! through here, where the motion's class decides the final shape:
//!
//! | class       | operand                                              |
//! |-------------|------------------------------------------------------|
//! | `Exclusive` | `[origin, target)` — the target char is not touched  |
//! | `Inclusive` | `[origin, target]` — widened one char past the target|
//! | `Linewise`  | whole lines from origin's line through target's line |
//!
//! Widening an inclusive end that already sits on the last char of a line
//! spills to the start of the next line, which is how `d$`-like operands come
//! to own the newline when the motion genuinely reaches past it.
//!
//! An empty operand is `None`: composing a motion that did not move produces
//! no span, and the command carrying it aborts instead of editing nothing.

use crate::position::{Position, Range};
use crate::register::RegisterKind;
use crate::traits::TextBuffer;

/// A composed operand: the range to act on plus how a register should
/// remember it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub range: Range,
    pub kind: RegisterKind,
}

/// How a motion behaves as an operator target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionClass {
    /// The target char stays outside the operand (`w`, `b`, `h`, `l`, …).
    Exclusive,
    /// The target char joins the operand (`e`, `f`, `$`, `%`).
    Inclusive,
    /// The operand widens to whole lines (`j`, `k`, `G`, `gg`, `{`, `}`).
    Linewise,
}

/// Compose a character-wise or line-wise span from a resolved motion.
///
/// Returns `None` when the operand would be empty — the target equals the
/// origin and no widening applies.
#[must_use]
pub fn motion_span(
    buf: &dyn TextBuffer,
    origin: Position,
    target: Position,
    class: MotionClass,
) -> Option<Span> {
    match class {
        MotionClass::Linewise => linewise_span(buf, origin.line, target.line),
        MotionClass::Exclusive => {
            if origin == target {
                return None;
            }
            Some(Span {
                range: Range::ordered(origin, target),
                kind: RegisterKind::Char,
            })
        }
        MotionClass::Inclusive => {
            let r = Range::ordered(origin, target);
            let end = inclusive_end(buf, r.end);
            if r.start == end {
                return None;
            }
            Some(Span {
                range: Range::new(r.start, end),
                kind: RegisterKind::Char,
            })
        }
    }
}

/// Whole-line span covering both given lines, in either order. The range runs
/// from column 0 of the first line to column 0 of the line after the last;
/// when the last line is the final line of the buffer the end stops at that
/// line's length instead (there is no line after to point into).
#[must_use]
pub fn linewise_span(buf: &dyn TextBuffer, a: usize, b: usize) -> Option<Span> {
    let first = a.min(b).min(buf.last_line());
    let last = a.max(b).min(buf.last_line());

    let start = Position::new(first, 0);
    let end = if last < buf.last_line() {
        Position::new(last + 1, 0)
    } else {
        Position::new(last, buf.line_len(last))
    };
    // A trailing empty line still yields an (empty) span — deleting it folds
    // into the preceding newline downstream. Only a truly empty buffer has
    // nothing to offer.
    if start == end && buf.is_empty() {
        return None;
    }
    Some(Span {
        range: Range::new(start, end),
        kind: RegisterKind::Line,
    })
}

/// Span for the doubled-operator form (`dd`, `yy`, `gUU`): `count` lines
/// starting at `line`, clamped to the end of the buffer.
#[must_use]
pub fn line_op_span(buf: &dyn TextBuffer, line: usize, count: usize) -> Option<Span> {
    if line > buf.last_line() {
        return None;
    }
    let last = line.saturating_add(count.max(1) - 1).min(buf.last_line());
    linewise_span(buf, line, last)
}

/// Widen an inclusive endpoint one char rightward. At the end of a line the
/// widening spills to the next line's column 0 (taking the newline); at the
/// very end of the buffer it stops at the line length.
#[must_use]
pub fn inclusive_end(buf: &dyn TextBuffer, pos: Position) -> Position {
    let len = buf.line_len(pos.line);
    if pos.col < len {
        pos.with_col(pos.col + 1)
    } else if pos.line < buf.last_line() {
        Position::new(pos.line + 1, 0)
    } else {
        pos.with_col(len)
    }
}

/// Resolve a text object `count` times, expanding outward.
///
/// The first application resolves at `pos`; each further application probes
/// just before the previous range's start (one or two chars back, stepping
/// over the object's own delimiter) and must strictly enclose and grow the
/// previous range, or the whole resolution fails. Only the final range
/// survives.
pub fn expand_object<F>(
    buf: &dyn TextBuffer,
    pos: Position,
    count: usize,
    resolve: F,
) -> Option<Range>
where
    F: Fn(&dyn TextBuffer, Position) -> Option<Range>,
{
    let mut range = resolve(buf, pos)?;
    for _ in 1..count.max(1) {
        let start_off = buf.offset_at(range.start);
        let mut grown = None;
        for back in 1..=2 {
            let Some(off) = start_off.checked_sub(back) else {
                break;
            };
            if let Some(next) = resolve(buf, buf.position_at(off)) {
                if next != range && next.encloses(range) {
                    grown = Some(next);
                    break;
                }
            }
        }
        range = grown?;
    }
    Some(range)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
