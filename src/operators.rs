//! Operator bodies — what each verb does to a composed span.
//!
//! Operators never mutate the buffer directly. [`plan`] turns an operator and
//! its span into an [`EditPlan`]: at most one replacement, a cursor target,
//! and the text a register should capture. The engine queues the plans of all
//! cursors through the transform queue and applies them together, so operator
//! bodies stay single-cursor and side-effect free.
//!
//! Paste and join produce their own plans ([`paste_plan`], [`join_plan`])
//! since they read registers and line seams rather than spans.
//!
//! Line-wise details worth knowing:
//!
//! - Deleting lines that reach the end of the buffer folds the range into the
//!   preceding newline, so no dangling empty line survives — but the register
//!   captures only the requested lines.
//! - Changing lines keeps one empty line open for Insert mode.
//! - Register text for line-wise spans is always newline-terminated.

use crate::action::Operator;
use crate::composer::Span;
use crate::multi_cursor::CursorTarget;
use crate::options::Options;
use crate::position::{Position, Range};
use crate::register::RegisterKind;
use crate::traits::TextBuffer;

/// The outcome of planning one operator over one span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditPlan {
    /// The buffer edit, if the operator edits at all (yank does not).
    pub replace: Option<(Range, String)>,
    /// Where the producing cursor lands.
    pub target: CursorTarget,
    /// Text for the register write, for register-writing operators.
    pub register_text: Option<String>,
    /// Insert mode follows (change-class operators).
    pub enters_insert: bool,
    /// After landing, snap the cursor to the line's first non-blank.
    pub linewise_cursor: bool,
}

/// Plan one operator application over one composed span.
#[must_use]
pub fn plan(op: Operator, buf: &dyn TextBuffer, span: Span, opts: &Options) -> EditPlan {
    match op {
        Operator::Delete => plan_delete(buf, span),
        Operator::Change => plan_change(buf, span),
        Operator::Yank => EditPlan {
            replace: None,
            target: CursorTarget::At(span.range.start),
            register_text: Some(register_text(buf, span)),
            enters_insert: false,
            linewise_cursor: false,
        },
        Operator::Indent => plan_reindent(buf, span, |line| indent_line(line, opts.shift_width)),
        Operator::Outdent => plan_reindent(buf, span, |line| outdent_line(line, opts.shift_width)),
        Operator::Lowercase => plan_recase(buf, span, |ch| ch.to_lowercase().collect()),
        Operator::Uppercase => plan_recase(buf, span, |ch| ch.to_uppercase().collect()),
        Operator::ToggleCase => plan_recase(buf, span, toggle_char),
        Operator::Reflow => plan_reflow(buf, span, opts.reflow_width()),
    }
}

fn plan_delete(buf: &dyn TextBuffer, span: Span) -> EditPlan {
    let register_text = Some(register_text(buf, span));
    let mut range = span.range;
    let linewise = span.kind == RegisterKind::Line;

    // Deleting whole lines through the end of the buffer also takes the
    // newline *before* them, so the previous line becomes the new last line.
    if linewise
        && range.start.line > 0
        && range.start.col == 0
        && range.end.line == buf.last_line()
        && range.end.col == buf.line_len(range.end.line)
    {
        let prev = range.start.line - 1;
        range = Range::new(Position::new(prev, buf.line_len(prev)), range.end);
    }

    EditPlan {
        replace: Some((range, String::new())),
        target: CursorTarget::Start,
        register_text,
        enters_insert: false,
        linewise_cursor: linewise,
    }
}

fn plan_change(buf: &dyn TextBuffer, span: Span) -> EditPlan {
    let register_text = Some(register_text(buf, span));
    let (replacement, target) = if span.kind == RegisterKind::Line {
        // Keep one empty line open for Insert. When the span owns a trailing
        // newline the replacement re-supplies it; otherwise emptying the
        // lines already leaves the empty line behind.
        let text = if covers_trailing_newline(span.range) {
            "\n".to_string()
        } else {
            String::new()
        };
        (text, CursorTarget::At(span.range.start))
    } else {
        (String::new(), CursorTarget::Start)
    };

    EditPlan {
        replace: Some((span.range, replacement)),
        target,
        register_text,
        enters_insert: true,
        linewise_cursor: false,
    }
}

fn plan_reindent(buf: &dyn TextBuffer, span: Span, f: impl Fn(&str) -> String) -> EditPlan {
    let (first, last) = span_lines(span.range);
    let lines: Vec<String> = (first..=last).map(|l| f(&buf.line_text(l))).collect();
    let fnb = lines
        .first()
        .map_or(0, |l| l.chars().position(|c| !c.is_whitespace()).unwrap_or(0));

    EditPlan {
        replace: Some((span.range, join_block(&lines, covers_trailing_newline(span.range)))),
        target: CursorTarget::At(Position::new(first, fnb)),
        register_text: None,
        enters_insert: false,
        linewise_cursor: false,
    }
}

fn plan_recase(buf: &dyn TextBuffer, span: Span, f: impl Fn(char) -> String) -> EditPlan {
    let text: String = buf
        .text(span.range)
        .chars()
        .map(|ch| if ch == '\n' { "\n".to_string() } else { f(ch) })
        .collect();

    EditPlan {
        replace: Some((span.range, text)),
        target: CursorTarget::Start,
        register_text: None,
        enters_insert: false,
        linewise_cursor: false,
    }
}

fn plan_reflow(buf: &dyn TextBuffer, span: Span, width: usize) -> EditPlan {
    let (first, last) = span_lines(span.range);
    let lines: Vec<String> = (first..=last).map(|l| buf.line_text(l)).collect();
    let wrapped = reflow_lines(&lines, width);

    EditPlan {
        replace: Some((span.range, join_block(&wrapped, covers_trailing_newline(span.range)))),
        target: CursorTarget::At(Position::new(first, 0)),
        register_text: None,
        enters_insert: false,
        linewise_cursor: true,
    }
}

// ---------------------------------------------------------------------------
// Paste
// ---------------------------------------------------------------------------

/// A planned paste: possibly several edits (block paste touches one line per
/// fragment) and the cursor landing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PastePlan {
    pub edits: Vec<(Range, String)>,
    pub target: CursorTarget,
}

/// Plan pasting register content at a cursor position.
///
/// `before` distinguishes `P` from `p`. Char-wise content goes inline, line
/// -wise content opens lines above/below, block-wise content reinserts its
/// fragments column-aligned on successive lines (padding short lines).
#[must_use]
pub fn paste_plan(
    buf: &dyn TextBuffer,
    pos: Position,
    content: &str,
    kind: RegisterKind,
    before: bool,
    count: usize,
) -> Option<PastePlan> {
    if content.is_empty() {
        return None;
    }
    let count = count.max(1);

    match kind {
        RegisterKind::Char => {
            let col = if before {
                pos.col
            } else {
                (pos.col + 1).min(buf.line_len(pos.line))
            };
            let at = Position::new(pos.line, col);
            Some(PastePlan {
                edits: vec![(Range::point(at), content.repeat(count))],
                target: CursorTarget::InsertLast,
            })
        }
        RegisterKind::Line => {
            let mut block = String::new();
            for _ in 0..count {
                block.push_str(content);
                if !block.ends_with('\n') {
                    block.push('\n');
                }
            }
            let fnb = content
                .lines()
                .next()
                .map_or(0, |l| l.chars().position(|c| !c.is_whitespace()).unwrap_or(0));

            if before {
                let at = Position::new(pos.line, 0);
                Some(PastePlan {
                    edits: vec![(Range::point(at), block)],
                    target: CursorTarget::At(Position::new(pos.line, fnb)),
                })
            } else if pos.line < buf.last_line() {
                let at = Position::new(pos.line + 1, 0);
                Some(PastePlan {
                    edits: vec![(Range::point(at), block)],
                    target: CursorTarget::At(Position::new(pos.line + 1, fnb)),
                })
            } else {
                // Below the final line: lead with a newline instead of
                // trailing one.
                block.pop();
                let at = Position::new(pos.line, buf.line_len(pos.line));
                Some(PastePlan {
                    edits: vec![(Range::point(at), format!("\n{block}"))],
                    target: CursorTarget::At(Position::new(pos.line + 1, fnb)),
                })
            }
        }
        RegisterKind::Block => {
            let mut fragments: Vec<&str> = Vec::new();
            for _ in 0..count {
                fragments.extend(content.split('\n'));
            }
            let col = if before { pos.col } else { pos.col + 1 };

            let mut edits = Vec::with_capacity(fragments.len());
            for (i, fragment) in fragments.iter().enumerate() {
                let line = pos.line + i;
                if line > buf.last_line() {
                    // Grow the buffer: new line with left padding.
                    let end = buf.position_at(buf.len_chars());
                    let pad = " ".repeat(col);
                    edits.push((Range::point(end), format!("\n{pad}{fragment}")));
                } else {
                    let len = buf.line_len(line);
                    if len < col {
                        let pad = " ".repeat(col - len);
                        edits.push((
                            Range::point(Position::new(line, len)),
                            format!("{pad}{fragment}"),
                        ));
                    } else {
                        edits.push((
                            Range::point(Position::new(line, col)),
                            (*fragment).to_string(),
                        ));
                    }
                }
            }
            Some(PastePlan {
                edits,
                target: CursorTarget::At(Position::new(pos.line, col)),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Join
// ---------------------------------------------------------------------------

/// Plan `J`: merge `count.max(2)` lines starting at `line` with single
/// spaces, dropping the joined lines' leading whitespace. Returns the edit
/// plus the seam position the cursor lands on, or `None` on the last line.
#[must_use]
pub fn join_plan(buf: &dyn TextBuffer, line: usize, count: usize) -> Option<(Range, String, Position)> {
    let last = line
        .saturating_add(count.max(2) - 1)
        .min(buf.last_line());
    if last == line {
        return None;
    }

    let mut merged = buf.line_text(line);
    let mut seam = merged.chars().count();
    for l in (line + 1)..=last {
        seam = merged.chars().count();
        let tail = buf.line_text(l);
        let tail = tail.trim_start();
        if !tail.is_empty() {
            if !merged.is_empty() && !merged.ends_with(' ') {
                merged.push(' ');
            }
            merged.push_str(tail);
        }
    }

    let range = Range::new(Position::new(line, 0), Position::new(last, buf.line_len(last)));
    Some((range, merged, Position::new(line, seam)))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Register capture for a span. Line-wise text is normalized to whole
/// newline-terminated lines regardless of how the range was shaped.
#[must_use]
pub fn register_text(buf: &dyn TextBuffer, span: Span) -> String {
    let mut text = buf.text(span.range);
    if span.kind == RegisterKind::Line {
        if text.starts_with('\n') {
            text.remove(0);
        }
        if !text.ends_with('\n') {
            text.push('\n');
        }
    }
    text
}

/// First and last line a (line-wise) span covers.
fn span_lines(range: Range) -> (usize, usize) {
    let last = if range.end.col == 0 && range.end.line > range.start.line {
        range.end.line - 1
    } else {
        range.end.line
    };
    (range.start.line, last)
}

/// True when the range's end points at the next line's column 0, i.e. the
/// span owns the trailing newline of its last line.
const fn covers_trailing_newline(range: Range) -> bool {
    range.end.col == 0 && range.end.line > range.start.line
}

fn join_block(lines: &[String], trailing_newline: bool) -> String {
    let mut text = lines.join("\n");
    if trailing_newline {
        text.push('\n');
    }
    text
}

fn indent_line(line: &str, width: usize) -> String {
    if line.is_empty() {
        String::new()
    } else {
        format!("{}{line}", " ".repeat(width))
    }
}

fn outdent_line(line: &str, width: usize) -> String {
    let mut removed = 0;
    let mut rest = line;
    while removed < width {
        match rest.chars().next() {
            Some(' ') => {
                rest = &rest[1..];
                removed += 1;
            }
            // A tab spans a whole shift; it only goes when the full shift
            // is still owed.
            Some('\t') if removed == 0 => {
                rest = &rest[1..];
                removed = width;
            }
            _ => break,
        }
    }
    rest.to_string()
}

pub(crate) fn toggle_char(ch: char) -> String {
    if ch.is_uppercase() {
        ch.to_lowercase().collect()
    } else if ch.is_lowercase() {
        ch.to_uppercase().collect()
    } else {
        ch.to_string()
    }
}

/// Greedy re-wrap. Paragraphs (separated by blank lines) re-wrap
/// independently; each keeps the indent of its first line. Blank lines
/// survive as-is.
fn reflow_lines(lines: &[String], width: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut para: Vec<&str> = Vec::new();

    let flush = |para: &mut Vec<&str>, out: &mut Vec<String>| {
        if para.is_empty() {
            return;
        }
        let indent: String = para[0].chars().take_while(|c| c.is_whitespace()).collect();
        let indent_w = indent.chars().count();
        let mut current = indent.clone();
        let mut current_w = indent_w;
        let mut has_word = false;

        for word in para.iter().flat_map(|l| l.split_whitespace()) {
            let w = word.chars().count();
            if has_word && current_w + 1 + w > width {
                out.push(std::mem::replace(&mut current, indent.clone()));
                current_w = indent_w;
                has_word = false;
            }
            if has_word {
                current.push(' ');
                current_w += 1;
            }
            current.push_str(word);
            current_w += w;
            has_word = true;
        }
        if has_word {
            out.push(current);
        }
        para.clear();
    };

    for line in lines {
        if line.trim().is_empty() {
            flush(&mut para, &mut out);
            out.push(line.clone());
        } else {
            para.push(line);
        }
    }
    flush(&mut para, &mut out);
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
