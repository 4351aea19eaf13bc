//! The engine — one key event in, buffer edits and state changes out.
//!
//! Everything else in the crate is a pure piece; this module wires them into
//! the command loop. Each key lands in exactly one handler, picked by the
//! engine's current state:
//!
//! | state                  | handler            |
//! |------------------------|--------------------|
//! | label overlay showing  | `overlay_key`      |
//! | `/` or `?` input open  | `search_input_key` |
//! | Insert or Replace mode | `insert_key`       |
//! | otherwise              | `normal_key`       |
//!
//! `normal_key` accumulates counts, a register prefix, and partial key
//! sequences in [`Pending`], resolves them through the keymap, and executes
//! the bound action. Operators wait in pending until a motion or text object
//! arrives, at which point the pair is composed into spans and run through
//! the operator planner — once per cursor, with all edits batched in a
//! [`TransformQueue`] so earlier edits shift later cursors correctly.
//!
//! Replays (dot and macros) feed remembered keys back through
//! [`handle_key`](Engine::handle_key); the recorders suspend themselves while
//! a replay is in flight, and the first reported error aborts the rest of the
//! replayed keys.

use crate::action::{Action, Command, Motion, Operator, TextObject};
use crate::composer::{self, MotionClass, Span};
use crate::cursor::Cursor;
use crate::cursor::CursorSet;
use crate::error::VimError;
use crate::key::{self, KeyCode, KeyEvent};
use crate::keymap::{self, MatchResult};
use crate::marks::{JumpList, MarkFile};
use crate::mode::{Mode, ModeSet, VisualKind};
use crate::multi_cursor::{CursorTarget, Transform, TransformQueue};
use crate::operators;
use crate::options::Options;
use crate::pending::Pending;
use crate::position::{Position, Range};
use crate::register::{RegisterFile, RegisterKind};
use crate::repeat::{DotRecorder, MacroRecorder, VisualShape};
use crate::search::{self, Direction, RegexSearcher, SearchState};
use crate::text_object;
use crate::traits::{FeedbackSink, NullFeedback, SearchProvider, TextBuffer};
use crate::word;

/// The command-language engine. Owns every piece of modal state; borrows the
/// buffer only for the duration of a key.
pub struct Engine {
    mode: Mode,
    cursors: CursorSet,
    pending: Pending,
    registers: RegisterFile,
    options: Options,
    search: SearchState,
    searcher: Box<dyn SearchProvider>,
    feedback: Box<dyn FeedbackSink>,
    /// Last `f`/`F`/`t`/`T`, for `;` and `,`.
    last_find: Option<(Motion, char)>,
    marks: MarkFile,
    jumps: JumpList,
    dot: DotRecorder,
    macros: MacroRecorder,
    /// Active label-jump targets, shown after `gs`.
    overlay: Option<Vec<(char, Position)>>,
    /// Set by the first error during a replay; stops the remaining keys.
    replay_abort: bool,
}

impl Engine {
    #[must_use]
    pub fn new() -> Self {
        debug_assert!(keymap::table_is_prefix_free(keymap::bindings()));
        Self {
            mode: Mode::Normal,
            cursors: CursorSet::new(),
            pending: Pending::new(),
            registers: RegisterFile::new(),
            options: Options::default(),
            search: SearchState::new(),
            searcher: Box::new(RegexSearcher),
            feedback: Box::new(NullFeedback),
            last_find: None,
            marks: MarkFile::new(),
            jumps: JumpList::new(),
            dot: DotRecorder::new(),
            macros: MacroRecorder::new(),
            overlay: None,
            replay_abort: false,
        }
    }

    // -- Accessors -----------------------------------------------------------

    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn primary_position(&self) -> Position {
        self.cursors.primary().position()
    }

    #[must_use]
    pub fn cursor_positions(&self) -> Vec<Position> {
        self.cursors.positions()
    }

    #[must_use]
    pub fn cursor_count(&self) -> usize {
        self.cursors.len()
    }

    /// Current selections, one per cursor that has an anchor.
    #[must_use]
    pub fn selections(&self) -> Vec<Range> {
        self.cursors.iter().filter_map(Cursor::selection).collect()
    }

    #[must_use]
    pub const fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    #[must_use]
    pub const fn options(&self) -> &Options {
        &self.options
    }

    pub fn set_options(&mut self, options: Options) {
        self.options = options;
    }

    pub fn set_feedback(&mut self, sink: Box<dyn FeedbackSink>) {
        self.feedback = sink;
    }

    pub fn set_searcher(&mut self, searcher: Box<dyn SearchProvider>) {
        self.searcher = searcher;
    }

    #[must_use]
    pub fn search_pattern(&self) -> &str {
        self.search.pattern()
    }

    #[must_use]
    pub fn is_recording_macro(&self) -> bool {
        self.macros.is_recording()
    }

    /// Move the primary cursor directly (host-driven, e.g. a mouse click).
    pub fn set_primary_position(&mut self, buf: &dyn TextBuffer, pos: Position) {
        let past_end = self.mode.cursor_past_end();
        self.cursors.primary_mut().set_position(pos, buf, past_end);
        self.cursors.merge();
    }

    // -- Key entry points ----------------------------------------------------

    /// Feed one key event through the engine.
    pub fn handle_key(&mut self, buf: &mut dyn TextBuffer, key: KeyEvent) {
        if self.macros.is_recording() && !self.replaying() {
            // A bare `q` outside any pending input ends the recording; the
            // terminating key itself is not stored.
            if self.overlay.is_none()
                && !self.search.is_inputting()
                && !self.mode.is_input()
                && self.pending.is_empty()
                && key == KeyEvent::char('q')
            {
                if let Some(name) = self.macros.stop() {
                    self.feedback.message(&format!("recorded @{name}"));
                }
                return;
            }
            self.macros.push(key);
        }

        if self.overlay.is_some() {
            self.overlay_key(buf, key);
        } else if self.search.is_inputting() {
            self.search_input_key(buf, key);
        } else if self.mode.is_input() {
            self.insert_key(buf, key);
        } else {
            self.normal_key(buf, key);
        }
    }

    /// Feed a run of key events.
    pub fn handle_keys(&mut self, buf: &mut dyn TextBuffer, keys: &[KeyEvent]) {
        for &k in keys {
            self.handle_key(buf, k);
        }
    }

    /// Feed keys written in angle-bracket notation (`"dw"`, `"ciw<Esc>"`).
    pub fn feed_str(&mut self, buf: &mut dyn TextBuffer, notation: &str) {
        self.handle_keys(buf, &key::parse_notation(notation));
    }

    // -- Normal / visual dispatch --------------------------------------------

    fn normal_key(&mut self, buf: &mut dyn TextBuffer, key: KeyEvent) {
        if key.code == KeyCode::Escape {
            self.cancel();
            return;
        }
        if self.pending.awaiting_register() {
            match key.text_char() {
                Some(ch) => self.pending.set_register(ch),
                None => self.pending.clear(),
            }
            return;
        }
        if self.pending.keys().is_empty() {
            if let Some(ch) = key.text_char() {
                if ch.is_ascii_digit() && (ch != '0' || self.pending.counting()) {
                    self.pending.push_digit(ch as u8 - b'0');
                    return;
                }
                if ch == '"' && self.pending.operator().is_none() {
                    self.pending.begin_register();
                    return;
                }
            }
        }

        self.pending.push_key(key);
        let context = ModeSet::current(self.mode, self.pending.operator().is_some());
        match keymap::lookup(self.pending.keys(), context) {
            MatchResult::Partial => {}
            MatchResult::Unique { binding, captures } => {
                let action = binding.action;
                let matched = self.pending.take_keys();
                self.execute(buf, action, &captures, matched);
            }
            MatchResult::NoMatch => {
                let doubled = self.pending.operator().is_some_and(|st| {
                    let keys = self.pending.keys();
                    keys.len() == 1 && keys[0] == st.doubled
                });
                if doubled {
                    let matched = self.pending.take_keys();
                    if let Some(st) = self.pending.operator() {
                        self.dot.extend(&matched);
                        self.run_line_operator(buf, st.op);
                    }
                } else if self.pending.operator().is_some() {
                    self.abort_command();
                } else {
                    self.pending.discard_keys();
                }
            }
        }
    }

    fn execute(
        &mut self,
        buf: &mut dyn TextBuffer,
        action: Action,
        captures: &[KeyEvent],
        matched: Vec<KeyEvent>,
    ) {
        match action {
            Action::Motion(motion) => {
                let arg = captures.first().and_then(|k| k.text_char());
                if motion.takes_char() && arg.is_none() {
                    self.abort_command();
                    return;
                }
                if self.pending.operator().is_some() {
                    self.compose_motion(buf, motion, arg, matched);
                } else {
                    self.move_cursors(buf, motion, arg);
                }
            }
            Action::Operator(op) => {
                if self.mode.is_visual() {
                    self.run_visual_operator(buf, op, matched);
                } else {
                    let doubled = matched.last().copied().unwrap_or(KeyEvent::esc());
                    self.dot.begin(matched);
                    self.pending.set_operator(op, doubled);
                }
            }
            Action::Object(obj) => {
                if self.pending.operator().is_some() {
                    self.compose_object(buf, obj, matched);
                } else if self.mode.is_visual() {
                    self.select_object(buf, obj);
                }
            }
            Action::Command(cmd) => self.run_command(buf, cmd, captures, matched),
        }
    }

    /// Escape in normal or visual mode: drop the innermost layer of state.
    fn cancel(&mut self) {
        if !self.pending.is_empty() {
            self.pending.clear();
            self.dot.cancel();
        } else if self.mode.is_visual() {
            self.mode = Mode::Normal;
            self.cursors.clear_anchors();
        } else {
            self.cursors.collapse_to_primary();
        }
    }

    // -- Motions -------------------------------------------------------------

    fn move_cursors(&mut self, buf: &mut dyn TextBuffer, motion: Motion, arg: Option<char>) {
        let count = self.pending.effective_count();
        let origins: Vec<(usize, Position, usize)> = self
            .cursors
            .iter()
            .enumerate()
            .map(|(i, c)| (i, c.position(), c.sticky_col()))
            .collect();

        let mut targets: Vec<(usize, Position)> = Vec::new();
        for &(idx, origin, sticky) in &origins {
            match self.motion_target(&*buf, origin, sticky, motion, arg, count, false) {
                Err(err) => {
                    self.report(err);
                    self.pending.clear();
                    return;
                }
                Ok(None) => {}
                Ok(Some((pos, _))) => targets.push((idx, pos)),
            }
        }

        if is_jump(motion) && targets.iter().any(|&(i, _)| i == 0) {
            self.jumps.push(self.cursors.primary().position());
        }

        let past_end = self.mode.cursor_past_end();
        let keeps = motion.keeps_sticky();
        for (idx, pos) in targets {
            if let Some(c) = self.cursors.get_mut(idx) {
                c.apply_motion(pos, keeps, &*buf, past_end);
            }
        }
        self.cursors.merge();
        self.pending.take_count();
    }

    /// Resolve one motion for one cursor. `Ok(None)` means the motion could
    /// not move (not an error: `j` on the last line just stays put).
    #[allow(clippy::too_many_lines)]
    fn motion_target(
        &mut self,
        buf: &dyn TextBuffer,
        origin: Position,
        sticky: usize,
        motion: Motion,
        arg: Option<char>,
        count: Option<usize>,
        op_pending: bool,
    ) -> Result<Option<(Position, MotionClass)>, VimError> {
        let n = count.unwrap_or(1).max(1);
        match motion {
            Motion::Left => {
                let mut p = origin;
                for _ in 0..n {
                    if p.col > 0 {
                        p.col -= 1;
                    } else if self.options.which_wrap_h_l && p.line > 0 {
                        p.line -= 1;
                        p.col = buf.line_len(p.line);
                    } else {
                        break;
                    }
                }
                Ok(Some((p, MotionClass::Exclusive)))
            }
            Motion::Right => {
                let mut p = origin;
                for _ in 0..n {
                    // As a movement the limit is the last character; as an
                    // operator target it is one past, so `dl` takes the char
                    // under the cursor.
                    let limit = if op_pending {
                        buf.line_len(p.line)
                    } else {
                        buf.max_col(p.line, self.mode.cursor_past_end())
                    };
                    if p.col < limit {
                        p.col += 1;
                    } else if self.options.which_wrap_h_l && p.line < buf.last_line() {
                        p.line += 1;
                        p.col = 0;
                    } else {
                        break;
                    }
                }
                Ok(Some((p, MotionClass::Exclusive)))
            }
            Motion::Up => {
                if origin.line == 0 {
                    return Ok(None);
                }
                let line = origin.line.saturating_sub(n);
                Ok(Some((Position::new(line, sticky), MotionClass::Linewise)))
            }
            Motion::Down => {
                if origin.line >= buf.last_line() {
                    return Ok(None);
                }
                let line = (origin.line + n).min(buf.last_line());
                Ok(Some((Position::new(line, sticky), MotionClass::Linewise)))
            }
            Motion::LineStart => Ok(Some((
                Position::new(origin.line, 0),
                MotionClass::Exclusive,
            ))),
            Motion::FirstNonBlank => Ok(Some((
                Position::new(origin.line, buf.first_non_blank(origin.line)),
                MotionClass::Exclusive,
            ))),
            Motion::LineEnd => {
                let line = (origin.line + n - 1).min(buf.last_line());
                let len = buf.line_len(line);
                if len == 0 {
                    Ok(Some((Position::new(line, 0), MotionClass::Exclusive)))
                } else {
                    Ok(Some((Position::new(line, len - 1), MotionClass::Inclusive)))
                }
            }
            Motion::WordForward | Motion::BigWordForward => {
                let step: fn(&dyn TextBuffer, Position) -> Position =
                    if matches!(motion, Motion::WordForward) {
                        word::word_forward
                    } else {
                        word::big_word_forward
                    };
                let mut prev = origin;
                let mut cur = origin;
                let mut stuck = false;
                for _ in 0..n {
                    prev = cur;
                    cur = step(buf, cur);
                    if cur == prev {
                        stuck = true;
                        break;
                    }
                }
                if op_pending {
                    // An operator's final `w` never runs onto the next line,
                    // and at the last word of the buffer it takes the rest of
                    // the line instead of going nowhere.
                    let eol = Position::new(prev.line, buf.line_len(prev.line));
                    if stuck || (cur.line > prev.line && eol > prev) {
                        cur = eol;
                    }
                }
                Ok(Some((cur, MotionClass::Exclusive)))
            }
            Motion::WordBackward | Motion::BigWordBackward => {
                let step: fn(&dyn TextBuffer, Position) -> Position =
                    if matches!(motion, Motion::WordBackward) {
                        word::word_backward
                    } else {
                        word::big_word_backward
                    };
                let mut cur = origin;
                for _ in 0..n {
                    let next = step(buf, cur);
                    if next == cur {
                        break;
                    }
                    cur = next;
                }
                Ok(Some((cur, MotionClass::Exclusive)))
            }
            Motion::WordEndForward | Motion::BigWordEndForward => {
                let step: fn(&dyn TextBuffer, Position) -> Position =
                    if matches!(motion, Motion::WordEndForward) {
                        word::word_end_forward
                    } else {
                        word::big_word_end_forward
                    };
                let mut cur = origin;
                for _ in 0..n {
                    let next = step(buf, cur);
                    if next == cur {
                        break;
                    }
                    cur = next;
                }
                Ok(Some((cur, MotionClass::Inclusive)))
            }
            Motion::FirstLine => {
                let line = count.map_or(0, |c| c.saturating_sub(1)).min(buf.last_line());
                Ok(Some((
                    Position::new(line, buf.first_non_blank(line)),
                    MotionClass::Linewise,
                )))
            }
            Motion::LastLine => {
                let line = count
                    .map_or(buf.last_line(), |c| c.saturating_sub(1))
                    .min(buf.last_line());
                Ok(Some((
                    Position::new(line, buf.first_non_blank(line)),
                    MotionClass::Linewise,
                )))
            }
            Motion::ParagraphForward => {
                let mut line = origin.line;
                for _ in 0..n {
                    line = next_paragraph(buf, line);
                }
                if line == origin.line {
                    return Ok(None);
                }
                Ok(Some((Position::new(line, 0), MotionClass::Exclusive)))
            }
            Motion::ParagraphBackward => {
                let mut line = origin.line;
                for _ in 0..n {
                    line = prev_paragraph(buf, line);
                }
                if line == origin.line {
                    return Ok(None);
                }
                Ok(Some((Position::new(line, 0), MotionClass::Exclusive)))
            }
            Motion::MatchPair => Ok(text_object::matching_bracket(buf, origin)
                .map(|pos| (pos, MotionClass::Inclusive))),
            Motion::FindForward
            | Motion::FindBackward
            | Motion::TillForward
            | Motion::TillBackward => {
                let Some(target) = arg else { return Ok(None) };
                self.last_find = Some((motion, target));
                Ok(resolve_find(buf, origin, motion, target, n))
            }
            Motion::RepeatFind => {
                let Some((m, target)) = self.last_find else {
                    return Ok(None);
                };
                Ok(resolve_find(buf, origin, m, target, n))
            }
            Motion::RepeatFindReverse => {
                let Some((m, target)) = self.last_find else {
                    return Ok(None);
                };
                let reversed = match m {
                    Motion::FindForward => Motion::FindBackward,
                    Motion::FindBackward => Motion::FindForward,
                    Motion::TillForward => Motion::TillBackward,
                    Motion::TillBackward => Motion::TillForward,
                    other => other,
                };
                Ok(resolve_find(buf, origin, reversed, target, n))
            }
            Motion::SearchNext | Motion::SearchPrev => {
                if !self.search.has_pattern() {
                    return Err(VimError::PatternNotFound(String::new()));
                }
                let pattern = self.search.pattern().to_string();
                let ignore = self.options.search_ignores_case(&pattern);
                let matches = self.searcher.find_all(buf, &pattern, ignore)?;
                let dir = if matches!(motion, Motion::SearchNext) {
                    self.search.direction()
                } else {
                    self.search.direction().opposite()
                };
                let mut at = origin;
                for _ in 0..n {
                    let Some(m) = search::next_match(&matches, at, dir, self.options.wrap_scan)
                    else {
                        return Err(VimError::PatternNotFound(pattern));
                    };
                    at = m.start;
                }
                Ok(Some((at, MotionClass::Exclusive)))
            }
            Motion::SearchWordForward | Motion::SearchWordBackward => {
                let Some(w) = word_under_cursor(buf, origin) else {
                    return Err(VimError::PatternNotFound(String::new()));
                };
                let pattern = search::word_pattern(&w);
                let dir = if matches!(motion, Motion::SearchWordForward) {
                    Direction::Forward
                } else {
                    Direction::Backward
                };
                self.search.set_pattern(pattern.clone(), dir);
                let ignore = self.options.search_ignores_case(&pattern);
                let matches = self.searcher.find_all(buf, &pattern, ignore)?;
                let mut at = origin;
                for _ in 0..n {
                    let Some(m) = search::next_match(&matches, at, dir, self.options.wrap_scan)
                    else {
                        return Err(VimError::PatternNotFound(pattern));
                    };
                    at = m.start;
                }
                Ok(Some((at, MotionClass::Exclusive)))
            }
            Motion::GotoMark => {
                let Some(name) = arg else { return Ok(None) };
                let pos = self.marks.get(name).ok_or(VimError::MarkNotSet(name))?;
                Ok(Some((pos, MotionClass::Exclusive)))
            }
            Motion::GotoMarkLine => {
                let Some(name) = arg else { return Ok(None) };
                let pos = self.marks.get(name).ok_or(VimError::MarkNotSet(name))?;
                let line = pos.line.min(buf.last_line());
                Ok(Some((
                    Position::new(line, buf.first_non_blank(line)),
                    MotionClass::Linewise,
                )))
            }
        }
    }

    // -- Operator composition ------------------------------------------------

    fn compose_motion(
        &mut self,
        buf: &mut dyn TextBuffer,
        motion: Motion,
        arg: Option<char>,
        matched: Vec<KeyEvent>,
    ) {
        let Some(st) = self.pending.operator() else {
            return;
        };
        let count = self.pending.effective_count();
        let origins: Vec<(Position, usize)> = self
            .cursors
            .iter()
            .map(|c| (c.position(), c.sticky_col()))
            .collect();

        let mut specs: Vec<(usize, Span)> = Vec::new();
        for (idx, &(origin, sticky)) in origins.iter().enumerate() {
            // `cw` on a word acts like `ce`: the trailing whitespace stays.
            let is_cw = st.op == Operator::Change
                && matches!(motion, Motion::WordForward | Motion::BigWordForward)
                && !self.options.change_word_eats_whitespace
                && buf.char_at(origin).is_some_and(|ch| !ch.is_whitespace());
            let resolved = if is_cw {
                let step: fn(&dyn TextBuffer, Position) -> Position =
                    if matches!(motion, Motion::WordForward) {
                        word::word_end_forward
                    } else {
                        word::big_word_end_forward
                    };
                let mut cur = origin;
                for _ in 0..count.unwrap_or(1).max(1) {
                    cur = step(&*buf, cur);
                }
                Ok(Some((cur, MotionClass::Inclusive)))
            } else {
                self.motion_target(&*buf, origin, sticky, motion, arg, count, true)
            };

            match resolved {
                Err(err) => {
                    self.report(err);
                    self.abort_command();
                    return;
                }
                Ok(None) => {
                    self.abort_command();
                    return;
                }
                Ok(Some((target, class))) => {
                    let class = if st.op.forces_linewise() {
                        MotionClass::Linewise
                    } else {
                        class
                    };
                    let Some(span) = composer::motion_span(&*buf, origin, target, class) else {
                        self.abort_command();
                        return;
                    };
                    specs.push((idx, span));
                }
            }
        }

        self.dot.extend(&matched);
        self.run_operator(buf, st.op, specs, None);
    }

    fn compose_object(&mut self, buf: &mut dyn TextBuffer, obj: TextObject, matched: Vec<KeyEvent>) {
        let Some(st) = self.pending.operator() else {
            return;
        };
        let count = self.pending.effective_count().unwrap_or(1);
        let origins: Vec<Position> = self.cursors.iter().map(Cursor::position).collect();

        let mut specs: Vec<(usize, Span)> = Vec::new();
        for (idx, &origin) in origins.iter().enumerate() {
            let Some(range) = object_range(&*buf, origin, obj, count) else {
                self.abort_command();
                return;
            };
            let span = if st.op.forces_linewise() || obj.is_linewise() {
                let end_line = if range.end.col == 0 && range.end.line > range.start.line {
                    range.end.line - 1
                } else {
                    range.end.line
                };
                let Some(span) = composer::linewise_span(&*buf, range.start.line, end_line) else {
                    self.abort_command();
                    return;
                };
                span
            } else {
                Span {
                    range,
                    kind: RegisterKind::Char,
                }
            };
            specs.push((idx, span));
        }

        self.dot.extend(&matched);
        self.run_operator(buf, st.op, specs, None);
    }

    /// The doubled form: `dd`, `yy`, `cc` (via `S`), `gUU`, …
    fn run_line_operator(&mut self, buf: &mut dyn TextBuffer, op: Operator) {
        let count = self.pending.effective_count().unwrap_or(1);
        let mut specs: Vec<(usize, Span)> = Vec::new();
        for (idx, c) in self.cursors.iter().enumerate() {
            if let Some(span) = composer::line_op_span(&*buf, c.line(), count) {
                specs.push((idx, span));
            }
        }
        self.run_operator(buf, op, specs, None);
    }

    fn run_visual_operator(&mut self, buf: &mut dyn TextBuffer, op: Operator, matched: Vec<KeyEvent>) {
        match self.mode {
            Mode::Visual(VisualKind::Block) => self.run_block_visual_operator(buf, op, matched),
            Mode::Visual(kind) => self.run_charline_visual_operator(buf, op, kind, matched),
            _ => {}
        }
    }

    fn run_charline_visual_operator(
        &mut self,
        buf: &mut dyn TextBuffer,
        op: Operator,
        kind: VisualKind,
        matched: Vec<KeyEvent>,
    ) {
        let mut specs: Vec<(usize, Span)> = Vec::new();
        let mut shape = None;
        for (idx, c) in self.cursors.iter().enumerate() {
            let sel = c.selection().unwrap_or_else(|| Range::point(c.position()));
            let span = if kind == VisualKind::Line {
                composer::linewise_span(&*buf, sel.start.line, sel.end.line)
            } else {
                let end = composer::inclusive_end(&*buf, sel.end);
                (sel.start != end).then_some(Span {
                    range: Range::new(sel.start, end),
                    kind: RegisterKind::Char,
                })
            };
            let Some(span) = span else { continue };
            if idx == 0 {
                let lines = sel.end.line - sel.start.line + 1;
                let cols = if lines == 1 {
                    sel.end.col - sel.start.col
                } else {
                    sel.end.col
                };
                shape = Some(VisualShape { kind, lines, cols });
            }
            specs.push((idx, span));
        }

        self.dot.begin(matched);
        if let Some(s) = shape {
            self.dot.set_shape(s);
        }
        self.run_operator(buf, op, specs, None);
    }

    /// Block-visual operators collapse to the primary cursor and act on one
    /// column range per covered line. A block change opens Insert at the
    /// top-left fragment only.
    fn run_block_visual_operator(
        &mut self,
        buf: &mut dyn TextBuffer,
        op: Operator,
        matched: Vec<KeyEvent>,
    ) {
        self.cursors.collapse_to_primary();
        let c = self.cursors.primary();
        let pos = c.position();
        let anchor = c.anchor().unwrap_or(pos);
        let (top, bot) = (pos.line.min(anchor.line), pos.line.max(anchor.line));
        let (lo, hi) = (pos.col.min(anchor.col), pos.col.max(anchor.col));

        let mut specs: Vec<(usize, Span)> = Vec::new();
        for line in top..=bot {
            let len = buf.line_len(line);
            if len == 0 || lo >= len {
                continue;
            }
            specs.push((
                0,
                Span {
                    range: Range::new(
                        Position::new(line, lo),
                        Position::new(line, (hi + 1).min(len)),
                    ),
                    kind: RegisterKind::Char,
                },
            ));
        }

        self.dot.begin(matched);
        self.dot.set_shape(VisualShape {
            kind: VisualKind::Block,
            lines: bot - top + 1,
            cols: hi - lo,
        });
        self.run_operator(buf, op, specs, Some(RegisterKind::Block));
    }

    /// The common operator tail: write registers, apply the planned edits,
    /// land the cursors, settle mode and the dot register.
    fn run_operator(
        &mut self,
        buf: &mut dyn TextBuffer,
        op: Operator,
        specs: Vec<(usize, Span)>,
        kind_override: Option<RegisterKind>,
    ) {
        if specs.is_empty() {
            self.abort_command();
            return;
        }
        let register = self.pending.register();
        let count = self.pending.effective_count();

        let mut queue = TransformQueue::new();
        let mut yank_targets: Vec<(usize, Position)> = Vec::new();
        let mut parts: Vec<String> = Vec::new();
        let mut enters_insert = false;
        let mut linewise_cursor = false;
        for &(idx, span) in &specs {
            let plan = operators::plan(op, &*buf, span, &self.options);
            enters_insert |= plan.enters_insert;
            linewise_cursor |= plan.linewise_cursor;
            if let Some(text) = plan.register_text {
                parts.push(text);
            }
            if let Some((range, text)) = plan.replace {
                queue.push(Transform {
                    cursor: idx,
                    range,
                    text,
                    target: plan.target,
                });
            } else if let CursorTarget::At(pos) = plan.target {
                yank_targets.push((idx, pos));
            }
        }

        if op.writes_register() {
            let kind = kind_override.unwrap_or(specs[0].1.kind);
            let text = if kind == RegisterKind::Line {
                parts.concat()
            } else {
                parts.join("\n")
            };
            if op == Operator::Yank {
                self.registers.record_yank(register, text, kind);
            } else {
                self.registers.record_delete(register, text, kind);
            }
            if kind == RegisterKind::Line {
                let range = specs[0].1.range;
                let lines = (range.end.line - range.start.line) + usize::from(range.end.col != 0);
                self.feedback.lines_changed(lines.max(1));
            }
        }

        let past_end = enters_insert;
        if queue.is_empty() {
            let mut placed = vec![false; self.cursors.len()];
            for (idx, pos) in yank_targets {
                if let Some(flag) = placed.get_mut(idx) {
                    if !*flag {
                        *flag = true;
                        if let Some(c) = self.cursors.get_mut(idx) {
                            c.set_position(pos, &*buf, past_end);
                        }
                    }
                }
            }
            self.cursors.merge();
        } else {
            let landed = queue.apply(&mut *buf);
            self.land_cursors(landed, &*buf, past_end);
        }

        self.cursors.clear_anchors();
        self.cursors.clamp_all(&*buf, past_end);
        if linewise_cursor {
            let snaps: Vec<(usize, Position)> = self
                .cursors
                .iter()
                .enumerate()
                .map(|(i, c)| (i, Position::new(c.line(), buf.first_non_blank(c.line()))))
                .collect();
            for (i, pos) in snaps {
                if let Some(c) = self.cursors.get_mut(i) {
                    c.set_position_unchecked(pos);
                }
            }
        }

        if op == Operator::Yank {
            self.dot.cancel();
        } else {
            self.dot.set_count(count);
            self.dot.set_register(register);
            if !enters_insert {
                self.dot.finish();
            }
        }
        self.mode = if enters_insert { Mode::Insert } else { Mode::Normal };
        self.pending.clear();
    }

    /// Select a text object in visual mode: anchor at its start, cursor on
    /// its last character.
    fn select_object(&mut self, buf: &mut dyn TextBuffer, obj: TextObject) {
        let count = self.pending.effective_count().unwrap_or(1);
        let origins: Vec<(usize, Position)> = self
            .cursors
            .iter()
            .enumerate()
            .map(|(i, c)| (i, c.position()))
            .collect();

        for (idx, origin) in origins {
            let Some(range) = object_range(&*buf, origin, obj, count) else {
                continue;
            };
            let last = if range.end.col == 0 && range.end.line > range.start.line {
                let line = range.end.line - 1;
                Position::new(line, buf.line_len(line).saturating_sub(1))
            } else {
                Position::new(range.end.line, range.end.col.saturating_sub(1))
            };
            if let Some(c) = self.cursors.get_mut(idx) {
                c.set_position_unchecked(range.start);
                c.set_anchor();
                c.set_position(last, &*buf, false);
            }
        }
        self.cursors.merge();
        self.pending.take_count();
    }

    // -- Commands ------------------------------------------------------------

    #[allow(clippy::too_many_lines)]
    fn run_command(
        &mut self,
        buf: &mut dyn TextBuffer,
        cmd: Command,
        captures: &[KeyEvent],
        matched: Vec<KeyEvent>,
    ) {
        let count = self.pending.effective_count();
        let register = self.pending.register();
        let arg = captures.first().and_then(|k| k.text_char());

        match cmd {
            Command::InsertBefore => self.begin_insert(matched, count, register),
            Command::InsertAfter => {
                let targets: Vec<(usize, Position)> = self
                    .cursors
                    .iter()
                    .enumerate()
                    .map(|(i, c)| (i, Position::new(c.line(), c.col() + 1)))
                    .collect();
                for (i, pos) in targets {
                    if let Some(c) = self.cursors.get_mut(i) {
                        c.set_position(pos, &*buf, true);
                    }
                }
                self.begin_insert(matched, count, register);
            }
            Command::InsertLineStart => {
                let targets: Vec<(usize, Position)> = self
                    .cursors
                    .iter()
                    .enumerate()
                    .map(|(i, c)| (i, Position::new(c.line(), buf.first_non_blank(c.line()))))
                    .collect();
                for (i, pos) in targets {
                    if let Some(c) = self.cursors.get_mut(i) {
                        c.set_position(pos, &*buf, true);
                    }
                }
                self.begin_insert(matched, count, register);
            }
            Command::InsertLineEnd => {
                let targets: Vec<(usize, Position)> = self
                    .cursors
                    .iter()
                    .enumerate()
                    .map(|(i, c)| (i, Position::new(c.line(), buf.line_len(c.line()))))
                    .collect();
                for (i, pos) in targets {
                    if let Some(c) = self.cursors.get_mut(i) {
                        c.set_position(pos, &*buf, true);
                    }
                }
                self.begin_insert(matched, count, register);
            }
            Command::OpenBelow => self.open_line(buf, true, matched),
            Command::OpenAbove => self.open_line(buf, false, matched),
            Command::DeleteCharForward => self.delete_chars(buf, true, matched),
            Command::DeleteCharBackward => self.delete_chars(buf, false, matched),
            Command::DeleteToLineEnd => self.kill_to_line_end(buf, false, matched),
            Command::ChangeToLineEnd => self.kill_to_line_end(buf, true, matched),
            Command::ChangeLine => {
                self.dot.begin(matched);
                self.run_line_operator(buf, Operator::Change);
            }
            Command::SubstituteChar => {
                self.dot.begin(matched);
                let n = count.unwrap_or(1);
                let mut specs: Vec<(usize, Span)> = Vec::new();
                for (idx, c) in self.cursors.iter().enumerate() {
                    let p = c.position();
                    let len = buf.line_len(p.line);
                    let end = (p.col + n).min(len);
                    specs.push((
                        idx,
                        Span {
                            range: Range::new(p, Position::new(p.line, end)),
                            kind: RegisterKind::Char,
                        },
                    ));
                }
                self.run_operator(buf, Operator::Change, specs, None);
            }
            Command::ReplaceChar => {
                if let Some(ch) = arg {
                    self.replace_chars(buf, ch, matched);
                }
            }
            Command::EnterReplace => {
                self.dot.begin(matched);
                self.dot.set_count(count);
                self.dot.set_register(register);
                self.mode = Mode::Replace;
            }
            Command::ToggleCaseChar => self.toggle_case_chars(buf, matched),
            Command::PasteAfter => {
                self.paste(buf, false, matched);
                return;
            }
            Command::PasteBefore => {
                self.paste(buf, true, matched);
                return;
            }
            Command::JoinLines => self.join_lines(buf, matched),
            Command::VisualChar => self.toggle_visual(VisualKind::Char),
            Command::VisualLine => self.toggle_visual(VisualKind::Line),
            Command::VisualBlock => self.toggle_visual(VisualKind::Block),
            Command::SwapVisualEnds => {
                for c in self.cursors.iter_mut() {
                    c.swap_anchor();
                }
            }
            Command::SetMark => {
                if let Some(name) = arg {
                    self.marks.set(name, self.cursors.primary().position());
                }
            }
            Command::RecordMacro => {
                if let Some(name) = arg {
                    if self.macros.start(name) {
                        self.feedback.message(&format!("recording @{name}"));
                    }
                }
            }
            Command::PlayMacro => {
                self.pending.clear();
                if let Some(name) = arg {
                    self.play_macro(buf, name, count.unwrap_or(1));
                }
                return;
            }
            Command::RepeatLastMacro => {
                self.pending.clear();
                match self.macros.last_played() {
                    Some(name) => self.play_macro(buf, name, count.unwrap_or(1)),
                    None => self.report(VimError::NoPreviousMacro),
                }
                return;
            }
            Command::RepeatChange => {
                self.pending.clear();
                self.repeat_last_change(buf, count);
                return;
            }
            Command::SearchForward | Command::SearchBackward => {
                let dir = if matches!(cmd, Command::SearchForward) {
                    Direction::Forward
                } else {
                    Direction::Backward
                };
                // A pending operator stays pending: `d/foo<CR>` composes on
                // confirmation.
                if self.pending.operator().is_some() {
                    self.dot.extend(&matched);
                }
                self.search
                    .begin_input(dir, self.cursors.primary().position());
                return;
            }
            Command::JumpBack => {
                let current = self.cursors.primary().position();
                if let Some(pos) = self.jumps.back(current) {
                    self.cursors.primary_mut().set_position(pos, &*buf, false);
                    self.cursors.merge();
                }
            }
            Command::JumpForward => {
                if let Some(pos) = self.jumps.forward() {
                    self.cursors.primary_mut().set_position(pos, &*buf, false);
                    self.cursors.merge();
                }
            }
            Command::AddCursorAtNextMatch => self.add_cursor_at_next_match(&*buf),
            Command::LabelJump => self.start_label_jump(&*buf),
        }
        self.pending.clear();
    }

    fn begin_insert(&mut self, matched: Vec<KeyEvent>, count: Option<usize>, register: Option<char>) {
        self.mode = Mode::Insert;
        self.dot.begin(matched);
        self.dot.set_count(count);
        self.dot.set_register(register);
    }

    fn open_line(&mut self, buf: &mut dyn TextBuffer, below: bool, matched: Vec<KeyEvent>) {
        let count = self.pending.effective_count();
        let register = self.pending.register();
        self.begin_insert(matched, count, register);

        let mut queue = TransformQueue::new();
        for (idx, c) in self.cursors.iter().enumerate() {
            let line = c.line();
            let (range, target) = if below {
                (
                    Range::point(Position::new(line, buf.line_len(line))),
                    CursorTarget::InsertEnd,
                )
            } else {
                (
                    Range::point(Position::new(line, 0)),
                    CursorTarget::At(Position::new(line, 0)),
                )
            };
            queue.push(Transform {
                cursor: idx,
                range,
                text: "\n".to_string(),
                target,
            });
        }
        let landed = queue.apply(&mut *buf);
        self.land_cursors(landed, &*buf, true);
    }

    /// `x` and `X`.
    fn delete_chars(&mut self, buf: &mut dyn TextBuffer, forward: bool, matched: Vec<KeyEvent>) {
        let count = self.pending.effective_count();
        let register = self.pending.register();
        let n = count.unwrap_or(1);

        let mut queue = TransformQueue::new();
        let mut parts: Vec<String> = Vec::new();
        for (idx, c) in self.cursors.iter().enumerate() {
            let p = c.position();
            let len = buf.line_len(p.line);
            let range = if forward {
                if p.col >= len {
                    continue;
                }
                Range::new(p, Position::new(p.line, (p.col + n).min(len)))
            } else {
                if p.col == 0 {
                    continue;
                }
                Range::new(Position::new(p.line, p.col.saturating_sub(n)), p)
            };
            parts.push(buf.text(range));
            queue.push(Transform {
                cursor: idx,
                range,
                text: String::new(),
                target: CursorTarget::Start,
            });
        }
        if queue.is_empty() {
            return;
        }
        self.registers
            .record_delete(register, parts.join("\n"), RegisterKind::Char);
        let landed = queue.apply(&mut *buf);
        self.land_cursors(landed, &*buf, false);
        self.cursors.clamp_all(&*buf, false);
        self.dot.record_immediate(matched, count, register);
    }

    /// `D` and `C`: from the cursor to the end of the `count`-th line down.
    fn kill_to_line_end(&mut self, buf: &mut dyn TextBuffer, change: bool, matched: Vec<KeyEvent>) {
        let count = self.pending.effective_count();
        let register = self.pending.register();
        let n = count.unwrap_or(1);
        let mut matched = Some(matched);
        if change {
            self.begin_insert(matched.take().unwrap_or_default(), count, register);
        }

        let mut queue = TransformQueue::new();
        let mut parts: Vec<String> = Vec::new();
        for (idx, c) in self.cursors.iter().enumerate() {
            let p = c.position();
            let last = (p.line + n - 1).min(buf.last_line());
            let range = Range::new(p, Position::new(last, buf.line_len(last)));
            if range.is_empty() && !change {
                continue;
            }
            parts.push(buf.text(range));
            queue.push(Transform {
                cursor: idx,
                range,
                text: String::new(),
                target: CursorTarget::Start,
            });
        }
        if queue.is_empty() {
            return;
        }
        self.registers
            .record_delete(register, parts.join("\n"), RegisterKind::Char);
        let landed = queue.apply(&mut *buf);
        let past_end = change;
        self.land_cursors(landed, &*buf, past_end);
        self.cursors.clamp_all(&*buf, past_end);
        if let Some(matched) = matched {
            self.dot.record_immediate(matched, count, register);
        }
    }

    /// `r{char}`: cursors without `count` chars left on the line sit out.
    fn replace_chars(&mut self, buf: &mut dyn TextBuffer, ch: char, matched: Vec<KeyEvent>) {
        let count = self.pending.effective_count();
        let register = self.pending.register();
        let n = count.unwrap_or(1);
        let text: String = ch.to_string().repeat(n);

        let mut queue = TransformQueue::new();
        for (idx, c) in self.cursors.iter().enumerate() {
            let p = c.position();
            if p.col + n > buf.line_len(p.line) {
                continue;
            }
            queue.push(Transform {
                cursor: idx,
                range: Range::new(p, Position::new(p.line, p.col + n)),
                text: text.clone(),
                target: CursorTarget::At(Position::new(p.line, p.col + n - 1)),
            });
        }
        if queue.is_empty() {
            return;
        }
        let landed = queue.apply(&mut *buf);
        self.land_cursors(landed, &*buf, false);
        self.dot.record_immediate(matched, count, register);
    }

    /// `~`: toggle case under the cursor and advance.
    fn toggle_case_chars(&mut self, buf: &mut dyn TextBuffer, matched: Vec<KeyEvent>) {
        let count = self.pending.effective_count();
        let n = count.unwrap_or(1);

        let mut queue = TransformQueue::new();
        for (idx, c) in self.cursors.iter().enumerate() {
            let p = c.position();
            let len = buf.line_len(p.line);
            if p.col >= len {
                continue;
            }
            let end = (p.col + n).min(len);
            let range = Range::new(p, Position::new(p.line, end));
            let text: String = buf.text(range).chars().map(operators::toggle_char).collect();
            queue.push(Transform {
                cursor: idx,
                range,
                text,
                target: CursorTarget::At(Position::new(p.line, end)),
            });
        }
        if queue.is_empty() {
            return;
        }
        let landed = queue.apply(&mut *buf);
        self.land_cursors(landed, &*buf, false);
        self.dot.record_immediate(matched, count, None);
    }

    fn paste(&mut self, buf: &mut dyn TextBuffer, before: bool, matched: Vec<KeyEvent>) {
        let count = self.pending.effective_count();
        let register = self.pending.register();
        if self.mode.is_visual() {
            self.visual_paste(buf, register, matched);
            return;
        }

        let reg = self.registers.get(register);
        let content = reg.content().to_string();
        let kind = reg.kind();
        if content.is_empty() {
            self.pending.clear();
            return;
        }
        let n = count.unwrap_or(1);

        let mut queue = TransformQueue::new();
        for (idx, c) in self.cursors.iter().enumerate() {
            let Some(plan) = operators::paste_plan(&*buf, c.position(), &content, kind, before, n)
            else {
                continue;
            };
            let target = plan.target;
            for (range, text) in plan.edits {
                queue.push(Transform {
                    cursor: idx,
                    range,
                    text,
                    target,
                });
            }
        }
        if queue.is_empty() {
            self.pending.clear();
            return;
        }
        let landed = queue.apply(&mut *buf);
        self.land_cursors(landed, &*buf, false);
        self.dot.record_immediate(matched, count, register);
        self.pending.clear();
    }

    /// `p` over a selection: the selection is replaced by the register and
    /// the replaced text takes its place in the unnamed register.
    fn visual_paste(&mut self, buf: &mut dyn TextBuffer, register: Option<char>, matched: Vec<KeyEvent>) {
        let reg = self.registers.get(register);
        let content = reg.content().to_string();
        if content.is_empty() {
            self.pending.clear();
            return;
        }
        let linewise = self.mode.visual_kind() == Some(VisualKind::Line);

        let mut queue = TransformQueue::new();
        let mut parts: Vec<String> = Vec::new();
        for (idx, c) in self.cursors.iter().enumerate() {
            let sel = c.selection().unwrap_or_else(|| Range::point(c.position()));
            let range = if linewise {
                match composer::linewise_span(&*buf, sel.start.line, sel.end.line) {
                    Some(span) => span.range,
                    None => continue,
                }
            } else {
                Range::new(sel.start, composer::inclusive_end(&*buf, sel.end))
            };
            let mut text = content.clone();
            if linewise {
                if range.end.col == 0 {
                    if !text.ends_with('\n') {
                        text.push('\n');
                    }
                } else {
                    // The replaced lines end the buffer without a newline.
                    while text.ends_with('\n') {
                        text.pop();
                    }
                }
            }
            parts.push(buf.text(range));
            queue.push(Transform {
                cursor: idx,
                range,
                text,
                target: CursorTarget::At(range.start),
            });
        }
        if queue.is_empty() {
            self.pending.clear();
            return;
        }
        let kind = if linewise {
            RegisterKind::Line
        } else {
            RegisterKind::Char
        };
        self.registers.record_delete(None, parts.join("\n"), kind);
        let landed = queue.apply(&mut *buf);
        self.land_cursors(landed, &*buf, false);
        self.cursors.clear_anchors();
        self.cursors.clamp_all(&*buf, false);
        self.mode = Mode::Normal;
        self.dot.record_immediate(matched, None, register);
        self.pending.clear();
    }

    fn join_lines(&mut self, buf: &mut dyn TextBuffer, matched: Vec<KeyEvent>) {
        let count = self.pending.effective_count();
        let n = count.unwrap_or(2);

        let mut queue = TransformQueue::new();
        for (idx, c) in self.cursors.iter().enumerate() {
            let Some((range, text, seam)) = operators::join_plan(&*buf, c.line(), n) else {
                continue;
            };
            queue.push(Transform {
                cursor: idx,
                range,
                text,
                target: CursorTarget::At(seam),
            });
        }
        if queue.is_empty() {
            return;
        }
        let landed = queue.apply(&mut *buf);
        self.land_cursors(landed, &*buf, false);
        self.dot.record_immediate(matched, count, None);
    }

    fn toggle_visual(&mut self, kind: VisualKind) {
        match self.mode {
            Mode::Visual(current) if current == kind => {
                self.mode = Mode::Normal;
                self.cursors.clear_anchors();
            }
            Mode::Visual(_) => {
                self.mode = Mode::Visual(kind);
            }
            _ => {
                if kind == VisualKind::Block {
                    self.cursors.collapse_to_primary();
                }
                for c in self.cursors.iter_mut() {
                    c.set_anchor();
                }
                self.mode = Mode::Visual(kind);
            }
        }
    }

    /// `gb`: add a cursor at the next occurrence of the word under the
    /// primary cursor, scanning past the furthest cursor and wrapping.
    fn add_cursor_at_next_match(&mut self, buf: &dyn TextBuffer) {
        let primary = self.cursors.primary().position();
        let Some(w) = word_under_cursor(buf, primary) else {
            self.report(VimError::PatternNotFound(String::new()));
            return;
        };
        let pattern = search::word_pattern(&w);
        let ignore = self.options.search_ignores_case(&pattern);
        let matches = match self.searcher.find_all(buf, &pattern, ignore) {
            Ok(m) => m,
            Err(err) => {
                self.report(err);
                return;
            }
        };
        let positions = self.cursors.positions();
        let from = positions.iter().copied().max().unwrap_or(primary);
        let Some(m) = search::next_match(&matches, from, Direction::Forward, true) else {
            self.report(VimError::PatternNotFound(pattern));
            return;
        };
        if positions.contains(&m.start) {
            return;
        }
        self.cursors.push(Cursor::at(m.start));
        self.cursors.merge();
    }

    /// `gs`: label every word start with a letter from the label alphabet
    /// and wait for one key picking a target.
    fn start_label_jump(&mut self, buf: &dyn TextBuffer) {
        let mut targets: Vec<(char, Position)> = Vec::new();
        let mut labels = self.options.label_alphabet.iter().copied();
        'scan: for line in 0..buf.line_count() {
            let text = buf.line_text(line);
            let mut prev_blank = true;
            for (col, ch) in text.chars().enumerate() {
                if !ch.is_whitespace() && prev_blank {
                    let Some(label) = labels.next() else {
                        break 'scan;
                    };
                    targets.push((label, Position::new(line, col)));
                }
                prev_blank = ch.is_whitespace();
            }
        }
        if targets.is_empty() {
            return;
        }
        let ranges: Vec<Range> = targets
            .iter()
            .map(|&(_, pos)| Range::new(pos, pos.with_col(pos.col + 1)))
            .collect();
        self.feedback.highlight(&ranges);
        self.overlay = Some(targets);
    }

    fn overlay_key(&mut self, buf: &mut dyn TextBuffer, key: KeyEvent) {
        let Some(targets) = self.overlay.take() else {
            return;
        };
        self.feedback.highlight(&[]);
        let Some(ch) = key.text_char() else { return };
        if let Some(&(_, pos)) = targets.iter().find(|&&(label, _)| label == ch) {
            self.jumps.push(self.cursors.primary().position());
            self.cursors.primary_mut().set_position(pos, &*buf, false);
            self.cursors.merge();
        }
    }

    // -- Search input --------------------------------------------------------

    fn search_input_key(&mut self, buf: &mut dyn TextBuffer, key: KeyEvent) {
        self.dot.push(key);
        match key.code {
            KeyCode::Escape => self.cancel_search(buf),
            KeyCode::Enter => self.confirm_search(buf),
            KeyCode::Backspace => {
                let empty = self.search.input().is_some_and(|s| s.text.is_empty());
                if empty {
                    self.cancel_search(buf);
                    return;
                }
                if let Some(s) = self.search.input_mut() {
                    s.text.pop();
                }
                self.preview_search(&*buf);
            }
            _ => {
                let Some(ch) = key.text_char() else { return };
                if let Some(s) = self.search.input_mut() {
                    s.text.push(ch);
                }
                self.preview_search(&*buf);
            }
        }
    }

    fn cancel_search(&mut self, buf: &mut dyn TextBuffer) {
        if let Some(s) = self.search.take_input() {
            self.cursors.primary_mut().set_position(s.saved, &*buf, false);
            self.cursors.merge();
        }
        self.feedback.highlight(&[]);
        self.abort_command();
    }

    /// Incremental preview: highlight all matches of the text so far and
    /// park the primary cursor on the first one. Invalid partial patterns
    /// stay silent.
    fn preview_search(&mut self, buf: &dyn TextBuffer) {
        let Some(s) = self.search.input() else { return };
        let (text, dir, saved) = (s.text.clone(), s.direction, s.saved);
        if text.is_empty() {
            self.feedback.highlight(&[]);
            self.cursors.primary_mut().set_position(saved, buf, false);
            self.cursors.merge();
            return;
        }
        let ignore = self.options.search_ignores_case(&text);
        match self.searcher.find_all(buf, &text, ignore) {
            Ok(matches) => {
                self.feedback.highlight(&matches);
                let at = search::match_from(&matches, saved, dir, self.options.wrap_scan)
                    .map_or(saved, |m| m.start);
                self.cursors.primary_mut().set_position(at, buf, false);
                self.cursors.merge();
            }
            Err(_) => self.feedback.highlight(&[]),
        }
    }

    fn confirm_search(&mut self, buf: &mut dyn TextBuffer) {
        self.feedback.highlight(&[]);
        let Some(s) = self.search.take_input() else { return };

        let pattern = if s.text.is_empty() {
            if !self.search.has_pattern() {
                self.report(VimError::PatternNotFound(String::new()));
                self.abort_command();
                return;
            }
            self.search.pattern().to_string()
        } else {
            s.text.clone()
        };
        self.search.set_pattern(pattern.clone(), s.direction);

        let ignore = self.options.search_ignores_case(&pattern);
        let matches = match self.searcher.find_all(&*buf, &pattern, ignore) {
            Ok(m) => m,
            Err(err) => {
                self.cursors.primary_mut().set_position(s.saved, &*buf, false);
                self.report(err);
                self.abort_command();
                return;
            }
        };
        let Some(m) = search::next_match(&matches, s.saved, s.direction, self.options.wrap_scan)
        else {
            self.cursors.primary_mut().set_position(s.saved, &*buf, false);
            self.report(VimError::PatternNotFound(pattern));
            self.abort_command();
            return;
        };

        if let Some(st) = self.pending.operator() {
            let class = if st.op.forces_linewise() {
                MotionClass::Linewise
            } else {
                MotionClass::Exclusive
            };
            let Some(span) = composer::motion_span(&*buf, s.saved, m.start, class) else {
                self.abort_command();
                return;
            };
            // The preview may have walked the cursor away; edit from the
            // position the search started at.
            self.cursors.primary_mut().set_position(s.saved, &*buf, false);
            self.run_operator(buf, st.op, vec![(0, span)], None);
        } else {
            self.jumps.push(s.saved);
            self.cursors.primary_mut().set_position(m.start, &*buf, false);
            self.cursors.merge();
            self.pending.clear();
        }
    }

    // -- Insert / Replace ----------------------------------------------------

    fn insert_key(&mut self, buf: &mut dyn TextBuffer, key: KeyEvent) {
        self.dot.push(key);

        match key.code {
            KeyCode::Escape => {
                self.mode = Mode::Normal;
                let targets: Vec<(usize, Position)> = self
                    .cursors
                    .iter()
                    .enumerate()
                    .map(|(i, c)| (i, Position::new(c.line(), c.col().saturating_sub(1))))
                    .collect();
                for (i, pos) in targets {
                    if let Some(c) = self.cursors.get_mut(i) {
                        c.set_position(pos, &*buf, false);
                    }
                }
                self.cursors.merge();
                self.dot.finish();
                return;
            }
            KeyCode::Left | KeyCode::Right | KeyCode::Up | KeyCode::Down => {
                let keeps = matches!(key.code, KeyCode::Up | KeyCode::Down);
                for c in self.cursors.iter_mut() {
                    let p = c.position();
                    let target = match key.code {
                        KeyCode::Left => p.with_col(p.col.saturating_sub(1)),
                        KeyCode::Right => p.with_col(p.col + 1),
                        KeyCode::Up => Position::new(p.line.saturating_sub(1), c.sticky_col()),
                        _ => Position::new(p.line + 1, c.sticky_col()),
                    };
                    c.apply_motion(target, keeps, &*buf, true);
                }
                self.cursors.merge();
                return;
            }
            KeyCode::Backspace => {
                self.insert_backspace(buf);
                return;
            }
            KeyCode::Delete => {
                self.insert_delete(buf);
                return;
            }
            _ => {}
        }

        let text = match key.code {
            KeyCode::Enter => Some("\n".to_string()),
            KeyCode::Tab => Some("\t".to_string()),
            _ => key.text_char().map(String::from),
        };
        let Some(text) = text else { return };

        let replacing = self.mode == Mode::Replace;
        let mut queue = TransformQueue::new();
        for (idx, c) in self.cursors.iter().enumerate() {
            let p = c.position();
            let range = if replacing && text != "\n" && p.col < buf.line_len(p.line) {
                Range::new(p, p.with_col(p.col + 1))
            } else {
                Range::point(p)
            };
            queue.push(Transform {
                cursor: idx,
                range,
                text: text.clone(),
                target: CursorTarget::InsertEnd,
            });
        }
        let landed = queue.apply(&mut *buf);
        self.land_cursors(landed, &*buf, true);
    }

    fn insert_backspace(&mut self, buf: &mut dyn TextBuffer) {
        if self.mode == Mode::Replace {
            // Replace-mode backspace only steps left; overwritten text is
            // not restored.
            for c in self.cursors.iter_mut() {
                let p = c.position();
                if p.col > 0 {
                    c.set_position(p.with_col(p.col - 1), &*buf, true);
                }
            }
            self.cursors.merge();
            return;
        }

        let mut queue = TransformQueue::new();
        for (idx, c) in self.cursors.iter().enumerate() {
            let p = c.position();
            let range = if p.col > 0 {
                Range::new(p.with_col(p.col - 1), p)
            } else if p.line > 0 {
                Range::new(
                    Position::new(p.line - 1, buf.line_len(p.line - 1)),
                    Position::new(p.line, 0),
                )
            } else {
                continue;
            };
            queue.push(Transform {
                cursor: idx,
                range,
                text: String::new(),
                target: CursorTarget::Start,
            });
        }
        if queue.is_empty() {
            return;
        }
        let landed = queue.apply(&mut *buf);
        self.land_cursors(landed, &*buf, true);
    }

    fn insert_delete(&mut self, buf: &mut dyn TextBuffer) {
        let mut queue = TransformQueue::new();
        for (idx, c) in self.cursors.iter().enumerate() {
            let p = c.position();
            let len = buf.line_len(p.line);
            let range = if p.col < len {
                Range::new(p, p.with_col(p.col + 1))
            } else if p.line < buf.last_line() {
                Range::new(p, Position::new(p.line + 1, 0))
            } else {
                continue;
            };
            queue.push(Transform {
                cursor: idx,
                range,
                text: String::new(),
                target: CursorTarget::Start,
            });
        }
        if queue.is_empty() {
            return;
        }
        let landed = queue.apply(&mut *buf);
        self.land_cursors(landed, &*buf, true);
    }

    // -- Replay --------------------------------------------------------------

    /// `.`: replay the last change, with an optional new count. A visual
    /// change re-forms an equivalent selection at each cursor first.
    fn repeat_last_change(&mut self, buf: &mut dyn TextBuffer, count: Option<usize>) {
        let Some(change) = self.dot.last().cloned() else {
            return;
        };
        self.dot.set_replaying(true);

        if let Some(shape) = change.shape {
            self.mode = Mode::Visual(shape.kind);
            let targets: Vec<(usize, Position)> = self
                .cursors
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    let p = c.position();
                    let line = p.line + shape.lines - 1;
                    let col = match shape.kind {
                        VisualKind::Char if shape.lines > 1 => shape.cols,
                        VisualKind::Line => p.col,
                        _ => p.col + shape.cols,
                    };
                    (i, Position::new(line, col))
                })
                .collect();
            for (i, pos) in targets {
                if let Some(c) = self.cursors.get_mut(i) {
                    c.set_anchor();
                    c.set_position(pos, &*buf, false);
                }
            }
        } else {
            if let Some(n) = count.or(change.count) {
                self.pending.set_count(n);
            }
            if let Some(r) = change.register {
                self.pending.set_register(r);
            }
        }

        self.replay_abort = false;
        for &k in &change.keys {
            if self.replay_abort {
                break;
            }
            self.handle_key(buf, k);
        }
        self.dot.set_replaying(false);
        if !self.macros.is_replaying() {
            self.replay_abort = false;
        }
    }

    fn play_macro(&mut self, buf: &mut dyn TextBuffer, name: char, count: usize) {
        let Some(keys) = self.macros.get(name).map(<[KeyEvent]>::to_vec) else {
            self.report(VimError::EmptyRegister(name));
            return;
        };
        if !self.macros.enter_replay() {
            return;
        }
        self.macros.set_last_played(name.to_ascii_lowercase());
        self.replay_abort = false;
        'runs: for _ in 0..count.max(1) {
            for &k in &keys {
                if self.replay_abort {
                    break 'runs;
                }
                self.handle_key(buf, k);
            }
        }
        self.macros.exit_replay();
        if !self.macros.is_replaying() {
            self.replay_abort = false;
        }
    }

    // -- Shared plumbing -----------------------------------------------------

    fn replaying(&self) -> bool {
        self.dot.is_replaying() || self.macros.is_replaying()
    }

    fn report(&mut self, err: VimError) {
        self.feedback.error(&err);
        if self.replaying() {
            self.replay_abort = true;
        }
    }

    fn abort_command(&mut self) {
        self.pending.clear();
        self.dot.cancel();
        if self.replaying() {
            self.replay_abort = true;
        }
    }

    /// Place cursors on their landing positions. Block-shaped edits produce
    /// several landings per cursor; the first (topmost) one wins.
    fn land_cursors(&mut self, landed: Vec<(usize, Position)>, buf: &dyn TextBuffer, past_end: bool) {
        let mut placed = vec![false; self.cursors.len()];
        for (idx, pos) in landed {
            if let Some(flag) = placed.get_mut(idx) {
                if !*flag {
                    *flag = true;
                    if let Some(c) = self.cursors.get_mut(idx) {
                        c.set_position(pos, buf, past_end);
                    }
                }
            }
        }
        self.cursors.merge();
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Free helpers
// ---------------------------------------------------------------------------

const fn is_jump(motion: Motion) -> bool {
    matches!(
        motion,
        Motion::FirstLine
            | Motion::LastLine
            | Motion::ParagraphForward
            | Motion::ParagraphBackward
            | Motion::SearchNext
            | Motion::SearchPrev
            | Motion::SearchWordForward
            | Motion::SearchWordBackward
            | Motion::GotoMark
            | Motion::GotoMarkLine
    )
}

/// Resolve `f`/`F`/`t`/`T` within the origin's line.
fn resolve_find(
    buf: &dyn TextBuffer,
    origin: Position,
    motion: Motion,
    target: char,
    n: usize,
) -> Option<(Position, MotionClass)> {
    let chars: Vec<char> = buf.line_text(origin.line).chars().collect();
    let (forward, till, class) = match motion {
        Motion::FindForward => (true, false, MotionClass::Inclusive),
        Motion::TillForward => (true, true, MotionClass::Inclusive),
        Motion::FindBackward => (false, false, MotionClass::Exclusive),
        Motion::TillBackward => (false, true, MotionClass::Exclusive),
        _ => return None,
    };

    let mut found = 0;
    let hit = if forward {
        (origin.col + 1..chars.len()).find(|&col| {
            if chars[col] == target {
                found += 1;
            }
            found == n
        })?
    } else {
        (0..origin.col.min(chars.len())).rev().find(|&col| {
            if chars[col] == target {
                found += 1;
            }
            found == n
        })?
    };
    let col = if till {
        if forward { hit.checked_sub(1)? } else { hit + 1 }
    } else {
        hit
    };
    Some((Position::new(origin.line, col), class))
}

/// Line of the next paragraph boundary: the first blank line past the
/// current paragraph, or the last line. Starting on blanks skips them first.
fn next_paragraph(buf: &dyn TextBuffer, line: usize) -> usize {
    let last = buf.last_line();
    let mut l = line;
    while l < last && blank_line(buf, l) {
        l += 1;
    }
    while l < last && !blank_line(buf, l) {
        l += 1;
    }
    l
}

/// Line of the previous paragraph boundary (a blank line, or line 0).
fn prev_paragraph(buf: &dyn TextBuffer, line: usize) -> usize {
    let mut l = line;
    while l > 0 && blank_line(buf, l) {
        l -= 1;
    }
    while l > 0 && !blank_line(buf, l) {
        l -= 1;
    }
    l
}

fn blank_line(buf: &dyn TextBuffer, line: usize) -> bool {
    buf.line_text(line).chars().all(char::is_whitespace)
}

/// The word under (or after) the cursor on its line, for `*`, `#` and `gb`.
fn word_under_cursor(buf: &dyn TextBuffer, pos: Position) -> Option<String> {
    let chars: Vec<char> = buf.line_text(pos.line).chars().collect();
    if chars.is_empty() {
        return None;
    }
    let mut col = pos.col.min(chars.len() - 1);
    if word::classify(chars[col]) != word::CharClass::Word {
        col = (col..chars.len()).find(|&c| word::classify(chars[c]) == word::CharClass::Word)?;
    }
    let mut start = col;
    while start > 0 && word::classify(chars[start - 1]) == word::CharClass::Word {
        start -= 1;
    }
    let mut end = col;
    while end + 1 < chars.len() && word::classify(chars[end + 1]) == word::CharClass::Word {
        end += 1;
    }
    Some(chars[start..=end].iter().collect())
}

/// Resolve a text object at a position, expanding outward `count` times.
fn object_range(
    buf: &dyn TextBuffer,
    pos: Position,
    obj: TextObject,
    count: usize,
) -> Option<Range> {
    composer::expand_object(buf, pos, count, move |buf, p| match obj {
        TextObject::Word { around } => {
            if around {
                text_object::a_word(buf, p)
            } else {
                text_object::inner_word(buf, p)
            }
        }
        TextObject::BigWord { around } => {
            if around {
                text_object::a_big_word(buf, p)
            } else {
                text_object::inner_big_word(buf, p)
            }
        }
        TextObject::Quote { delim, around } => {
            if around {
                text_object::a_quote(buf, p, delim)
            } else {
                text_object::inner_quote(buf, p, delim)
            }
        }
        TextObject::Bracket { open, close, around } => {
            if around {
                text_object::a_bracket(buf, p, open, close)
            } else {
                text_object::inner_bracket(buf, p, open, close)
            }
        }
        TextObject::Paragraph { around } => {
            if around {
                text_object::a_paragraph(buf, p)
            } else {
                text_object::inner_paragraph(buf, p)
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::buffer::ScratchBuffer;
    use crate::register::Register;

    fn p(line: usize, col: usize) -> Position {
        Position::new(line, col)
    }

    fn run(text: &str, keys: &str) -> (Engine, ScratchBuffer) {
        let mut buf = ScratchBuffer::from_text(text);
        let mut eng = Engine::new();
        eng.feed_str(&mut buf, keys);
        (eng, buf)
    }

    fn unnamed(eng: &Engine) -> &Register {
        eng.registers().get(None)
    }

    struct CollectSink(Rc<RefCell<Vec<String>>>);

    impl FeedbackSink for CollectSink {
        fn error(&mut self, err: &VimError) {
            self.0.borrow_mut().push(err.to_string());
        }
    }

    fn run_with_errors(text: &str, keys: &str) -> (Engine, ScratchBuffer, Rc<RefCell<Vec<String>>>) {
        let errors = Rc::new(RefCell::new(Vec::new()));
        let mut eng = Engine::new();
        eng.set_feedback(Box::new(CollectSink(Rc::clone(&errors))));
        let mut buf = ScratchBuffer::from_text(text);
        eng.feed_str(&mut buf, keys);
        (eng, buf, errors)
    }

    // -- Operators with motions ----------------------------------------------

    #[test]
    fn dw_deletes_to_next_word() {
        let (eng, buf) = run("one two", "dw");
        assert_eq!(buf.contents(), "two");
        assert_eq!(unnamed(&eng).content(), "one ");
        assert_eq!(eng.primary_position(), p(0, 0));
    }

    #[test]
    fn dw_on_last_word_takes_rest_of_line() {
        let (_, buf) = run("one two", "wdw");
        assert_eq!(buf.contents(), "one ");
    }

    #[test]
    fn counts_multiply_across_operator_and_motion() {
        let (_, buf) = run("a b c d e f g", "2d3w");
        assert_eq!(buf.contents(), "g");
    }

    #[test]
    fn dd_deletes_line_into_ring() {
        let (eng, buf) = run("aa\nbb\ncc", "dd");
        assert_eq!(buf.contents(), "bb\ncc");
        assert_eq!(unnamed(&eng).content(), "aa\n");
        assert_eq!(unnamed(&eng).kind(), RegisterKind::Line);
        assert_eq!(eng.registers().get(Some('1')).content(), "aa\n");
        assert_eq!(eng.primary_position(), p(0, 0));
    }

    #[test]
    fn dd_on_last_line_folds_preceding_newline() {
        let (eng, buf) = run("aa\nbb", "jdd");
        assert_eq!(buf.contents(), "aa");
        assert_eq!(unnamed(&eng).content(), "bb\n");
        assert_eq!(eng.primary_position(), p(0, 0));
    }

    #[test]
    fn d_dollar_on_empty_line_is_a_no_op() {
        let (_, buf) = run("aa\n\nbb", "jd$");
        assert_eq!(buf.contents(), "aa\n\nbb");
    }

    #[test]
    fn dk_on_first_line_does_nothing() {
        let (_, buf) = run("aa\nbb", "dk");
        assert_eq!(buf.contents(), "aa\nbb");
    }

    #[test]
    fn dj_takes_both_lines() {
        let (_, buf) = run("aa\nbb\ncc", "dj");
        assert_eq!(buf.contents(), "cc");
    }

    #[test]
    fn cw_behaves_like_ce() {
        let (eng, buf) = run("hello world", "cwbye<Esc>");
        assert_eq!(buf.contents(), "bye world");
        assert_eq!(eng.mode(), Mode::Normal);
    }

    #[test]
    fn dt_stops_before_target() {
        let (_, buf) = run("hello", "dtl");
        assert_eq!(buf.contents(), "llo");
    }

    #[test]
    fn d_paragraph_forward_is_charwise() {
        // Unlike the paragraph objects, `}` composes exclusively: text
        // before the cursor and the blank boundary line survive.
        let (_, buf) = run("alpha beta\ngamma\n\ndelta", "lld}");
        assert_eq!(buf.contents(), "al\n\ndelta");
    }

    #[test]
    fn d_paragraph_backward_is_charwise() {
        let (eng, buf) = run("alpha\n\nbeta gamma", "G$d{");
        assert_eq!(buf.contents(), "alpha\na");
        assert_eq!(eng.primary_position(), p(1, 0));
    }

    #[test]
    fn d_percent_takes_the_pair() {
        let (_, buf) = run("a(bc)d", "d%");
        assert_eq!(buf.contents(), "d");
    }

    // -- Line operators ------------------------------------------------------

    #[test]
    fn yyp_duplicates_line() {
        let (eng, buf) = run("hello", "yyp");
        assert_eq!(buf.contents(), "hello\nhello");
        assert_eq!(eng.primary_position(), p(1, 0));
    }

    #[test]
    fn dd_then_capital_p_restores() {
        let (_, buf) = run("aa\nbb", "ddP");
        assert_eq!(buf.contents(), "aa\nbb");
    }

    #[test]
    fn change_line_keeps_the_line_open() {
        let (_, buf) = run("aa\nnext", "Sfoo<Esc>");
        assert_eq!(buf.contents(), "foo\nnext");
    }

    #[test]
    fn uppercase_doubled_recases_line() {
        let (_, buf) = run("abc", "gUU");
        assert_eq!(buf.contents(), "ABC");
    }

    // -- Single-key edits ----------------------------------------------------

    #[test]
    fn x_deletes_char_and_dot_repeats() {
        let (_, buf) = run("abcd", "x.");
        assert_eq!(buf.contents(), "cd");
    }

    #[test]
    fn counted_x() {
        let (eng, buf) = run("abcdef", "3x");
        assert_eq!(buf.contents(), "def");
        assert_eq!(unnamed(&eng).content(), "abc");
    }

    #[test]
    fn backward_x_deletes_before_cursor() {
        let (_, buf) = run("abc", "llX");
        assert_eq!(buf.contents(), "ac");
    }

    #[test]
    fn capital_d_kills_to_line_end() {
        let (eng, buf) = run("hello world\nnext", "wD");
        assert_eq!(buf.contents(), "hello \nnext");
        assert_eq!(unnamed(&eng).content(), "world");
        assert_eq!(eng.primary_position(), p(0, 5));
    }

    #[test]
    fn capital_c_changes_to_line_end() {
        let (_, buf) = run("hello world", "wCthere<Esc>");
        assert_eq!(buf.contents(), "hello there");
    }

    #[test]
    fn substitute_char() {
        let (_, buf) = run("abc", "sX<Esc>");
        assert_eq!(buf.contents(), "Xbc");
    }

    #[test]
    fn counted_replace_char() {
        let (eng, buf) = run("abcdef", "3rx");
        assert_eq!(buf.contents(), "xxxdef");
        assert_eq!(eng.primary_position(), p(0, 2));
    }

    #[test]
    fn replace_char_needs_enough_chars() {
        let (_, buf) = run("ab", "5rx");
        assert_eq!(buf.contents(), "ab");
    }

    #[test]
    fn tilde_toggles_and_advances() {
        let (eng, buf) = run("abc", "~~");
        assert_eq!(buf.contents(), "ABc");
        assert_eq!(eng.primary_position(), p(0, 2));
    }

    #[test]
    fn join_lands_on_seam() {
        let (eng, buf) = run("hello\n   world", "J");
        assert_eq!(buf.contents(), "hello world");
        assert_eq!(eng.primary_position(), p(0, 5));
    }

    #[test]
    fn counted_join() {
        let (_, buf) = run("a\nb\nc\nd", "3J");
        assert_eq!(buf.contents(), "a b c\nd");
    }

    // -- Text objects --------------------------------------------------------

    #[test]
    fn change_inner_word() {
        let (_, buf) = run("foo bar", "wciwnew<Esc>");
        assert_eq!(buf.contents(), "foo new");
    }

    #[test]
    fn delete_inner_bracket() {
        let (eng, buf) = run("f(hello)", "fhdi(");
        assert_eq!(buf.contents(), "f()");
        assert_eq!(eng.primary_position(), p(0, 2));
    }

    #[test]
    fn change_around_quote() {
        let (_, buf) = run("say \"hi\" now", "5lca\"X<Esc>");
        assert_eq!(buf.contents(), "say X now");
    }

    #[test]
    fn delete_around_paragraph() {
        let (_, buf) = run("a\nb\n\nc", "dap");
        assert_eq!(buf.contents(), "c");
    }

    #[test]
    fn counted_object_grows_outward() {
        let (_, buf) = run("(a (b) c)", "4ld2i(");
        assert_eq!(buf.contents(), "()");
    }

    #[test]
    fn failed_object_aborts_the_operator() {
        let (_, buf) = run("plain text", "di(x");
        // The object failed; the later x still runs normally.
        assert_eq!(buf.contents(), "lain text");
    }

    // -- Registers -----------------------------------------------------------

    #[test]
    fn named_register_round_trip() {
        let (eng, buf) = run("word other", "\"ayiw$\"ap");
        assert_eq!(buf.contents(), "word otherword");
        assert_eq!(eng.registers().get(Some('a')).content(), "word");
    }

    #[test]
    fn yank_fills_register_zero_delete_fills_ring() {
        let (eng, _) = run("abc def", "yiwdw");
        assert_eq!(eng.registers().get(Some('0')).content(), "abc");
        assert_eq!(eng.registers().get(Some('1')).content(), "abc ");
        assert_eq!(unnamed(&eng).content(), "abc ");
    }

    #[test]
    fn delete_ring_shifts() {
        let (eng, buf) = run("a\nb\nc", "dddd\"2p");
        assert_eq!(eng.registers().get(Some('1')).content(), "b\n");
        assert_eq!(eng.registers().get(Some('2')).content(), "a\n");
        assert_eq!(buf.contents(), "c\na");
    }

    #[test]
    fn charwise_paste_after() {
        let (eng, buf) = run("ab", "ylp");
        assert_eq!(buf.contents(), "aab");
        assert_eq!(eng.primary_position(), p(0, 1));
    }

    // -- Insert commands -----------------------------------------------------

    #[test]
    fn insert_before_and_after() {
        let (_, buf) = run("hello", "ix<Esc>");
        assert_eq!(buf.contents(), "xhello");
        let (_, buf) = run("hello", "ax<Esc>");
        assert_eq!(buf.contents(), "hxello");
    }

    #[test]
    fn insert_line_start_and_end() {
        let (_, buf) = run("  hi", "lllIx<Esc>");
        assert_eq!(buf.contents(), "  xhi");
        let (_, buf) = run("hi", "Ax<Esc>");
        assert_eq!(buf.contents(), "hix");
    }

    #[test]
    fn open_below_and_above() {
        let (eng, buf) = run("aa", "ox<Esc>");
        assert_eq!(buf.contents(), "aa\nx");
        assert_eq!(eng.primary_position(), p(1, 0));
        let (_, buf) = run("aa", "Ox<Esc>");
        assert_eq!(buf.contents(), "x\naa");
    }

    #[test]
    fn insert_backspace_joins_lines() {
        let (eng, buf) = run("ab\ncd", "ji<BS><Esc>");
        assert_eq!(buf.contents(), "abcd");
        assert_eq!(eng.primary_position(), p(0, 1));
    }

    #[test]
    fn replace_mode_overwrites() {
        let (eng, buf) = run("abcd", "Rxy<Esc>");
        assert_eq!(buf.contents(), "xycd");
        assert_eq!(eng.primary_position(), p(0, 1));
    }

    #[test]
    fn dot_repeats_an_insert() {
        let (_, buf) = run("one\ntwo", "aZ<Esc>j.");
        assert_eq!(buf.contents(), "oZne\ntwZo");
    }

    // -- Visual mode ---------------------------------------------------------

    #[test]
    fn visual_char_delete() {
        let (eng, buf) = run("hello", "vlld");
        assert_eq!(buf.contents(), "lo");
        assert_eq!(eng.mode(), Mode::Normal);
    }

    #[test]
    fn visual_line_delete() {
        let (_, buf) = run("a\nb\nc", "Vjd");
        assert_eq!(buf.contents(), "c");
    }

    #[test]
    fn visual_toggle_case() {
        let (_, buf) = run("abc", "vll~");
        assert_eq!(buf.contents(), "ABC");
    }

    #[test]
    fn visual_swap_ends_then_extend() {
        let (_, buf) = run("abcdef", "lvllohd");
        // o moves the cursor to the anchor end; h extends leftward from there.
        assert_eq!(buf.contents(), "ef");
    }

    #[test]
    fn visual_block_delete() {
        let (eng, buf) = run("abcd\nefgh\nijkl", "l<C-v>jjld");
        assert_eq!(buf.contents(), "ad\neh\nil");
        assert_eq!(eng.primary_position(), p(0, 1));
    }

    #[test]
    fn visual_block_yank_is_blockwise() {
        let (eng, _) = run("ab\ncd", "<C-v>jy");
        assert_eq!(unnamed(&eng).content(), "a\nc");
        assert_eq!(unnamed(&eng).kind(), RegisterKind::Block);
    }

    #[test]
    fn visual_switch_char_to_line() {
        let (_, buf) = run("aa\nbb", "vVd");
        assert_eq!(buf.contents(), "bb");
    }

    #[test]
    fn visual_object_selection() {
        let (_, buf) = run("foo bar", "wviwd");
        assert_eq!(buf.contents(), "foo ");
    }

    #[test]
    fn visual_paste_replaces_selection() {
        let (eng, buf) = run("one two", "yiwwviwp");
        assert_eq!(buf.contents(), "one one");
        assert_eq!(unnamed(&eng).content(), "two");
    }

    #[test]
    fn escape_leaves_visual_mode() {
        let (eng, _) = run("hello", "vll<Esc>");
        assert_eq!(eng.mode(), Mode::Normal);
        assert!(eng.selections().is_empty());
    }

    // -- Pending cancellation ------------------------------------------------

    #[test]
    fn escape_cancels_a_pending_operator() {
        let (_, buf) = run("abc", "d<Esc>x");
        assert_eq!(buf.contents(), "bc");
    }

    #[test]
    fn escape_clears_a_pending_count() {
        let (_, buf) = run("abcdef", "3<Esc>x");
        assert_eq!(buf.contents(), "bcdef");
    }

    // -- Search --------------------------------------------------------------

    #[test]
    fn search_then_next_and_prev() {
        let (eng, _) = run("one two one two", "/two<CR>");
        assert_eq!(eng.primary_position(), p(0, 4));
        let (eng, _) = run("one two one two", "/two<CR>n");
        assert_eq!(eng.primary_position(), p(0, 12));
        let (eng, _) = run("one two one two", "/two<CR>nN");
        assert_eq!(eng.primary_position(), p(0, 4));
    }

    #[test]
    fn backward_search() {
        let (eng, _) = run("ab cd ab", "$?ab<CR>");
        assert_eq!(eng.primary_position(), p(0, 6));
    }

    #[test]
    fn star_searches_word_and_wraps() {
        let (eng, _) = run("xx yy\nzz xx", "*");
        assert_eq!(eng.primary_position(), p(1, 3));
        assert_eq!(eng.search_pattern(), r"\bxx\b");
        let (eng, _) = run("xx yy\nzz xx", "**");
        assert_eq!(eng.primary_position(), p(0, 0));
    }

    #[test]
    fn hash_searches_backward() {
        let (eng, _) = run("aa bb\naa", "j#");
        assert_eq!(eng.primary_position(), p(0, 0));
    }

    #[test]
    fn failed_search_reports_and_stays() {
        let (eng, buf, errors) = run_with_errors("abc", "/zzz<CR>");
        assert_eq!(buf.contents(), "abc");
        assert_eq!(eng.primary_position(), p(0, 0));
        assert!(errors.borrow()[0].contains("zzz"));
    }

    #[test]
    fn operator_composes_over_search() {
        let (_, buf) = run("one two three", "d/three<CR>");
        assert_eq!(buf.contents(), "three");
    }

    #[test]
    fn empty_search_reuses_last_pattern() {
        let (eng, _) = run("ab ab ab", "/ab<CR>/<CR>");
        assert_eq!(eng.primary_position(), p(0, 6));
    }

    #[test]
    fn escape_cancels_search_input() {
        let (eng, _) = run("ab cd", "/cd<Esc>");
        assert_eq!(eng.primary_position(), p(0, 0));
        assert_eq!(eng.search_pattern(), "");
    }

    // -- Marks and jumps -----------------------------------------------------

    #[test]
    fn mark_and_backtick_jump() {
        let (eng, _) = run("aa\nbb\ncc", "majj`a");
        assert_eq!(eng.primary_position(), p(0, 0));
    }

    #[test]
    fn unset_mark_reports() {
        let (eng, _, errors) = run_with_errors("aa", "`z");
        assert_eq!(eng.primary_position(), p(0, 0));
        assert!(errors.borrow()[0].contains('z'));
    }

    #[test]
    fn jumplist_back_and_forward() {
        let (eng, _) = run("a\nb\nc\nd\ne", "G");
        assert_eq!(eng.primary_position(), p(4, 0));
        let (eng, _) = run("a\nb\nc\nd\ne", "G<C-o>");
        assert_eq!(eng.primary_position(), p(0, 0));
        let (eng, _) = run("a\nb\nc\nd\ne", "G<C-o><C-i>");
        assert_eq!(eng.primary_position(), p(4, 0));
    }

    #[test]
    fn counted_gg_and_g() {
        let (eng, _) = run("a\nb\nc", "3gg");
        assert_eq!(eng.primary_position(), p(2, 0));
        let (eng, _) = run("a\nb\nc", "G2G");
        assert_eq!(eng.primary_position(), p(1, 0));
    }

    // -- Find and repeat find ------------------------------------------------

    #[test]
    fn find_then_semicolon_and_comma() {
        let (eng, _) = run("abcabc", "fc");
        assert_eq!(eng.primary_position(), p(0, 2));
        let (eng, _) = run("abcabc", "fc;");
        assert_eq!(eng.primary_position(), p(0, 5));
        let (eng, _) = run("abcabc", "fc;,");
        assert_eq!(eng.primary_position(), p(0, 2));
    }

    // -- Dot repeat ----------------------------------------------------------

    #[test]
    fn dot_repeats_change_word() {
        let (_, buf) = run("one two three\nfour five six", "cwX<Esc>j0.");
        assert_eq!(buf.contents(), "X two three\nX five six");
    }

    #[test]
    fn dot_repeats_dd() {
        let (_, buf) = run("a\nb\nc", "dd.");
        assert_eq!(buf.contents(), "c");
    }

    #[test]
    fn dot_count_overrides_original() {
        let (_, buf) = run("a b c d", "dw2.");
        assert_eq!(buf.contents(), "d");
    }

    #[test]
    fn dot_repeats_visual_operator_by_shape() {
        let (_, buf) = run("abcdef", "vld0.");
        // vld removes two chars; . re-forms a two-char selection at col 0.
        assert_eq!(buf.contents(), "ef");
    }

    // -- Macros --------------------------------------------------------------

    #[test]
    fn macro_records_and_plays() {
        let (eng, buf) = run("1\n2\n3", "qaxjq@a");
        assert_eq!(buf.contents(), "\n\n3");
        assert_eq!(eng.primary_position(), p(2, 0));
        assert!(!eng.is_recording_macro());
    }

    #[test]
    fn uppercase_macro_appends() {
        // Both recorded deletes already ran, leaving "cd"; the appended
        // macro then deletes twice more.
        let (_, buf) = run("abcd", "qaxqqAxq@a");
        assert_eq!(buf.contents(), "");
    }

    #[test]
    fn at_at_replays_last_macro() {
        let (_, buf) = run("abcdef", "qaxq@a@@");
        assert_eq!(buf.contents(), "def");
    }

    #[test]
    fn counted_macro_replay() {
        let (_, buf) = run("abcdef", "qaxq3@a");
        assert_eq!(buf.contents(), "ef");
    }

    #[test]
    fn empty_macro_register_reports() {
        let (_, _, errors) = run_with_errors("ab", "@z");
        assert!(errors.borrow()[0].contains("E353"));
    }

    #[test]
    fn at_at_without_history_reports() {
        let (_, _, errors) = run_with_errors("ab", "@@");
        assert!(errors.borrow()[0].contains("E748"));
    }

    // -- Multi-cursor --------------------------------------------------------

    #[test]
    fn gb_adds_cursor_at_next_match() {
        let (eng, _) = run("foo bar foo baz foo", "gb");
        assert_eq!(eng.cursor_positions(), vec![p(0, 0), p(0, 8)]);
        let (eng, _) = run("foo bar foo baz foo", "gbgb");
        assert_eq!(eng.cursor_count(), 3);
    }

    #[test]
    fn multi_cursor_edit_applies_to_all() {
        let (_, buf) = run("foo foo", "gbx");
        assert_eq!(buf.contents(), "oo oo");
    }

    #[test]
    fn multi_cursor_insert() {
        let (eng, buf) = run("ab ab", "gbiZ<Esc>");
        assert_eq!(buf.contents(), "Zab Zab");
        assert_eq!(eng.cursor_positions(), vec![p(0, 0), p(0, 4)]);
    }

    #[test]
    fn multi_cursor_operator() {
        let (_, buf) = run("foo foo", "gbdw");
        assert_eq!(buf.contents(), "");
    }

    #[test]
    fn escape_collapses_to_primary() {
        let (eng, _) = run("aa aa aa", "gbgb<Esc>");
        assert_eq!(eng.cursor_count(), 1);
    }

    // -- Label jump ----------------------------------------------------------

    #[test]
    fn label_jump_moves_to_target() {
        let (eng, _) = run("foo bar\nbaz", "gsb");
        assert_eq!(eng.primary_position(), p(0, 4));
        let (eng, _) = run("foo bar\nbaz", "gsc");
        assert_eq!(eng.primary_position(), p(1, 0));
    }

    #[test]
    fn label_overlay_escape_cancels() {
        let (eng, buf) = run("foo bar", "gs<Esc>x");
        // The overlay is gone; x edits normally again.
        assert_eq!(buf.contents(), "oo bar");
        assert_eq!(eng.primary_position(), p(0, 0));
    }

    // -- Indent, case, reflow ------------------------------------------------

    #[test]
    fn indent_and_outdent() {
        let (eng, buf) = run("foo", ">>");
        assert_eq!(buf.contents(), "    foo");
        assert_eq!(eng.primary_position(), p(0, 4));
        let (_, buf) = run("    foo", "<<");
        assert_eq!(buf.contents(), "foo");
    }

    #[test]
    fn indent_motion_is_linewise() {
        let (_, buf) = run("a\nb\nc", ">j");
        assert_eq!(buf.contents(), "    a\n    b\nc");
    }

    #[test]
    fn lowercase_inner_word() {
        let (_, buf) = run("HeLLo There", "guiw");
        assert_eq!(buf.contents(), "hello There");
    }

    #[test]
    fn toggle_case_over_motion() {
        let (_, buf) = run("AbC dEf", "g~w");
        assert_eq!(buf.contents(), "aBc dEf");
    }

    #[test]
    fn reflow_wraps_at_text_width() {
        let mut eng = Engine::new();
        let mut opts = Options::default();
        opts.text_width = 7;
        eng.set_options(opts);
        let mut buf = ScratchBuffer::from_text("one two three");
        eng.feed_str(&mut buf, "gqq");
        assert_eq!(buf.contents(), "one two\nthree");
        assert_eq!(eng.primary_position(), p(0, 0));
    }

    // -- Options -------------------------------------------------------------

    #[test]
    fn whichwrap_lets_l_cross_lines() {
        let mut eng = Engine::new();
        let mut opts = Options::default();
        opts.which_wrap_h_l = true;
        eng.set_options(opts);
        let mut buf = ScratchBuffer::from_text("ab\ncd");
        eng.feed_str(&mut buf, "lll");
        assert_eq!(eng.primary_position(), p(1, 1));
    }
}
