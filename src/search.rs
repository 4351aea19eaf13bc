//! Search — pattern state, direction/wrap bookkeeping, and the bundled
//! regex-backed provider.
//!
//! The provider returns every match in document order; everything
//! directional lives here. `n`/`N` pick the next or previous match relative
//! to the cursor and the *remembered* direction, so `?foo` followed by `n`
//! keeps moving backward. Wrap-around is the engine's choice via
//! `wrapscan`, never the provider's.
//!
//! While the user types after `/` or `?`, a [`SearchInput`] session holds
//! the text so far and the position to restore on cancel. Confirming the
//! session promotes its text to the remembered pattern.

use regex::RegexBuilder;

use crate::error::VimError;
use crate::position::{Position, Range};
use crate::traits::{SearchProvider, TextBuffer};

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Which way a search travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Forward => Self::Backward,
            Self::Backward => Self::Forward,
        }
    }
}

// ---------------------------------------------------------------------------
// Search state
// ---------------------------------------------------------------------------

/// An in-progress `/` or `?` session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchInput {
    /// Pattern text typed so far.
    pub text: String,
    pub direction: Direction,
    /// Primary cursor position when the session opened; restored on cancel.
    pub saved: Position,
}

/// The remembered pattern and direction, plus any active input session.
#[derive(Debug, Clone)]
pub struct SearchState {
    pattern: String,
    direction: Direction,
    input: Option<SearchInput>,
}

impl SearchState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pattern: String::new(),
            direction: Direction::Forward,
            input: None,
        }
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    #[must_use]
    pub fn has_pattern(&self) -> bool {
        !self.pattern.is_empty()
    }

    /// Remember a confirmed pattern and its direction.
    pub fn set_pattern(&mut self, pattern: String, direction: Direction) {
        self.pattern = pattern;
        self.direction = direction;
    }

    // -- Input session -------------------------------------------------------

    pub fn begin_input(&mut self, direction: Direction, saved: Position) {
        self.input = Some(SearchInput {
            text: String::new(),
            direction,
            saved,
        });
    }

    #[must_use]
    pub const fn is_inputting(&self) -> bool {
        self.input.is_some()
    }

    #[must_use]
    pub const fn input(&self) -> Option<&SearchInput> {
        self.input.as_ref()
    }

    pub const fn input_mut(&mut self) -> Option<&mut SearchInput> {
        self.input.as_mut()
    }

    /// End the session, returning it for confirmation or cancellation.
    pub fn take_input(&mut self) -> Option<SearchInput> {
        self.input.take()
    }
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Match picking
// ---------------------------------------------------------------------------

/// The next match strictly past `from` in `direction`, wrapping around the
/// buffer when `wrap` allows it. `matches` must be in document order.
#[must_use]
pub fn next_match(
    matches: &[Range],
    from: Position,
    direction: Direction,
    wrap: bool,
) -> Option<Range> {
    if matches.is_empty() {
        return None;
    }
    match direction {
        Direction::Forward => matches
            .iter()
            .find(|m| m.start > from)
            .or_else(|| wrap.then(|| &matches[0]))
            .copied(),
        Direction::Backward => matches
            .iter()
            .rev()
            .find(|m| m.start < from)
            .or_else(|| wrap.then(|| &matches[matches.len() - 1]))
            .copied(),
    }
}

/// Like [`next_match`] but a match starting exactly at `from` counts.
/// Incremental display uses this so typing never skips the match under the
/// cursor.
#[must_use]
pub fn match_from(
    matches: &[Range],
    from: Position,
    direction: Direction,
    wrap: bool,
) -> Option<Range> {
    if matches.iter().any(|m| m.start == from) {
        return matches.iter().find(|m| m.start == from).copied();
    }
    next_match(matches, from, direction, wrap)
}

/// The match containing `pos`, if any.
#[must_use]
pub fn match_containing(matches: &[Range], pos: Position) -> Option<Range> {
    matches.iter().find(|m| m.contains(pos)).copied()
}

/// Whole-word pattern for `*` and `#`.
#[must_use]
pub fn word_pattern(word: &str) -> String {
    format!(r"\b{}\b", regex::escape(word))
}

// ---------------------------------------------------------------------------
// RegexSearcher
// ---------------------------------------------------------------------------

/// The bundled [`SearchProvider`]: patterns are regex syntax, matched over
/// the whole document. Zero-width matches are dropped — they cannot be
/// jumped to or highlighted meaningfully.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexSearcher;

impl SearchProvider for RegexSearcher {
    fn find_all(
        &self,
        buffer: &dyn TextBuffer,
        pattern: &str,
        ignore_case: bool,
    ) -> Result<Vec<Range>, VimError> {
        if pattern.is_empty() {
            return Err(VimError::PatternNotFound(String::new()));
        }
        let re = RegexBuilder::new(pattern)
            .case_insensitive(ignore_case)
            .build()
            .map_err(|_| VimError::PatternNotFound(pattern.to_string()))?;

        let hay = buffer.contents();
        let mut out = Vec::new();
        // Single monotonic byte→char scan; find_iter yields ascending starts.
        let mut byte = 0;
        let mut chars = 0;
        for m in re.find_iter(&hay) {
            if m.start() == m.end() {
                continue;
            }
            chars += hay[byte..m.start()].chars().count();
            byte = m.start();
            let start = buffer.position_at(chars);

            chars += hay[byte..m.end()].chars().count();
            byte = m.end();
            out.push(Range::new(start, buffer.position_at(chars)));
        }
        Ok(out)
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

    fn find(text: &str, pattern: &str) -> Vec<Range> {
        RegexSearcher
            .find_all(&ScratchBuffer::from_text(text), pattern, false)
            .unwrap()
    }

    // -- RegexSearcher --------------------------------------------------------

    #[test]
    fn finds_all_in_document_order() {
        let matches = find("foo bar\nfoo baz", "foo");
        assert_eq!(
            matches,
            vec![
                Range::new(p(0, 0), p(0, 3)),
                Range::new(p(1, 0), p(1, 3)),
            ]
        );
    }

    #[test]
    fn case_insensitive_flag() {
        let buf = ScratchBuffer::from_text("Foo foo FOO");
        assert_eq!(RegexSearcher.find_all(&buf, "foo", true).unwrap().len(), 3);
        assert_eq!(RegexSearcher.find_all(&buf, "foo", false).unwrap().len(), 1);
    }

    #[test]
    fn bad_pattern_is_domain_error() {
        let buf = ScratchBuffer::from_text("x");
        let err = RegexSearcher.find_all(&buf, "(unclosed", false).unwrap_err();
        assert!(matches!(err, VimError::PatternNotFound(_)));
    }

    #[test]
    fn empty_pattern_is_rejected() {
        let buf = ScratchBuffer::from_text("x");
        assert!(RegexSearcher.find_all(&buf, "", false).is_err());
    }

    #[test]
    fn zero_width_matches_are_dropped() {
        let matches = find("ab", "x?");
        assert!(matches.is_empty());
    }

    #[test]
    fn multibyte_columns_are_char_counted() {
        let matches = find("αβγ δ", "δ");
        assert_eq!(matches, vec![Range::new(p(0, 4), p(0, 5))]);
    }

    #[test]
    fn word_pattern_escapes_and_bounds() {
        let matches = find("ab a.b ab", &word_pattern("a.b"));
        assert_eq!(matches, vec![Range::new(p(0, 3), p(0, 6))]);
    }

    // -- next_match -----------------------------------------------------------

    fn three() -> Vec<Range> {
        vec![
            Range::new(p(0, 2), p(0, 5)),
            Range::new(p(1, 0), p(1, 3)),
            Range::new(p(3, 4), p(3, 7)),
        ]
    }

    #[test]
    fn forward_picks_strictly_after() {
        let m = three();
        assert_eq!(next_match(&m, p(0, 2), Direction::Forward, false), Some(m[1]));
        assert_eq!(next_match(&m, p(1, 0), Direction::Forward, false), Some(m[2]));
    }

    #[test]
    fn forward_wraps_or_fails() {
        let m = three();
        assert_eq!(next_match(&m, p(3, 4), Direction::Forward, true), Some(m[0]));
        assert_eq!(next_match(&m, p(3, 4), Direction::Forward, false), None);
    }

    #[test]
    fn backward_picks_strictly_before() {
        let m = three();
        assert_eq!(next_match(&m, p(1, 0), Direction::Backward, false), Some(m[0]));
        assert_eq!(next_match(&m, p(9, 0), Direction::Backward, false), Some(m[2]));
    }

    #[test]
    fn backward_wraps_to_last() {
        let m = three();
        assert_eq!(next_match(&m, p(0, 0), Direction::Backward, true), Some(m[2]));
        assert_eq!(next_match(&m, p(0, 0), Direction::Backward, false), None);
    }

    #[test]
    fn empty_match_list() {
        assert_eq!(next_match(&[], p(0, 0), Direction::Forward, true), None);
    }

    // -- match_from / match_containing ----------------------------------------

    #[test]
    fn match_from_counts_exact_start() {
        let m = three();
        assert_eq!(match_from(&m, p(1, 0), Direction::Forward, false), Some(m[1]));
    }

    #[test]
    fn containing_respects_half_open_end() {
        let m = three();
        assert_eq!(match_containing(&m, p(0, 4)), Some(m[0]));
        assert_eq!(match_containing(&m, p(0, 5)), None);
    }

    // -- SearchState ----------------------------------------------------------

    #[test]
    fn state_remembers_pattern_and_direction() {
        let mut s = SearchState::new();
        assert!(!s.has_pattern());
        s.set_pattern("foo".into(), Direction::Backward);
        assert_eq!(s.pattern(), "foo");
        assert_eq!(s.direction(), Direction::Backward);
    }

    #[test]
    fn input_session_lifecycle() {
        let mut s = SearchState::new();
        s.begin_input(Direction::Forward, p(2, 3));
        assert!(s.is_inputting());
        s.input_mut().unwrap().text.push('x');

        let session = s.take_input().unwrap();
        assert_eq!(session.text, "x");
        assert_eq!(session.saved, p(2, 3));
        assert!(!s.is_inputting());
    }

    #[test]
    fn direction_opposite() {
        assert_eq!(Direction::Forward.opposite(), Direction::Backward);
        assert_eq!(Direction::Backward.opposite(), Direction::Forward);
    }
}
