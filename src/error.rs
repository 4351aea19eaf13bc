//! Domain errors — the closed set of user-visible failure conditions.
//!
//! Three kinds of failure exist in the engine and only one of them is an
//! error. Unmatched key sequences are discarded silently. Failed motions
//! (`%` with no bracket under the cursor) make the composed command a no-op.
//! Only the conditions below are reported to the user, through
//! [`FeedbackSink::error`](crate::traits::FeedbackSink::error); none of them
//! ever mutate the buffer, and the session always continues in Normal mode.
//!
//! Messages follow Vim's wording (including the E-numbers) so hosts can show
//! them verbatim.

use thiserror::Error;

/// A recoverable, user-visible error condition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VimError {
    /// A mark motion (`` `x ``, `'x`) named a mark that was never set.
    #[error("E20: Mark not set: {0}")]
    MarkNotSet(char),

    /// A search (or `n`/`N`/`*`/`#`) found no match for the pattern.
    #[error("E486: Pattern not found: {0}")]
    PatternNotFound(String),

    /// Macro playback from a register that holds nothing.
    #[error("E353: Nothing in register {0}")]
    EmptyRegister(char),

    /// `@@` before any macro has been played.
    #[error("E748: No previously used register")]
    NoPreviousMacro,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_use_vim_wording() {
        assert_eq!(
            VimError::MarkNotSet('a').to_string(),
            "E20: Mark not set: a"
        );
        assert_eq!(
            VimError::PatternNotFound("foo".into()).to_string(),
            "E486: Pattern not found: foo"
        );
        assert_eq!(
            VimError::EmptyRegister('q').to_string(),
            "E353: Nothing in register q"
        );
    }

    #[test]
    fn errors_compare_by_value() {
        assert_eq!(VimError::MarkNotSet('a'), VimError::MarkNotSet('a'));
        assert_ne!(VimError::MarkNotSet('a'), VimError::MarkNotSet('b'));
    }
}
