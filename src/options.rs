//! Engine options — the read-only configuration snapshot.
//!
//! The host owns option storage, parsing, and persistence; the engine only
//! consults an injected [`Options`] value. It is immutable for the duration
//! of one key event (replace it between keys with
//! [`Engine::set_options`](crate::engine::Engine::set_options)).
//!
//! Names and defaults track the Vim options they correspond to.

/// Option snapshot consulted by matcher, composer, and operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// `ignorecase` — searches ignore case.
    pub ignore_case: bool,
    /// `smartcase` — an uppercase char in the pattern overrides
    /// `ignore_case` back to sensitive. Meaningless without `ignore_case`.
    pub smart_case: bool,
    /// `wrapscan` — searches wrap around the ends of the buffer.
    pub wrap_scan: bool,
    /// `whichwrap` for `h`/`l` — allow them to cross line boundaries.
    pub which_wrap_h_l: bool,
    /// Off reproduces Vim's `cw` special case (`cw` acts like `ce`, leaving
    /// trailing whitespace). On makes `cw` take exactly what `dw` takes.
    pub change_word_eats_whitespace: bool,
    /// `textwidth` — wrap width for the reflow operator (`gq`).
    /// 0 means unset; reflow then falls back to 79, as Vim's formatter does.
    pub text_width: usize,
    /// `shiftwidth` — columns inserted/removed by `>` and `<`.
    pub shift_width: usize,
    /// Label characters for the jump overlay, in assignment order.
    pub label_alphabet: Vec<char>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            ignore_case: false,
            smart_case: false,
            wrap_scan: true,
            which_wrap_h_l: false,
            change_word_eats_whitespace: false,
            text_width: 0,
            shift_width: 4,
            label_alphabet: ('a'..='z').collect(),
        }
    }
}

impl Options {
    /// Should a search for `pattern` ignore case, after applying the
    /// smartcase rule?
    #[must_use]
    pub fn search_ignores_case(&self, pattern: &str) -> bool {
        if !self.ignore_case {
            return false;
        }
        if self.smart_case && pattern.chars().any(char::is_uppercase) {
            return false;
        }
        true
    }

    /// Effective reflow width for `gq`.
    #[inline]
    #[must_use]
    pub const fn reflow_width(&self) -> usize {
        if self.text_width == 0 {
            79
        } else {
            self.text_width
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- Defaults -------------------------------------------------------------

    #[test]
    fn defaults_match_vim() {
        let o = Options::default();
        assert!(!o.ignore_case);
        assert!(o.wrap_scan);
        assert!(!o.which_wrap_h_l);
        assert_eq!(o.text_width, 0);
        assert_eq!(o.label_alphabet.len(), 26);
    }

    // -- Case rules -------------------------------------------------------------

    #[test]
    fn case_sensitive_by_default() {
        let o = Options::default();
        assert!(!o.search_ignores_case("foo"));
        assert!(!o.search_ignores_case("Foo"));
    }

    #[test]
    fn ignorecase_without_smartcase() {
        let o = Options {
            ignore_case: true,
            ..Options::default()
        };
        assert!(o.search_ignores_case("foo"));
        assert!(o.search_ignores_case("Foo"));
    }

    #[test]
    fn smartcase_flips_on_uppercase() {
        let o = Options {
            ignore_case: true,
            smart_case: true,
            ..Options::default()
        };
        assert!(o.search_ignores_case("foo"));
        assert!(!o.search_ignores_case("Foo"));
    }

    // -- Reflow width --------------------------------------------------------------

    #[test]
    fn reflow_width_falls_back() {
        let mut o = Options::default();
        assert_eq!(o.reflow_width(), 79);
        o.text_width = 72;
        assert_eq!(o.reflow_width(), 72);
    }
}
