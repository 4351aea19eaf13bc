//! Key events and Vim key notation.
//!
//! The engine consumes [`KeyEvent`]s — a key identity plus modifier flags.
//! Hosts map their platform events (terminal escape sequences, GUI keycodes)
//! into this shape; the engine never parses raw input bytes.
//!
//! Printable characters carry their case in the char itself: `Shift+a`
//! arrives as `Char('A')` with no modifier bit. The `SHIFT` flag only
//! matters for named keys (`<S-Tab>`), which the engine currently ignores.
//!
//! [`parse_notation`] turns Vim's textual key notation (`"3dw<Esc>"`,
//! `"<C-v>"`) into events. Tests and bulk feeding (`Engine::feed_str`) use
//! it; interactive hosts usually construct events directly.

use bitflags::bitflags;

// ---------------------------------------------------------------------------
// Key identity
// ---------------------------------------------------------------------------

/// Identity of a key. Printable characters use [`Char`](KeyCode::Char);
/// named keys get dedicated variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A Unicode character (printable).
    Char(char),
    Escape,
    Enter,
    Tab,
    Backspace,
    Delete,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
}

bitflags! {
    /// Keyboard modifier flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
    }
}

/// A single key press: identity + modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    /// A bare key with no modifiers.
    #[inline]
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
        }
    }

    /// A printable character key.
    #[inline]
    #[must_use]
    pub const fn char(ch: char) -> Self {
        Self::new(KeyCode::Char(ch))
    }

    /// `Ctrl` + a character key.
    #[inline]
    #[must_use]
    pub const fn ctrl(ch: char) -> Self {
        Self {
            code: KeyCode::Char(ch),
            modifiers: Modifiers::CTRL,
        }
    }

    /// The Escape key.
    #[inline]
    #[must_use]
    pub const fn esc() -> Self {
        Self::new(KeyCode::Escape)
    }

    /// The Enter key.
    #[inline]
    #[must_use]
    pub const fn enter() -> Self {
        Self::new(KeyCode::Enter)
    }

    /// The Backspace key.
    #[inline]
    #[must_use]
    pub const fn backspace() -> Self {
        Self::new(KeyCode::Backspace)
    }

    /// The printable character of this event, if it is an unmodified
    /// character key. `Ctrl`/`Alt` combinations return `None` so they can
    /// never be mistaken for typed text.
    #[must_use]
    pub fn text_char(self) -> Option<char> {
        match self.code {
            KeyCode::Char(ch)
                if !self.modifiers.intersects(Modifiers::CTRL | Modifiers::ALT) =>
            {
                Some(ch)
            }
            _ => None,
        }
    }

    /// True for `Ctrl` + the given character.
    #[inline]
    #[must_use]
    pub fn is_ctrl(self, ch: char) -> bool {
        self.modifiers.contains(Modifiers::CTRL) && self.code == KeyCode::Char(ch)
    }
}

// ---------------------------------------------------------------------------
// Key notation
// ---------------------------------------------------------------------------

/// Parse a string of Vim key notation into events.
///
/// Plain characters map one-to-one. Angle-bracket groups name special keys
/// and modified keys:
///
/// | Notation | Event |
/// |----------|-------|
/// | `<Esc>` | Escape |
/// | `<CR>`, `<Enter>` | Enter |
/// | `<Tab>` | Tab |
/// | `<BS>` | Backspace |
/// | `<Del>` | Delete |
/// | `<Space>` | `Char(' ')` |
/// | `<lt>` | `Char('<')` |
/// | `<Up>` `<Down>` `<Left>` `<Right>` `<Home>` `<End>` | named keys |
/// | `<C-x>` | Ctrl + `x` |
/// | `<A-x>`, `<M-x>` | Alt + `x` |
///
/// A `<` that does not open a recognized group is taken literally, matching
/// how Vim treats stray `<` in typed input.
#[must_use]
pub fn parse_notation(input: &str) -> Vec<KeyEvent> {
    let mut keys = Vec::new();
    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        if ch == '<' {
            if let Some(close) = chars[i + 1..].iter().position(|&c| c == '>') {
                let group: String = chars[i + 1..i + 1 + close].iter().collect();
                if let Some(key) = parse_group(&group) {
                    keys.push(key);
                    i += close + 2;
                    continue;
                }
            }
        }
        keys.push(KeyEvent::char(ch));
        i += 1;
    }

    keys
}

/// Parse the inside of one `<...>` group. `None` means "not a recognized
/// group" and the caller falls back to a literal `<`.
fn parse_group(group: &str) -> Option<KeyEvent> {
    // Modifier prefix: C- / A- / M- / S- (possibly stacked, e.g. <C-S-x>).
    let mut modifiers = Modifiers::empty();
    let mut rest = group;
    loop {
        let Some((prefix, tail)) = rest.split_once('-') else {
            break;
        };
        let flag = match prefix {
            "C" | "c" => Modifiers::CTRL,
            "A" | "a" | "M" | "m" => Modifiers::ALT,
            "S" | "s" => Modifiers::SHIFT,
            _ => break,
        };
        // A trailing '-' with nothing after it is the literal key '-'.
        if tail.is_empty() {
            return None;
        }
        modifiers |= flag;
        rest = tail;
    }

    let code = match rest {
        "Esc" | "esc" => KeyCode::Escape,
        "CR" | "cr" | "Enter" | "enter" | "Return" => KeyCode::Enter,
        "Tab" | "tab" => KeyCode::Tab,
        "BS" | "bs" => KeyCode::Backspace,
        "Del" | "del" => KeyCode::Delete,
        "Space" | "space" => KeyCode::Char(' '),
        "lt" => KeyCode::Char('<'),
        "Up" => KeyCode::Up,
        "Down" => KeyCode::Down,
        "Left" => KeyCode::Left,
        "Right" => KeyCode::Right,
        "Home" => KeyCode::Home,
        "End" => KeyCode::End,
        _ => {
            let mut it = rest.chars();
            let ch = it.next()?;
            if it.next().is_some() {
                return None;
            }
            // Bare single chars are only meaningful with a modifier;
            // "<x>" alone is not notation.
            if modifiers.is_empty() {
                return None;
            }
            KeyCode::Char(ch)
        }
    };

    Some(KeyEvent { code, modifiers })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- Constructors --------------------------------------------------------

    #[test]
    fn char_constructor_is_unmodified() {
        let k = KeyEvent::char('a');
        assert_eq!(k.code, KeyCode::Char('a'));
        assert!(k.modifiers.is_empty());
        assert_eq!(k.text_char(), Some('a'));
    }

    #[test]
    fn ctrl_constructor_sets_flag() {
        let k = KeyEvent::ctrl('r');
        assert!(k.is_ctrl('r'));
        assert!(!k.is_ctrl('s'));
        assert_eq!(k.text_char(), None);
    }

    #[test]
    fn uppercase_char_is_not_shift_modified() {
        let k = KeyEvent::char('A');
        assert!(k.modifiers.is_empty());
        assert_eq!(k.text_char(), Some('A'));
    }

    // -- Notation: plain chars -------------------------------------------------

    #[test]
    fn plain_chars_map_one_to_one() {
        let keys = parse_notation("dw");
        assert_eq!(keys, vec![KeyEvent::char('d'), KeyEvent::char('w')]);
    }

    #[test]
    fn digits_and_symbols_are_literal() {
        let keys = parse_notation("3$");
        assert_eq!(keys, vec![KeyEvent::char('3'), KeyEvent::char('$')]);
    }

    // -- Notation: groups ---------------------------------------------------------

    #[test]
    fn named_keys() {
        assert_eq!(parse_notation("<Esc>"), vec![KeyEvent::esc()]);
        assert_eq!(parse_notation("<CR>"), vec![KeyEvent::enter()]);
        assert_eq!(parse_notation("<BS>"), vec![KeyEvent::backspace()]);
        assert_eq!(
            parse_notation("<Space>"),
            vec![KeyEvent::char(' ')]
        );
    }

    #[test]
    fn ctrl_group() {
        assert_eq!(parse_notation("<C-v>"), vec![KeyEvent::ctrl('v')]);
        assert_eq!(parse_notation("<C-o>"), vec![KeyEvent::ctrl('o')]);
    }

    #[test]
    fn alt_group_both_spellings() {
        let alt_x = KeyEvent {
            code: KeyCode::Char('x'),
            modifiers: Modifiers::ALT,
        };
        assert_eq!(parse_notation("<A-x>"), vec![alt_x]);
        assert_eq!(parse_notation("<M-x>"), vec![alt_x]);
    }

    #[test]
    fn modified_named_key() {
        let keys = parse_notation("<C-Home>");
        assert_eq!(
            keys,
            vec![KeyEvent {
                code: KeyCode::Home,
                modifiers: Modifiers::CTRL,
            }]
        );
    }

    #[test]
    fn lt_escape() {
        assert_eq!(parse_notation("<lt>"), vec![KeyEvent::char('<')]);
    }

    // -- Notation: fallbacks ---------------------------------------------------------

    #[test]
    fn unrecognized_group_is_literal() {
        // "<zz>" is not notation; every char is literal.
        let keys = parse_notation("<zz>");
        assert_eq!(keys.len(), 4);
        assert_eq!(keys[0], KeyEvent::char('<'));
        assert_eq!(keys[3], KeyEvent::char('>'));
    }

    #[test]
    fn unclosed_angle_is_literal() {
        let keys = parse_notation("a<b");
        assert_eq!(
            keys,
            vec![
                KeyEvent::char('a'),
                KeyEvent::char('<'),
                KeyEvent::char('b'),
            ]
        );
    }

    #[test]
    fn bare_single_char_group_is_literal() {
        // "<x>" without a modifier is not a key name.
        let keys = parse_notation("<x>");
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn mixed_sequence() {
        let keys = parse_notation("ciw<Esc>p");
        assert_eq!(keys.len(), 5);
        assert_eq!(keys[3], KeyEvent::esc());
        assert_eq!(keys[4], KeyEvent::char('p'));
    }
}
