//! The in-progress command accumulator.
//!
//! One logical command builds up across several key events following the
//! grammar `[count]["register][operator][count]{motion | text object}`.
//! `Pending` holds everything collected so far: the count being typed, the
//! selected register, the pending operator (with its own count, typed before
//! the operator key), and the keys fed to the matcher since the last
//! completed command.
//!
//! The engine creates one `Pending` and clears it — it is never replaced —
//! so cancellation is a single [`clear`](Pending::clear) call and there is
//! no partial state left behind when a command aborts.
//!
//! Count semantics: `0` means "no count typed". The effective count of a
//! composed command multiplies the operator count with the motion count
//! (`2d3w` deletes six words); [`merge_counts`] implements that rule.

use crate::action::Operator;
use crate::key::KeyEvent;

/// Merge an operator count with a motion count.
///
/// `0` is "unset": if both are unset the result is unset; one set count
/// passes through; two set counts multiply (saturating).
#[must_use]
pub const fn merge_counts(a: usize, b: usize) -> usize {
    match (a, b) {
        (0, n) | (n, 0) => n,
        (a, b) => a.saturating_mul(b),
    }
}

/// A pending operator: the verb, the count typed before it, and the key that
/// doubles it into the line-wise form (`dd`, `yy`, `gUU` — the last literal
/// key of the operator's pattern).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpState {
    pub op: Operator,
    pub count: usize,
    pub doubled: KeyEvent,
}

/// Accumulator for one logical command in progress.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Pending {
    /// Count being typed right now (the motion count once an operator is
    /// set). 0 = unset.
    count: usize,
    operator: Option<OpState>,
    register: Option<char>,
    /// Keys fed to the matcher since the last completed (or discarded)
    /// sequence. Count digits and the register prefix never land here.
    keys: Vec<KeyEvent>,
    /// `"` was typed; the next key names the register.
    awaiting_register: bool,
}

impl Pending {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -- Counts ---------------------------------------------------------------

    /// Append a digit to the count accumulator.
    pub const fn push_digit(&mut self, digit: u8) {
        self.count = self.count.saturating_mul(10).saturating_add(digit as usize);
    }

    /// True while digits are accumulating — `0` extends the count instead of
    /// acting as the line-start motion.
    #[inline]
    #[must_use]
    pub const fn counting(&self) -> bool {
        self.count > 0
    }

    /// Take the current count, `None` if no digits were typed.
    pub const fn take_count(&mut self) -> Option<usize> {
        let c = self.count;
        self.count = 0;
        if c == 0 { None } else { Some(c) }
    }

    /// Force the count (dot-repeat installs the stored count this way).
    pub const fn set_count(&mut self, count: usize) {
        self.count = count;
    }

    /// Operator count × motion count, `None` when neither was typed.
    /// Does not consume anything.
    #[must_use]
    pub fn effective_count(&self) -> Option<usize> {
        let op_count = self.operator.map_or(0, |o| o.count);
        match merge_counts(op_count, self.count) {
            0 => None,
            n => Some(n),
        }
    }

    // -- Operator -------------------------------------------------------------

    /// Enter operator-pending: the accumulated count becomes the operator's
    /// count and the count accumulator resets for the motion count.
    pub const fn set_operator(&mut self, op: Operator, doubled: KeyEvent) {
        self.operator = Some(OpState {
            op,
            count: self.count,
            doubled,
        });
        self.count = 0;
    }

    #[inline]
    #[must_use]
    pub const fn operator(&self) -> Option<OpState> {
        self.operator
    }

    // -- Register -------------------------------------------------------------

    /// `"` was typed: the next key names the register.
    pub const fn begin_register(&mut self) {
        self.awaiting_register = true;
    }

    #[inline]
    #[must_use]
    pub const fn awaiting_register(&self) -> bool {
        self.awaiting_register
    }

    pub const fn set_register(&mut self, name: char) {
        self.register = Some(name);
        self.awaiting_register = false;
    }

    #[inline]
    #[must_use]
    pub const fn register(&self) -> Option<char> {
        self.register
    }

    // -- Key sequence ---------------------------------------------------------

    pub fn push_key(&mut self, key: KeyEvent) {
        self.keys.push(key);
    }

    #[inline]
    #[must_use]
    pub fn keys(&self) -> &[KeyEvent] {
        &self.keys
    }

    /// Take the matched sequence, leaving counts/operator/register in place.
    /// Called when the matcher resolves — the operator stays pending while
    /// its motion keys accumulate in a fresh sequence.
    pub fn take_keys(&mut self) -> Vec<KeyEvent> {
        std::mem::take(&mut self.keys)
    }

    /// Drop an unmatchable sequence, keeping any pending operator and counts.
    /// (A stray key after `d` discards the key, not the operator — the next
    /// key may still complete the command.)
    pub fn discard_keys(&mut self) {
        self.keys.clear();
    }

    // -- Lifecycle ------------------------------------------------------------

    /// True when nothing at all is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
            && self.operator.is_none()
            && self.register.is_none()
            && self.keys.is_empty()
            && !self.awaiting_register
    }

    /// Discard the whole in-progress command. Cancellation and command
    /// completion both end here.
    pub fn clear(&mut self) {
        self.count = 0;
        self.operator = None;
        self.register = None;
        self.keys.clear();
        self.awaiting_register = false;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- merge_counts ---------------------------------------------------------

    #[test]
    fn merge_counts_unset_rules() {
        assert_eq!(merge_counts(0, 0), 0);
        assert_eq!(merge_counts(2, 0), 2);
        assert_eq!(merge_counts(0, 3), 3);
        assert_eq!(merge_counts(2, 3), 6);
    }

    #[test]
    fn merge_counts_saturates() {
        assert_eq!(merge_counts(usize::MAX, 2), usize::MAX);
    }

    // -- Count accumulation ---------------------------------------------------

    #[test]
    fn digits_build_decimal() {
        let mut p = Pending::new();
        assert!(!p.counting());
        p.push_digit(1);
        p.push_digit(2);
        assert!(p.counting());
        assert_eq!(p.take_count(), Some(12));
        assert_eq!(p.take_count(), None);
    }

    #[test]
    fn effective_count_multiplies_across_operator() {
        let mut p = Pending::new();
        p.push_digit(2);
        p.set_operator(Operator::Delete, KeyEvent::char('d'));
        assert_eq!(p.effective_count(), Some(2));
        p.push_digit(3);
        assert_eq!(p.effective_count(), Some(6));
    }

    #[test]
    fn effective_count_unset_without_digits() {
        let mut p = Pending::new();
        assert_eq!(p.effective_count(), None);
        p.set_operator(Operator::Yank, KeyEvent::char('y'));
        assert_eq!(p.effective_count(), None);
    }

    // -- Operator -------------------------------------------------------------

    #[test]
    fn set_operator_captures_count() {
        let mut p = Pending::new();
        p.push_digit(4);
        p.set_operator(Operator::Change, KeyEvent::char('c'));
        let op = p.operator().unwrap();
        assert_eq!(op.op, Operator::Change);
        assert_eq!(op.count, 4);
        assert_eq!(op.doubled, KeyEvent::char('c'));
        // Motion count starts fresh.
        assert!(!p.counting());
    }

    // -- Register -------------------------------------------------------------

    #[test]
    fn register_capture_flow() {
        let mut p = Pending::new();
        p.begin_register();
        assert!(p.awaiting_register());
        p.set_register('a');
        assert!(!p.awaiting_register());
        assert_eq!(p.register(), Some('a'));
    }

    // -- Keys and lifecycle ---------------------------------------------------

    #[test]
    fn take_keys_leaves_command_state() {
        let mut p = Pending::new();
        p.push_digit(2);
        p.set_operator(Operator::Delete, KeyEvent::char('d'));
        p.push_key(KeyEvent::char('i'));
        p.push_key(KeyEvent::char('w'));

        let keys = p.take_keys();
        assert_eq!(keys.len(), 2);
        assert!(p.keys().is_empty());
        assert!(p.operator().is_some());
    }

    #[test]
    fn discard_keys_keeps_operator() {
        let mut p = Pending::new();
        p.set_operator(Operator::Delete, KeyEvent::char('d'));
        p.push_key(KeyEvent::char('Z'));
        p.discard_keys();
        assert!(p.keys().is_empty());
        assert!(p.operator().is_some());
    }

    #[test]
    fn clear_resets_everything() {
        let mut p = Pending::new();
        p.push_digit(3);
        p.set_operator(Operator::Delete, KeyEvent::char('d'));
        p.set_register('b');
        p.push_key(KeyEvent::char('w'));
        assert!(!p.is_empty());

        p.clear();
        assert!(p.is_empty());
        assert_eq!(p.effective_count(), None);
    }
}
