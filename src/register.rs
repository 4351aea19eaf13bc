//! Registers — storage for yanked and deleted text.
//!
//! Every yank and delete writes a register; paste reads one back. A register
//! remembers how its text was captured, because paste reinserts each kind
//! differently:
//!
//! - **Char-wise**: inline at the cursor (`p` after, `P` before).
//! - **Line-wise**: whole lines below (`p`) or above (`P`) the cursor line.
//! - **Block-wise**: one line fragment per row, at the cursor column.
//!
//! ## The register file
//!
//! - **Unnamed (`""`)** — updated by every yank and delete, always.
//! - **Named (`"a`–`"z`)** — user-selected targets; uppercase appends.
//! - **`"0`** — the last yank that did not name a register.
//! - **`"1`–`"9`** — the delete ring; every delete shifts it down one slot.
//!
//! Engine code never writes registers directly — operators go through
//! [`RegisterFile::record_yank`] / [`RegisterFile::record_delete`] so the
//! unnamed/ring bookkeeping stays in one place.

/// How register content was captured — determines paste behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterKind {
    /// Character-wise. Paste inserts inline at the cursor.
    Char,
    /// Line-wise. Content is newline-terminated whole lines; paste opens
    /// lines above/below.
    Line,
    /// Block-wise. Content is one fragment per source row, newline-joined;
    /// paste reinserts the fragments column-aligned.
    Block,
}

/// A single register slot.
#[derive(Debug, Clone)]
pub struct Register {
    /// Stored text. Empty when nothing has been captured.
    content: String,
    /// Capture kind. `Char` when empty (paste of nothing is a no-op).
    kind: RegisterKind,
}

impl Register {
    /// An empty register.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            content: String::new(),
            kind: RegisterKind::Char,
        }
    }

    /// Replace the register's content.
    pub fn set(&mut self, text: String, kind: RegisterKind) {
        self.content = text;
        self.kind = kind;
    }

    /// Append to the register (uppercase register names).
    ///
    /// If either side is line-wise the register becomes line-wise and the
    /// pieces are joined at a line boundary.
    pub fn append(&mut self, text: &str, kind: RegisterKind) {
        if kind == RegisterKind::Line || self.kind == RegisterKind::Line {
            if !self.content.is_empty() && !self.content.ends_with('\n') {
                self.content.push('\n');
            }
            self.content.push_str(text);
            self.kind = RegisterKind::Line;
        } else {
            self.content.push_str(text);
        }
    }

    /// The stored text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// How the text was captured.
    #[must_use]
    pub const fn kind(&self) -> RegisterKind {
        self.kind
    }

    /// True when there is nothing to paste.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

impl Default for Register {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Register file
// ---------------------------------------------------------------------------

/// The complete register file: unnamed + named a–z + numbered 0–9.
pub struct RegisterFile {
    /// `""` — receives every yank and delete.
    unnamed: Register,
    /// `"a`–`"z`, indexed by `ch - 'a'`.
    named: [Register; 26],
    /// `"0` (last yank) through `"9` (oldest ring entry).
    numbered: [Register; 10],
}

impl RegisterFile {
    /// A register file with every slot empty.
    #[must_use]
    pub fn new() -> Self {
        Self {
            unnamed: Register::new(),
            named: std::array::from_fn(|_| Register::new()),
            numbered: std::array::from_fn(|_| Register::new()),
        }
    }

    /// Record a yank.
    ///
    /// - `name == None` → unnamed + `"0`.
    /// - `Some('a'..='z')` → overwrite named, copy to unnamed.
    /// - `Some('A'..='Z')` → append to named, copy the result to unnamed.
    /// - `Some('0'..='9')` → overwrite that numbered slot + unnamed.
    ///
    /// Unrecognized names fall back to unnamed-only.
    pub fn record_yank(&mut self, name: Option<char>, text: String, kind: RegisterKind) {
        match name {
            None => {
                self.numbered[0].set(text.clone(), kind);
                self.unnamed.set(text, kind);
            }
            Some(ch) => self.store_named(ch, text, kind),
        }
    }

    /// Record a delete: shift the ring (`"1` ← text, old `"1` → `"2`, …),
    /// then update the unnamed register and any explicitly named target.
    pub fn record_delete(&mut self, name: Option<char>, text: String, kind: RegisterKind) {
        for i in (2..10).rev() {
            self.numbered[i] = self.numbered[i - 1].clone();
        }
        self.numbered[1].set(text.clone(), kind);

        match name {
            None => self.unnamed.set(text, kind),
            Some(ch) => self.store_named(ch, text, kind),
        }
    }

    fn store_named(&mut self, name: char, text: String, kind: RegisterKind) {
        match name {
            'a'..='z' => {
                let idx = (name as u8 - b'a') as usize;
                self.named[idx].set(text.clone(), kind);
                self.unnamed.set(text, kind);
            }
            'A'..='Z' => {
                let idx = (name as u8 - b'A') as usize;
                self.named[idx].append(&text, kind);
                let full = self.named[idx].content().to_string();
                let full_kind = self.named[idx].kind();
                self.unnamed.set(full, full_kind);
            }
            '0'..='9' => {
                let idx = (name as u8 - b'0') as usize;
                self.numbered[idx].set(text.clone(), kind);
                self.unnamed.set(text, kind);
            }
            _ => self.unnamed.set(text, kind),
        }
    }

    /// The register to read from. `None` is the unnamed register; uppercase
    /// names read their lowercase slot; unknown names fall back to unnamed.
    #[must_use]
    pub const fn get(&self, name: Option<char>) -> &Register {
        match name {
            Some(ch) if ch.is_ascii_lowercase() => &self.named[(ch as u8 - b'a') as usize],
            Some(ch) if ch.is_ascii_uppercase() => &self.named[(ch as u8 - b'A') as usize],
            Some(ch) if ch.is_ascii_digit() => &self.numbered[(ch as u8 - b'0') as usize],
            _ => &self.unnamed,
        }
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- Register slot --------------------------------------------------------

    #[test]
    fn new_register_is_empty_char() {
        let reg = Register::new();
        assert!(reg.is_empty());
        assert_eq!(reg.kind(), RegisterKind::Char);
    }

    #[test]
    fn set_replaces_content_and_kind() {
        let mut reg = Register::new();
        reg.set("first".into(), RegisterKind::Char);
        reg.set("second\n".into(), RegisterKind::Line);
        assert_eq!(reg.content(), "second\n");
        assert_eq!(reg.kind(), RegisterKind::Line);
    }

    #[test]
    fn append_char_to_char_concatenates() {
        let mut reg = Register::new();
        reg.set("foo".into(), RegisterKind::Char);
        reg.append("bar", RegisterKind::Char);
        assert_eq!(reg.content(), "foobar");
        assert_eq!(reg.kind(), RegisterKind::Char);
    }

    #[test]
    fn append_line_upgrades_kind_and_joins_at_newline() {
        let mut reg = Register::new();
        reg.set("first".into(), RegisterKind::Char);
        reg.append("second\n", RegisterKind::Line);
        assert_eq!(reg.content(), "first\nsecond\n");
        assert_eq!(reg.kind(), RegisterKind::Line);
    }

    #[test]
    fn append_char_to_line_stays_line() {
        let mut reg = Register::new();
        reg.set("first\n".into(), RegisterKind::Line);
        reg.append("tail", RegisterKind::Char);
        assert_eq!(reg.content(), "first\ntail");
        assert_eq!(reg.kind(), RegisterKind::Line);
    }

    #[test]
    fn block_kind_round_trips() {
        let mut reg = Register::new();
        reg.set("ab\ncd".into(), RegisterKind::Block);
        assert_eq!(reg.kind(), RegisterKind::Block);
        assert_eq!(reg.content(), "ab\ncd");
    }

    // -- Yank bookkeeping ---------------------------------------------------------

    #[test]
    fn unnamed_yank_updates_zero_register() {
        let mut rf = RegisterFile::new();
        rf.record_yank(None, "hello".into(), RegisterKind::Char);
        assert_eq!(rf.get(None).content(), "hello");
        assert_eq!(rf.get(Some('0')).content(), "hello");
        // The delete ring is untouched.
        assert!(rf.get(Some('1')).is_empty());
    }

    #[test]
    fn named_yank_writes_named_and_unnamed() {
        let mut rf = RegisterFile::new();
        rf.record_yank(Some('a'), "world".into(), RegisterKind::Line);
        assert_eq!(rf.get(Some('a')).content(), "world");
        assert_eq!(rf.get(None).content(), "world");
        // "0 is reserved for unnamed yanks.
        assert!(rf.get(Some('0')).is_empty());
    }

    #[test]
    fn uppercase_yank_appends() {
        let mut rf = RegisterFile::new();
        rf.record_yank(Some('a'), "hello".into(), RegisterKind::Char);
        rf.record_yank(Some('A'), " world".into(), RegisterKind::Char);
        assert_eq!(rf.get(Some('a')).content(), "hello world");
        // Unnamed sees the full appended content.
        assert_eq!(rf.get(None).content(), "hello world");
    }

    #[test]
    fn uppercase_append_to_empty_register() {
        let mut rf = RegisterFile::new();
        rf.record_yank(Some('A'), "first".into(), RegisterKind::Char);
        assert_eq!(rf.get(Some('a')).content(), "first");
    }

    #[test]
    fn get_is_case_insensitive() {
        let mut rf = RegisterFile::new();
        rf.record_yank(Some('z'), "data".into(), RegisterKind::Char);
        assert_eq!(rf.get(Some('Z')).content(), "data");
    }

    #[test]
    fn unknown_names_fall_back_to_unnamed() {
        let mut rf = RegisterFile::new();
        rf.record_yank(Some('!'), "fallback".into(), RegisterKind::Char);
        assert_eq!(rf.get(None).content(), "fallback");
        assert_eq!(rf.get(Some('!')).content(), "fallback");
    }

    // -- Delete ring ------------------------------------------------------------------

    #[test]
    fn deletes_shift_the_ring() {
        let mut rf = RegisterFile::new();
        rf.record_delete(None, "one\n".into(), RegisterKind::Line);
        rf.record_delete(None, "two\n".into(), RegisterKind::Line);
        rf.record_delete(None, "three\n".into(), RegisterKind::Line);
        assert_eq!(rf.get(Some('1')).content(), "three\n");
        assert_eq!(rf.get(Some('2')).content(), "two\n");
        assert_eq!(rf.get(Some('3')).content(), "one\n");
        assert_eq!(rf.get(None).content(), "three\n");
    }

    #[test]
    fn ring_preserves_kind_per_slot() {
        let mut rf = RegisterFile::new();
        rf.record_delete(None, "word".into(), RegisterKind::Char);
        rf.record_delete(None, "line\n".into(), RegisterKind::Line);
        assert_eq!(rf.get(Some('1')).kind(), RegisterKind::Line);
        assert_eq!(rf.get(Some('2')).kind(), RegisterKind::Char);
    }

    #[test]
    fn ring_drops_oldest_past_nine() {
        let mut rf = RegisterFile::new();
        for i in 0..12 {
            rf.record_delete(None, format!("d{i}"), RegisterKind::Char);
        }
        assert_eq!(rf.get(Some('1')).content(), "d11");
        assert_eq!(rf.get(Some('9')).content(), "d3");
    }

    #[test]
    fn delete_leaves_zero_register_alone() {
        let mut rf = RegisterFile::new();
        rf.record_yank(None, "yanked".into(), RegisterKind::Char);
        rf.record_delete(None, "deleted".into(), RegisterKind::Char);
        assert_eq!(rf.get(Some('0')).content(), "yanked");
        assert_eq!(rf.get(None).content(), "deleted");
    }

    #[test]
    fn named_delete_still_shifts_ring() {
        let mut rf = RegisterFile::new();
        rf.record_delete(Some('a'), "gone".into(), RegisterKind::Char);
        assert_eq!(rf.get(Some('a')).content(), "gone");
        assert_eq!(rf.get(Some('1')).content(), "gone");
        assert_eq!(rf.get(None).content(), "gone");
    }
}
