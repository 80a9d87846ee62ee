//! Replacement records collected while a translation unit is checked and
//! consumed by the original-file patcher at the end of the unit.

use std::collections::BTreeMap;

use proc_modernize_core::Span;

/// Line range of the statement in the pre-processor input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcLines {
    pub filename: String,
    pub start: u32,
    pub end: u32,
}

/// One rewritten statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementRecord {
    /// `EXEC SQL ...;` as recovered from the comment.
    pub execsql: String,
    pub fullcomment: String,
    pub funcname: String,
    pub originalfile: String,
    pub reqname: String,
    /// Call replacing the statement: `fetchC(age);`
    pub rpltcode: String,
    pub pc: Option<PcLines>,
    /// Whether the comment spanned several lines.
    pub had_cr: bool,
    /// The generated block in the unit, for diagnostics.
    pub span: Span,
    /// Rule that produced the record.
    pub rule: &'static str,
}

/// Occurrence key `"<comment>:<startLine>"`.
pub fn occurrence_key(comment: &str, start_line: u32) -> String {
    format!("{comment}:{start_line}")
}

/// Per-unit table of replacement records.
#[derive(Debug, Default)]
pub struct ReplacementTable {
    entries: BTreeMap<String, ReplacementRecord>,
}

impl ReplacementTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the key is taken. Returns whether the record was stored.
    pub fn insert(&mut self, key: String, record: ReplacementRecord) -> bool {
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, record);
        true
    }

    pub fn get(&self, key: &str) -> Option<&ReplacementRecord> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Take every record out, leaving the table empty.
    pub fn drain(&mut self) -> Vec<ReplacementRecord> {
        std::mem::take(&mut self.entries).into_values().collect()
    }
}
