//! Alias table: ordered, normalized `from -> to` code pairs.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::tables::{cell_at, headers, PassMemo, Table};
use crate::types::normalize_code;

/// One remapping pair, both sides normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasEntry {
    pub from: String,
    pub to: String,
}

/// Forward lookup is exact per `from`; reverse lookup returns the first
/// `from` in table order whose `to` matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AliasTable {
    entries: Vec<AliasEntry>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding only the built-in pair.
    pub fn with_default(from: &str, to: &str) -> Self {
        let mut table = Self::new();
        table.insert(from, to);
        table
    }

    /// Built-in pair first, then the external rows in table order.
    pub fn from_table(table: &Table, default: (&str, &str)) -> Result<Self> {
        let mut aliases = Self::with_default(default.0, default.1);
        aliases.load_rows(table)?;
        Ok(aliases)
    }

    /// Add a pair. A later pair for the same `from` replaces the earlier
    /// target but keeps its position.
    pub fn insert(&mut self, from: &str, to: &str) {
        let from = normalize_code(from);
        let to = normalize_code(to);
        if from.is_empty() || to.is_empty() {
            return;
        }
        match self.entries.iter_mut().find(|e| e.from == from) {
            Some(existing) => existing.to = to,
            None => self.entries.push(AliasEntry { from, to }),
        }
    }

    /// Append every `(from, to)` row of an alias table.
    pub fn load_rows(&mut self, table: &Table) -> Result<()> {
        let mut memo = PassMemo::new();
        let from_col = memo.require(table, &headers::ALIAS_FROM, "From")?;
        let to_col = memo.require(table, &headers::ALIAS_TO, "To")?;

        for row in table.data_rows() {
            self.insert(&cell_at(row, from_col).text(), &cell_at(row, to_col).text());
        }
        Ok(())
    }

    pub fn entries(&self) -> &[AliasEntry] {
        &self.entries
    }

    pub fn forward(&self, code: &str) -> Option<&str> {
        let code = normalize_code(code);
        self.entries
            .iter()
            .find(|e| e.from == code)
            .map(|e| e.to.as_str())
    }

    pub fn reverse(&self, code: &str) -> Option<&str> {
        let code = normalize_code(code);
        self.entries
            .iter()
            .find(|e| e.to == code)
            .map(|e| e.from.as_str())
    }

    /// Mapped code, or the input unchanged.
    pub fn resolve_forward(&self, code: &str) -> String {
        self.forward(code)
            .map(str::to_string)
            .unwrap_or_else(|| code.to_string())
    }

    /// First code mapping onto `code`, or the input unchanged.
    pub fn resolve_reverse(&self, code: &str) -> String {
        self.reverse(code)
            .map(str::to_string)
            .unwrap_or_else(|| code.to_string())
    }

    /// `[code, forward, reverse]`, normalized, duplicates dropped, in that
    /// order. Every alias-aware lookup walks codes in this order.
    pub fn synonyms(&self, code: &str) -> Vec<String> {
        let mut out: Vec<String> = Vec::with_capacity(3);
        let candidates = [
            normalize_code(code),
            normalize_code(&self.resolve_forward(code)),
            normalize_code(&self.resolve_reverse(code)),
        ];
        for candidate in candidates {
            if !candidate.is_empty() && !out.contains(&candidate) {
                out.push(candidate);
            }
        }
        out
    }
}
