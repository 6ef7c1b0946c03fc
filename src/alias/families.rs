//! Exec-family directory, the combined lookup map, and family policy.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::tables::{cell_at, headers, PassMemo, Table};
use crate::types::normalize_code;

use super::table::AliasTable;

/// Code -> exec family name, in table order. First row per code wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecDirectory {
    entries: Vec<(String, String)>,
}

impl ExecDirectory {
    pub fn from_table(table: &Table) -> Result<Self> {
        let mut memo = PassMemo::new();
        let code_col = memo.require(table, &headers::EXEC_CODE, "Code")?;
        let desc_col = memo.require(table, &headers::EXEC_DESCRIPTION, "Exec Family")?;

        let mut directory = Self::default();
        for row in table.data_rows() {
            directory.insert(&cell_at(row, code_col).text(), &cell_at(row, desc_col).text());
        }
        Ok(directory)
    }

    pub fn insert(&mut self, code: &str, description: &str) {
        let code = normalize_code(code);
        let description = description.trim();
        if code.is_empty() || description.is_empty() {
            return;
        }
        if self.entries.iter().any(|(c, _)| *c == code) {
            return;
        }
        self.entries.push((code, description.to_string()));
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }
}

/// A family argument after lookup: its exec family (if known) and the
/// codes to try for it, in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFamily {
    pub exec: Option<String>,
    pub codes: Vec<String>,
}

impl ResolvedFamily {
    /// Exec family name if known, else the primary code.
    pub fn label(&self) -> &str {
        self.exec
            .as_deref()
            .or_else(|| self.codes.first().map(String::as_str))
            .unwrap_or("")
    }
}

/// The lookup map read on every resolution: aliases plus exec directory,
/// pre-indexed both ways.
#[derive(Debug, Clone, Default)]
pub struct FamilyLookup {
    aliases: AliasTable,
    code_to_exec: HashMap<String, String>,
    /// normalized exec name -> (display name, codes in table order)
    exec_to_codes: HashMap<String, (String, Vec<String>)>,
}

impl FamilyLookup {
    pub fn new(aliases: AliasTable, exec: &ExecDirectory) -> Self {
        let mut code_to_exec = HashMap::new();
        let mut exec_to_codes: HashMap<String, (String, Vec<String>)> = HashMap::new();

        for (code, description) in exec.entries() {
            code_to_exec.insert(code.clone(), description.clone());
            exec_to_codes
                .entry(normalize_code(description))
                .or_insert_with(|| (description.clone(), Vec::new()))
                .1
                .push(code.clone());
        }

        Self {
            aliases,
            code_to_exec,
            exec_to_codes,
        }
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Exec family for a code: direct, then via its forward alias, then via
    /// its reverse alias.
    pub fn exec_family_for_code(&self, code: &str) -> Option<&str> {
        self.aliases
            .synonyms(code)
            .iter()
            .find_map(|c| self.code_to_exec.get(c))
            .map(String::as_str)
    }

    /// Codes mapped to an exec family name (case-insensitive).
    pub fn codes_for_exec(&self, exec_family: &str) -> &[String] {
        self.exec_to_codes
            .get(&normalize_code(exec_family))
            .map(|(_, codes)| codes.as_slice())
            .unwrap_or(&[])
    }

    /// Interpret a family argument, which may be a code or an exec family name.
    pub fn resolve(&self, family: &str) -> ResolvedFamily {
        let key = normalize_code(family);
        if let Some((display, codes)) = self.exec_to_codes.get(&key) {
            return ResolvedFamily {
                exec: Some(display.clone()),
                codes: codes.clone(),
            };
        }

        ResolvedFamily {
            exec: self.exec_family_for_code(&key).map(str::to_string),
            codes: if key.is_empty() { Vec::new() } else { vec![key] },
        }
    }

    /// Every code the family is known by: its own codes, the codes sharing
    /// its exec family, and their aliases.
    fn related_codes(&self, family: &ResolvedFamily) -> Vec<String> {
        let mut codes: Vec<String> = family.codes.clone();
        if let Some(exec) = &family.exec {
            codes.extend(self.codes_for_exec(exec).iter().cloned());
        }
        let mut out = Vec::new();
        for code in codes {
            for synonym in self.aliases.synonyms(&code) {
                if !out.contains(&synonym) {
                    out.push(synonym);
                }
            }
        }
        out
    }
}

/// Business classification of families by code prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyPolicy {
    pub engineering_prefixes: Vec<String>,
    pub finance_prefixes: Vec<String>,
}

impl FamilyPolicy {
    pub fn new(engineering_prefixes: &[String], finance_prefixes: &[String]) -> Self {
        Self {
            engineering_prefixes: engineering_prefixes.iter().map(|p| normalize_code(p)).collect(),
            finance_prefixes: finance_prefixes.iter().map(|p| normalize_code(p)).collect(),
        }
    }

    /// Eligible for the X0/X1 bands: some related code carries an
    /// engineering prefix.
    pub fn is_engineering(&self, family: &ResolvedFamily, lookup: &FamilyLookup) -> bool {
        lookup
            .related_codes(family)
            .iter()
            .any(|code| has_prefix(code, &self.engineering_prefixes))
    }

    /// Finance families may match `F` survey rows where `P` is asked for.
    pub fn is_finance(&self, family: &ResolvedFamily, lookup: &FamilyLookup) -> bool {
        if let Some(exec) = &family.exec {
            if normalize_code(exec).contains("FINANCE") {
                return true;
            }
        }
        lookup
            .related_codes(family)
            .iter()
            .any(|code| has_prefix(code, &self.finance_prefixes))
    }
}

fn has_prefix(code: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|p| !p.is_empty() && code.starts_with(p.as_str()))
}
