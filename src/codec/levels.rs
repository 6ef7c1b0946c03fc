//! The level table: internal level -> benchmark token.

use std::collections::HashMap;

use crate::error::{EngineError, Result};
use crate::tables::{cell_at, headers, Table};

use super::level::LevelSpec;
use super::token::{BenchmarkToken, TokenQuery};

/// One named level row. Half levels usually have no token of their own.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelEntry {
    /// Level name as written in the table (trimmed)
    pub name: String,
    pub spec: Option<LevelSpec>,
    pub token: Option<BenchmarkToken>,
}

/// Parsed level table, in table order.
#[derive(Debug, Clone, Default)]
pub struct LevelTable {
    entries: Vec<LevelEntry>,
    by_level: HashMap<LevelSpec, usize>,
}

impl LevelTable {
    pub fn from_table(table: &Table) -> Result<Self> {
        let level_col = table
            .find_column(&headers::LEVEL)
            .ok_or_else(|| EngineError::missing_column(&table.name, "Level"))?;
        let token_col = table
            .find_column(&headers::BENCHMARK_LEVEL)
            .ok_or_else(|| EngineError::missing_column(&table.name, "Benchmark Level"))?;

        let entries = table
            .data_rows()
            .filter(|row| !cell_at(row, level_col).is_blank())
            .map(|row| {
                let name = cell_at(row, level_col).text().into_owned();
                LevelEntry {
                    spec: LevelSpec::parse(&name),
                    token: BenchmarkToken::parse(&cell_at(row, token_col).text()),
                    name,
                }
            })
            .collect();

        Ok(Self::from_entries(entries))
    }

    pub fn from_entries(entries: Vec<LevelEntry>) -> Self {
        let mut by_level = HashMap::new();
        for (i, entry) in entries.iter().enumerate() {
            if let Some(spec) = entry.spec {
                // First row for a level wins
                by_level.entry(spec).or_insert(i);
            }
        }
        Self { entries, by_level }
    }

    pub fn entries(&self) -> &[LevelEntry] {
        &self.entries
    }

    pub fn token_for(&self, spec: &LevelSpec) -> Option<&BenchmarkToken> {
        let idx = *self.by_level.get(spec)?;
        self.entries[idx].token.as_ref()
    }

    /// Matching query for a whole level; `None` when the level has no token.
    pub fn query_for(&self, spec: &LevelSpec) -> Option<TokenQuery> {
        let token = self.token_for(spec)?;
        Some(TokenQuery {
            tier: spec.base,
            letter: token.letter(),
            number: token.number,
            role: spec.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Role;

    fn level_table() -> LevelTable {
        let table = Table::from_text_rows(
            "Levels",
            &[
                vec!["Level", "Benchmark Level"],
                vec!["L5 IC", "P5"],
                vec!["L5.5 IC", ""],
                vec!["L6 IC", "P6"],
                vec!["L6 IC", "P9"],
                vec!["L8 Mgr", "E3"],
                vec!["Intern", "P1"],
            ],
        );
        LevelTable::from_table(&table).unwrap()
    }

    #[test]
    fn test_entries_keep_table_order() {
        let levels = level_table();
        let names: Vec<_> = levels.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["L5 IC", "L5.5 IC", "L6 IC", "L6 IC", "L8 Mgr", "Intern"]);
        // Off-grammar names are kept but never parse
        assert!(levels.entries()[5].spec.is_none());
    }

    #[test]
    fn test_token_for_first_row_wins() {
        let levels = level_table();
        let l6 = LevelSpec::whole(6, Role::IC);
        assert_eq!(levels.token_for(&l6).unwrap().to_string(), "P6");
    }

    #[test]
    fn test_half_level_has_no_token() {
        let levels = level_table();
        let half = LevelSpec::parse("L5.5 IC").unwrap();
        assert!(levels.token_for(&half).is_none());
        assert!(levels.query_for(&half).is_none());
    }

    #[test]
    fn test_query_for_executive() {
        let levels = level_table();
        let q = levels.query_for(&LevelSpec::whole(8, Role::Mgr)).unwrap();
        assert_eq!(q.tier, 8);
        assert_eq!(q.letter, 'E');
        assert_eq!(q.number, Some(3));
        assert!(q.is_executive());
    }

    #[test]
    fn test_missing_column_is_config_error() {
        let table = Table::from_text_rows("Levels", &[vec!["Level", "Something"]]);
        let err = LevelTable::from_table(&table).unwrap_err();
        assert!(matches!(err, EngineError::MissingColumn { .. }));
    }
}
