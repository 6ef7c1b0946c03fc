//! Scan resolver: live lookup of one percentile in one survey table.
//!
//! Row order is part of the contract. The scan walks rows top to bottom and
//! stops at the first row that matches the family and token and has a
//! numeric cell for the requested percentile. No "best match" search.
//!
//! # Fallback Order
//!
//! ```text
//! family as given → forward alias → reverse alias → absent
//! ```

use crate::alias::{FamilyLookup, FamilyPolicy, ResolvedFamily};
use crate::codec::{BenchmarkToken, LevelSpec, LevelTable, TokenQuery};
use crate::error::Result;
use crate::tables::{cell_at, headers, PassMemo, TableAccessor};
use crate::types::{midpoint, normalize_code, Percentile};

/// Resolves single percentiles by scanning raw survey tables.
pub struct ScanResolver<'a> {
    tables: &'a TableAccessor,
    levels: &'a LevelTable,
    lookup: &'a FamilyLookup,
    policy: &'a FamilyPolicy,
}

impl<'a> ScanResolver<'a> {
    pub fn new(
        tables: &'a TableAccessor,
        levels: &'a LevelTable,
        lookup: &'a FamilyLookup,
        policy: &'a FamilyPolicy,
    ) -> Self {
        Self {
            tables,
            levels,
            lookup,
            policy,
        }
    }

    /// First value for `family` matching `query` in `table`, no alias fallback.
    ///
    /// Missing Job Family, Job Code, or percentile columns are configuration
    /// errors; everything else that fails to match is `Ok(None)`.
    pub fn resolve_value(
        &self,
        memo: &mut PassMemo,
        table: &str,
        family: &str,
        query: &TokenQuery,
        percentile: Percentile,
    ) -> Result<Option<f64>> {
        let finance = self.policy.is_finance(&self.lookup.resolve(family), self.lookup);
        self.scan(memo, table, family, query, percentile, finance)
    }

    /// [`Self::resolve_value`] over the code, its forward alias, then its
    /// reverse alias. The first present value wins.
    pub fn resolve_with_aliases(
        &self,
        memo: &mut PassMemo,
        table: &str,
        family: &str,
        query: &TokenQuery,
        percentile: Percentile,
    ) -> Result<Option<f64>> {
        let finance = self.policy.is_finance(&self.lookup.resolve(family), self.lookup);
        self.scan_synonyms(memo, table, family, query, percentile, finance)
    }

    /// Resolve a level for a family, blending floor and ceiling for half
    /// levels. Each of the family's codes is tried in order.
    pub fn resolve_level(
        &self,
        memo: &mut PassMemo,
        table: &str,
        family: &ResolvedFamily,
        level: &LevelSpec,
        percentile: Percentile,
    ) -> Result<Option<f64>> {
        if level.is_half {
            let low = self.resolve_whole(memo, table, family, &level.floor(), percentile)?;
            let high = self.resolve_whole(memo, table, family, &level.ceil(), percentile)?;
            return Ok(midpoint(low, high));
        }
        self.resolve_whole(memo, table, family, level, percentile)
    }

    fn resolve_whole(
        &self,
        memo: &mut PassMemo,
        table: &str,
        family: &ResolvedFamily,
        level: &LevelSpec,
        percentile: Percentile,
    ) -> Result<Option<f64>> {
        let Some(query) = self.levels.query_for(level) else {
            return Ok(None);
        };
        let finance = self.policy.is_finance(family, self.lookup);

        for code in &family.codes {
            if let Some(value) = self.scan_synonyms(memo, table, code, &query, percentile, finance)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    fn scan_synonyms(
        &self,
        memo: &mut PassMemo,
        table: &str,
        family: &str,
        query: &TokenQuery,
        percentile: Percentile,
        finance: bool,
    ) -> Result<Option<f64>> {
        for code in self.lookup.aliases().synonyms(family) {
            if let Some(value) = self.scan(memo, table, &code, query, percentile, finance)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    fn scan(
        &self,
        memo: &mut PassMemo,
        table_name: &str,
        family: &str,
        query: &TokenQuery,
        percentile: Percentile,
        finance: bool,
    ) -> Result<Option<f64>> {
        let table = self.tables.table_in(memo, table_name)?;
        let family_col = memo.require(&table, &headers::JOB_FAMILY, "Job Family")?;
        let code_col = memo.require(&table, &headers::JOB_CODE, "Job Code")?;
        let value_col = memo.require(&table, headers::percentile(percentile), percentile.label())?;

        let wanted = normalize_code(family);
        if wanted.is_empty() {
            return Ok(None);
        }

        for row in table.data_rows() {
            if normalize_code(&cell_at(row, family_col).text()) != wanted {
                continue;
            }
            let Some(token) = BenchmarkToken::parse(&cell_at(row, code_col).text()) else {
                continue;
            };
            if !query.matches(&token, finance) {
                continue;
            }
            if let Some(value) = cell_at(row, value_col).number() {
                return Ok(Some(value));
            }
        }

        Ok(None)
    }
}
