//! Internal pay aggregation.
//!
//! A payroll record is published under its whole synonym set (exec family,
//! own code, forward alias, reverse alias), so it can be found by any name
//! the family goes by. Lookups at query time walk the same order.

use std::collections::HashMap;

use crate::alias::FamilyLookup;
use crate::codec::canonical_level;
use crate::error::Result;
use crate::tables::{cell_at, headers, PassMemo, Table};
use crate::types::{normalize_code, InternalStats};

/// One payroll row, normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct PayRecord {
    pub site: String,
    pub family_code: String,
    /// From the mapped-family column, else from the exec directory
    pub exec_family: Option<String>,
    pub level: String,
    pub pay: Option<f64>,
    pub active: bool,
}

impl PayRecord {
    /// Contributes to statistics at all.
    pub fn counts(&self) -> bool {
        self.active && self.pay.is_some()
    }

    /// Family keys this record is published under, in lookup order.
    pub fn synonym_keys(&self, lookup: &FamilyLookup) -> Vec<String> {
        let mut keys: Vec<String> = Vec::with_capacity(4);
        if let Some(exec) = &self.exec_family {
            keys.push(normalize_code(exec));
        }
        for code in lookup.aliases().synonyms(&self.family_code) {
            if !keys.contains(&code) {
                keys.push(code);
            }
        }
        keys
    }

    /// Matches a query family by code or by exec family name.
    pub fn matches_family(&self, family: &str) -> bool {
        let wanted = normalize_code(family);
        self.family_code == wanted
            || self
                .exec_family
                .as_deref()
                .is_some_and(|exec| normalize_code(exec) == wanted)
    }
}

/// Read the payroll table. The mapped/exec family column is optional.
pub fn read_pay_records(table: &Table, lookup: &FamilyLookup) -> Result<Vec<PayRecord>> {
    let mut memo = PassMemo::new();
    let site_col = memo.require(table, &headers::SITE, "Site")?;
    let family_col = memo.require(table, &headers::JOB_FAMILY, "Job Family")?;
    let level_col = memo.require(table, &headers::LEVEL, "Level")?;
    let active_col = memo.require(table, &headers::ACTIVE, "Active")?;
    let pay_col = memo.require(table, &headers::PAY, "Pay")?;
    let exec_col = memo.column(table, &headers::MAPPED_FAMILY);

    let records = table
        .data_rows()
        .map(|row| {
            let family_code = normalize_code(&cell_at(row, family_col).text());
            let exec_family = exec_col
                .map(|col| cell_at(row, col).text().into_owned())
                .filter(|s| !s.is_empty())
                .or_else(|| lookup.exec_family_for_code(&family_code).map(str::to_string));

            PayRecord {
                site: normalize_code(&cell_at(row, site_col).text()),
                exec_family,
                level: canonical_level(&cell_at(row, level_col).text()),
                pay: cell_at(row, pay_col).number(),
                active: cell_at(row, active_col).flag(),
                family_code,
            }
        })
        .collect();

    Ok(records)
}

/// Stats over records matching (site, family, level), filtered live.
pub fn filter_stats(records: &[PayRecord], site: &str, family: &str, level: &str) -> InternalStats {
    let site = normalize_code(site);
    let level = canonical_level(level);
    let pays: Vec<f64> = records
        .iter()
        .filter(|r| r.counts() && r.site == site && r.level == level && r.matches_family(family))
        .filter_map(|r| r.pay)
        .collect();
    InternalStats::from_values(&pays)
}

type BucketKey = (String, String, String);

/// Aggregated stats per (site, family key, level).
#[derive(Debug, Clone, Default)]
pub struct InternalIndex {
    stats: HashMap<BucketKey, InternalStats>,
}

impl InternalIndex {
    pub fn build(records: &[PayRecord], lookup: &FamilyLookup) -> Self {
        let mut buckets: HashMap<BucketKey, Vec<f64>> = HashMap::new();

        for record in records.iter().filter(|r| r.counts()) {
            let Some(pay) = record.pay else { continue };
            for family in record.synonym_keys(lookup) {
                buckets
                    .entry((record.site.clone(), family, record.level.clone()))
                    .or_default()
                    .push(pay);
            }
        }

        let stats = buckets
            .into_iter()
            .map(|(key, pays)| (key, InternalStats::from_values(&pays)))
            .collect();

        Self { stats }
    }

    pub fn get(&self, site: &str, family: &str, level: &str) -> Option<&InternalStats> {
        self.stats.get(&(
            normalize_code(site),
            normalize_code(family),
            canonical_level(level),
        ))
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}
