//! The denormalized benchmark index.
//!
//! # Pipeline
//!
//! ```text
//! survey tables ─┐
//! level table ───┼→ IndexBuilder ─→ BenchmarkIndex ─→ one cache write
//! lookup map ────┤        ↑
//! payroll ─→ InternalIndex┘
//! ```
//!
//! One row per (site, region, resolved code, exec family, level). The
//! index is assembled locally and published whole; nobody mutates a
//! published index.

mod builder;
pub mod export;
mod internal;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cache::keys;
use crate::codec::canonical_level;
use crate::resolve::Band;
use crate::types::{normalize_code, InternalStats, Percentiles, Range};

pub use builder::{IndexBuilder, RegionSurvey};
pub use internal::{filter_stats, read_pay_records, InternalIndex, PayRecord};

/// Lookup key into the index: (exec family, level, region).
///
/// Kept structured; its string form separates parts with the cache key
/// separator so `("Data", "L1 IC", "USA")` and `("Data", "L1 ICU", "SA")`
/// stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndexKey {
    pub exec_family: String,
    pub level: String,
    pub region: String,
}

impl IndexKey {
    pub fn new(exec_family: &str, level: &str, region: &str) -> Self {
        Self {
            exec_family: normalize_code(exec_family),
            level: canonical_level(level),
            region: normalize_code(region),
        }
    }

    pub fn cache_key(&self) -> String {
        keys::compose("", &[self.exec_family.as_str(), self.level.as_str(), self.region.as_str()])
    }
}

/// One denormalized index row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexRow {
    pub site: String,
    pub region: String,
    /// Family code after forward alias resolution
    pub code: String,
    pub exec_family: String,
    /// Family as written in the survey table
    pub raw_family: String,
    pub level: String,
    /// Benchmark token from the level table (blank for half levels)
    pub token: Option<String>,
    /// Market percentiles, rounded to the nearest 100
    pub percentiles: Percentiles,
    /// Internal pay stats, rounded to whole units
    pub internal: InternalStats,
}

impl IndexRow {
    pub fn key(&self) -> IndexKey {
        IndexKey::new(&self.exec_family, &self.level, &self.region)
    }

    /// min/mid/max for a band.
    pub fn range(&self, band: Band) -> Range {
        let [min, mid, max] = band.triad();
        Range {
            min: self.percentiles.get(min),
            mid: self.percentiles.get(mid),
            max: self.percentiles.get(max),
        }
    }
}

/// Published index: rows in build order plus a key lookup (first row per
/// key wins).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkIndex {
    rows: Vec<IndexRow>,
    by_key: BTreeMap<IndexKey, usize>,
}

impl BenchmarkIndex {
    pub fn rows(&self) -> &[IndexRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, key: &IndexKey) -> Option<&IndexRow> {
        self.by_key.get(key).map(|&i| &self.rows[i])
    }

    fn push(&mut self, row: IndexRow) {
        let idx = self.rows.len();
        self.by_key.entry(row.key()).or_insert(idx);
        self.rows.push(row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_key_cannot_collide_where_concatenation_did() {
        let a = IndexKey::new("Data", "L1 IC", "USA");
        let b = IndexKey::new("Data", "L1 ICU", "SA");

        // Plain family+level+region concatenation made these the same key
        let concat = |k: &IndexKey| format!("{}{}{}", k.exec_family, k.level, k.region);
        assert_eq!(concat(&a), concat(&b));

        assert_ne!(a, b);
        assert_ne!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_family_ending_in_digit() {
        // "SWE2" + "L1 IC" vs "SWE" + "2L1 IC" style overlaps
        let a = IndexKey::new("SWE2", "L1 IC", "US");
        let b = IndexKey::new("SWE", "2L1 IC", "US");
        assert_ne!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn test_index_key_normalizes() {
        assert_eq!(
            IndexKey::new(" software engineering ", "l5 ic", "us"),
            IndexKey::new("Software Engineering", "L5 IC", "US")
        );
    }

    #[test]
    fn test_first_row_per_key_wins() {
        let row = |p50: f64| IndexRow {
            site: "US".into(),
            region: "US".into(),
            code: "SWE".into(),
            exec_family: "Software Engineering".into(),
            raw_family: "SWE".into(),
            level: "L5 IC".into(),
            token: Some("P5".into()),
            percentiles: Percentiles {
                p50: Some(p50),
                ..Default::default()
            },
            internal: InternalStats::default(),
        };

        let mut index = BenchmarkIndex::default();
        index.push(row(100.0));
        index.push(row(200.0));

        let hit = index.get(&IndexKey::new("Software Engineering", "L5 IC", "US")).unwrap();
        assert_eq!(hit.percentiles.p50, Some(100.0));
    }

    #[test]
    fn test_row_range_uses_band_triad() {
        let row = IndexRow {
            site: "US".into(),
            region: "US".into(),
            code: "SWE".into(),
            exec_family: "SWE".into(),
            raw_family: "SWE".into(),
            level: "L5 IC".into(),
            token: None,
            percentiles: Percentiles {
                p40: Some(1.0),
                p50: Some(2.0),
                p62_5: Some(3.0),
                p75: Some(4.0),
                p90: None,
            },
            internal: InternalStats::default(),
        };
        assert_eq!(
            row.range(Band::X0),
            Range { min: Some(3.0), mid: Some(4.0), max: None }
        );
        assert_eq!(
            row.range(Band::Y1),
            Range { min: Some(1.0), mid: Some(2.0), max: Some(3.0) }
        );
    }
}
