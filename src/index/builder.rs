//! Index construction.
//!
//! Each region's survey table is read once into per-family row lists. Every
//! family is then crossed with every level-table entry, applying the same
//! token matching the scan resolver uses, so an index row and a live scan
//! agree on which survey row supplies each percentile.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info};

use crate::alias::{FamilyLookup, FamilyPolicy};
use crate::codec::{BenchmarkToken, LevelSpec, LevelTable, TokenQuery};
use crate::config::RegionConfig;
use crate::error::Result;
use crate::tables::{cell_at, headers, PassMemo, Table};
use crate::types::{normalize_code, Percentile, Percentiles};

use super::internal::InternalIndex;
use super::{BenchmarkIndex, IndexRow};

/// Market percentiles are published to the nearest 100.
const PERCENTILE_STEP: f64 = 100.0;

/// One family's rows in a survey table, in table order.
#[derive(Debug, Clone)]
struct SurveyFamily {
    code: String,
    /// Family text as first written in the table
    raw: String,
    /// First non-blank description seen for the family
    description: Option<String>,
    rows: Vec<(BenchmarkToken, Percentiles)>,
}

/// A region's survey table after one pass.
#[derive(Debug, Clone, Default)]
pub struct RegionSurvey {
    families: Vec<SurveyFamily>,
    by_code: HashMap<String, usize>,
}

impl RegionSurvey {
    /// All five percentile columns are required here, unlike the scan which
    /// only needs the one it is asked for.
    pub fn from_table(table: &Table) -> Result<Self> {
        let mut memo = PassMemo::new();
        let family_col = memo.require(table, &headers::JOB_FAMILY, "Job Family")?;
        let code_col = memo.require(table, &headers::JOB_CODE, "Job Code")?;
        let desc_col = memo.column(table, &headers::FAMILY_DESCRIPTION);

        let mut value_cols = Vec::with_capacity(Percentile::ALL.len());
        for p in Percentile::ALL {
            value_cols.push((p, memo.require(table, headers::percentile(p), p.label())?));
        }

        let mut survey = Self::default();
        for row in table.data_rows() {
            let raw = cell_at(row, family_col).text();
            let code = normalize_code(&raw);
            if code.is_empty() {
                continue;
            }
            let Some(token) = BenchmarkToken::parse(&cell_at(row, code_col).text()) else {
                continue;
            };

            let mut percentiles = Percentiles::default();
            for &(p, col) in &value_cols {
                percentiles.set(p, cell_at(row, col).number());
            }

            let idx = *survey.by_code.entry(code.clone()).or_insert_with(|| {
                survey.families.push(SurveyFamily {
                    code,
                    raw: raw.trim().to_string(),
                    description: None,
                    rows: Vec::new(),
                });
                survey.families.len() - 1
            });
            let family = &mut survey.families[idx];
            if family.description.is_none() {
                family.description = desc_col
                    .map(|col| cell_at(row, col).text().into_owned())
                    .filter(|s| !s.is_empty());
            }
            family.rows.push((token, percentiles));
        }

        Ok(survey)
    }

    /// Family codes in first-seen order.
    pub fn family_codes(&self) -> impl Iterator<Item = &str> {
        self.families.iter().map(|f| f.code.as_str())
    }

    /// Per percentile, the first row matching `query` that has a value.
    pub fn lookup(&self, family: &str, query: &TokenQuery, finance: bool) -> Percentiles {
        let mut out = Percentiles::default();
        let Some(&idx) = self.by_code.get(&normalize_code(family)) else {
            return out;
        };

        let matching: Vec<&Percentiles> = self.families[idx]
            .rows
            .iter()
            .filter(|(token, _)| query.matches(token, finance))
            .map(|(_, percentiles)| percentiles)
            .collect();

        for p in Percentile::ALL {
            out.set(p, matching.iter().find_map(|row| row.get(p)));
        }
        out
    }
}

/// Builds a [`BenchmarkIndex`] from survey tables and payroll stats.
pub struct IndexBuilder<'a> {
    levels: &'a LevelTable,
    lookup: &'a FamilyLookup,
    policy: &'a FamilyPolicy,
}

impl<'a> IndexBuilder<'a> {
    pub fn new(levels: &'a LevelTable, lookup: &'a FamilyLookup, policy: &'a FamilyPolicy) -> Self {
        Self {
            levels,
            lookup,
            policy,
        }
    }

    /// Assemble the whole index locally. Regions are visited in the order
    /// given, families in first-seen order, levels in level-table order.
    pub fn build(
        &self,
        regions: &[(RegionConfig, Arc<Table>)],
        internal: &InternalIndex,
    ) -> Result<BenchmarkIndex> {
        let mut index = BenchmarkIndex::default();
        let mut seen: HashSet<(String, String, String, String, String)> = HashSet::new();

        for (region, table) in regions {
            let survey = RegionSurvey::from_table(table)?;
            let site = normalize_code(&region.site);
            let region_name = normalize_code(&region.name);
            let before = index.len();

            for family in &survey.families {
                let finance = self
                    .policy
                    .is_finance(&self.lookup.resolve(&family.code), self.lookup);
                let code = normalize_code(&self.lookup.aliases().resolve_forward(&family.code));
                let exec_family = self
                    .lookup
                    .exec_family_for_code(&family.code)
                    .map(str::to_string)
                    .or_else(|| family.description.clone())
                    .unwrap_or_else(|| family.code.clone());

                for entry in self.levels.entries() {
                    let Some(spec) = entry.spec else { continue };
                    let percentiles = self.percentiles_for(&survey, &family.code, &spec, finance);
                    if percentiles.is_empty() {
                        continue;
                    }

                    let level = spec.to_string();
                    let dedup = (
                        site.clone(),
                        region_name.clone(),
                        code.clone(),
                        normalize_code(&exec_family),
                        level.clone(),
                    );
                    if !seen.insert(dedup) {
                        debug!(region = %region_name, family = %code, level = %level, "duplicate index row dropped");
                        continue;
                    }

                    let stats = internal
                        .get(&site, &exec_family, &level)
                        .or_else(|| internal.get(&site, &family.code, &level))
                        .map(|s| s.rounded())
                        .unwrap_or_default();

                    index.push(IndexRow {
                        site: site.clone(),
                        region: region_name.clone(),
                        code: code.clone(),
                        exec_family: exec_family.clone(),
                        raw_family: family.raw.clone(),
                        level,
                        token: entry.token.as_ref().map(ToString::to_string),
                        percentiles: percentiles.rounded(PERCENTILE_STEP),
                        internal: stats,
                    });
                }
            }

            info!(
                region = %region_name,
                table = %table.name,
                families = survey.families.len(),
                rows = index.len() - before,
                "indexed region"
            );
        }

        Ok(index)
    }

    /// Whole levels read their mapped token; half levels blend floor and
    /// ceiling component-wise.
    fn percentiles_for(
        &self,
        survey: &RegionSurvey,
        family: &str,
        spec: &LevelSpec,
        finance: bool,
    ) -> Percentiles {
        if spec.is_half {
            let low = self.whole(survey, family, &spec.floor(), finance);
            let high = self.whole(survey, family, &spec.ceil(), finance);
            return low.blend(&high);
        }
        self.whole(survey, family, spec, finance)
    }

    fn whole(&self, survey: &RegionSurvey, family: &str, spec: &LevelSpec, finance: bool) -> Percentiles {
        match self.levels.query_for(spec) {
            Some(query) => survey.lookup(family, &query, finance),
            None => Percentiles::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::{AliasTable, ExecDirectory};
    use crate::cache::{ManualClock, TtlCache};
    use crate::config::Config;
    use crate::index::{read_pay_records, IndexKey};
    use crate::resolve::ScanResolver;
    use crate::tables::{fixtures, TableAccessor};

    struct Inputs {
        levels: LevelTable,
        lookup: FamilyLookup,
        policy: FamilyPolicy,
        internal: InternalIndex,
        regions: Vec<(RegionConfig, Arc<Table>)>,
    }

    impl Inputs {
        fn standard() -> Self {
            let config = fixtures::config();
            let aliases = AliasTable::from_table(&fixtures::aliases(), ("SDE", "SWE")).unwrap();
            let exec = ExecDirectory::from_table(&fixtures::exec_families()).unwrap();
            let lookup = FamilyLookup::new(aliases, &exec);
            let records = read_pay_records(&fixtures::internal_pay(), &lookup).unwrap();
            Self {
                levels: LevelTable::from_table(&fixtures::levels()).unwrap(),
                policy: FamilyPolicy::new(&config.engineering_prefixes, &config.finance_prefixes),
                internal: InternalIndex::build(&records, &lookup),
                lookup,
                regions: vec![
                    (config.regions[0].clone(), Arc::new(fixtures::benchmarks_us())),
                    (config.regions[1].clone(), Arc::new(fixtures::benchmarks_uk())),
                ],
            }
        }

        fn build(&self) -> BenchmarkIndex {
            IndexBuilder::new(&self.levels, &self.lookup, &self.policy)
                .build(&self.regions, &self.internal)
                .unwrap()
        }
    }

    fn row<'a>(index: &'a BenchmarkIndex, family: &str, level: &str, region: &str) -> &'a IndexRow {
        index
            .get(&IndexKey::new(family, level, region))
            .unwrap_or_else(|| panic!("no row for {family} {level} {region}"))
    }

    #[test]
    fn test_survey_keeps_first_seen_order() {
        let survey = RegionSurvey::from_table(&fixtures::benchmarks_us()).unwrap();
        let codes: Vec<_> = survey.family_codes().collect();
        assert_eq!(codes, ["SWE", "FIN", "MKT", "EXE", "OPS"]);
    }

    #[test]
    fn test_survey_requires_every_percentile() {
        let table = Table::from_text_rows(
            "Benchmarks US",
            &[vec!["Job Code", "Job Family", "P50"], vec!["SWE.P5", "SWE", "1"]],
        );
        assert!(RegionSurvey::from_table(&table).is_err());
    }

    #[test]
    fn test_rebuild_is_byte_identical() {
        let inputs = Inputs::standard();
        let first = bincode::serialize(&inputs.build()).unwrap();
        let second = bincode::serialize(&inputs.build()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_whole_level_row() {
        let index = Inputs::standard().build();
        let hit = row(&index, "Software Engineering", "L5 IC", "US");
        assert_eq!(hit.code, "SWE");
        assert_eq!(hit.site, "US");
        assert_eq!(hit.token.as_deref(), Some("P5"));
        assert_eq!(hit.percentiles.p50, Some(140_000.0));
        assert_eq!(hit.percentiles.p90, Some(190_000.0));
    }

    #[test]
    fn test_half_level_row_averages_components() {
        let index = Inputs::standard().build();
        let hit = row(&index, "Software Engineering", "L5.5 IC", "US");
        assert_eq!(hit.token, None);
        // mean(140000, 175000) = 157500, published to the nearest 100
        assert_eq!(hit.percentiles.p50, Some(157_500.0));
        assert_eq!(hit.percentiles.p40, Some(145_000.0));
    }

    #[test]
    fn test_half_level_single_side_unmodified() {
        let index = Inputs::standard().build();
        // UK SWE.P6 is blank throughout: L5.5 IC takes P5 as-is
        let hit = row(&index, "Software Engineering", "L5.5 IC", "UK");
        assert_eq!(hit.percentiles.p40, Some(80_000.0));
    }

    #[test]
    fn test_percentiles_rounded_to_hundreds() {
        let index = Inputs::standard().build();
        let hit = row(&index, "Software Engineering", "L5 IC", "UK");
        assert_eq!(hit.percentiles.p75, Some(100_000.0));
        assert_eq!(hit.percentiles.p90, Some(120_000.0));
    }

    #[test]
    fn test_blank_combinations_skipped() {
        let index = Inputs::standard().build();
        assert!(index.get(&IndexKey::new("Software Engineering", "L6 IC", "UK")).is_none());
        // No P3 rows anywhere
        assert!(index.rows().iter().all(|r| r.level != "L3 IC"));
    }

    #[test]
    fn test_internal_stats_merged() {
        let index = Inputs::standard().build();
        let us = row(&index, "Software Engineering", "L5 IC", "US");
        assert_eq!(us.internal.count, 4);
        assert_eq!(us.internal.median, Some(65_000.0));

        let uk = row(&index, "Software Engineering", "L5 IC", "UK");
        assert_eq!(uk.internal.count, 1);
        assert_eq!(uk.internal.min, Some(40_000.0));

        let no_payroll = row(&index, "Software Engineering", "L6 IC", "US");
        assert_eq!(no_payroll.internal.count, 0);
    }

    #[test]
    fn test_family_without_exec_uses_description() {
        let index = Inputs::standard().build();
        let ops = row(&index, "Operations", "L5 IC", "US");
        assert_eq!(ops.code, "OPS");
        assert_eq!(ops.raw_family, "OPS");
    }

    #[test]
    fn test_executive_and_finance_rows() {
        let index = Inputs::standard().build();
        assert_eq!(row(&index, "Executive", "L8 Mgr", "US").percentiles.p50, Some(330_000.0));
        assert_eq!(row(&index, "Executive", "L7 Mgr", "US").percentiles.p50, Some(240_000.0));
        assert_eq!(row(&index, "Finance", "L4 IC", "US").percentiles.p50, Some(95_000.0));
    }

    #[test]
    fn test_one_row_per_composite_key() {
        let index = Inputs::standard().build();
        let mut keys: Vec<_> = index
            .rows()
            .iter()
            .map(|r| (&r.site, &r.region, &r.code, &r.exec_family, &r.level))
            .collect();
        let total = keys.len();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), total);
    }

    #[test]
    fn test_index_agrees_with_scan() {
        let inputs = Inputs::standard();
        let index = inputs.build();

        let cache = Arc::new(TtlCache::in_memory(Arc::new(ManualClock::new(0))).unwrap());
        let tables = TableAccessor::new(Box::new(fixtures::source()), cache, Config::default().ttl_secs);
        let scan = ScanResolver::new(&tables, &inputs.levels, &inputs.lookup, &inputs.policy);

        for r in index.rows().iter().filter(|r| r.region == "US") {
            let family = inputs.lookup.resolve(&r.code);
            let spec = LevelSpec::parse(&r.level).unwrap();
            for p in Percentile::ALL {
                let scanned = scan
                    .resolve_level(&mut PassMemo::new(), "Benchmarks US", &family, &spec, p)
                    .unwrap()
                    .map(|v| crate::types::round_to(v, PERCENTILE_STEP));
                assert_eq!(r.percentiles.get(p), scanned, "{} {} {}", r.code, r.level, p);
            }
        }
    }
}
