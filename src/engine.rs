//! The query facade.
//!
//! # Resolution Flow
//!
//! ```text
//! (band, region, family, level)
//!     → lookup map: family → exec family + codes
//!     → band gate: X0/X1 only for engineering families
//!     → published index hit? → min/mid/max
//!     → else scan resolver, one pick per triad component (cached)
//! ```
//!
//! Only configuration errors are returned as `Err`. Everything the data
//! cannot answer comes back as absent fields or a zero count.

use std::sync::{Arc, Mutex};

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::alias::{AliasTable, ExecDirectory, FamilyLookup, FamilyPolicy, ResolvedFamily};
use crate::cache::{keys, CacheStats, LookupCache, SystemClock, TtlCache};
use crate::codec::{canonical_level, LevelSpec, LevelTable};
use crate::config::{Config, RegionConfig};
use crate::error::{EngineError, Result};
use crate::index::{filter_stats, read_pay_records, BenchmarkIndex, IndexBuilder, IndexKey, InternalIndex};
use crate::resolve::{effective_band, Band, ScanResolver};
use crate::tables::{PassMemo, TableAccessor, TableSource};
use crate::types::{normalize_code, InternalStats, Percentile, Range};

/// Cache key of the published index.
fn index_key() -> String {
    keys::compose(keys::INDEX, &["current"])
}

/// Benchmark resolution engine. `Send + Sync`; share it behind an `Arc`.
pub struct BenchmarkEngine {
    config: Config,
    tables: TableAccessor,
    cache: Arc<TtlCache>,
    lookups: LookupCache<FamilyLookup>,
    published: LookupCache<BenchmarkIndex>,
    policy: FamilyPolicy,
    rebuild_lock: Mutex<()>,
}

impl BenchmarkEngine {
    pub fn new(config: Config, source: Box<dyn TableSource>, cache: Arc<TtlCache>) -> Self {
        let tables = TableAccessor::new(source, cache.clone(), config.ttl_secs);
        let lookups = LookupCache::new(config.ttl_secs, cache.clock());
        let published = LookupCache::new(config.ttl_secs, cache.clock());
        let policy = FamilyPolicy::new(&config.engineering_prefixes, &config.finance_prefixes);
        Self {
            config,
            tables,
            cache,
            lookups,
            published,
            policy,
            rebuild_lock: Mutex::new(()),
        }
    }

    /// Engine over the configured cache: persistent when `cache_dir` is
    /// set, in-memory otherwise.
    pub fn open(config: Config, source: Box<dyn TableSource>) -> anyhow::Result<Self> {
        let clock = Arc::new(SystemClock);
        let cache = match &config.cache_dir {
            Some(dir) => TtlCache::open(dir, clock)
                .with_context(|| format!("Failed to open cache in {}", dir.display()))?,
            None => TtlCache::in_memory(clock)?,
        };
        Ok(Self::new(config, source, Arc::new(cache)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// min/mid/max for `band` in `region`.
    ///
    /// Unknown bands, regions, families and levels resolve to an empty
    /// range. Non-engineering families are served Y1 whatever was asked.
    pub fn resolve_range(&self, band: &str, region: &str, family: &str, level: &str) -> Result<Range> {
        let Some(requested) = Band::parse(band) else {
            debug!(band, "unknown band");
            return Ok(Range::empty());
        };
        let Some(region) = self.config.region(region) else {
            debug!(region, "unknown region");
            return Ok(Range::empty());
        };

        let lookup = self.lookup()?;
        let family = lookup.resolve(family);
        if family.codes.is_empty() {
            return Ok(Range::empty());
        }
        let band = effective_band(requested, &family, &lookup, &self.policy);

        if let Some(index) = self.published_index() {
            let key = IndexKey::new(family.label(), level, &region.name);
            if let Some(row) = index.get(&key) {
                let range = row.range(band);
                if range.is_present() {
                    debug!(family = family.label(), level, region = %region.name, "index hit");
                    return Ok(range);
                }
            }
        }

        let Some(spec) = LevelSpec::parse(level) else {
            return Ok(Range::empty());
        };

        let levels = self.level_table()?;
        let scan = ScanResolver::new(&self.tables, &levels, &lookup, &self.policy);
        let mut memo = PassMemo::new();
        let [min, mid, max] = band.triad();

        Ok(Range {
            min: self.pick(&scan, &mut memo, region, &family, &spec, min)?,
            mid: self.pick(&scan, &mut memo, region, &family, &spec, mid)?,
            max: self.pick(&scan, &mut memo, region, &family, &spec, max)?,
        })
    }

    /// One scan-resolved percentile, cached under `pick:` (misses included).
    ///
    /// The key carries every code the scan tries, in order, so codes that
    /// share an exec family never share a pick.
    fn pick(
        &self,
        scan: &ScanResolver<'_>,
        memo: &mut PassMemo,
        region: &RegionConfig,
        family: &ResolvedFamily,
        spec: &LevelSpec,
        percentile: Percentile,
    ) -> Result<Option<f64>> {
        let exec = family.exec.as_deref().map(normalize_code).unwrap_or_default();
        let level = spec.to_string();
        let mut parts = vec![region.table.as_str(), exec.as_str(), level.as_str(), percentile.label()];
        parts.extend(family.codes.iter().map(String::as_str));
        let key = keys::compose(keys::PICK, &parts);
        if let Some(value) = self.cache.get::<Option<f64>>(&key) {
            return Ok(value);
        }

        let value = scan.resolve_level(memo, &region.table, family, spec, percentile)?;
        self.store(&key, &value);
        Ok(value)
    }

    /// Payroll statistics for active records matching the region's site,
    /// the family (by code or exec family name) and the level.
    pub fn resolve_internal_stats(&self, region: &str, family: &str, level: &str) -> Result<InternalStats> {
        let site = self
            .config
            .region(region)
            .map(|r| r.site.as_str())
            .unwrap_or(region);
        let level = canonical_level(level);

        let key = keys::compose(
            keys::STATS,
            &[normalize_code(site).as_str(), normalize_code(family).as_str(), level.as_str()],
        );
        if let Some(stats) = self.cache.get::<InternalStats>(&key) {
            return Ok(stats);
        }

        let lookup = self.lookup()?;
        let table = self.tables.table(&self.config.tables.internal)?;
        let records = read_pay_records(&table, &lookup)?;
        let stats = filter_stats(&records, site, family, &level);

        self.store(&key, &stats);
        Ok(stats)
    }

    /// Build the index from the current tables and publish it with one
    /// cache write. Concurrent rebuilds are serialized.
    pub fn rebuild_index(&self) -> Result<Arc<BenchmarkIndex>> {
        let _guard = self
            .rebuild_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let levels = self.level_table()?;
        let lookup = self.lookup()?;

        let mut regions = Vec::with_capacity(self.config.regions.len());
        for region in &self.config.regions {
            regions.push((region.clone(), self.tables.table(&region.table)?));
        }

        // Payroll is optional here: without it every row has a zero count
        let internal = match self.tables.optional_table(&self.config.tables.internal)? {
            Some(table) => InternalIndex::build(&read_pay_records(&table, &lookup)?, &lookup),
            None => InternalIndex::default(),
        };

        let index = IndexBuilder::new(&levels, &lookup, &self.policy).build(&regions, &internal)?;

        self.cache
            .put(&index_key(), &index, self.config.ttl_secs)
            .map_err(|e| EngineError::Cache(format!("{:#}", e)))?;

        let index = Arc::new(index);
        self.published.publish(index.clone());
        info!(rows = index.len(), regions = regions.len(), "published benchmark index");
        Ok(index)
    }

    /// The last published index, if one is live. Served from the in-process
    /// slot; the store is read only when the slot is empty or stale.
    pub fn published_index(&self) -> Option<Arc<BenchmarkIndex>> {
        self.published
            .get_or_refresh(|| self.cache.get::<BenchmarkIndex>(&index_key()).ok_or(()))
            .ok()
    }

    /// Drop every cached value under every namespace, plus the in-process
    /// lookup map and index. Returns the number of store entries removed.
    pub fn clear_all_caches(&self) -> Result<usize> {
        let removed = self
            .cache
            .clear_prefixes(&keys::ALL_PREFIXES)
            .map_err(|e| EngineError::Cache(format!("{:#}", e)))?;
        self.lookups.invalidate();
        self.published.invalidate();
        info!(removed, "cleared all caches");
        Ok(removed)
    }

    /// The family lookup map, from the in-process slot when fresh.
    pub fn lookup(&self) -> Result<Arc<FamilyLookup>> {
        self.lookups.get_or_refresh(|| -> Result<FamilyLookup> {
            let aliases = self.alias_table()?;
            let exec = self.exec_directory()?;
            Ok(FamilyLookup::new(aliases, &exec))
        })
    }

    fn level_table(&self) -> Result<LevelTable> {
        let table = self.tables.table(&self.config.tables.levels)?;
        LevelTable::from_table(&table)
    }

    /// Alias pairs, cached under `alias:`. A missing alias table leaves
    /// only the built-in pair.
    fn alias_table(&self) -> Result<AliasTable> {
        let name = &self.config.tables.aliases;
        let key = keys::compose(keys::ALIAS, &[name.as_str()]);
        if let Some(aliases) = self.cache.get::<AliasTable>(&key) {
            return Ok(aliases);
        }

        let (from, to) = &self.config.default_alias;
        let aliases = match self.tables.optional_table(name)? {
            Some(table) => AliasTable::from_table(&table, (from.as_str(), to.as_str()))?,
            None => AliasTable::with_default(from, to),
        };
        self.store(&key, &aliases);
        Ok(aliases)
    }

    /// Exec directory, cached under `exec:`.
    fn exec_directory(&self) -> Result<ExecDirectory> {
        let name = &self.config.tables.exec_families;
        let key = keys::compose(keys::EXEC, &[name.as_str()]);
        if let Some(directory) = self.cache.get::<ExecDirectory>(&key) {
            return Ok(directory);
        }

        let directory = match self.tables.optional_table(name)? {
            Some(table) => ExecDirectory::from_table(&table)?,
            None => ExecDirectory::default(),
        };
        self.store(&key, &directory);
        Ok(directory)
    }

    fn store<T: serde::Serialize>(&self, key: &str, value: &T) {
        if let Err(e) = self.cache.put(key, value, self.config.ttl_secs) {
            warn!(key, error = %e, "cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::tables::{fixtures, MemorySource, Table};

    struct Harness {
        engine: BenchmarkEngine,
        source: Arc<MemorySource>,
        cache: Arc<TtlCache>,
        clock: Arc<ManualClock>,
    }

    impl Harness {
        fn with_source(source: MemorySource) -> Self {
            let source = Arc::new(source);
            let clock = Arc::new(ManualClock::new(1_000));
            let cache = Arc::new(TtlCache::in_memory(clock.clone()).unwrap());
            let engine = BenchmarkEngine::new(fixtures::config(), Box::new(source.clone()), cache.clone());
            Self {
                engine,
                source,
                cache,
                clock,
            }
        }

        fn standard() -> Self {
            Self::with_source(fixtures::source())
        }

        fn range(&self, band: &str, region: &str, family: &str, level: &str) -> Range {
            self.engine.resolve_range(band, region, family, level).unwrap()
        }
    }

    fn range(min: f64, mid: f64, max: f64) -> Range {
        Range {
            min: Some(min),
            mid: Some(mid),
            max: Some(max),
        }
    }

    #[test]
    fn test_engine_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BenchmarkEngine>();
    }

    #[test]
    fn test_scan_fallback_without_index() {
        let h = Harness::standard();
        assert!(h.engine.published_index().is_none());
        assert_eq!(h.range("X0", "US", "SWE", "L5 IC"), range(150_000.0, 165_000.0, 190_000.0));
        assert_eq!(h.range("Y1", "US", "SWE", "L5 IC"), range(130_000.0, 140_000.0, 150_000.0));
    }

    #[test]
    fn test_non_engineering_band_downgraded() {
        let h = Harness::standard();
        let x0 = h.range("X0", "US", "MKT", "L4 IC");
        assert_eq!(x0, h.range("Y1", "US", "MKT", "L4 IC"));
        assert_eq!(x0, range(80_000.0, 85_000.0, 90_000.0));
    }

    #[test]
    fn test_family_by_exec_name_or_alias() {
        let h = Harness::standard();
        let expected = h.range("X1", "US", "SWE", "L6 IC");
        assert_eq!(h.range("X1", "us", "Software Engineering", "L6 IC"), expected);
        assert_eq!(h.range("X1", "US", "dev", "l6 ic"), expected);
    }

    #[test]
    fn test_index_serves_rounded_values() {
        let h = Harness::standard();
        // Scan path returns raw survey values
        assert_eq!(h.range("X0", "UK", "SWE", "L5 IC"), range(90_000.0, 99_950.0, 120_049.0));

        h.engine.clear_all_caches().unwrap();
        let index = h.engine.rebuild_index().unwrap();
        assert!(!index.is_empty());
        assert!(h.engine.published_index().is_some());

        // Index rows are published to the nearest 100
        assert_eq!(h.range("X0", "UK", "SWE", "L5 IC"), range(90_000.0, 100_000.0, 120_000.0));
    }

    #[test]
    fn test_index_miss_falls_back_to_scan() {
        let h = Harness::standard();
        h.engine.rebuild_index().unwrap();
        // DATA has no survey rows and no index row; the scan finds nothing either
        assert_eq!(h.range("X0", "US", "DATA", "L5 IC"), Range::empty());
        // OPS is indexed under its description, so a code query takes the scan path
        assert_eq!(h.range("Y1", "US", "OPS", "L5 IC"), range(70_000.0, 75_000.0, 80_000.0));
    }

    #[test]
    fn test_half_levels_at_query_time() {
        let h = Harness::standard();
        let half = h.range("Y1", "US", "SWE", "L5.5 IC");
        assert_eq!(half.mid, Some((140_000.0 + 175_000.0) / 2.0));
    }

    #[test]
    fn test_half_level_without_upper_neighbour_is_empty() {
        let h = Harness::standard();
        assert_eq!(h.range("Y1", "US", "SWE", "L4294967295.5 IC"), Range::empty());
        assert_eq!(h.range("Y1", "US", "SWE", "L4294967295 IC"), Range::empty());
    }

    /// Two codes filed under one exec family, each with its own survey row.
    fn shared_exec_source() -> MemorySource {
        MemorySource::new()
            .with_table(fixtures::levels())
            .with_table(Table::from_text_rows(
                "Exec Families",
                &[
                    vec!["Code", "Exec Family"],
                    vec!["SWE", "Software Engineering"],
                    vec!["DATA", "Software Engineering"],
                ],
            ))
            .with_table(Table::from_text_rows(
                "Benchmarks US",
                &[
                    vec!["Job Code", "Job Family", "P40", "P50", "P62.5", "P75", "P90"],
                    vec!["SWE.P5", "SWE", "100", "200", "300", "400", "500"],
                    vec!["DATA.P5", "DATA", "1", "2", "3", "4", "5"],
                ],
            ))
    }

    #[test]
    fn test_codes_sharing_exec_family_keep_separate_picks() {
        let cold = |family: &str| Harness::with_source(shared_exec_source()).range("Y1", "US", family, "L5 IC");
        let cold_data = cold("DATA");
        let cold_swe = cold("SWE");
        let cold_exec = cold("Software Engineering");

        assert_eq!(cold_swe, range(100.0, 200.0, 300.0));
        assert_eq!(cold_data, range(1.0, 2.0, 3.0));
        // The exec name tries its codes in table order
        assert_eq!(cold_exec, cold_swe);

        let warm = Harness::with_source(shared_exec_source());
        for _ in 0..2 {
            assert_eq!(warm.range("Y1", "US", "DATA", "L5 IC"), cold_data);
            assert_eq!(warm.range("Y1", "US", "SWE", "L5 IC"), cold_swe);
            assert_eq!(warm.range("Y1", "US", "Software Engineering", "L5 IC"), cold_exec);
        }
    }

    #[test]
    fn test_misses_are_empty_not_errors() {
        let h = Harness::standard();
        assert_eq!(h.range("Z9", "US", "SWE", "L5 IC"), Range::empty());
        assert_eq!(h.range("X0", "FR", "SWE", "L5 IC"), Range::empty());
        assert_eq!(h.range("X0", "US", "SWE", "L9 IC"), Range::empty());
        assert_eq!(h.range("X0", "US", "SWE", "senior"), Range::empty());
        assert_eq!(h.range("X0", "US", "  ", "L5 IC"), Range::empty());
        assert_eq!(h.range("X0", "US", "NOPE", "L5 IC"), Range::empty());
    }

    #[test]
    fn test_internal_stats() {
        let h = Harness::standard();
        let by_exec = h
            .engine
            .resolve_internal_stats("US", "Software Engineering", "L5 IC")
            .unwrap();
        assert_eq!(by_exec.count, 4);
        assert_eq!(by_exec.median, Some(65_000.0));

        let by_code = h.engine.resolve_internal_stats("US", "SWE", "L5 IC").unwrap();
        assert_eq!(by_code.count, 3);

        let none = h.engine.resolve_internal_stats("US", "SWE", "L7 Mgr").unwrap();
        assert_eq!(none, InternalStats::default());
    }

    #[test]
    fn test_reads_are_cached_until_cleared() {
        let h = Harness::standard();
        h.range("X0", "US", "SWE", "L5 IC");
        let after_first = h.source.reads();
        assert!(after_first > 0);

        h.range("X0", "US", "SWE", "L5 IC");
        h.range("X0", "US", "SWE", "L6 IC");
        assert_eq!(h.source.reads(), after_first);

        assert!(h.engine.clear_all_caches().unwrap() > 0);
        h.range("X0", "US", "SWE", "L5 IC");
        assert!(h.source.reads() > after_first);
    }

    #[test]
    fn test_entries_expire_after_ttl() {
        let h = Harness::standard();
        h.range("X0", "US", "SWE", "L5 IC");
        let reads = h.source.reads();

        h.clock.advance(599);
        h.range("X0", "US", "SWE", "L5 IC");
        assert_eq!(h.source.reads(), reads);

        h.clock.advance(2);
        h.range("X0", "US", "SWE", "L5 IC");
        assert!(h.source.reads() > reads);
    }

    #[test]
    fn test_clear_all_drops_published_index() {
        let h = Harness::standard();
        h.engine.rebuild_index().unwrap();
        h.engine.resolve_internal_stats("US", "SWE", "L5 IC").unwrap();

        h.engine.clear_all_caches().unwrap();
        assert!(h.engine.published_index().is_none());
        assert_eq!(h.engine.cache_stats().entries, 0);
    }

    #[test]
    fn test_published_index_held_in_process() {
        let h = Harness::standard();
        let built = h.engine.rebuild_index().unwrap();

        // Reads after a rebuild no longer touch the store
        h.cache.remove_prefix(keys::INDEX).unwrap();
        let held = h.engine.published_index().unwrap();
        assert!(Arc::ptr_eq(&built, &held));
        assert_eq!(h.range("X0", "UK", "SWE", "L5 IC"), range(90_000.0, 100_000.0, 120_000.0));

        h.engine.clear_all_caches().unwrap();
        assert!(h.engine.published_index().is_none());
    }

    #[test]
    fn test_published_index_loaded_from_store() {
        let h = Harness::standard();
        let built = h.engine.rebuild_index().unwrap();

        // A second engine over the same store picks up the published index
        let other = BenchmarkEngine::new(fixtures::config(), Box::new(h.source.clone()), h.cache.clone());
        let loaded = other.published_index().unwrap();
        assert_eq!(loaded.len(), built.len());

        h.clock.advance(601);
        assert!(h.engine.published_index().is_none());
    }

    #[test]
    fn test_missing_level_table_is_config_error() {
        let source = MemorySource::new()
            .with_table(fixtures::aliases())
            .with_table(fixtures::benchmarks_us());
        let h = Harness::with_source(source);
        let err = h.engine.resolve_range("X0", "US", "SWE", "L5 IC").unwrap_err();
        assert!(matches!(err, EngineError::MissingTable { ref name } if name == "Levels"));
    }

    #[test]
    fn test_missing_percentile_column_is_config_error() {
        let source = MemorySource::new()
            .with_table(fixtures::levels())
            .with_table(Table::from_text_rows(
                "Benchmarks US",
                &[vec!["Job Code", "Job Family", "P62.5", "P75"], vec!["SWE.P5", "SWE", "1", "2"]],
            ));
        let h = Harness::with_source(source);
        let err = h.engine.resolve_range("X0", "US", "SWE", "L5 IC").unwrap_err();
        assert!(matches!(err, EngineError::MissingColumn { ref column, .. } if column == "P90"));
        assert!(h.engine.rebuild_index().is_err());
    }

    #[test]
    fn test_rebuild_without_payroll() {
        let source = MemorySource::new()
            .with_table(fixtures::levels())
            .with_table(fixtures::benchmarks_us())
            .with_table(fixtures::benchmarks_uk());
        let h = Harness::with_source(source);
        let index = h.engine.rebuild_index().unwrap();
        assert!(index.rows().iter().all(|r| r.internal.count == 0));
        assert!(h.engine.resolve_internal_stats("US", "SWE", "L5 IC").is_err());
    }
}
