//! Cache-backed access to raw tables.

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;
use tracing::{debug, warn};

use crate::cache::{keys, TtlCache};
use crate::error::{EngineError, Result};

use super::source::TableSource;
use super::table::Table;

/// Hands out whole-table snapshots, reading each table from its source at
/// most once per TTL window.
pub struct TableAccessor {
    source: Box<dyn TableSource>,
    cache: Arc<TtlCache>,
    ttl_secs: u64,
}

impl TableAccessor {
    pub fn new(source: Box<dyn TableSource>, cache: Arc<TtlCache>, ttl_secs: u64) -> Self {
        Self {
            source,
            cache,
            ttl_secs,
        }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Snapshot of a required table. Missing is a configuration error.
    pub fn table(&self, name: &str) -> Result<Arc<Table>> {
        self.optional_table(name)?
            .ok_or_else(|| EngineError::MissingTable {
                name: name.to_string(),
            })
    }

    /// Snapshot of a table that may legitimately not exist.
    /// Absence is not cached; the source is asked again next time.
    pub fn optional_table(&self, name: &str) -> Result<Option<Arc<Table>>> {
        let key = keys::compose(keys::RAW, &[name]);
        if let Some(table) = self.cache.get::<Table>(&key) {
            debug!(table = name, "raw table cache hit");
            return Ok(Some(Arc::new(table)));
        }

        debug!(table = name, source = self.source.name(), "reading raw table");
        let Some(table) = self.source.read_table(name)? else {
            return Ok(None);
        };

        if let Err(e) = self.cache.put(&key, &table, self.ttl_secs) {
            warn!(table = name, error = %e, "failed to cache raw table");
        }
        Ok(Some(Arc::new(table)))
    }

    /// Like [`Self::table`], memoized for the current pass.
    pub fn table_in(&self, memo: &mut PassMemo, name: &str) -> Result<Arc<Table>> {
        if let Some(table) = memo.tables.get(name) {
            return Ok(table.clone());
        }
        let table = self.table(name)?;
        memo.tables.insert(name.to_string(), table.clone());
        Ok(table)
    }
}

/// Scratch memo for one resolution pass: table snapshots plus
/// (table, header pattern) -> column index. Dropped when the pass ends.
#[derive(Default)]
pub struct PassMemo {
    tables: HashMap<String, Arc<Table>>,
    columns: HashMap<(String, String), Option<usize>>,
}

impl PassMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Column whose header matches `pattern`, if any.
    pub fn column(&mut self, table: &Table, pattern: &Regex) -> Option<usize> {
        *self
            .columns
            .entry((table.name.clone(), pattern.as_str().to_string()))
            .or_insert_with(|| table.find_column(pattern))
    }

    /// Column that must exist; a missing header is a configuration error.
    pub fn require(&mut self, table: &Table, pattern: &Regex, label: &str) -> Result<usize> {
        self.column(table, pattern)
            .ok_or_else(|| EngineError::missing_column(&table.name, label))
    }
}
