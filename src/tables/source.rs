//! Table sources: where raw table snapshots come from.
//!
//! The engine never talks to spreadsheets or files directly. Collaborators
//! hand it a `TableSource`; the accessor caches whatever it returns.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{EngineError, Result};

use super::table::{Cell, Table};

/// Supplies whole-table snapshots by name.
pub trait TableSource: Send + Sync {
    /// Source name for diagnostics
    fn name(&self) -> &str;

    /// Read a table. `Ok(None)` means the table does not exist.
    fn read_table(&self, name: &str) -> Result<Option<Table>>;
}

/// Reads `<dir>/<table name>.csv` files. All cells arrive as text.
pub struct CsvDirSource {
    dir: PathBuf,
}

impl CsvDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", name))
    }
}

impl TableSource for CsvDirSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn read_table(&self, name: &str) -> Result<Option<Table>> {
        let path = self.path_for(name);
        if !path.exists() {
            return Ok(None);
        }

        let read_err = |e: csv::Error| EngineError::TableRead {
            name: name.to_string(),
            reason: e.to_string(),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&path)
            .map_err(read_err)?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(read_err)?;
            rows.push(record.iter().map(Cell::from_raw).collect());
        }

        Ok(Some(Table::new(name, rows)))
    }
}

/// In-memory tables. Counts reads so callers can observe cache misses.
#[derive(Default)]
pub struct MemorySource {
    tables: HashMap<String, Table>,
    reads: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: Table) -> Self {
        self.insert(table);
        self
    }

    pub fn insert(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }

    /// Number of `read_table` calls served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl TableSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn read_table(&self, name: &str) -> Result<Option<Table>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.tables.get(name).cloned())
    }
}

impl<T: TableSource + ?Sized> TableSource for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn read_table(&self, name: &str) -> Result<Option<Table>> {
        (**self).read_table(name)
    }
}
