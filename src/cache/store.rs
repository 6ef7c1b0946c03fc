//! TTL key/value cache using redb.
//!
//! Strategy: every cached value is stored as bincode bytes wrapped in an
//! entry that carries its expiry time. Expired or undecodable entries read
//! as misses, so a corrupt cache can only cost a recomputation.
//!
//! Cache structure:
//! - Database: `<dir>/payband.redb`, or an in-memory backend
//! - Key: namespaced string (see [`super::keys`])
//! - Value: bincode-serialized `(expires_at, payload)`
//!
//! Design decisions:
//! - Bincode for compact binary serialization
//! - Expiry stored in the value so a read is a single lookup
//! - One write transaction per `put`, so a published value is all-or-nothing

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use redb::backends::InMemoryBackend;
use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::clock::Clock;

/// Key = namespaced cache key, Value = serialized CacheEntry
const ENTRIES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("entries");

/// Stored envelope: expiry plus the serialized value.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    /// Unix seconds after which the entry is a miss
    expires_at: u64,
    /// bincode bytes of the cached value
    payload: Vec<u8>,
}

impl CacheEntry {
    fn is_live(&self, now: u64) -> bool {
        now < self.expires_at
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).context("Failed to serialize cache entry")
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).context("Failed to deserialize cache entry")
    }
}

/// Process-wide TTL cache backed by redb.
pub struct TtlCache {
    db: Database,
    clock: Arc<dyn Clock>,
    /// Database file, `None` for the in-memory backend
    location: Option<PathBuf>,
}

impl TtlCache {
    /// Open or create a persistent cache under `dir`.
    ///
    /// Cache location: `<dir>/payband.redb`
    pub fn open(dir: &Path, clock: Arc<dyn Clock>) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create cache directory: {}", dir.display()))?;

        let db_path = dir.join("payband.redb");
        let db = Database::create(&db_path)
            .with_context(|| format!("Failed to open cache database: {}", db_path.display()))?;

        Self::init(db, clock, Some(db_path))
    }

    /// Cache living only for the lifetime of this process.
    pub fn in_memory(clock: Arc<dyn Clock>) -> Result<Self> {
        let db = Database::builder()
            .create_with_backend(InMemoryBackend::new())
            .context("Failed to create in-memory cache database")?;

        Self::init(db, clock, None)
    }

    fn init(db: Database, clock: Arc<dyn Clock>, location: Option<PathBuf>) -> Result<Self> {
        // Create the table up front so read transactions never see it missing
        let write_txn = db.begin_write().context("Failed to begin init transaction")?;
        {
            write_txn
                .open_table(ENTRIES_TABLE)
                .context("Failed to create cache table")?;
        }
        write_txn.commit().context("Failed to commit cache init")?;

        Ok(Self { db, clock, location })
    }

    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    pub fn now_secs(&self) -> u64 {
        self.clock.now_secs()
    }

    /// The clock expiry is measured against.
    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    /// Cached value for `key`, if present, unexpired and decodable.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let read_txn = self.db.begin_read().ok()?;
        let table = read_txn.open_table(ENTRIES_TABLE).ok()?;

        let value_guard = table.get(key).ok()??;
        let entry = match CacheEntry::from_bytes(value_guard.value()) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(key, error = %e, "cache entry undecodable, treating as miss");
                return None;
            }
        };

        if !entry.is_live(self.clock.now_secs()) {
            debug!(key, "cache entry expired");
            return None;
        }

        match bincode::deserialize(&entry.payload) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(key, error = %e, "cache payload undecodable, treating as miss");
                None
            }
        }
    }

    /// Store `value` under `key` for `ttl_secs`. Replaces any previous entry.
    pub fn put<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) -> Result<()> {
        let payload = bincode::serialize(value)
            .with_context(|| format!("Failed to serialize value for {}", key))?;
        self.put_raw(key, payload, ttl_secs)
    }

    /// Store pre-serialized bytes. Bytes that do not decode as the type later
    /// requested read back as a miss.
    pub fn put_raw(&self, key: &str, payload: Vec<u8>, ttl_secs: u64) -> Result<()> {
        let entry = CacheEntry {
            expires_at: self.clock.now_secs().saturating_add(ttl_secs),
            payload,
        };
        let bytes = entry.to_bytes()?;

        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction")?;
        {
            let mut table = write_txn
                .open_table(ENTRIES_TABLE)
                .context("Failed to open cache table")?;
            table
                .insert(key, bytes.as_slice())
                .with_context(|| format!("Failed to insert cache entry for {}", key))?;
        }
        write_txn.commit().context("Failed to commit cache write")?;

        Ok(())
    }

    /// Remove every key starting with `prefix`. Returns the number removed.
    pub fn remove_prefix(&self, prefix: &str) -> Result<usize> {
        self.clear_prefixes(&[prefix])
    }

    /// Remove every key under any of `prefixes` in one transaction.
    pub fn clear_prefixes(&self, prefixes: &[&str]) -> Result<usize> {
        let write_txn = self
            .db
            .begin_write()
            .context("Failed to begin write transaction for clear")?;

        let removed = {
            let mut table = write_txn
                .open_table(ENTRIES_TABLE)
                .context("Failed to open cache table")?;

            let keys: Vec<String> = table
                .iter()
                .ok()
                .into_iter()
                .flatten()
                .filter_map(|r| r.ok())
                .map(|(k, _)| k.value().to_string())
                .filter(|k| prefixes.iter().any(|p| k.starts_with(p)))
                .collect();

            for key in &keys {
                table
                    .remove(key.as_str())
                    .context("Failed to remove cache entry during clear")?;
            }
            keys.len()
        };

        write_txn.commit().context("Failed to commit cache clear")?;

        Ok(removed)
    }

    /// Entry count and approximate size, expired entries included.
    pub fn stats(&self) -> CacheStats {
        let read_txn = match self.db.begin_read() {
            Ok(txn) => txn,
            Err(_) => return CacheStats::default(),
        };

        let table = match read_txn.open_table(ENTRIES_TABLE) {
            Ok(t) => t,
            Err(_) => return CacheStats::default(),
        };

        let entries = table.len().unwrap_or(0) as usize;

        let size_bytes = table
            .iter()
            .ok()
            .into_iter()
            .flatten()
            .filter_map(|r| r.ok())
            .map(|(k, v)| k.value().len() + v.value().len())
            .sum::<usize>() as u64;

        CacheStats { entries, size_bytes }
    }
}

/// Cache statistics for monitoring.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of stored entries
    pub entries: usize,
    /// Approximate total size in bytes (keys + values)
    pub size_bytes: u64,
}

impl CacheStats {
    /// Format size in human-readable form (KB, MB, GB)
    pub fn size_human(&self) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if self.size_bytes >= GB {
            format!("{:.2} GB", self.size_bytes as f64 / GB as f64)
        } else if self.size_bytes >= MB {
            format!("{:.2} MB", self.size_bytes as f64 / MB as f64)
        } else if self.size_bytes >= KB {
            format!("{:.2} KB", self.size_bytes as f64 / KB as f64)
        } else {
            format!("{} B", self.size_bytes)
        }
    }
}
