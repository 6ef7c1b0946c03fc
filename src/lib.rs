//! payband - compensation benchmark resolution
//!
//! Resolves market pay ranges for a (band, region, job family, level)
//! tuple from per-region survey tables, and internal pay statistics from a
//! payroll table.
//!
//! # Architecture
//!
//! ```text
//! TableSource → TableAccessor ─┬→ ScanResolver ─────────┐
//!   (csv/mem)    (raw: cache)  │   (live, row order)    ├→ BenchmarkEngine
//!                              └→ IndexBuilder → index ─┘   (band gate,
//!                                   (one publish)             fallback)
//! ```
//!
//! # Key Properties
//!
//! - Survey row order is a contract: the first matching row with a value wins
//! - Half levels (`L5.5 IC`) blend their neighbours component-wise
//! - X0/X1 bands are reserved for engineering families; others get Y1
//! - Misses are `None`, never errors; only missing tables/columns are `Err`
//! - Every cache layer is TTL-bound and cleared in one pass

pub mod alias;
pub mod cache;
pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod resolve;
pub mod tables;
pub mod types;

// Re-export core types
pub use types::{InternalStats, Percentile, Percentiles, Range};

pub use alias::{AliasTable, FamilyLookup, FamilyPolicy};
pub use codec::{BenchmarkToken, LevelSpec, LevelTable, Role};
pub use config::{Config, RegionConfig};
pub use engine::BenchmarkEngine;
pub use error::{EngineError, Result};
pub use index::{BenchmarkIndex, IndexKey, IndexRow};
pub use resolve::Band;
pub use tables::{CsvDirSource, MemorySource, Table, TableSource};
