//! Raw table access.
//!
//! Collaborators supply tables through [`TableSource`]; the
//! [`TableAccessor`] caches whole snapshots in the TTL store, and a
//! per-pass [`PassMemo`] avoids repeated header scans inside one query.

mod accessor;
mod source;
mod table;

#[cfg(test)]
pub(crate) mod fixtures;

pub use accessor::{PassMemo, TableAccessor};
pub use source::{CsvDirSource, MemorySource, TableSource};
pub use table::{cell_at, headers, Cell, Table};
