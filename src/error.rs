//! Engine errors.
//!
//! Only setup defects surface as errors. A missing survey row, an absent
//! percentile, or an unparsable level is a resolution miss and travels as
//! `None` instead.

use thiserror::Error;

/// Configuration errors: a required table or column is missing, or a
/// configured table could not be read. Never retried.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("required table '{name}' is missing")]
    MissingTable { name: String },

    #[error("table '{table}' has no '{column}' column")]
    MissingColumn { table: String, column: String },

    #[error("failed to read table '{name}': {reason}")]
    TableRead { name: String, reason: String },

    #[error("cache store unavailable: {0}")]
    Cache(String),
}

impl EngineError {
    pub fn missing_column(table: &str, column: &str) -> Self {
        Self::MissingColumn {
            table: table.to_string(),
            column: column.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
