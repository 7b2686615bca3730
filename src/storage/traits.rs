//! Record store trait and error types

use crate::state::ContactRecord;
use thiserror::Error;

/// Errors that can occur reading or writing a record store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Unsupported store format: {0} (expected .db, .sqlite or .csv)")]
    UnsupportedFormat(String),

    #[error("Store not found: {0}")]
    NotFound(String),

    #[error("Invalid record at row {row}: {message}")]
    InvalidRecord { row: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// A persisted, ordered set of contact records
///
/// Stores are read in full at the start of a run and rewritten in full at
/// each checkpoint. A failed save must leave the previously saved state
/// intact.
pub trait RecordStore {
    /// Reads every record, in stored order
    fn load(&mut self) -> StoreResult<Vec<ContactRecord>>;

    /// Replaces the stored records with `records`
    fn save(&mut self, records: &[ContactRecord]) -> StoreResult<()>;

    /// Human-readable location for logs
    fn location(&self) -> String;
}
