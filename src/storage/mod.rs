//! Storage module for persisting contact records
//!
//! This module handles reading and checkpointing the record set:
//! - The `RecordStore` trait shared by all backends
//! - A SQLite backend (`.db`, `.sqlite`, `.sqlite3`)
//! - A CSV backend (`.csv`) that preserves unknown columns

mod csv_store;
mod schema;
mod sqlite;
mod traits;

pub use csv_store::CsvRecordStore;
pub use schema::{initialize_schema, SCHEMA_SQL};
pub use sqlite::SqliteRecordStore;
pub use traits::{RecordStore, StoreError, StoreResult};

use std::path::Path;

/// Opens the store for a path, picking the backend from its extension
///
/// # Examples
///
/// ```no_run
/// use contact_enricher::storage::open_store;
/// use std::path::Path;
///
/// let mut store = open_store(Path::new("outputs/schools_wa_contacts.sqlite")).unwrap();
/// let records = store.load().unwrap();
/// ```
pub fn open_store(path: &Path) -> StoreResult<Box<dyn RecordStore>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "db" | "sqlite" | "sqlite3" => {
            if !path.exists() {
                return Err(StoreError::NotFound(path.display().to_string()));
            }
            Ok(Box::new(SqliteRecordStore::open(path)?))
        }
        "csv" => Ok(Box::new(CsvRecordStore::new(path))),
        _ => Err(StoreError::UnsupportedFormat(path.display().to_string())),
    }
}
