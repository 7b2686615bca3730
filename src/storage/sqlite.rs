//! SQLite record store
//!
//! Records live in a single `records` table keyed by their position in the
//! dataset. Every save rewrites the table inside one transaction, so a crash
//! mid-save leaves the previous checkpoint in place.

use crate::state::ContactRecord;
use crate::storage::schema::{initialize_schema, RECORD_COLUMNS};
use crate::storage::traits::{RecordStore, StoreError, StoreResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use std::path::{Path, PathBuf};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-backed record store
pub struct SqliteRecordStore {
    conn: Connection,
    path: PathBuf,
}

impl SqliteRecordStore {
    /// Opens (creating if needed) a database file
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;
        initialize_schema(&conn)?;

        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn,
            path: PathBuf::from(":memory:"),
        })
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<(i64, ContactRecord, Option<String>)> {
    let checked: i64 = row.get(8)?;
    let record = ContactRecord {
        name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        locality: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        postcode: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        phone: row.get(4)?,
        public_email: row.get(5)?,
        contact_form_url: row.get(6)?,
        website_url: row.get(7)?,
        website_checked: checked != 0,
        last_verified_date: None,
    };
    Ok((row.get(0)?, record, row.get(9)?))
}

impl RecordStore for SqliteRecordStore {
    fn load(&mut self) -> StoreResult<Vec<ContactRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM records ORDER BY row_index",
            RECORD_COLUMNS
        ))?;
        let rows = stmt.query_map([], record_from_row)?;

        let mut records = Vec::new();
        for row in rows {
            let (row_index, mut record, date) = row?;
            record.last_verified_date = match date.as_deref().map(str::trim) {
                None | Some("") => None,
                Some(value) => Some(NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(
                    |e| StoreError::InvalidRecord {
                        row: usize::try_from(row_index).unwrap_or(0),
                        message: format!("bad last_verified_date '{}': {}", value, e),
                    },
                )?),
            };
            record.normalize();
            records.push(record);
        }
        Ok(records)
    }

    fn save(&mut self, records: &[ContactRecord]) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM records", [])?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO records ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                RECORD_COLUMNS
            ))?;
            for (index, record) in records.iter().enumerate() {
                stmt.execute(params![
                    index as i64,
                    record.name,
                    record.locality,
                    record.postcode,
                    record.phone,
                    record.public_email,
                    record.contact_form_url,
                    record.website_url,
                    record.website_checked as i64,
                    record
                        .last_verified_date
                        .map(|d| d.format(DATE_FORMAT).to_string()),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
