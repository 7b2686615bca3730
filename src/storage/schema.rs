//! Database schema for SQLite record stores

use rusqlite::Connection;

/// SQL schema for the records table
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS records (
    row_index INTEGER PRIMARY KEY,
    name TEXT NOT NULL DEFAULT '',
    locality TEXT NOT NULL DEFAULT '',
    postcode TEXT NOT NULL DEFAULT '',
    phone TEXT,
    public_email TEXT,
    contact_form_url TEXT,
    website_url TEXT,
    website_checked INTEGER NOT NULL DEFAULT 0,
    last_verified_date TEXT
);

CREATE INDEX IF NOT EXISTS idx_records_checked ON records(website_checked);
"#;

/// Column list in the order used by reads and writes
pub const RECORD_COLUMNS: &str = "row_index, name, locality, postcode, phone, public_email, \
     contact_form_url, website_url, website_checked, last_verified_date";

/// Initializes the database schema
pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
