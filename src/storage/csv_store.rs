//! CSV record store
//!
//! Reads the dataset exports the directory scripts produce. Columns the
//! crawler does not know about are carried through untouched, and the
//! original header names and order are kept on save. Saves go to a
//! temporary sibling file that is then renamed over the original.

use crate::state::ContactRecord;
use crate::storage::traits::{RecordStore, StoreError, StoreResult};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Locality,
    Postcode,
    Phone,
    PublicEmail,
    ContactFormUrl,
    WebsiteUrl,
    WebsiteChecked,
    LastVerifiedDate,
}

impl Field {
    const ALL: [Field; 9] = [
        Field::Name,
        Field::Locality,
        Field::Postcode,
        Field::Phone,
        Field::PublicEmail,
        Field::ContactFormUrl,
        Field::WebsiteUrl,
        Field::WebsiteChecked,
        Field::LastVerifiedDate,
    ];

    fn header(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Locality => "locality",
            Field::Postcode => "postcode",
            Field::Phone => "phone",
            Field::PublicEmail => "public_email",
            Field::ContactFormUrl => "contact_form_url",
            Field::WebsiteUrl => "website_url",
            Field::WebsiteChecked => "website_checked",
            Field::LastVerifiedDate => "last_verified_date",
        }
    }

    /// Maps a header, including the names older exports used
    fn from_header(header: &str) -> Option<Self> {
        let header = header.trim().to_ascii_lowercase();
        match header.as_str() {
            "school_name" => Some(Field::Name),
            "suburb" => Some(Field::Locality),
            other => Field::ALL.into_iter().find(|f| f.header() == other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Field(Field),
    Extra,
}

/// Header names as found in the file, with what each one holds
#[derive(Debug, Clone)]
struct Layout {
    headers: Vec<String>,
    columns: Vec<Column>,
}

impl Layout {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut layout = Layout {
            headers: Vec::new(),
            columns: Vec::new(),
        };
        for header in headers {
            let column = match Field::from_header(header) {
                Some(field) if !layout.columns.contains(&Column::Field(field)) => {
                    Column::Field(field)
                }
                _ => Column::Extra,
            };
            layout.headers.push(header.to_string());
            layout.columns.push(column);
        }

        for field in Field::ALL {
            if !layout.columns.contains(&Column::Field(field)) {
                layout.headers.push(field.header().to_string());
                layout.columns.push(Column::Field(field));
            }
        }
        layout
    }

    fn canonical() -> Self {
        Layout {
            headers: Field::ALL.iter().map(|f| f.header().to_string()).collect(),
            columns: Field::ALL.iter().map(|&f| Column::Field(f)).collect(),
        }
    }
}

/// CSV-backed record store
pub struct CsvRecordStore {
    path: PathBuf,
    layout: Option<Layout>,

    /// Values of pass-through columns, per row
    extras: Vec<Vec<String>>,
}

impl CsvRecordStore {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            layout: None,
            extras: Vec::new(),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn parse_checked(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}

fn parse_date(value: &str, row: usize) -> StoreResult<Option<NaiveDate>> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map(Some)
        .map_err(|e| StoreError::InvalidRecord {
            row,
            message: format!("bad last_verified_date '{}': {}", value, e),
        })
}

impl RecordStore for CsvRecordStore {
    fn load(&mut self) -> StoreResult<Vec<ContactRecord>> {
        if !self.path.exists() {
            return Err(StoreError::NotFound(self.path.display().to_string()));
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;
        let layout = Layout::from_headers(reader.headers()?);

        let mut records = Vec::new();
        let mut extras = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let values = result?;
            let mut record = ContactRecord::default();
            let mut row_extras = Vec::new();

            for (index, column) in layout.columns.iter().enumerate() {
                let value = values.get(index).unwrap_or("");
                match column {
                    Column::Extra => row_extras.push(value.to_string()),
                    Column::Field(field) => match field {
                        Field::Name => record.name = value.trim().to_string(),
                        Field::Locality => record.locality = value.trim().to_string(),
                        Field::Postcode => record.postcode = value.trim().to_string(),
                        Field::Phone => record.phone = Some(value.to_string()),
                        Field::PublicEmail => record.public_email = Some(value.to_string()),
                        Field::ContactFormUrl => record.contact_form_url = Some(value.to_string()),
                        Field::WebsiteUrl => record.website_url = Some(value.to_string()),
                        Field::WebsiteChecked => record.website_checked = parse_checked(value),
                        Field::LastVerifiedDate => {
                            record.last_verified_date = parse_date(value, row)?
                        }
                    },
                }
            }

            record.normalize();
            records.push(record);
            extras.push(row_extras);
        }

        self.layout = Some(layout);
        self.extras = extras;
        Ok(records)
    }

    fn save(&mut self, records: &[ContactRecord]) -> StoreResult<()> {
        let layout = self.layout.clone().unwrap_or_else(Layout::canonical);
        let temp_path = self.temp_path();

        let mut writer = csv::Writer::from_path(&temp_path)?;
        writer.write_record(&layout.headers)?;

        for (row, record) in records.iter().enumerate() {
            let mut extras = self.extras.get(row).into_iter().flatten();
            let mut line = Vec::with_capacity(layout.columns.len());
            for column in &layout.columns {
                let value = match column {
                    Column::Extra => extras.next().cloned().unwrap_or_default(),
                    Column::Field(field) => field_value(record, *field),
                };
                line.push(value);
            }
            writer.write_record(&line)?;
        }
        writer.flush()?;
        drop(writer);

        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

fn field_value(record: &ContactRecord, field: Field) -> String {
    match field {
        Field::Name => record.name.clone(),
        Field::Locality => record.locality.clone(),
        Field::Postcode => record.postcode.clone(),
        Field::Phone => record.phone.clone().unwrap_or_default(),
        Field::PublicEmail => record.public_email.clone().unwrap_or_default(),
        Field::ContactFormUrl => record.contact_form_url.clone().unwrap_or_default(),
        Field::WebsiteUrl => record.website_url.clone().unwrap_or_default(),
        Field::WebsiteChecked => record.website_checked.to_string(),
        Field::LastVerifiedDate => record
            .last_verified_date
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_default(),
    }
}
