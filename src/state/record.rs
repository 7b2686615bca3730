//! Organization contact records and the update rules applied to them
use crate::state::CrawlResult;
use crate::url::ensure_http;
use chrono::NaiveDate;

/// One organization in the directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactRecord {
    pub name: String,
    pub locality: String,
    pub postcode: String,
    pub phone: Option<String>,

    /// Only ever holds an address that passed classification
    pub public_email: Option<String>,

    pub contact_form_url: Option<String>,

    /// Absolute http(s) URL, or None
    pub website_url: Option<String>,

    /// Set once the crawl loop has attempted this record; gates reprocessing
    pub website_checked: bool,

    pub last_verified_date: Option<NaiveDate>,
}

/// Which previously-empty fields an update filled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppliedFields {
    pub email: bool,
    pub contact_form: bool,
}

impl ContactRecord {
    pub fn new(name: &str, website_url: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            website_url: website_url.map(str::to_string),
            ..Self::default()
        }
    }

    /// Normalizes fields read from an external store
    ///
    /// Blank optional fields become None and the website is made absolute.
    pub fn normalize(&mut self) {
        self.phone = clean_optional(self.phone.take());
        self.public_email = clean_optional(self.public_email.take());
        self.contact_form_url = clean_optional(self.contact_form_url.take());
        self.website_url = self.website_url.take().and_then(|w| ensure_http(&w));
    }

    /// True if the crawl loop should attempt this record
    pub fn needs_enrichment(&self) -> bool {
        !self.website_checked && self.website_url.is_some()
    }

    /// Applies the result of an enrichment attempt
    ///
    /// Email and form URL are only written into fields that are currently
    /// empty; existing values are never replaced. The record is marked as
    /// checked whatever the outcome.
    pub fn apply(&mut self, result: &CrawlResult, today: NaiveDate) -> AppliedFields {
        let mut applied = AppliedFields::default();

        if result.outcome.is_success() {
            if let Some(email) = &result.email {
                applied.email = fill_if_empty(&mut self.public_email, email);
            }
            if let Some(form) = &result.contact_form_url {
                applied.contact_form = fill_if_empty(&mut self.contact_form_url, form);
            }
        }

        self.website_checked = true;
        self.last_verified_date = Some(today);
        applied
    }

    /// Operator reset so the next run attempts this record again
    pub fn reset_checked(&mut self) {
        self.website_checked = false;
    }
}

fn fill_if_empty(field: &mut Option<String>, value: &str) -> bool {
    let value = value.trim();
    let is_empty = field.as_deref().map(str::trim).unwrap_or("").is_empty();
    if is_empty && !value.is_empty() {
        *field = Some(value.to_string());
        true
    } else {
        false
    }
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("nan"))
}
