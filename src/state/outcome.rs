//! Per-attempt results of enriching one record
use std::fmt;

/// How an enrichment attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// Homepage fetched and extraction ran (fields may still be empty)
    Success,

    /// Homepage answered with an error status
    HttpError(u16),

    /// robots.txt disallows the homepage
    Blocked,

    /// Fetch or processing failure, with the reason
    Exception(String),

    /// A shutdown request cut processing short; the result must be discarded
    Interrupted,
}

impl CrawlOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Short tag used in logs and summaries
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::HttpError(_) => "http_error",
            Self::Blocked => "blocked",
            Self::Exception(_) => "exception",
            Self::Interrupted => "interrupted",
        }
    }
}

impl fmt::Display for CrawlOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HttpError(status) => write!(f, "http_error (HTTP {})", status),
            Self::Exception(reason) => write!(f, "exception ({})", reason),
            other => write!(f, "{}", other.tag()),
        }
    }
}

/// Ephemeral result of one enrichment attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlResult {
    pub email: Option<String>,
    pub contact_form_url: Option<String>,
    pub outcome: CrawlOutcome,
}

impl CrawlResult {
    pub fn success(email: Option<String>, contact_form_url: Option<String>) -> Self {
        Self {
            email,
            contact_form_url,
            outcome: CrawlOutcome::Success,
        }
    }

    pub fn failed(outcome: CrawlOutcome) -> Self {
        Self {
            email: None,
            contact_form_url: None,
            outcome,
        }
    }

    /// True once both email and contact form are known
    pub fn is_complete(&self) -> bool {
        self.email.is_some() && self.contact_form_url.is_some()
    }
}
