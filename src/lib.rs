//! Contact Enricher: a polite contact-details crawler
//!
//! This crate walks a directory of organization records, visits each
//! organization's own website and recovers a public contact email and/or a
//! contact-form URL, respecting robots.txt, a crawl-wide request delay and
//! the records already recovered in earlier runs.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod logging;
pub mod output;
pub mod robots;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for enrichment runs
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Record store error: {0}")]
    Store(#[from] storage::StoreError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid portal rule '{name}': {message}")]
    InvalidPortal { name: String, message: String },
}

/// Failures of a single compliant fetch
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("URL disallowed by robots.txt: {url}")]
    RobotsDisallowed { url: String },

    #[error("Fetch of {url} failed after {attempts} attempt(s): {reason}")]
    FetchFailed {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("TLS failure for {url}: {message}")]
    Tls { url: String, message: String },

    #[error("Not an http(s) URL: {0}")]
    InvalidUrl(String),
}

/// Result type alias for enrichment operations
pub type Result<T> = std::result::Result<T, EnrichError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlCounters, Enricher, Fetcher, ShutdownSignal};
pub use extract::{choose_general_email, classify_public_email, EmailStatus, EmailStrategy};
pub use logging::CrawlLogger;
pub use state::{ContactRecord, CrawlOutcome, CrawlResult};
pub use url::ensure_http;
