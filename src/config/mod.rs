//! Configuration module
//!
//! Loads, parses, and validates the TOML configuration of an enrichment run.
//! The resulting [`Config`] is built once and passed by reference into each
//! component; nothing reads ambient configuration state.
//!
//! # Example
//!
//! ```no_run
//! use contact_enricher::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("enricher.toml")).unwrap();
//! println!("Request delay: {}s", config.http.request_delay_seconds);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    default_portals, Config, CrawlConfig, HttpConfig, LoggingConfig, PortalRule, StoreConfig,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{validate, validate_http_config, validate_portal_rule};
