use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for an enrichment run
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub http: HttpConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default = "default_portals", rename = "portal")]
    pub portals: Vec<PortalRule>,
}

/// Compliant fetcher configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header sent with every request, fixed for the run
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Minimum delay between consecutive outbound requests, crawl-wide
    #[serde(rename = "request-delay-seconds", default = "default_request_delay")]
    pub request_delay_seconds: f64,

    /// General request timeout
    #[serde(rename = "timeout-seconds", default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Upper bound applied to the timeout during enrichment runs
    #[serde(
        rename = "enrichment-timeout-cap-seconds",
        default = "default_timeout_cap"
    )]
    pub enrichment_timeout_cap_seconds: u64,

    /// Retries after the first attempt for transient failures
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Seed of the exponential backoff schedule, in seconds
    #[serde(rename = "backoff-factor", default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// External command used when the TLS handshake fails (empty disables)
    #[serde(rename = "tls-fallback-command", default = "default_tls_fallback")]
    pub tls_fallback_command: String,
}

impl HttpConfig {
    /// Builds a configuration with the default politeness settings
    pub fn with_user_agent(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            request_delay_seconds: default_request_delay(),
            timeout_seconds: default_timeout(),
            enrichment_timeout_cap_seconds: default_timeout_cap(),
            max_retries: default_max_retries(),
            backoff_factor: default_backoff_factor(),
            tls_fallback_command: default_tls_fallback(),
        }
    }

    /// Timeout actually used by the fetcher: the general timeout, capped
    pub fn effective_timeout(&self) -> Duration {
        Duration::from_secs(
            self.timeout_seconds
                .min(self.enrichment_timeout_cap_seconds)
                .max(1),
        )
    }

    /// Crawl-wide delay between requests
    pub fn request_delay(&self) -> Duration {
        Duration::from_secs_f64(self.request_delay_seconds.max(0.0))
    }
}

/// Crawl loop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Maximum number of new site attempts per run (0 = unlimited)
    #[serde(rename = "max-sites", default)]
    pub max_sites: usize,

    /// Attempted records between two checkpoints (0 = only on exit)
    #[serde(rename = "checkpoint-every", default = "default_checkpoint_every")]
    pub checkpoint_every: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_sites: 0,
            checkpoint_every: default_checkpoint_every(),
        }
    }
}

/// Record store location
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to a `.csv` file or a SQLite database (`.db`, `.sqlite`)
    pub path: String,
}

/// Append-only log files
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// One line per outbound request
    #[serde(rename = "activity-log")]
    pub activity_log: Option<String>,

    /// One entry per failure, with context
    #[serde(rename = "error-log")]
    pub error_log: Option<String>,
}

/// A directory portal that wraps organization homepages
///
/// Some records point at a government directory page rather than the
/// organization's own site. A portal rule describes how to recognise such a
/// page, how to dig the real homepage out of it, and where the directory
/// hosts its own contact page for the organization.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PortalRule {
    pub name: String,

    /// Substring the (lowercase) host must contain
    #[serde(rename = "host-contains")]
    pub host_contains: String,

    /// Substring the (lowercase) path must contain
    #[serde(rename = "path-contains", default)]
    pub path_contains: String,

    /// Regex with a named `url` group locating the real homepage in the page
    #[serde(rename = "homepage-pattern")]
    pub homepage_pattern: String,

    /// Query parameters that may carry the organization ID
    #[serde(rename = "id-params", default)]
    pub id_params: Vec<String>,

    /// Path of the directory contact page, with `{id}` substituted
    #[serde(rename = "contact-path", default)]
    pub contact_path: Option<String>,
}

fn default_request_delay() -> f64 {
    1.0
}

fn default_timeout() -> u64 {
    20
}

fn default_timeout_cap() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    1
}

fn default_backoff_factor() -> f64 {
    0.5
}

fn default_tls_fallback() -> String {
    "curl".to_string()
}

fn default_checkpoint_every() -> usize {
    50
}

/// Portal rules used when the configuration does not list any
pub fn default_portals() -> Vec<PortalRule> {
    vec![PortalRule {
        name: "wa-schools-online".to_string(),
        host_contains: "det.wa.edu.au".to_string(),
        path_contains: "schoolsonline".to_string(),
        homepage_pattern: r"(?i)openNewPage\('(?P<url>https?://[^']+\.wa\.edu\.au[^']*)'"
            .to_string(),
        id_params: vec![
            "schoolID".to_string(),
            "schoolId".to_string(),
            "schoolid".to_string(),
        ],
        contact_path: Some("/schoolsonline/contact.do?schoolID={id}".to_string()),
    }]
}
