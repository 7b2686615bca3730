//! Per-record enrichment
//!
//! Drives the fetcher and the page extractors for one organization website:
//! homepage first, then bounded contact-page discovery, then the directory
//! portal's own contact page when the record came from one.

use crate::config::{validate_portal_rule, Config, PortalRule};
use crate::crawler::{Fetcher, ShutdownSignal};
use crate::extract::{analyze_page, PageFindings};
use crate::logging::CrawlLogger;
use crate::state::{CrawlOutcome, CrawlResult};
use crate::url::parse_http_url;
use crate::{ConfigResult, FetchError};
use regex::Regex;
use std::sync::Arc;
use url::Url;

/// A portal rule with its homepage pattern compiled
#[derive(Debug, Clone)]
pub struct CompiledPortal {
    rule: PortalRule,
    pattern: Regex,
}

impl CompiledPortal {
    pub fn compile(rule: &PortalRule) -> ConfigResult<Self> {
        Ok(Self {
            pattern: validate_portal_rule(rule)?,
            rule: rule.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.rule.name
    }

    /// True if the URL is a page of this portal
    pub fn matches(&self, url: &Url) -> bool {
        let host = url.host_str().unwrap_or("").to_ascii_lowercase();
        let path = url.path().to_ascii_lowercase();
        host.contains(&self.rule.host_contains.to_ascii_lowercase())
            && path.contains(&self.rule.path_contains.to_ascii_lowercase())
    }

    /// Digs the organization's own homepage out of a portal page
    pub fn unwrap_homepage(&self, body: &str) -> Option<Url> {
        let captures = self.pattern.captures(body)?;
        parse_http_url(captures.name("url")?.as_str())
    }

    /// The portal's contact page for the organization a portal URL refers to
    ///
    /// The organization ID must be all digits.
    pub fn contact_endpoint(&self, url: &Url) -> Option<Url> {
        let contact_path = self.rule.contact_path.as_deref()?;
        if !self.matches(url) {
            return None;
        }

        let id = url.query_pairs().find_map(|(key, value)| {
            let is_id_param = self.rule.id_params.iter().any(|param| *param == key);
            let is_numeric = !value.is_empty() && value.chars().all(|c| c.is_ascii_digit());
            (is_id_param && is_numeric).then(|| value.into_owned())
        })?;

        url.join(&contact_path.replace("{id}", &id)).ok()
    }
}

/// Why enrichment stopped before producing a result
enum Halt {
    Fetch(FetchError),
    Interrupted,
}

impl From<FetchError> for Halt {
    fn from(error: FetchError) -> Self {
        Self::Fetch(error)
    }
}

/// Enriches one website at a time
pub struct Enricher {
    fetcher: Fetcher,
    portals: Vec<CompiledPortal>,
    logger: Arc<CrawlLogger>,
}

impl Enricher {
    pub fn new(
        fetcher: Fetcher,
        portals: &[PortalRule],
        logger: Arc<CrawlLogger>,
    ) -> ConfigResult<Self> {
        let portals = portals
            .iter()
            .map(CompiledPortal::compile)
            .collect::<ConfigResult<Vec<_>>>()?;

        Ok(Self {
            fetcher,
            portals,
            logger,
        })
    }

    /// Builds the fetcher and enricher described by a configuration
    pub fn from_config(config: &Config, logger: Arc<CrawlLogger>) -> crate::Result<Self> {
        let fetcher = Fetcher::new(&config.http, Arc::clone(&logger))?;
        Ok(Self::new(fetcher, &config.portals, logger)?)
    }

    /// Recovers a public email and contact-form URL for one website
    ///
    /// Never fails: fetch errors on the homepage become `Blocked` or
    /// `Exception` outcomes, errors on later pages are skipped. A shutdown
    /// request observed between fetches yields `Interrupted`.
    pub async fn enrich(&mut self, website_url: &str, shutdown: &ShutdownSignal) -> CrawlResult {
        match self.run(website_url, shutdown).await {
            Ok(result) => result,
            Err(Halt::Interrupted) => CrawlResult::failed(CrawlOutcome::Interrupted),
            Err(Halt::Fetch(FetchError::RobotsDisallowed { .. })) => {
                CrawlResult::failed(CrawlOutcome::Blocked)
            }
            Err(Halt::Fetch(error)) => {
                CrawlResult::failed(CrawlOutcome::Exception(error.to_string()))
            }
        }
    }

    async fn run(
        &mut self,
        website_url: &str,
        shutdown: &ShutdownSignal,
    ) -> Result<CrawlResult, Halt> {
        check(shutdown)?;
        let first = self.fetcher.fetch(website_url).await?;
        if first.is_error_status() {
            return Ok(CrawlResult::failed(CrawlOutcome::HttpError(first.status_code)));
        }

        let unwrapped = self
            .portals
            .iter()
            .filter(|portal| portal.matches(&first.resolved_url))
            .find_map(|portal| {
                portal
                    .unwrap_homepage(&first.body)
                    .map(|url| (portal.name().to_string(), url))
            });

        let homepage = match unwrapped {
            Some((portal, real_homepage)) => {
                tracing::debug!(
                    "Unwrapped {} homepage {} from {}",
                    portal,
                    real_homepage,
                    first.resolved_url
                );
                check(shutdown)?;
                let page = self.fetcher.fetch(real_homepage.as_str()).await?;
                if page.is_error_status() {
                    return Ok(CrawlResult::failed(CrawlOutcome::HttpError(page.status_code)));
                }
                page
            }
            None => first,
        };

        let findings = analyze_page(&homepage.body, &homepage.resolved_url);
        let candidates = findings.contact_candidates.clone();
        let mut result = CrawlResult::success(None, None);
        fill_missing(&mut result, findings);

        if !result.is_complete() {
            for candidate in candidates {
                check(shutdown)?;
                if let Some(findings) = self.fetch_findings(&candidate).await {
                    fill_missing(&mut result, findings);
                }
                if result.is_complete() {
                    break;
                }
            }
        }

        if !result.is_complete() {
            if let Some(endpoint) = self.portal_contact_endpoint(website_url) {
                check(shutdown)?;
                if let Some(findings) = self.fetch_findings(&endpoint).await {
                    fill_missing(&mut result, findings);
                }
            }
        }

        Ok(result)
    }

    /// Fetches a secondary page; failures and error statuses are skipped
    async fn fetch_findings(&mut self, url: &Url) -> Option<PageFindings> {
        match self.fetcher.fetch(url.as_str()).await {
            Ok(page) if page.is_error_status() => {
                tracing::debug!("Skipping {} (HTTP {})", url, page.status_code);
                None
            }
            Ok(page) => Some(analyze_page(&page.body, &page.resolved_url)),
            Err(error) => {
                tracing::debug!("Skipping {}: {}", url, error);
                if matches!(error, FetchError::Tls { .. }) {
                    self.logger.error(&format!("contact page {}", url), &error);
                }
                None
            }
        }
    }

    fn portal_contact_endpoint(&self, website_url: &str) -> Option<Url> {
        let url = parse_http_url(website_url)?;
        self.portals
            .iter()
            .find_map(|portal| portal.contact_endpoint(&url))
    }
}

fn check(shutdown: &ShutdownSignal) -> Result<(), Halt> {
    if shutdown.is_triggered() {
        Err(Halt::Interrupted)
    } else {
        Ok(())
    }
}

/// Copies findings into fields that are still empty
fn fill_missing(result: &mut CrawlResult, findings: PageFindings) {
    if result.email.is_none() {
        result.email = findings.email;
    }
    if result.contact_form_url.is_none() {
        result.contact_form_url = findings.contact_form_url.map(String::from);
    }
}
