//! Compliant HTTP fetcher
//!
//! This module handles every outbound request of a crawl:
//! - robots.txt consultation, cached per origin
//! - A crawl-wide minimum delay between requests
//! - Retries with exponential backoff for transient failures
//! - A one-shot external-command fallback for TLS failures
//! - One activity-log line per request

use crate::config::HttpConfig;
use crate::crawler::fallback::CurlFallback;
use crate::logging::CrawlLogger;
use crate::robots::{robots_from_response, ParsedRobots, RobotsCache};
use crate::url::{origin_key, parse_http_url, robots_url};
use crate::FetchError;
use reqwest::{redirect::Policy, Client};
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Maximum redirect hops followed per request
const MAX_REDIRECTS: usize = 10;

/// Owned result of a successful fetch
///
/// 4xx and 5xx responses are still responses; callers inspect `status_code`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// URL the caller asked for
    pub requested_url: Url,

    /// URL after following redirects
    pub resolved_url: Url,

    pub status_code: u16,

    pub body: String,
}

impl FetchResponse {
    pub fn is_error_status(&self) -> bool {
        self.status_code >= 400
    }
}

/// Enforces a minimum gap between consecutive outbound requests
#[derive(Debug)]
pub struct RequestGate {
    min_delay: Duration,
    last_request: Option<Instant>,
}

impl RequestGate {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last_request: None,
        }
    }

    /// Waits until the next request may go out, then records it as sent
    pub async fn wait(&mut self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.min_delay {
                tokio::time::sleep(self.min_delay - elapsed).await;
            }
        }
        self.last_request = Some(Instant::now());
    }
}

/// Delay before retry `retry` (1-based): `backoff_factor * 2^(retry - 1)` seconds
pub fn backoff_delay(backoff_factor: f64, retry: u32) -> Duration {
    if retry == 0 {
        return Duration::ZERO;
    }
    let exponent = i32::try_from(retry - 1).unwrap_or(i32::MAX);
    let secs = backoff_factor * 2f64.powi(exponent);
    if secs.is_finite() && secs > 0.0 {
        Duration::from_secs_f64(secs)
    } else {
        Duration::ZERO
    }
}

/// Returns true if a request error came from certificate or TLS handshake
/// validation
pub fn is_tls_error(error: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = Some(error);
    while let Some(err) = source {
        let message = err.to_string().to_lowercase();
        if ["certificate", "tls", "ssl", "handshake"]
            .iter()
            .any(|needle| message.contains(needle))
        {
            return true;
        }
        source = err.source();
    }
    false
}

/// Builds the HTTP client shared by all requests of a crawl
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.effective_timeout())
        .connect_timeout(config.effective_timeout())
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// How a single attempt went
enum Attempt {
    Response(FetchResponse),
    Transient(String),
    Tls(String),
    Fatal(String),
}

/// The only component that performs network I/O
pub struct Fetcher {
    client: Client,
    config: HttpConfig,
    gate: RequestGate,
    robots: RobotsCache,
    fallback: Option<CurlFallback>,
    logger: Arc<CrawlLogger>,
}

impl Fetcher {
    pub fn new(config: &HttpConfig, logger: Arc<CrawlLogger>) -> Result<Self, reqwest::Error> {
        let client = build_http_client(config)?;
        let command = config.tls_fallback_command.trim();
        let fallback = if command.is_empty() {
            None
        } else {
            Some(CurlFallback::new(
                command,
                config.effective_timeout(),
                &config.user_agent,
            ))
        };

        Ok(Self {
            client,
            config: config.clone(),
            gate: RequestGate::new(config.request_delay()),
            robots: RobotsCache::new(),
            fallback,
            logger,
        })
    }

    /// Fetches a URL politely
    ///
    /// # Request Flow
    ///
    /// 1. Consult the origin's robots.txt (fetched once per origin)
    /// 2. Wait for the request gate
    /// 3. Send the GET, following up to 10 redirects
    /// 4. Handle the outcome per the retry table
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | robots.txt disallows | `RobotsDisallowed`, nothing sent |
    /// | 2xx, 3xx, 4xx | Returned as a response |
    /// | 5xx, timeout, connect error | Retry with backoff, then `FetchFailed` |
    /// | TLS failure | One external-command fallback, else `Tls` |
    pub async fn fetch(&mut self, url: &str) -> Result<FetchResponse, FetchError> {
        let url = parse_http_url(url).ok_or_else(|| FetchError::InvalidUrl(url.to_string()))?;

        if !self.is_allowed(&url).await {
            tracing::debug!("robots.txt disallows {}", url);
            return Err(FetchError::RobotsDisallowed {
                url: url.to_string(),
            });
        }

        let max_attempts = self.config.max_retries.saturating_add(1);
        let mut last_reason = String::new();

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                let delay = backoff_delay(self.config.backoff_factor, attempt - 1);
                tracing::debug!(
                    "Retrying {} in {:?} (attempt {}/{}): {}",
                    url,
                    delay,
                    attempt,
                    max_attempts,
                    last_reason
                );
                tokio::time::sleep(delay).await;
            }

            match self.attempt(&url).await {
                Attempt::Response(response) => return Ok(response),
                Attempt::Transient(reason) => last_reason = reason,
                Attempt::Tls(message) => return self.tls_fallback(&url, message).await,
                Attempt::Fatal(reason) => {
                    return Err(FetchError::FetchFailed {
                        url: url.to_string(),
                        attempts: attempt,
                        reason,
                    })
                }
            }
        }

        Err(FetchError::FetchFailed {
            url: url.to_string(),
            attempts: max_attempts,
            reason: last_reason,
        })
    }

    /// Number of origins whose robots.txt has been consulted
    pub fn robots_cached(&self) -> usize {
        self.robots.len()
    }

    async fn attempt(&mut self, url: &Url) -> Attempt {
        self.gate.wait().await;
        let started = Instant::now();

        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                self.logger
                    .request(url.as_str(), None, started.elapsed(), &e.to_string());
                return if is_tls_error(&e) {
                    Attempt::Tls(e.to_string())
                } else if e.is_timeout() || e.is_connect() || e.is_request() {
                    Attempt::Transient(e.to_string())
                } else {
                    Attempt::Fatal(e.to_string())
                };
            }
        };

        let status_code = response.status().as_u16();
        let resolved_url = response.url().clone();

        match response.text().await {
            Ok(body) => {
                let note = if resolved_url != *url {
                    format!("-> {}", resolved_url)
                } else {
                    String::new()
                };
                self.logger
                    .request(url.as_str(), Some(status_code), started.elapsed(), &note);

                if status_code >= 500 {
                    Attempt::Transient(format!("HTTP {}", status_code))
                } else {
                    Attempt::Response(FetchResponse {
                        requested_url: url.clone(),
                        resolved_url,
                        status_code,
                        body,
                    })
                }
            }
            Err(e) => {
                self.logger.request(
                    url.as_str(),
                    Some(status_code),
                    started.elapsed(),
                    &format!("body read failed: {}", e),
                );
                Attempt::Transient(e.to_string())
            }
        }
    }

    async fn tls_fallback(&mut self, url: &Url, message: String) -> Result<FetchResponse, FetchError> {
        let Some(fallback) = self.fallback.clone() else {
            return Err(FetchError::Tls {
                url: url.to_string(),
                message,
            });
        };

        tracing::info!("TLS failure for {}, retrying through external fetch", url);
        self.gate.wait().await;
        let started = Instant::now();

        match fallback.fetch(url).await {
            Ok(response) => {
                self.logger.request(
                    url.as_str(),
                    Some(response.status_code),
                    started.elapsed(),
                    "tls-fallback",
                );
                Ok(FetchResponse {
                    requested_url: url.clone(),
                    resolved_url: response.resolved_url,
                    status_code: response.status_code,
                    body: response.body,
                })
            }
            Err(fallback_error) => {
                self.logger
                    .request(url.as_str(), None, started.elapsed(), "tls-fallback failed");
                self.logger
                    .error(&format!("TLS fallback for {}", url), &fallback_error);
                Err(FetchError::Tls {
                    url: url.to_string(),
                    message: format!("{}; fallback: {}", message, fallback_error),
                })
            }
        }
    }

    async fn is_allowed(&mut self, url: &Url) -> bool {
        let origin = origin_key(url);
        if self.robots.get(&origin).is_none() {
            let robots = self.fetch_robots(url).await;
            self.robots.insert(origin.clone(), robots);
        }

        self.robots
            .get(&origin)
            .map(|robots| robots.is_allowed(url.as_str(), &self.config.user_agent))
            .unwrap_or(true)
    }

    /// Fetches and parses an origin's robots.txt; unreachable means allow-all
    async fn fetch_robots(&mut self, url: &Url) -> ParsedRobots {
        let Some(robots_url) = robots_url(url) else {
            return ParsedRobots::allow_all();
        };

        self.gate.wait().await;
        let started = Instant::now();

        let response = match self.client.get(robots_url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                self.logger
                    .request(robots_url.as_str(), None, started.elapsed(), &e.to_string());
                tracing::debug!("robots.txt unreachable for {}: {}", url, e);
                return ParsedRobots::allow_all();
            }
        };

        let status_code = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        self.logger
            .request(robots_url.as_str(), Some(status_code), started.elapsed(), "robots");

        robots_from_response(status_code, &body)
    }
}
