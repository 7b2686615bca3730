//! Crawler module for polite contact enrichment
//!
//! This module contains the core crawling logic, including:
//! - The compliant fetcher (robots.txt, request delay, retries, TLS fallback)
//! - Per-record enrichment across homepage, contact pages and portals
//! - The resumable, checkpointing crawl loop
//! - Cooperative shutdown

mod coordinator;
mod enricher;
mod fallback;
mod fetcher;
mod shutdown;

pub use coordinator::{Coordinator, CrawlCounters, CrawlOptions};
pub use enricher::{CompiledPortal, Enricher};
pub use fallback::{parse_write_out, CurlFallback, FallbackResponse};
pub use fetcher::{
    backoff_delay, build_http_client, is_tls_error, FetchResponse, Fetcher, RequestGate,
};
pub use shutdown::ShutdownSignal;

use crate::config::Config;
use crate::logging::CrawlLogger;
use crate::storage::open_store;
use std::path::Path;
use std::sync::Arc;

/// Runs a complete enrichment pass over the configured store
///
/// This is the main entry point for a crawl. It will:
/// 1. Open the record store and load every record
/// 2. Build the fetcher and enricher
/// 3. Run the crawl loop until done, capped or interrupted
/// 4. Checkpoint the record set
pub async fn run_enrichment(
    config: &Config,
    logger: Arc<CrawlLogger>,
    shutdown: &ShutdownSignal,
) -> crate::Result<CrawlCounters> {
    let store = open_store(Path::new(&config.store.path))?;
    let enricher = Enricher::from_config(config, Arc::clone(&logger))?;
    let mut coordinator =
        Coordinator::new(store, enricher, CrawlOptions::from_config(config), logger)?;
    coordinator.run(shutdown).await
}
