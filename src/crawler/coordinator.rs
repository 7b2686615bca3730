//! Crawler coordinator - the resumable crawl loop
//!
//! Walks the record set in stored order and enriches each record that has a
//! website and has not been checked yet:
//! - Applying results under the fill-only-empty rule
//! - Checkpointing the whole record set every N attempts and on exit
//! - Stopping cleanly when a shutdown is requested

use crate::config::Config;
use crate::crawler::{Enricher, ShutdownSignal};
use crate::logging::CrawlLogger;
use crate::state::{ContactRecord, CrawlOutcome};
use crate::storage::RecordStore;
use crate::Result;
use chrono::Local;
use std::sync::Arc;

/// Loop limits, usually taken from `[crawl]` and CLI overrides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlOptions {
    /// Maximum records to attempt; 0 means unlimited
    pub max_sites: usize,

    /// Attempts between checkpoints; 0 means checkpoint only on exit
    pub checkpoint_every: usize,
}

impl CrawlOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_sites: config.crawl.max_sites,
            checkpoint_every: config.crawl.checkpoint_every,
        }
    }
}

/// Counters reported at each checkpoint and at exit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlCounters {
    pub attempted: usize,
    pub succeeded: usize,
    pub emails_found: usize,
    pub forms_found: usize,
    pub blocked: usize,
    pub failed: usize,
    pub interrupted: bool,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    records: Vec<ContactRecord>,
    store: Box<dyn RecordStore>,
    enricher: Enricher,
    options: CrawlOptions,
    logger: Arc<CrawlLogger>,
    counters: CrawlCounters,
}

impl Coordinator {
    /// Loads the record set from the store
    ///
    /// Fails if the store cannot be read.
    pub fn new(
        mut store: Box<dyn RecordStore>,
        enricher: Enricher,
        options: CrawlOptions,
        logger: Arc<CrawlLogger>,
    ) -> Result<Self> {
        let records = store.load()?;
        tracing::info!("Loaded {} records from {}", records.len(), store.location());

        Ok(Self {
            records,
            store,
            enricher,
            options,
            logger,
            counters: CrawlCounters::default(),
        })
    }

    pub fn records(&self) -> &[ContactRecord] {
        &self.records
    }

    pub fn counters(&self) -> CrawlCounters {
        self.counters
    }

    /// Number of records the loop would still attempt
    pub fn pending(&self) -> usize {
        self.records.iter().filter(|r| r.needs_enrichment()).count()
    }

    /// Runs the crawl loop to completion, the site cap, or a shutdown request
    ///
    /// The record set is checkpointed every `checkpoint_every` attempts and
    /// always once more before returning. A failed checkpoint aborts the run.
    pub async fn run(&mut self, shutdown: &ShutdownSignal) -> Result<CrawlCounters> {
        tracing::info!(
            "Starting enrichment: {} pending of {} records",
            self.pending(),
            self.records.len()
        );

        for index in 0..self.records.len() {
            if shutdown.is_triggered() {
                self.counters.interrupted = true;
                break;
            }
            if !self.records[index].needs_enrichment() {
                continue;
            }
            if self.options.max_sites > 0 && self.counters.attempted >= self.options.max_sites {
                tracing::info!("Reached max-sites limit of {}", self.options.max_sites);
                break;
            }

            if !self.process(index, shutdown).await {
                self.counters.interrupted = true;
                break;
            }

            let every = self.options.checkpoint_every;
            if every > 0 && self.counters.attempted % every == 0 {
                self.checkpoint()?;
                self.print_progress();
            }
        }

        self.checkpoint()?;
        if self.counters.interrupted {
            tracing::warn!(
                "Interrupted after {} attempts; progress saved",
                self.counters.attempted
            );
        }
        Ok(self.counters)
    }

    /// Enriches one record; returns false if a shutdown cut it short
    async fn process(&mut self, index: usize, shutdown: &ShutdownSignal) -> bool {
        let Some(website) = self.records[index].website_url.clone() else {
            return true;
        };

        self.counters.attempted += 1;
        tracing::info!(
            "[{}] {} -> {}",
            self.counters.attempted,
            self.records[index].name,
            website
        );

        let result = self.enricher.enrich(&website, shutdown).await;

        if result.outcome == CrawlOutcome::Interrupted {
            // Never persisted, so the record is retried on the next run
            self.counters.attempted -= 1;
            return false;
        }

        let record = &mut self.records[index];
        let applied = record.apply(&result, Local::now().date_naive());

        match &result.outcome {
            CrawlOutcome::Success => {
                self.counters.succeeded += 1;
                if applied.email {
                    self.counters.emails_found += 1;
                }
                if applied.contact_form {
                    self.counters.forms_found += 1;
                }
                tracing::debug!(
                    "{}: email={:?} form={:?}",
                    record.name,
                    result.email,
                    result.contact_form_url
                );
            }
            CrawlOutcome::Blocked => {
                self.counters.blocked += 1;
                self.logger
                    .error(&format!("{} ({})", record.name, website), &result.outcome);
            }
            CrawlOutcome::HttpError(_) | CrawlOutcome::Exception(_) => {
                self.counters.failed += 1;
                self.logger
                    .error(&format!("{} ({})", record.name, website), &result.outcome);
            }
            CrawlOutcome::Interrupted => {}
        }
        true
    }

    /// Persists the full record set
    pub fn checkpoint(&mut self) -> Result<()> {
        self.store.save(&self.records)?;
        tracing::debug!(
            "Checkpoint: {} records saved to {}",
            self.records.len(),
            self.store.location()
        );
        Ok(())
    }

    fn print_progress(&self) {
        let c = &self.counters;
        println!(
            "Checkpoint after {} attempts: {} ok, {} emails, {} forms, {} blocked, {} failed",
            c.attempted, c.succeeded, c.emails_found, c.forms_found, c.blocked, c.failed
        );
    }
}
