//! State module for enrichment progress
//!
//! # Components
//!
//! - `ContactRecord`: one organization, mutated in place by the crawl loop
//! - `CrawlResult` / `CrawlOutcome`: the ephemeral result of one attempt

mod outcome;
mod record;

pub use outcome::{CrawlOutcome, CrawlResult};
pub use record::{AppliedFields, ContactRecord};
