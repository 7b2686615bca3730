//! Statistics over a record set and a crawl run
//!
//! This module provides functionality for summarizing a record store and
//! printing the counters of a finished crawl.

use crate::crawler::CrawlCounters;
use crate::state::ContactRecord;

/// Dataset coverage summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatasetStatistics {
    pub total_records: usize,
    pub with_website: usize,
    pub checked: usize,
    pub with_email: usize,
    pub with_contact_form: usize,

    /// Records with a website that the crawler has not attempted yet
    pub pending: usize,
}

/// Computes coverage statistics for a record set
pub fn dataset_statistics(records: &[ContactRecord]) -> DatasetStatistics {
    records
        .iter()
        .fold(DatasetStatistics::default(), |mut stats, record| {
            stats.total_records += 1;
            stats.with_website += usize::from(record.website_url.is_some());
            stats.checked += usize::from(record.website_checked);
            stats.with_email += usize::from(record.public_email.is_some());
            stats.with_contact_form += usize::from(record.contact_form_url.is_some());
            stats.pending += usize::from(record.needs_enrichment());
            stats
        })
}

fn percentage(part: usize, total: usize) -> f64 {
    if total > 0 {
        (part as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Prints dataset statistics to stdout in a formatted manner
pub fn print_statistics(location: &str, stats: &DatasetStatistics) {
    println!("=== Record Store Statistics ===\n");
    println!("Store: {}", location);
    println!("  Total records: {}", stats.total_records);

    for (label, count) in [
        ("With website", stats.with_website),
        ("Website checked", stats.checked),
        ("With public email", stats.with_email),
        ("With contact form", stats.with_contact_form),
    ] {
        println!(
            "  {}: {} ({:.1}%)",
            label,
            count,
            percentage(count, stats.total_records)
        );
    }
    println!("  Pending enrichment: {}", stats.pending);
}

/// Prints the final summary of a crawl run
pub fn print_summary(counters: &CrawlCounters) {
    println!("\n=== Enrichment Summary ===\n");
    println!("  Attempted: {}", counters.attempted);
    println!(
        "  Succeeded: {} ({:.1}%)",
        counters.succeeded,
        percentage(counters.succeeded, counters.attempted)
    );
    println!("  Emails found: {}", counters.emails_found);
    println!("  Contact forms found: {}", counters.forms_found);
    println!("  Blocked by robots.txt: {}", counters.blocked);
    println!("  Failed: {}", counters.failed);
    if counters.interrupted {
        println!("\nRun was interrupted; rerun to resume.");
    }
}
