//! Output module for store statistics and run summaries

pub mod stats;

pub use stats::{dataset_statistics, print_statistics, print_summary, DatasetStatistics};
