//! Contact Enricher main entry point
//!
//! This is the command-line interface for the contact enrichment crawler.

use clap::Parser;
use contact_enricher::config::{load_config_with_hash, validate, Config};
use contact_enricher::crawler::run_enrichment;
use contact_enricher::output::{dataset_statistics, print_statistics, print_summary};
use contact_enricher::storage::open_store;
use contact_enricher::{CrawlLogger, ShutdownSignal};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Contact Enricher: recovers public contact details from organization websites
///
/// Visits each record's website politely, respecting robots.txt and a
/// crawl-wide request delay, and fills in a public email and contact-form URL
/// where they are still missing. Interrupted runs resume where they stopped.
#[derive(Parser, Debug)]
#[command(name = "contact-enricher")]
#[command(version)]
#[command(about = "A polite contact-details enrichment crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Record store to use instead of the configured one (.db, .sqlite, .csv)
    #[arg(long, value_name = "PATH")]
    store: Option<String>,

    /// Maximum number of sites to attempt (0 = unlimited)
    #[arg(long, value_name = "N")]
    max_sites: Option<usize>,

    /// Checkpoint the store every N attempted sites (0 = only on exit)
    #[arg(long, value_name = "N")]
    checkpoint_every: Option<usize>,

    /// Minimum delay between requests, in seconds
    #[arg(long, value_name = "SECONDS")]
    delay: Option<f64>,

    /// Request timeout, in seconds
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Retries for transient failures
    #[arg(long, value_name = "N")]
    max_retries: Option<u32>,

    /// Backoff factor for retries, in seconds
    #[arg(long, value_name = "SECONDS")]
    backoff_factor: Option<f64>,

    /// User-Agent sent with every request
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be enriched without fetching anything
    #[arg(long, conflicts_with_all = ["stats", "reset_checked"])]
    dry_run: bool,

    /// Show statistics from the record store and exit
    #[arg(long, conflicts_with_all = ["dry_run", "reset_checked"])]
    stats: bool,

    /// Clear website_checked on every record so the next run retries them all
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    reset_checked: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(store) = &self.store {
            config.store.path = store.clone();
        }
        if let Some(max_sites) = self.max_sites {
            config.crawl.max_sites = max_sites;
        }
        if let Some(every) = self.checkpoint_every {
            config.crawl.checkpoint_every = every;
        }
        if let Some(delay) = self.delay {
            config.http.request_delay_seconds = delay;
        }
        if let Some(timeout) = self.timeout {
            config.http.timeout_seconds = timeout;
        }
        if let Some(retries) = self.max_retries {
            config.http.max_retries = retries;
        }
        if let Some(factor) = self.backoff_factor {
            config.http.backoff_factor = factor;
        }
        if let Some(user_agent) = &self.user_agent {
            config.http.user_agent = user_agent.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };
    cli.apply_overrides(&mut config);
    validate(&config)?;

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.reset_checked {
        handle_reset_checked(&config)?;
    } else {
        handle_enrichment(config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("contact_enricher=info,warn"),
            1 => EnvFilter::new("contact_enricher=debug,activity=debug,info"),
            2 => EnvFilter::new("contact_enricher=trace,activity=debug,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be enriched
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Contact Enricher Dry Run ===\n");

    println!("HTTP Configuration:");
    println!("  User agent: {}", config.http.user_agent);
    println!("  Request delay: {}s", config.http.request_delay_seconds);
    println!(
        "  Timeout: {}s (effective {:?})",
        config.http.timeout_seconds,
        config.http.effective_timeout()
    );
    println!(
        "  Retries: {} (backoff factor {})",
        config.http.max_retries, config.http.backoff_factor
    );
    if config.http.tls_fallback_command.trim().is_empty() {
        println!("  TLS fallback: disabled");
    } else {
        println!("  TLS fallback: {}", config.http.tls_fallback_command);
    }

    println!("\nCrawl:");
    if config.crawl.max_sites == 0 {
        println!("  Max sites: unlimited");
    } else {
        println!("  Max sites: {}", config.crawl.max_sites);
    }
    println!("  Checkpoint every: {}", config.crawl.checkpoint_every);

    println!("\nLogs:");
    println!(
        "  Activity: {}",
        config.logging.activity_log.as_deref().unwrap_or("(none)")
    );
    println!(
        "  Errors: {}",
        config.logging.error_log.as_deref().unwrap_or("(none)")
    );

    println!("\nPortal Rules ({}):", config.portals.len());
    for portal in &config.portals {
        println!(
            "  - {} (host contains '{}', path contains '{}')",
            portal.name, portal.host_contains, portal.path_contains
        );
    }

    let mut store = open_store(Path::new(&config.store.path))?;
    let records = store.load()?;
    let stats = dataset_statistics(&records);

    println!("\nStore: {}", store.location());
    println!("  Records: {}", stats.total_records);
    println!("  Pending enrichment: {}", stats.pending);

    println!("\n✓ Configuration is valid");
    let would_attempt = match config.crawl.max_sites {
        0 => stats.pending,
        cap => stats.pending.min(cap),
    };
    println!("✓ Would attempt {} websites", would_attempt);

    Ok(())
}

/// Handles the --stats mode: shows coverage statistics from the store
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_store(Path::new(&config.store.path))?;
    let records = store.load()?;
    print_statistics(&store.location(), &dataset_statistics(&records));
    Ok(())
}

/// Handles the --reset-checked mode: makes every record eligible again
fn handle_reset_checked(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut store = open_store(Path::new(&config.store.path))?;
    let mut records = store.load()?;

    let mut reset = 0;
    for record in records.iter_mut().filter(|r| r.website_checked) {
        record.reset_checked();
        reset += 1;
    }
    store.save(&records)?;

    println!("✓ Reset website_checked on {} records in {}", reset, store.location());
    Ok(())
}

/// Handles the main enrichment run
async fn handle_enrichment(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let logger = Arc::new(CrawlLogger::open(&config.logging)?);
    let shutdown = ShutdownSignal::new();

    let handler = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received Ctrl+C, finishing the current request and saving...");
            handler.trigger();
        }
    });

    match run_enrichment(&config, logger, &shutdown).await {
        Ok(counters) => {
            print_summary(&counters);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Enrichment failed: {}", e);
            Err(e.into())
        }
    }
}
