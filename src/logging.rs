//! Append-only activity and error logs
//!
//! A [`CrawlLogger`] is built by the caller of a crawl and handed to the
//! fetcher, the enricher and the crawl loop. Every entry is also emitted as a
//! `tracing` event, so console output follows the subscriber configured in
//! `main` while the files keep a permanent record.

use crate::config::LoggingConfig;
use chrono::Local;
use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

/// Two independent write-only streams: one line per request, one entry per failure
#[derive(Debug, Default)]
pub struct CrawlLogger {
    activity: Option<Mutex<File>>,
    errors: Option<Mutex<File>>,
}

impl CrawlLogger {
    /// Opens (creating if needed) the configured log files in append mode
    pub fn open(config: &LoggingConfig) -> io::Result<Self> {
        Ok(Self {
            activity: config.activity_log.as_deref().map(open_append).transpose()?,
            errors: config.error_log.as_deref().map(open_append).transpose()?,
        })
    }

    /// A logger that only emits tracing events
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Records one outbound request
    pub fn request(&self, url: &str, status: Option<u16>, elapsed: Duration, note: &str) {
        let status = status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "---".to_string());
        tracing::debug!(target: "activity", "GET {} -> {} ({} ms) {}", url, status, elapsed.as_millis(), note);

        if let Some(file) = &self.activity {
            let line = format!(
                "{} | GET {} | {} | {}ms{}{}",
                timestamp(),
                url,
                status,
                elapsed.as_millis(),
                if note.is_empty() { "" } else { " | " },
                note
            );
            append_line(file, &line);
        }
    }

    /// Records one failure along with the context it happened in
    pub fn error(&self, context: &str, error: &dyn Display) {
        tracing::warn!(target: "errors", "{}: {}", context, error);

        if let Some(file) = &self.errors {
            let line = format!("{} | ERROR | {}: {}", timestamp(), context, error);
            append_line(file, &line);
        }
    }
}

fn open_append(path: &str) -> io::Result<Mutex<File>> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(Mutex::new(file))
}

fn append_line(file: &Mutex<File>, line: &str) {
    let result = match file.lock() {
        Ok(mut f) => writeln!(f, "{}", line),
        Err(poisoned) => writeln!(poisoned.into_inner(), "{}", line),
    };
    if let Err(e) = result {
        tracing::warn!("Failed to write log line: {}", e);
    }
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
