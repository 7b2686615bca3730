//! Email candidate extraction and ranking
//!
//! Candidates are gathered per strategy and tried in a fixed priority order:
//! explicit `mailto:` links first, then Cloudflare-protected addresses, then
//! addresses appearing in visible text.

use crate::extract::classify::strip_mailto;
use crate::extract::{classify_public_email, extract_obfuscated, visible_text};
use percent_encoding::percent_decode_str;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

/// Where an email candidate was found; ordering is priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EmailStrategy {
    Mailto,
    Obfuscated,
    Text,
}

impl EmailStrategy {
    pub const ALL: [EmailStrategy; 3] = [Self::Mailto, Self::Obfuscated, Self::Text];
}

/// A raw address scraped from a page, before classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailCandidate {
    pub address: String,
    pub strategy: EmailStrategy,
    pub source_url: Url,
}

fn text_email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]*[a-z0-9])?@[a-z0-9](?:[a-z0-9-]*[a-z0-9])?(?:\.[a-z0-9](?:[a-z0-9-]*[a-z0-9])?)*\.[a-z]{2,24}\b",
        )
        .expect("text email pattern is valid")
    })
}

/// Returns the address part of every `mailto:` link, percent-decoded
pub fn extract_mailto(doc: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut found = Vec::new();
    for element in doc.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(target) = strip_mailto(href.trim()) else {
            continue;
        };

        let target = target.split('?').next().unwrap_or("");
        let decoded = percent_decode_str(target).decode_utf8_lossy();
        for address in decoded.split(',') {
            let address = address.trim();
            if !address.is_empty() {
                found.push(address.to_string());
            }
        }
    }
    found
}

/// Scans text for email-shaped tokens, deduplicated in order of appearance
pub fn extract_text(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text_email_regex()
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|candidate| !candidate.contains(".."))
        .filter(|candidate| seen.insert(candidate.to_ascii_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Returns the first candidate that classifies as a valid public address,
/// normalized
pub fn choose_general_email(
    candidates: &[String],
    source_url: &Url,
    strategy: EmailStrategy,
) -> Option<String> {
    candidates
        .iter()
        .map(|candidate| classify_public_email(candidate, source_url, strategy))
        .find(|verdict| verdict.is_valid())
        .map(|verdict| verdict.normalized)
}

/// Gathers every email candidate on a page, in strategy priority order
pub fn collect_candidates(doc: &Html, source_url: &Url) -> Vec<EmailCandidate> {
    let mut candidates = Vec::new();
    for strategy in EmailStrategy::ALL {
        let raw = match strategy {
            EmailStrategy::Mailto => extract_mailto(doc),
            EmailStrategy::Obfuscated => extract_obfuscated(doc),
            EmailStrategy::Text => extract_text(&visible_text(doc)),
        };
        candidates.extend(raw.into_iter().map(|address| EmailCandidate {
            address,
            strategy,
            source_url: source_url.clone(),
        }));
    }
    candidates
}

/// Picks the best public email on a page
///
/// Strategies are tried in priority order; within a strategy the first valid
/// candidate wins.
pub fn choose_best_email(doc: &Html, source_url: &Url) -> Option<String> {
    let candidates = collect_candidates(doc, source_url);

    EmailStrategy::ALL.iter().find_map(|&strategy| {
        let raw: Vec<String> = candidates
            .iter()
            .filter(|c| c.strategy == strategy)
            .map(|c| c.address.clone())
            .collect();
        choose_general_email(&raw, source_url, strategy)
    })
}
