//! Contact-page discovery
//!
//! When the homepage lacks an email or form, a bounded list of likely contact
//! pages is tried. Anchors that look like contact links come first, then a
//! fixed set of conventional paths.

use crate::extract::form::contact_anchor_href;
use crate::url::{dedup_key, resolve_href};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Upper bound on candidate pages per site
pub const MAX_CONTACT_CANDIDATES: usize = 8;

/// Conventional contact paths tried after on-page links
pub const FALLBACK_PATHS: &[&str] = &[
    "/contact",
    "/contact-us",
    "/contactus",
    "/about/contact",
    "/about-us/contact",
    "/enrolments",
];

/// Returns up to [`MAX_CONTACT_CANDIDATES`] distinct candidate contact pages,
/// in discovery order
pub fn candidate_contact_urls(doc: &Html, base_url: &Url) -> Vec<Url> {
    let mut raw: Vec<Url> = Vec::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        raw.extend(
            doc.select(&selector)
                .filter_map(|element| contact_anchor_href(&element))
                .filter_map(|href| resolve_href(base_url, &href)),
        );
    }
    raw.extend(
        FALLBACK_PATHS
            .iter()
            .filter_map(|path| resolve_href(base_url, path)),
    );

    let mut seen = HashSet::new();
    raw.into_iter()
        .filter(|url| seen.insert(dedup_key(url)))
        .take(MAX_CONTACT_CANDIDATES)
        .collect()
}
