//! Public email classification
//!
//! Decides whether a scraped address is a genuine public contact address for
//! the site it was found on. Classification is pure: the same input always
//! yields the same verdict.

use crate::extract::EmailStrategy;
use crate::url::is_same_or_subdomain;
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Whether a candidate may be stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailStatus {
    Valid,
    Rejected,
}

/// Why a candidate got its status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationReason {
    Accepted,
    Malformed,
    Placeholder,
    UnrelatedDomain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailClassification {
    pub normalized: String,
    pub status: EmailStatus,
    pub reason: ClassificationReason,
}

impl EmailClassification {
    pub fn is_valid(&self) -> bool {
        self.status == EmailStatus::Valid
    }

    fn rejected(normalized: String, reason: ClassificationReason) -> Self {
        Self {
            normalized,
            status: EmailStatus::Rejected,
            reason,
        }
    }
}

const MAX_ADDRESS_LEN: usize = 254;

const PLACEHOLDER_LOCALS: &[&str] = &[
    "noreply",
    "no-reply",
    "no_reply",
    "donotreply",
    "do-not-reply",
    "do_not_reply",
    "mailer-daemon",
    "postmaster",
    "bounce",
    "bounces",
    "example",
    "test",
    "user",
    "username",
    "name",
    "email",
    "your-email",
    "youremail",
    "yourname",
];

const PLACEHOLDER_DOMAINS: &[&str] = &[
    "example.com",
    "example.org",
    "example.net",
    "test.com",
    "domain.com",
    "email.com",
    "yourdomain.com",
    "yoursite.com",
    "mysite.com",
    "website.com",
    "sample.com",
    "company.com",
    "localhost",
];

/// File extensions that show up as fake TLDs, e.g. `logo@2x.png`
const ASSET_SUFFIXES: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "webp", "bmp", "ico", "css", "js",
];

/// Website-builder, tracking and library domains whose addresses leak into
/// page markup without belonging to the organization
const VENDOR_DOMAINS: &[&str] = &[
    "sentry.io",
    "wixpress.com",
    "squarespace.com",
    "mailchimp.com",
    "sendgrid.net",
    "cloudflare.com",
    "googleapis.com",
    "w3.org",
    "schema.org",
    "jquery.com",
    "godaddy.com",
];

fn address_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-z0-9._%+-]+@[a-z0-9-]+(\.[a-z0-9-]+)*\.[a-z]{2,24}$")
            .expect("address pattern is valid")
    })
}

/// Normalizes a raw address: trims wrapping punctuation, drops a `mailto:`
/// prefix and any query string, and lower-cases it
pub fn normalize_email(raw: &str) -> String {
    let mut value = trim_wrapping(raw);
    if let Some(rest) = strip_mailto(value) {
        value = rest;
    }
    if let Some(idx) = value.find('?') {
        value = &value[..idx];
    }
    trim_wrapping(value).to_lowercase()
}

/// Returns what follows a case-insensitive `mailto:` prefix
pub(crate) fn strip_mailto(value: &str) -> Option<&str> {
    let prefix = value.get(..7)?;
    if prefix.eq_ignore_ascii_case("mailto:") {
        value.get(7..)
    } else {
        None
    }
}

fn trim_wrapping(value: &str) -> &str {
    value.trim_matches(|c: char| c.is_whitespace() || "<>()[]{}\"'.,;:".contains(c))
}

/// Classifies a scraped address found on `source_url`
///
/// # Examples
///
/// ```
/// use contact_enricher::extract::{classify_public_email, EmailStatus, EmailStrategy};
/// use url::Url;
///
/// let source = Url::parse("https://school.example.com.au/").unwrap();
/// let verdict = classify_public_email("Info@Example.com.au", &source, EmailStrategy::Text);
/// assert_eq!(verdict.normalized, "info@example.com.au");
/// assert_eq!(verdict.status, EmailStatus::Valid);
/// ```
pub fn classify_public_email(
    address: &str,
    source_url: &Url,
    strategy: EmailStrategy,
) -> EmailClassification {
    let normalized = normalize_email(address);

    let verdict = if !is_well_formed(&normalized) {
        EmailClassification::rejected(normalized, ClassificationReason::Malformed)
    } else if is_placeholder(&normalized) {
        EmailClassification::rejected(normalized, ClassificationReason::Placeholder)
    } else if is_unrelated_vendor(&normalized, source_url) {
        EmailClassification::rejected(normalized, ClassificationReason::UnrelatedDomain)
    } else {
        EmailClassification {
            normalized,
            status: EmailStatus::Valid,
            reason: ClassificationReason::Accepted,
        }
    };

    tracing::trace!(
        "Classified {} ({:?}) from {}: {:?}",
        verdict.normalized,
        strategy,
        source_url,
        verdict.reason
    );
    verdict
}

fn split_address(address: &str) -> Option<(&str, &str)> {
    let mut parts = address.split('@');
    let local = parts.next()?;
    let domain = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((local, domain))
}

fn is_well_formed(address: &str) -> bool {
    if address.len() > MAX_ADDRESS_LEN || address.contains("..") {
        return false;
    }
    if !address_regex().is_match(address) {
        return false;
    }
    let Some((local, domain)) = split_address(address) else {
        return false;
    };
    if local.starts_with('.') || local.ends_with('.') {
        return false;
    }
    domain
        .split('.')
        .all(|label| !label.is_empty() && !label.starts_with('-') && !label.ends_with('-'))
}

fn is_placeholder(address: &str) -> bool {
    let Some((local, domain)) = split_address(address) else {
        return true;
    };
    if PLACEHOLDER_LOCALS.contains(&local) || PLACEHOLDER_DOMAINS.contains(&domain) {
        return true;
    }
    domain
        .rsplit('.')
        .next()
        .map(|tld| ASSET_SUFFIXES.contains(&tld))
        .unwrap_or(false)
}

fn is_unrelated_vendor(address: &str, source_url: &Url) -> bool {
    let Some((_, domain)) = split_address(address) else {
        return false;
    };
    let source_host = source_url
        .host_str()
        .map(|h| h.to_ascii_lowercase())
        .unwrap_or_default();

    VENDOR_DOMAINS.iter().any(|vendor| {
        is_same_or_subdomain(vendor, domain) && !is_same_or_subdomain(vendor, &source_host)
    })
}
