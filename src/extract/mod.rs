//! Page extraction module
//!
//! Pure functions that turn a fetched HTML page into contact findings:
//! email candidates per strategy, the public-email classifier, the
//! contact-form heuristic and contact-page discovery.
//!
//! Parsing never fails; malformed markup just yields fewer findings.

mod classify;
mod discover;
mod email;
mod form;
mod obfuscation;

pub use classify::{
    classify_public_email, normalize_email, ClassificationReason, EmailClassification,
    EmailStatus,
};
pub use discover::{candidate_contact_urls, FALLBACK_PATHS, MAX_CONTACT_CANDIDATES};
pub use email::{
    choose_best_email, choose_general_email, collect_candidates, extract_mailto, extract_text,
    EmailCandidate, EmailStrategy,
};
pub use form::extract_contact_form;
pub use obfuscation::{decode_cfemail, extract_obfuscated};

use scraper::{Html, Node};
use url::Url;

/// Elements whose text never renders
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Everything the enricher needs from one page
///
/// Produced synchronously so the parsed document never lives across an await.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageFindings {
    pub email: Option<String>,
    pub contact_form_url: Option<Url>,
    pub contact_candidates: Vec<Url>,
}

/// Parses a page and extracts its findings
pub fn analyze_page(html: &str, page_url: &Url) -> PageFindings {
    let doc = Html::parse_document(html);
    PageFindings {
        email: choose_best_email(&doc, page_url),
        contact_form_url: extract_contact_form(&doc, page_url),
        contact_candidates: candidate_contact_urls(&doc, page_url),
    }
}

/// Concatenates the document's rendered text nodes
pub fn visible_text(doc: &Html) -> String {
    let mut text = String::new();
    for node in doc.tree.nodes() {
        let Node::Text(fragment) = node.value() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element())
            .map(|element| HIDDEN_ELEMENTS.contains(&element.name()))
            .unwrap_or(false);
        if !hidden {
            text.push_str(fragment);
            text.push(' ');
        }
    }
    text
}
