use crate::url::{has_inert_scheme, resolve_href};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Returns the href of an anchor that looks like it leads to a contact page
pub(crate) fn contact_anchor_href(element: &ElementRef<'_>) -> Option<String> {
    let href = element.value().attr("href")?.trim();
    if href.is_empty() || has_inert_scheme(href) {
        return None;
    }

    let label = element.text().collect::<String>().to_lowercase();
    if href.to_lowercase().contains("contact") || label.contains("contact") {
        Some(href.to_string())
    } else {
        None
    }
}

/// Finds the contact-form URL: the first anchor whose href or label mentions
/// "contact", resolved against `base_url`
pub fn extract_contact_form(doc: &Html, base_url: &Url) -> Option<Url> {
    let selector = Selector::parse("a[href]").ok()?;
    doc.select(&selector)
        .filter_map(|element| contact_anchor_href(&element))
        .find_map(|href| resolve_href(base_url, &href))
}
