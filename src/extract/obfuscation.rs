//! Cloudflare email-protection decoding
//!
//! Protected addresses are hex strings: the first byte is an XOR key and each
//! following byte is one character of the address XORed with that key.

use scraper::{Html, Selector};

const PROTECTION_PATH: &str = "/cdn-cgi/l/email-protection";

/// Decodes a single Cloudflare-protected hex string
///
/// Returns None if the string is not valid hex, is empty, does not decode to
/// UTF-8, or does not look like an address.
pub fn decode_cfemail(encoded: &str) -> Option<String> {
    let bytes = hex::decode(encoded.trim()).ok()?;
    let (&key, rest) = bytes.split_first()?;
    let decoded: Vec<u8> = rest.iter().map(|b| b ^ key).collect();
    let address = String::from_utf8(decoded).ok()?;
    if address.contains('@') {
        Some(address)
    } else {
        None
    }
}

/// Returns every decodable protected address on the page
///
/// Sources are `data-cfemail` attributes and the `#hex` fragment of links to
/// the protection endpoint.
pub fn extract_obfuscated(doc: &Html) -> Vec<String> {
    let mut encoded = Vec::new();

    if let Ok(selector) = Selector::parse("[data-cfemail]") {
        for element in doc.select(&selector) {
            if let Some(value) = element.value().attr("data-cfemail") {
                encoded.push(value.to_string());
            }
        }
    }

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in doc.select(&selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            if !href.contains(PROTECTION_PATH) {
                continue;
            }
            if let Some((_, fragment)) = href.split_once('#') {
                encoded.push(fragment.to_string());
            }
        }
    }

    encoded
        .iter()
        .filter_map(|value| decode_cfemail(value))
        .collect()
}
