//! URL handling module
//!
//! Normalization of website values read from record stores, href resolution
//! for discovered links, and the host/origin helpers used by robots.txt
//! caching and email ownership checks.

mod domain;
mod normalize;

pub use domain::{extract_domain, is_same_or_subdomain, origin_key, robots_url};
pub use normalize::{dedup_key, ensure_http, has_inert_scheme, parse_http_url, resolve_href};
