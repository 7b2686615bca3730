use url::Url;

/// Normalizes a raw website value from a record store into an absolute URL
///
/// # Normalization Steps
///
/// 1. Trim whitespace; empty values and the literal `nan` (a common artefact of
///    spreadsheet exports) are treated as missing
/// 2. Scheme-relative values (`//host/path`) get an `https:` prefix
/// 3. Values already starting with `http://` or `https://` are kept as-is
/// 4. Anything else is treated as a bare host and gets an `https://` prefix
///
/// # Examples
///
/// ```
/// use contact_enricher::url::ensure_http;
///
/// assert_eq!(ensure_http("www.school.edu.au"), Some("https://www.school.edu.au".to_string()));
/// assert_eq!(ensure_http("//school.edu.au/"), Some("https://school.edu.au/".to_string()));
/// assert_eq!(ensure_http("  NaN "), None);
/// ```
pub fn ensure_http(raw: &str) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        return None;
    }

    if value.starts_with("//") {
        return Some(format!("https:{}", value));
    }

    let lower = value.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Some(value.to_string());
    }

    Some(format!("https://{}", value))
}

/// Parses a string into a URL, accepting only `http` and `https` schemes
pub fn parse_http_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw.trim()).ok()?;
    if is_http(&url) && url.host_str().is_some() {
        Some(url)
    } else {
        None
    }
}

/// Resolves an href against a base URL, rejecting non-http(s) results
///
/// The fragment is dropped since it never changes what a GET returns.
pub fn resolve_href(base_url: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || has_inert_scheme(href) {
        return None;
    }

    let mut resolved = base_url.join(href).ok()?;
    if !is_http(&resolved) {
        return None;
    }
    resolved.set_fragment(None);
    Some(resolved)
}

/// Key used to treat two candidate URLs as the same page
///
/// Case-insensitive, ignoring a trailing slash and any fragment.
pub fn dedup_key(url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);
    url.as_str().to_lowercase().trim_end_matches('/').to_string()
}

/// Returns true for hrefs that never point at a fetchable page
pub fn has_inert_scheme(href: &str) -> bool {
    let lower = href.trim_start().to_ascii_lowercase();
    lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("javascript:")
        || lower.starts_with("data:")
}

fn is_http(url: &Url) -> bool {
    url.scheme() == "http" || url.scheme() == "https"
}
