use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use contact_enricher::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Key identifying a robots.txt scope: scheme, host and port
pub fn origin_key(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// URL of the robots.txt governing the given page
pub fn robots_url(url: &Url) -> Option<Url> {
    url.join("/robots.txt").ok()
}

/// Checks whether `candidate` is `domain` itself or one of its subdomains
///
/// ```
/// use contact_enricher::url::is_same_or_subdomain;
///
/// assert!(is_same_or_subdomain("wixpress.com", "wixpress.com"));
/// assert!(is_same_or_subdomain("wixpress.com", "sentry.wixpress.com"));
/// assert!(!is_same_or_subdomain("wixpress.com", "notwixpress.com"));
/// ```
pub fn is_same_or_subdomain(domain: &str, candidate: &str) -> bool {
    candidate == domain || candidate.ends_with(&format!(".{}", domain))
}
