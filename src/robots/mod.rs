//! Robots.txt handling module
//!
//! Parsing and per-origin caching of robots.txt. Fetching goes through the
//! compliant fetcher so robots requests share its delay gate and activity log.

mod cache;
mod parser;

pub use cache::{CachedRobots, RobotsCache};
pub use parser::{robots_token, ParsedRobots};

/// Interprets a robots.txt response
///
/// A 2xx body is parsed. 401 and 403 mean the site refuses crawlers
/// outright; any other status means no policy was published.
pub fn robots_from_response(status_code: u16, body: &str) -> ParsedRobots {
    match status_code {
        200..=299 => ParsedRobots::from_content(body),
        401 | 403 => ParsedRobots::from_content("User-agent: *\nDisallow: /"),
        _ => ParsedRobots::allow_all(),
    }
}
