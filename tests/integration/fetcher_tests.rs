//! Integration tests for the compliant fetcher
//!
//! These tests use wiremock to check robots.txt handling, retries, the
//! request delay and redirect resolution against a real HTTP server.

mod common;

use common::{html, mount_page, test_fetcher, test_http_config};
use contact_enricher::config::LoggingConfig;
use contact_enricher::crawler::Fetcher;
use contact_enricher::{CrawlLogger, FetchError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_robots(server: &MockServer, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_robots_disallow_sends_nothing() {
    let server = MockServer::start().await;
    mount_robots(&server, 200, "User-agent: *\nDisallow: /private").await;
    mount_page(&server, "/private/staff", "secret", 0).await;
    mount_page(&server, "/public", "hello", 1).await;

    let mut fetcher = test_fetcher(&test_http_config());

    let blocked = fetcher
        .fetch(&format!("{}/private/staff", server.uri()))
        .await;
    assert!(matches!(blocked, Err(FetchError::RobotsDisallowed { .. })));

    let allowed = fetcher
        .fetch(&format!("{}/public", server.uri()))
        .await
        .expect("public page should be fetched");
    assert_eq!(allowed.status_code, 200);
    assert_eq!(fetcher.robots_cached(), 1);
}

#[tokio::test]
async fn test_forbidden_robots_blocks_everything() {
    let server = MockServer::start().await;
    mount_robots(&server, 403, "").await;
    mount_page(&server, "/", "home", 0).await;

    let mut fetcher = test_fetcher(&test_http_config());
    let result = fetcher.fetch(&format!("{}/", server.uri())).await;
    assert!(matches!(result, Err(FetchError::RobotsDisallowed { .. })));
}

#[tokio::test]
async fn test_missing_robots_allows_all() {
    let server = MockServer::start().await;
    mount_robots(&server, 404, "").await;
    mount_page(&server, "/", "home", 1).await;

    let mut fetcher = test_fetcher(&test_http_config());
    let response = fetcher
        .fetch(&format!("{}/", server.uri()))
        .await
        .expect("homepage should be fetched");
    assert!(response.body.contains("home"));
}

#[tokio::test]
async fn test_503_is_retried_with_backoff() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let http = test_http_config();
    let mut fetcher = test_fetcher(&http);

    let started = Instant::now();
    let result = fetcher.fetch(&format!("{}/flaky", server.uri())).await;
    let elapsed = started.elapsed();

    match result {
        Err(FetchError::FetchFailed { attempts, .. }) => {
            assert_eq!(attempts, http.max_retries + 1)
        }
        other => panic!("expected FetchFailed, got {:?}", other),
    }
    // 0.05s before the first retry, 0.1s before the second
    assert!(elapsed >= Duration::from_millis(150), "elapsed {:?}", elapsed);
}

#[tokio::test]
async fn test_404_is_a_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .expect(1)
        .mount(&server)
        .await;

    let mut fetcher = test_fetcher(&test_http_config());
    let response = fetcher
        .fetch(&format!("{}/gone", server.uri()))
        .await
        .expect("4xx is not an error");

    assert_eq!(response.status_code, 404);
    assert!(response.is_error_status());
}

#[tokio::test]
async fn test_redirect_reports_resolved_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old-home"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/home"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/home"))
        .respond_with(html("welcome"))
        .mount(&server)
        .await;

    let mut fetcher = test_fetcher(&test_http_config());
    let requested = format!("{}/old-home", server.uri());
    let response = fetcher.fetch(&requested).await.expect("redirect followed");

    assert_eq!(response.requested_url.as_str(), requested);
    assert_eq!(response.resolved_url.path(), "/home");
    assert!(response.body.contains("welcome"));
}

#[tokio::test]
async fn test_request_delay_applies_to_every_request() {
    let server = MockServer::start().await;
    mount_page(&server, "/a", "a", 1).await;
    mount_page(&server, "/b", "b", 1).await;

    let mut http = test_http_config();
    http.request_delay_seconds = 0.2;
    let mut fetcher = test_fetcher(&http);

    let started = Instant::now();
    fetcher.fetch(&format!("{}/a", server.uri())).await.unwrap();
    fetcher.fetch(&format!("{}/b", server.uri())).await.unwrap();

    // robots.txt, /a and /b: two gaps of at least 200ms
    assert!(started.elapsed() >= Duration::from_millis(400));
}

#[tokio::test]
async fn test_unreachable_host_fails_after_retries() {
    let mut http = test_http_config();
    http.max_retries = 1;
    let mut fetcher = test_fetcher(&http);

    let result = fetcher.fetch("http://127.0.0.1:1/").await;
    match result {
        Err(FetchError::FetchFailed { attempts, .. }) => assert_eq!(attempts, 2),
        other => panic!("expected FetchFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_activity_log_has_one_line_per_request() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "home", 1).await;

    let dir = TempDir::new().unwrap();
    let log_path = dir.path().join("logs").join("activity.log");
    let logger = CrawlLogger::open(&LoggingConfig {
        activity_log: Some(log_path.display().to_string()),
        error_log: None,
    })
    .unwrap();

    let mut fetcher = Fetcher::new(&test_http_config(), Arc::new(logger)).unwrap();
    fetcher.fetch(&format!("{}/", server.uri())).await.unwrap();

    let contents = std::fs::read_to_string(&log_path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("/robots.txt | 404"));
    assert!(lines[1].contains("| 200 |"));
}

/// TLS record carrying a fatal `handshake_failure` alert
const HANDSHAKE_FAILURE_ALERT: [u8; 7] = [0x15, 0x03, 0x03, 0x00, 0x02, 0x02, 0x28];

/// Starts a server that answers every TLS ClientHello with a fatal alert
async fn start_tls_rejecting_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut hello = [0u8; 2048];
                let _ = socket.read(&mut hello).await;
                let _ = socket.write_all(&HANDSHAKE_FAILURE_ALERT).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    format!("https://{}", addr)
}

/// Writes an executable shell script standing in for curl
#[cfg(unix)]
fn write_fetch_script(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("fake-curl");
    std::fs::write(&script, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    script
}

#[cfg(unix)]
#[tokio::test]
async fn test_tls_failure_uses_fallback_command() {
    let base = start_tls_rejecting_server().await;
    let dir = TempDir::new().unwrap();
    let script = write_fetch_script(
        dir.path(),
        r#"for last; do :; done
printf '<a href="mailto:office@oldcert.edu.au">Email</a>\n__contact_enricher__ 200 %s' "$last""#,
    );

    let mut http = test_http_config();
    http.tls_fallback_command = script.display().to_string();
    let mut fetcher = test_fetcher(&http);

    let requested = format!("{}/", base);
    let response = fetcher
        .fetch(&requested)
        .await
        .expect("fallback should recover the page");

    assert_eq!(response.status_code, 200);
    assert_eq!(response.resolved_url.as_str(), requested);
    assert!(response.body.contains("office@oldcert.edu.au"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_failed_fallback_reports_tls_error() {
    let base = start_tls_rejecting_server().await;
    let dir = TempDir::new().unwrap();
    let script = write_fetch_script(dir.path(), "echo 'certificate problem' >&2\nexit 60");

    let mut http = test_http_config();
    http.tls_fallback_command = script.display().to_string();
    let mut fetcher = test_fetcher(&http);

    match fetcher.fetch(&format!("{}/", base)).await {
        Err(FetchError::Tls { message, .. }) => assert!(message.contains("exit")),
        other => panic!("expected Tls, got {:?}", other),
    }
}

#[tokio::test]
async fn test_tls_failure_without_fallback_is_not_retried() {
    let base = start_tls_rejecting_server().await;
    let mut fetcher = test_fetcher(&test_http_config());

    let result = fetcher.fetch(&format!("{}/", base)).await;
    assert!(matches!(result, Err(FetchError::Tls { .. })));
}
