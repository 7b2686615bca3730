//! Integration tests for per-record enrichment
//!
//! These tests use wiremock to serve small organization sites and check how
//! the enricher walks homepage, contact pages and portal pages.

mod common;

use common::{mount_page, test_enricher, test_http_config};
use contact_enricher::config::PortalRule;
use contact_enricher::{CrawlOutcome, ShutdownSignal};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_homepage_has_everything() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="mailto:office@hilltop.wa.edu.au">Email us</a>
           <a href="/contact-us">Contact</a>"#,
        1,
    )
    .await;
    mount_page(&server, "/contact-us", "form", 0).await;

    let mut enricher = test_enricher(&test_http_config(), &[]);
    let result = enricher
        .enrich(&format!("{}/", server.uri()), &ShutdownSignal::new())
        .await;

    assert_eq!(result.outcome, CrawlOutcome::Success);
    assert_eq!(result.email.as_deref(), Some("office@hilltop.wa.edu.au"));
    assert_eq!(
        result.contact_form_url,
        Some(format!("{}/contact-us", server.uri()))
    );
}

#[tokio::test]
async fn test_email_found_on_contact_page() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/get-in-touch">Contact us</a>"#, 1).await;
    mount_page(
        &server,
        "/get-in-touch",
        "<p>Write to enquiries@bayside.edu.au or call the office.</p>",
        1,
    )
    .await;
    mount_page(&server, "/contact", "unused", 0).await;

    let mut enricher = test_enricher(&test_http_config(), &[]);
    let result = enricher
        .enrich(&format!("{}/", server.uri()), &ShutdownSignal::new())
        .await;

    assert_eq!(result.outcome, CrawlOutcome::Success);
    assert_eq!(result.email.as_deref(), Some("enquiries@bayside.edu.au"));
    assert_eq!(
        result.contact_form_url,
        Some(format!("{}/get-in-touch", server.uri()))
    );
}

#[tokio::test]
async fn test_failed_candidates_are_skipped() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "<p>Welcome to Outback School</p>", 1).await;
    Mock::given(method("GET"))
        .and(path("/contact"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/contactus",
        "<p>Office: admin@outback.nt.edu.au</p>",
        1,
    )
    .await;

    let mut http = test_http_config();
    http.max_retries = 0;
    let mut enricher = test_enricher(&http, &[]);
    let result = enricher
        .enrich(&format!("{}/", server.uri()), &ShutdownSignal::new())
        .await;

    assert_eq!(result.outcome, CrawlOutcome::Success);
    assert_eq!(result.email.as_deref(), Some("admin@outback.nt.edu.au"));
    assert_eq!(result.contact_form_url, None);
}

#[tokio::test]
async fn test_homepage_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(410))
        .expect(1)
        .mount(&server)
        .await;

    let mut enricher = test_enricher(&test_http_config(), &[]);
    let result = enricher
        .enrich(&format!("{}/", server.uri()), &ShutdownSignal::new())
        .await;

    assert_eq!(result.outcome, CrawlOutcome::HttpError(410));
    assert!(result.email.is_none());
}

#[tokio::test]
async fn test_robots_block_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: TestBot\nDisallow: /"))
        .mount(&server)
        .await;
    mount_page(&server, "/", "home", 0).await;

    let mut enricher = test_enricher(&test_http_config(), &[]);
    let result = enricher
        .enrich(&format!("{}/", server.uri()), &ShutdownSignal::new())
        .await;

    assert_eq!(result.outcome, CrawlOutcome::Blocked);
}

#[tokio::test]
async fn test_unreachable_site_is_an_exception() {
    let mut http = test_http_config();
    http.max_retries = 0;
    let mut enricher = test_enricher(&http, &[]);

    let result = enricher
        .enrich("http://127.0.0.1:1/", &ShutdownSignal::new())
        .await;

    assert!(matches!(result.outcome, CrawlOutcome::Exception(_)));
}

#[tokio::test]
async fn test_shutdown_before_start_sends_nothing() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "home", 0).await;

    let shutdown = ShutdownSignal::new();
    shutdown.trigger();

    let mut enricher = test_enricher(&test_http_config(), &[]);
    let result = enricher
        .enrich(&format!("{}/", server.uri()), &shutdown)
        .await;

    assert_eq!(result.outcome, CrawlOutcome::Interrupted);
}

#[tokio::test]
async fn test_portal_page_is_unwrapped() {
    let server = MockServer::start().await;
    let uri = server.uri();

    mount_page(
        &server,
        "/directory/overview.do",
        &format!(
            r##"<a href="#" onclick="openNewPage('{}/school/', 'site')">School website</a>"##,
            uri
        ),
        1,
    )
    .await;
    mount_page(
        &server,
        "/school/",
        "<p>General enquiries: office@ridge.wa.edu.au</p>",
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/directory/contact.do"))
        .and(query_param("schoolID", "4127"))
        .respond_with(common::html(
            r#"<a href="/directory/enquiry.do?schoolID=4127">Contact the school</a>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let portal = PortalRule {
        name: "test-directory".to_string(),
        host_contains: "127.0.0.1".to_string(),
        path_contains: "/directory".to_string(),
        homepage_pattern: r"openNewPage\('(?P<url>https?://[^']+)'".to_string(),
        id_params: vec!["schoolID".to_string()],
        contact_path: Some("/directory/contact.do?schoolID={id}".to_string()),
    };

    let mut enricher = test_enricher(&test_http_config(), &[portal]);
    let result = enricher
        .enrich(
            &format!("{}/directory/overview.do?schoolID=4127", uri),
            &ShutdownSignal::new(),
        )
        .await;

    assert_eq!(result.outcome, CrawlOutcome::Success);
    assert_eq!(result.email.as_deref(), Some("office@ridge.wa.edu.au"));
    assert_eq!(
        result.contact_form_url,
        Some(format!("{}/directory/enquiry.do?schoolID=4127", uri))
    );
}
