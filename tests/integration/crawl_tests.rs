//! Integration tests for the crawl loop
//!
//! These tests use wiremock for the websites and a temporary record store to
//! test the full load, enrich, checkpoint cycle end-to-end.

mod common;

use chrono::Local;
use common::{html, mount_page, test_enricher, test_http_config};
use contact_enricher::crawler::{Coordinator, CrawlOptions};
use contact_enricher::storage::{open_store, CsvRecordStore, RecordStore, SqliteRecordStore};
use contact_enricher::{ContactRecord, CrawlLogger, ShutdownSignal};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn options(max_sites: usize) -> CrawlOptions {
    CrawlOptions {
        max_sites,
        checkpoint_every: 1,
    }
}

fn seed_sqlite(dir: &TempDir, records: &[ContactRecord]) -> PathBuf {
    let path = dir.path().join("records.sqlite");
    let mut store = SqliteRecordStore::open(&path).expect("Failed to create store");
    store.save(records).expect("Failed to seed store");
    path
}

fn load(path: &Path) -> Vec<ContactRecord> {
    open_store(path)
        .expect("Failed to open store")
        .load()
        .expect("Failed to load store")
}

fn coordinator(path: &Path, options: CrawlOptions) -> Coordinator {
    let store = open_store(path).expect("Failed to open store");
    let enricher = test_enricher(&test_http_config(), &[]);
    Coordinator::new(store, enricher, options, Arc::new(CrawlLogger::disabled()))
        .expect("Failed to create coordinator")
}

fn site(server: &MockServer, page: &str) -> Option<String> {
    Some(format!("{}{}", server.uri(), page))
}

/// Serves a page and raises the shutdown flag, as Ctrl-C would mid-request
struct TriggerShutdown {
    signal: ShutdownSignal,
    body: String,
}

impl Respond for TriggerShutdown {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        self.signal.trigger();
        html(&self.body)
    }
}

#[tokio::test]
async fn test_crawl_fills_and_marks_records() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/hilltop/",
        r#"<a href="mailto:office@hilltop.wa.edu.au">Email</a><a href="/hilltop/contact">Contact</a>"#,
        1,
    )
    .await;
    mount_page(
        &server,
        "/bayside/",
        r#"<a href="mailto:web@bayside.edu.au">Email</a><a href="/bayside/enquire">Contact us</a>"#,
        1,
    )
    .await;
    mount_page(&server, "/done/", "already checked", 0).await;

    let mut hilltop = ContactRecord::new("Hilltop Primary", None);
    hilltop.website_url = site(&server, "/hilltop/");

    let mut bayside = ContactRecord::new("Bayside College", None);
    bayside.website_url = site(&server, "/bayside/");
    bayside.public_email = Some("principal@bayside.edu.au".to_string());

    let no_site = ContactRecord::new("Outback School", None);

    let mut done = ContactRecord::new("Done School", None);
    done.website_url = site(&server, "/done/");
    done.website_checked = true;

    let dir = TempDir::new().unwrap();
    let path = seed_sqlite(&dir, &[hilltop, bayside, no_site, done.clone()]);

    let mut crawl = coordinator(&path, options(0));
    let counters = crawl.run(&ShutdownSignal::new()).await.expect("Crawl failed");

    assert_eq!(counters.attempted, 2);
    assert_eq!(counters.succeeded, 2);
    assert_eq!(counters.emails_found, 1);
    assert_eq!(counters.forms_found, 2);
    assert!(!counters.interrupted);

    let records = load(&path);
    let today = Local::now().date_naive();

    assert_eq!(
        records[0].public_email.as_deref(),
        Some("office@hilltop.wa.edu.au")
    );
    assert!(records[0].website_checked);
    assert_eq!(records[0].last_verified_date, Some(today));

    // Existing email is never replaced
    assert_eq!(
        records[1].public_email.as_deref(),
        Some("principal@bayside.edu.au")
    );
    assert_eq!(
        records[1].contact_form_url,
        Some(format!("{}/bayside/enquire", server.uri()))
    );

    assert!(!records[2].website_checked);
    assert_eq!(records[3], done);
}

/// Serves a page after recording which stored records are already checked
struct SnapshotStore {
    path: PathBuf,
    checked: Arc<Mutex<Vec<bool>>>,
    body: String,
}

impl Respond for SnapshotStore {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let stored = load(&self.path);
        *self.checked.lock().unwrap() = stored.iter().map(|r| r.website_checked).collect();
        html(&self.body)
    }
}

/// Runs three records and snapshots the store while the third is fetched
async fn checked_while_fetching_third(checkpoint_every: usize) -> Vec<bool> {
    let server = MockServer::start().await;
    let body = r#"<a href="mailto:office@school.edu.au">Email</a><a href="/contact">Contact</a>"#;
    mount_page(&server, "/one/", body, 1).await;
    mount_page(&server, "/two/", body, 1).await;

    let records: Vec<ContactRecord> = ["/one/", "/two/", "/three/"]
        .iter()
        .map(|page| {
            let mut record = ContactRecord::new(page, None);
            record.website_url = site(&server, page);
            record
        })
        .collect();

    let dir = TempDir::new().unwrap();
    let store_path = seed_sqlite(&dir, &records);

    let checked = Arc::new(Mutex::new(Vec::new()));
    Mock::given(method("GET"))
        .and(path("/three/"))
        .respond_with(SnapshotStore {
            path: store_path.clone(),
            checked: Arc::clone(&checked),
            body: body.to_string(),
        })
        .expect(1)
        .mount(&server)
        .await;

    let crawl_options = CrawlOptions {
        max_sites: 0,
        checkpoint_every,
    };
    let counters = coordinator(&store_path, crawl_options)
        .run(&ShutdownSignal::new())
        .await
        .unwrap();
    assert_eq!(counters.attempted, 3);
    assert!(load(&store_path).iter().all(|r| r.website_checked));

    let snapshot = checked.lock().unwrap().clone();
    snapshot
}

#[tokio::test]
async fn test_checkpoint_persists_progress_mid_run() {
    let snapshot = checked_while_fetching_third(2).await;
    assert_eq!(snapshot, vec![true, true, false]);
}

#[tokio::test]
async fn test_zero_checkpoint_every_saves_only_on_exit() {
    let snapshot = checked_while_fetching_third(0).await;
    assert_eq!(snapshot, vec![false, false, false]);
}

#[tokio::test]
async fn test_second_run_is_a_no_op() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="mailto:office@ridge.wa.edu.au">Email</a><a href="/contact">Contact</a>"#,
        1,
    )
    .await;

    let mut record = ContactRecord::new("Ridge Primary", None);
    record.website_url = site(&server, "/");

    let dir = TempDir::new().unwrap();
    let path = seed_sqlite(&dir, &[record]);

    let first = coordinator(&path, options(0))
        .run(&ShutdownSignal::new())
        .await
        .unwrap();
    assert_eq!(first.attempted, 1);
    let after_first = load(&path);

    let second = coordinator(&path, options(0))
        .run(&ShutdownSignal::new())
        .await
        .unwrap();
    assert_eq!(second.attempted, 0);
    assert_eq!(load(&path), after_first);
}

#[tokio::test]
async fn test_failures_are_marked_checked() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let mut record = ContactRecord::new("Gone School", None);
    record.website_url = site(&server, "/");

    let dir = TempDir::new().unwrap();
    let path = seed_sqlite(&dir, &[record]);

    let counters = coordinator(&path, options(0))
        .run(&ShutdownSignal::new())
        .await
        .unwrap();

    assert_eq!(counters.failed, 1);
    let records = load(&path);
    assert!(records[0].website_checked);
    assert!(records[0].public_email.is_none());
}

#[tokio::test]
async fn test_max_sites_caps_attempts() {
    let server = MockServer::start().await;
    let body = r#"<a href="mailto:office@school.edu.au">Email</a><a href="/contact">Contact</a>"#;
    mount_page(&server, "/one/", body, 1).await;
    mount_page(&server, "/two/", body, 1).await;
    mount_page(&server, "/three/", body, 0).await;

    let records: Vec<ContactRecord> = ["/one/", "/two/", "/three/"]
        .iter()
        .map(|page| {
            let mut record = ContactRecord::new(page, None);
            record.website_url = site(&server, page);
            record
        })
        .collect();

    let dir = TempDir::new().unwrap();
    let path = seed_sqlite(&dir, &records);

    let counters = coordinator(&path, options(2))
        .run(&ShutdownSignal::new())
        .await
        .unwrap();

    assert_eq!(counters.attempted, 2);
    let saved = load(&path);
    assert!(saved[0].website_checked && saved[1].website_checked);
    assert!(!saved[2].website_checked);
}

#[tokio::test]
async fn test_interrupted_record_is_not_persisted() {
    let server = MockServer::start().await;
    let shutdown = ShutdownSignal::new();

    mount_page(
        &server,
        "/one/",
        r#"<a href="mailto:office@one.edu.au">Email</a><a href="/one/contact">Contact</a>"#,
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/two/"))
        .respond_with(TriggerShutdown {
            signal: shutdown.clone(),
            body: "<p>office@two.edu.au</p>".to_string(),
        })
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/three/", "never", 0).await;

    let records: Vec<ContactRecord> = ["/one/", "/two/", "/three/"]
        .iter()
        .map(|page| {
            let mut record = ContactRecord::new(page, None);
            record.website_url = site(&server, page);
            record
        })
        .collect();

    let dir = TempDir::new().unwrap();
    let path = seed_sqlite(&dir, &records);

    let counters = coordinator(&path, options(0)).run(&shutdown).await.unwrap();

    assert!(counters.interrupted);
    assert_eq!(counters.attempted, 1);

    let saved = load(&path);
    assert!(saved[0].website_checked);
    assert_eq!(saved[0].public_email.as_deref(), Some("office@one.edu.au"));
    assert!(!saved[1].website_checked);
    assert!(saved[1].public_email.is_none());
    assert!(!saved[2].website_checked);
}

#[tokio::test]
async fn test_csv_store_round_trip() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="mailto:office@coast.edu.au">Email</a><a href="/contact-us">Contact</a>"#,
        1,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("schools.csv");
    std::fs::write(
        &path,
        format!(
            "school_name,suburb,sector,website_url\nCoast High,Seaview,Government,{}/\n",
            server.uri()
        ),
    )
    .unwrap();

    let counters = coordinator(&path, options(0))
        .run(&ShutdownSignal::new())
        .await
        .unwrap();
    assert_eq!(counters.emails_found, 1);

    let saved = std::fs::read_to_string(&path).unwrap();
    assert!(saved.starts_with("school_name,suburb,sector,website_url,"));
    assert!(saved.contains("Government"));

    let records = CsvRecordStore::new(&path).load().unwrap();
    assert_eq!(records[0].name, "Coast High");
    assert_eq!(records[0].public_email.as_deref(), Some("office@coast.edu.au"));
    assert!(records[0].website_checked);
}
