//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end, including resuming from the record store.

use std::path::Path;
use std::time::{Duration, Instant};
use sumi_scribe::config::{parse_config, Config};
use sumi_scribe::crawler::{crawl, Coordinator, StopReason};
use sumi_scribe::output::load_records;
use sumi_scribe::storage::{JsonRecordStore, Record, RecordStore};
use sumi_scribe::url::LocationId;
use sumi_scribe::CrawlPhase;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing records into `dir`
fn create_test_config(dir: &TempDir, store_format: &str, interval_ms: u64, history: bool) -> Config {
    let records = dir.path().join(match store_format {
        "sqlite" => "records.db",
        _ => "records.json",
    });

    parse_config(&format!(
        r#"
[crawler]
min-request-interval = {interval_ms}
fetch-timeout = 5
follow-revision-history = {history}

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[output]
records-path = "{records}"
store-format = "{store_format}"
summary-path = "{summary}"
"#,
        records = records.display(),
        summary = dir.path().join("summary.md").display(),
    ))
    .expect("test config should be valid")
}

fn article(title: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|l| format!(r#"<a href="{}">{}</a>"#, l, l))
        .collect();

    format!(
        r#"<html><head><title>{title} - TestWiki</title></head><body>
        <h1 id="firstHeading">{title}</h1>
        <div id="bodyContent"><p>About {title}.</p>{anchors}</div>
        </body></html>"#
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_raw(body, "text/html; charset=utf-8")
}

async fn mount_page(server: &MockServer, page: &str, body: String, times: u64) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html(body))
        .expect(times)
        .mount(server)
        .await;
}

async fn forbid_other_requests(server: &MockServer) {
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(server)
        .await;
}

fn location(server: &MockServer, page: &str) -> LocationId {
    LocationId::parse(&format!("{}{}", server.uri(), page)).unwrap()
}

async fn run(config: &Config, seeds: Vec<String>) -> sumi_scribe::CrawlReport {
    Coordinator::from_config(config, seeds)
        .expect("coordinator should build")
        .run()
        .await
        .expect("crawl should succeed")
}

fn stored_locations(config: &Config) -> Vec<String> {
    let mut locations: Vec<String> = load_records(&config.output)
        .unwrap()
        .into_iter()
        .map(|r| r.location.to_string())
        .collect();
    locations.sort();
    locations
}

#[tokio::test]
async fn test_crawl_follows_links_and_visits_each_page_once() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, "json", 0, false);

    mount_page(
        &server,
        "/wiki/A",
        article("A", &["/wiki/B", "/wiki/C", "/wiki/Help:Contents", "/about"]),
        1,
    )
    .await;
    mount_page(&server, "/wiki/B", article("B", &["/wiki/C", "/wiki/A"]), 1).await;
    mount_page(&server, "/wiki/C", article("C", &["/wiki/A#History"]), 1).await;
    forbid_other_requests(&server).await;

    let report = run(&config, vec![format!("{}/wiki/A", server.uri())]).await;

    assert_eq!(report.records_stored, 3);
    assert_eq!(report.stop_reason, Some(StopReason::FrontierExhausted));
    assert_eq!(
        stored_locations(&config),
        vec![
            location(&server, "/wiki/A").to_string(),
            location(&server, "/wiki/B").to_string(),
            location(&server, "/wiki/C").to_string(),
        ]
    );

    let records = load_records(&config.output).unwrap();
    let a = records
        .iter()
        .find(|r| r.title == "A")
        .expect("record for A");
    assert!(a.body.starts_with("About A."));
    assert_eq!(a.outgoing.len(), 4);
}

#[tokio::test]
async fn test_failed_fetch_is_abandoned() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, "json", 0, false);

    Mock::given(method("GET"))
        .and(path("/wiki/Missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let report = run(&config, vec![format!("{}/wiki/Missing", server.uri())]).await;

    assert_eq!(report.fetch_failures, 1);
    assert_eq!(report.stop_reason, Some(StopReason::FrontierExhausted));
    assert!(load_records(&config.output).unwrap().is_empty());
}

#[tokio::test]
async fn test_non_html_response_is_abandoned() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, "json", 0, false);

    mount_page(&server, "/wiki/A", article("A", &["/wiki/Data"]), 1).await;
    Mock::given(method("GET"))
        .and(path("/wiki/Data"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("{}")
                .insert_header("content-type", "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let report = run(&config, vec![format!("{}/wiki/A", server.uri())]).await;

    assert_eq!(report.records_stored, 1);
    assert_eq!(report.fetch_failures, 1);
}

#[tokio::test]
async fn test_restart_after_completion_is_idempotent() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, "json", 0, false);
    let seeds = vec![format!("{}/wiki/A", server.uri())];

    mount_page(&server, "/wiki/A", article("A", &["/wiki/B"]), 1).await;
    mount_page(&server, "/wiki/B", article("B", &["/wiki/A"]), 1).await;

    run(&config, seeds.clone()).await;
    server.verify().await;
    server.reset().await;
    forbid_other_requests(&server).await;

    let report = run(&config, seeds).await;

    assert_eq!(report.resumed_records, 2);
    assert_eq!(report.records_stored, 0);
    assert_eq!(stored_locations(&config).len(), 2);
}

#[tokio::test]
async fn test_resume_continues_from_stored_links() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, "json", 0, false);

    // A previous run stored A and was interrupted before B and C
    let mut store = JsonRecordStore::new(Path::new(&config.output.records_path));
    store
        .append_and_flush(Record {
            location: location(&server, "/wiki/A"),
            title: "A".to_string(),
            body: "About A.".to_string(),
            outgoing: [location(&server, "/wiki/B"), location(&server, "/wiki/C")]
                .into_iter()
                .collect(),
            provenance_timestamp: None,
        })
        .unwrap();

    mount_page(&server, "/wiki/B", article("B", &["/wiki/A"]), 1).await;
    mount_page(&server, "/wiki/C", article("C", &[]), 1).await;
    forbid_other_requests(&server).await;

    let report = run(&config, vec![format!("{}/wiki/A", server.uri())]).await;

    assert_eq!(report.resumed_records, 1);
    assert_eq!(report.records_stored, 2);
    assert_eq!(stored_locations(&config).len(), 3);
}

#[tokio::test]
async fn test_fresh_crawl_moves_previous_store_aside() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, "json", 0, false);

    let mut store = JsonRecordStore::new(Path::new(&config.output.records_path));
    store
        .append_and_flush(Record {
            location: location(&server, "/wiki/A"),
            title: "Old A".to_string(),
            body: String::new(),
            outgoing: Default::default(),
            provenance_timestamp: None,
        })
        .unwrap();

    let mut config = config;
    config.seeds.urls = vec![format!("{}/wiki/A", server.uri())];
    mount_page(&server, "/wiki/A", article("A", &[]), 1).await;

    let report = crawl(config.clone(), true).await.unwrap();

    assert_eq!(report.records_stored, 1);
    assert_eq!(load_records(&config.output).unwrap()[0].title, "A");
    assert!(dir.path().join("records.json.bak").exists());
}

#[tokio::test]
async fn test_sqlite_store_backend() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, "sqlite", 0, false);
    let seeds = vec![format!("{}/wiki/A", server.uri())];

    mount_page(&server, "/wiki/A", article("A", &["/wiki/B"]), 1).await;
    mount_page(&server, "/wiki/B", article("B", &[]), 1).await;

    let report = run(&config, seeds.clone()).await;
    assert_eq!(report.records_stored, 2);

    let report = run(&config, seeds).await;
    assert_eq!(report.resumed_records, 2);
    assert_eq!(report.records_stored, 0);
    assert_eq!(stored_locations(&config).len(), 2);
}

#[tokio::test]
async fn test_requests_are_spaced_by_minimum_interval() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, "json", 200, false);

    mount_page(&server, "/wiki/A", article("A", &["/wiki/B", "/wiki/C"]), 1).await;
    mount_page(&server, "/wiki/B", article("B", &[]), 1).await;
    mount_page(&server, "/wiki/C", article("C", &[]), 1).await;

    let started = Instant::now();
    let report = run(&config, vec![format!("{}/wiki/A", server.uri())]).await;

    assert_eq!(report.records_stored, 3);
    assert!(started.elapsed() >= Duration::from_millis(400));
}

#[tokio::test]
async fn test_provenance_from_revision_history() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, "json", 0, true);

    mount_page(
        &server,
        "/wiki/A",
        r#"<html><head><title>A</title></head><body>
        <h1 id="firstHeading">A</h1>
        <ul><li id="ca-history"><a href="/w/index.php?title=A&amp;action=history">View history</a></li></ul>
        <div id="bodyContent">Text</div></body></html>"#
            .to_string(),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/w/index.php"))
        .and(query_param("dir", "prev"))
        .and(query_param("limit", "1"))
        .respond_with(html(
            r#"<html><body><ul id="pagehistory">
            <li><a class="mw-changeslist-date" href="/w/index.php?oldid=1">08:15, 3 March 2004</a></li>
            </ul></body></html>"#
                .to_string(),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let report = run(&config, vec![format!("{}/wiki/A", server.uri())]).await;

    assert_eq!(report.provenance_from_history, 1);
    let records = load_records(&config.output).unwrap();
    assert_eq!(
        records[0].provenance_timestamp.as_deref(),
        Some("08:15, 3 March 2004")
    );
}

#[tokio::test]
async fn test_stop_before_run_fetches_nothing() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, "json", 0, false);
    forbid_other_requests(&server).await;

    let mut coordinator =
        Coordinator::from_config(&config, vec![format!("{}/wiki/A", server.uri())]).unwrap();
    coordinator.stop_handle().stop();

    let report = coordinator.run().await.unwrap();

    assert_eq!(report.stop_reason, Some(StopReason::StopRequested));
    assert_eq!(report.records_stored, 0);
    assert_eq!(coordinator.phase(), CrawlPhase::Stopped);
    assert_eq!(coordinator.frontier().len(), 1);
}

#[tokio::test]
async fn test_corrupt_store_aborts_before_fetching() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&dir, "json", 0, false);
    std::fs::write(&config.output.records_path, "[{\"location\":").unwrap();
    forbid_other_requests(&server).await;

    let mut coordinator =
        Coordinator::from_config(&config, vec![format!("{}/wiki/A", server.uri())]).unwrap();
    let err = coordinator.run().await.unwrap_err();

    assert!(err.is_store_failure());
    assert_eq!(coordinator.phase(), CrawlPhase::Idle);
}
