//! Integration tests for the scrape pipeline
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! fetch, parse and write cycle end-to-end.

use courtside::config::ScrapeConfig;
use courtside::pipeline::FetchError;
use courtside::{run_scrape, ConfigError, Coordinator, ScrapeError};
use std::path::Path;
use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MATCH_SHEET: &str = include_str!("../fixtures/match_sheet.html");
const NO_DATA: &str = include_str!("../fixtures/no_data.html");
const USER_AGENT: &str = "CourtsideTest/1.0";

/// Creates a test configuration pointing at the mock server
fn create_test_config(server: &MockServer, dir: &Path, start_id: u32, end_id: u32) -> ScrapeConfig {
    let mut config = ScrapeConfig::for_range(start_id, end_id);
    config.base_url = format!("{}/partido/estadisticas/id/", server.uri());
    config.output_file = dir.join("stats.csv").display().to_string();
    config.output_file_game = dir.join("games.csv").display().to_string();
    config.user_agent = USER_AGENT.to_string();
    config.max_retries = 2;
    config.retry_delay = 0.0;
    config.rate_limit = 0.0;
    config.request_timeout = 5.0;
    config.concurrency = 4;
    config
}

fn match_path(match_id: u32) -> String {
    format!("/partido/estadisticas/id/{}", match_id)
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

fn read_rows(path: &str) -> Vec<String> {
    std::fs::read_to_string(path)
        .expect("Failed to read output")
        .lines()
        .skip(1)
        .map(str::to_string)
        .collect()
}

fn row_ids(rows: &[String]) -> Vec<u32> {
    rows.iter()
        .map(|row| row.split(',').next().unwrap().parse().unwrap())
        .collect()
}

#[tokio::test]
async fn test_transient_errors_retried_until_success() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path(match_path(1)))
        .and(header("user-agent", USER_AGENT))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(match_path(1)))
        .and(header("user-agent", USER_AGENT))
        .respond_with(html(MATCH_SHEET))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, dir.path(), 1, 1);
    let report = run_scrape(config.clone()).await.expect("Scrape failed");

    assert_eq!(report.attempted, 1);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(report.records_written, 5);

    let rows = read_rows(&config.output_file);
    assert_eq!(rows.len(), 5);
    assert!(row_ids(&rows).iter().all(|id| *id == 1));

    let games = read_rows(&config.output_file_game);
    assert_eq!(games, vec!["1,Real Madrid,FC Barcelona,3,2,20,23".to_string()]);
}

#[tokio::test]
async fn test_not_found_recorded_as_permanent_failure() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    for match_id in [1, 3] {
        Mock::given(method("GET"))
            .and(path(match_path(match_id)))
            .respond_with(html(MATCH_SHEET))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    // Not retried despite max_retries = 2
    Mock::given(method("GET"))
        .and(path(match_path(2)))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, dir.path(), 1, 3);
    let report = run_scrape(config.clone()).await.expect("Scrape failed");

    assert_eq!(report.attempted, 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.failed_ids(), vec![2]);
    assert_eq!(
        report.failures[0].cause,
        FetchError::PermanentRequest { status: 404 }
    );
    assert_eq!(report.failures[0].attempts, 1);

    let ids = row_ids(&read_rows(&config.output_file));
    assert_eq!(ids, vec![1, 1, 1, 1, 1, 3, 3, 3, 3, 3]);
}

#[tokio::test]
async fn test_placeholder_page_counts_as_success_without_records() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path(match_path(5)))
        .respond_with(html(NO_DATA))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, dir.path(), 5, 5);
    let report = run_scrape(config.clone()).await.expect("Scrape failed");

    assert_eq!(report.attempted, 1);
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(report.empty_matches, vec![5]);
    assert_eq!(report.records_written, 0);
    assert_eq!(report.games_written, 0);

    // Header only
    assert!(read_rows(&config.output_file).is_empty());
}

#[tokio::test]
async fn test_inverted_range_rejected_before_any_request() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .respond_with(html(MATCH_SHEET))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, dir.path(), 10, 9);
    let result = run_scrape(config.clone()).await;

    assert!(matches!(
        result,
        Err(ScrapeError::Config(ConfigError::Validation(_)))
    ));
    assert!(!Path::new(&config.output_file).exists());
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_retry_bound_with_persistent_server_error() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path(match_path(8)))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server, dir.path(), 8, 8);
    config.max_retries = 3;

    let coordinator = Coordinator::new(config).expect("Failed to create coordinator");
    let limiter = coordinator.fetcher().limiter().clone();
    let report = coordinator.run().await.expect("Scrape failed");

    assert_eq!(report.failed, 1);
    assert_eq!(report.failures[0].attempts, 4);
    assert_eq!(
        report.failures[0].cause,
        FetchError::ServerError { status: 503 }
    );
    assert!(report.failures[0].cause.is_transient());
    assert_eq!(limiter.grants(), 4);
    assert!(report.all_failed());
}

#[tokio::test]
async fn test_sequential_pool_accounts_for_every_match() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    for match_id in 1..=6u32 {
        let response = match match_id {
            5 => html(NO_DATA),
            id if id % 2 == 0 => html(MATCH_SHEET),
            _ => ResponseTemplate::new(404),
        };
        Mock::given(method("GET"))
            .and(path(match_path(match_id)))
            .respond_with(response)
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let mut config = create_test_config(&mock_server, dir.path(), 1, 6);
    config.concurrency = 1;

    let report = run_scrape(config.clone()).await.expect("Scrape failed");

    assert_eq!(report.attempted, 6);
    assert_eq!(report.succeeded + report.failed, 6);
    assert_eq!(report.succeeded, 4);
    assert_eq!(report.failed_ids(), vec![1, 3]);
    assert_eq!(report.empty_matches, vec![5]);
    assert_eq!(report.records_written, 15);

    let game_ids = row_ids(&read_rows(&config.output_file_game));
    assert_eq!(game_ids, vec![2, 4, 6]);
}

#[tokio::test]
async fn test_concurrency_does_not_change_output() {
    let mock_server = MockServer::start().await;

    // Later ids answer faster, so workers finish out of order
    for match_id in 1..=12u32 {
        Mock::given(method("GET"))
            .and(path(match_path(match_id)))
            .respond_with(
                html(MATCH_SHEET).set_delay(Duration::from_millis(u64::from(13 - match_id) * 5)),
            )
            .mount(&mock_server)
            .await;
    }

    let sequential_dir = tempfile::tempdir().unwrap();
    let mut sequential = create_test_config(&mock_server, sequential_dir.path(), 1, 12);
    sequential.concurrency = 1;

    let concurrent_dir = tempfile::tempdir().unwrap();
    let mut concurrent = create_test_config(&mock_server, concurrent_dir.path(), 1, 12);
    concurrent.concurrency = 8;

    let sequential_report = run_scrape(sequential.clone()).await.expect("Scrape failed");
    let concurrent_report = run_scrape(concurrent.clone()).await.expect("Scrape failed");

    assert_eq!(sequential_report.succeeded, 12);
    assert_eq!(concurrent_report.succeeded, 12);
    assert_eq!(
        read_rows(&sequential.output_file),
        read_rows(&concurrent.output_file)
    );
    assert_eq!(
        read_rows(&sequential.output_file_game),
        read_rows(&concurrent.output_file_game)
    );
}

#[tokio::test]
async fn test_rate_limit_paces_concurrent_requests() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path_regex(r"^/partido/estadisticas/id/\d+$"))
        .respond_with(html(NO_DATA))
        .expect(5)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server, dir.path(), 1, 5);
    config.concurrency = 5;
    config.rate_limit = 0.05;

    let start = Instant::now();
    let report = run_scrape(config).await.expect("Scrape failed");

    assert_eq!(report.succeeded, 5);
    // Five grants are separated by four full intervals
    assert!(start.elapsed() >= Duration::from_millis(200));
}

#[tokio::test]
async fn test_summary_file_written() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path(match_path(1)))
        .respond_with(html(MATCH_SHEET))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(match_path(2)))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server, dir.path(), 1, 2);
    config.summary_file = Some(dir.path().join("summary.md").display().to_string());

    let coordinator = Coordinator::new(config)
        .expect("Failed to create coordinator")
        .with_config_hash("0123abcd");
    let report = coordinator.run().await.expect("Scrape failed");

    assert_eq!(report.config_hash.as_deref(), Some("0123abcd"));

    let summary = std::fs::read_to_string(dir.path().join("summary.md")).unwrap();
    assert!(summary.contains("- **Matches Attempted**: 2"));
    assert!(summary.contains("- **Config Hash**: 0123abcd"));
    assert!(summary.contains("| 2 | Request rejected: HTTP 403 | permanent | 1 |"));
}

#[tokio::test]
async fn test_oversized_cell_does_not_abort_run() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let oversized = MATCH_SHEET.replacen("25:30", "99999999:00", 1);
    Mock::given(method("GET"))
        .and(path(match_path(1)))
        .respond_with(html(&oversized))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(match_path(2)))
        .respond_with(html(MATCH_SHEET))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, dir.path(), 1, 2);
    let report = run_scrape(config.clone()).await.expect("Scrape failed");

    assert_eq!(report.succeeded, 2);
    assert_eq!(report.records_written, 10);

    let rows = read_rows(&config.output_file);
    assert_eq!(row_ids(&rows), vec![1, 1, 1, 1, 1, 2, 2, 2, 2, 2]);
    // seconds_played is left empty for the unreadable cell
    assert!(rows[0].starts_with("1,Real Madrid,1,5,A. García,,14,"));
}

#[tokio::test]
async fn test_unwritable_output_is_fatal() {
    let mock_server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .respond_with(html(MATCH_SHEET))
        .mount(&mock_server)
        .await;

    // A directory cannot be opened as the output file
    let mut config = create_test_config(&mock_server, dir.path(), 1, 2);
    let blocked = dir.path().join("blocked");
    std::fs::create_dir(&blocked).unwrap();
    config.output_file = blocked.display().to_string();

    let result = run_scrape(config).await;
    assert!(matches!(result, Err(ScrapeError::Output(_))));
}
