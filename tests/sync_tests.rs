//! Integration tests for the sync pipeline
//!
//! These tests use wiremock to stand in for the GraphQL source and run
//! fetch + persist end-to-end against an in-memory database.

use character_sync::config::SourceConfig;
use character_sync::storage::{CharacterStorage, RunStatus, SqliteStorage};
use character_sync::sync::{sync_characters, CharacterFetcher};
use serde_json::{json, Value};
use std::collections::HashSet;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn character_json(api_id: &str, name: &str) -> Value {
    json!({
        "api_id": api_id,
        "name": name,
        "status": "Alive",
        "species": "Human",
        "gender": "Male",
        "image": format!("https://rickandmortyapi.com/api/character/avatar/{}.jpeg", api_id),
    })
}

fn page_body(pages: u32, results: Vec<Value>) -> Value {
    json!({
        "data": {
            "characters": {
                "info": { "pages": pages },
                "results": results,
            }
        }
    })
}

/// Mounts a response for one page number
async fn mount_page(server: &MockServer, page: u32, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({ "variables": { "page": page } })))
        .respond_with(response)
        .mount(server)
        .await;
}

fn fetcher_for(server: &MockServer) -> CharacterFetcher {
    let config = SourceConfig {
        endpoint: format!("{}/graphql", server.uri()),
        ..SourceConfig::default()
    };
    CharacterFetcher::new(&config).expect("Failed to build fetcher")
}

fn api_ids(characters: &[character_sync::NewCharacter]) -> HashSet<String> {
    characters.iter().map(|c| c.api_id.clone()).collect()
}

#[tokio::test]
async fn test_two_page_sync_persists_both_records() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        1,
        ResponseTemplate::new(200).set_body_json(page_body(2, vec![character_json("1", "Rick")])),
    )
    .await;
    mount_page(
        &server,
        2,
        ResponseTemplate::new(200).set_body_json(page_body(2, vec![character_json("2", "Morty")])),
    )
    .await;

    let fetcher = fetcher_for(&server);
    let mut storage = SqliteStorage::new_in_memory().expect("Failed to open DB");

    let report = sync_characters(&fetcher, &mut storage, 1000).await;

    assert_eq!(report.fetched, 2);
    assert_eq!(report.inserted, 2);
    assert_eq!(storage.count_characters(None).unwrap(), 2);
    let stored = storage.list_characters(None, 10, 0).unwrap();
    assert!(stored.iter().any(|c| c.api_id == "2" && c.name == "Morty"));
}

#[tokio::test]
async fn test_single_page_issues_no_further_requests() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        1,
        ResponseTemplate::new(200).set_body_json(page_body(
            1,
            vec![character_json("1", "Rick"), character_json("2", "Morty")],
        )),
    )
    .await;

    let characters = fetcher_for(&server).fetch_all().await;

    assert_eq!(characters.len(), 2);
    let requests = server.received_requests().await.expect("Recording enabled");
    assert_eq!(requests.len(), 1);
}

#[tokio::test]
async fn test_first_page_failure_aborts_everything() {
    let failures = vec![
        ResponseTemplate::new(500).set_body_string("upstream exploded"),
        ResponseTemplate::new(200)
            .set_body_json(json!({ "errors": [{ "message": "Something went wrong" }] })),
        ResponseTemplate::new(200).set_body_json(json!({ "unexpected": true })),
        ResponseTemplate::new(200).set_body_json(json!({ "data": { "characters": {} } })),
        ResponseTemplate::new(200).set_body_string("not json"),
    ];

    for response in failures {
        let server = MockServer::start().await;
        mount_page(&server, 1, response).await;
        // Later pages would succeed, but must never be requested
        mount_page(
            &server,
            2,
            ResponseTemplate::new(200).set_body_json(page_body(2, vec![character_json("2", "Morty")])),
        )
        .await;

        let fetcher = fetcher_for(&server);
        let mut storage = SqliteStorage::new_in_memory().unwrap();

        let report = sync_characters(&fetcher, &mut storage, 1000).await;

        assert_eq!(report.fetched, 0);
        assert_eq!(report.inserted, 0);
        assert_eq!(storage.count_characters(None).unwrap(), 0);

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1, "Only page 1 should be requested");
    }
}

#[tokio::test]
async fn test_failed_middle_page_is_skipped() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        1,
        ResponseTemplate::new(200).set_body_json(page_body(4, vec![character_json("1", "Rick")])),
    )
    .await;
    mount_page(
        &server,
        2,
        ResponseTemplate::new(200).set_body_json(page_body(4, vec![character_json("2", "Morty")])),
    )
    .await;
    mount_page(&server, 3, ResponseTemplate::new(502).set_body_string("bad gateway")).await;
    mount_page(
        &server,
        4,
        ResponseTemplate::new(200).set_body_json(page_body(4, vec![character_json("4", "Beth")])),
    )
    .await;

    let characters = fetcher_for(&server).fetch_all().await;

    let expected: HashSet<String> = ["1", "2", "4"].iter().map(|s| s.to_string()).collect();
    assert_eq!(api_ids(&characters), expected);
    assert_eq!(server.received_requests().await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_malformed_and_errored_pages_degrade_to_empty() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        1,
        ResponseTemplate::new(200).set_body_json(page_body(3, vec![character_json("1", "Rick")])),
    )
    .await;
    mount_page(&server, 2, ResponseTemplate::new(200).set_body_string("{truncated")).await;
    mount_page(
        &server,
        3,
        ResponseTemplate::new(200).set_body_json(json!({ "errors": [{ "message": "rate limited" }] })),
    )
    .await;

    let characters = fetcher_for(&server).fetch_all().await;

    assert_eq!(characters.len(), 1);
    assert_eq!(characters[0].api_id, "1");
}

#[tokio::test]
async fn test_duplicates_across_pages_collapse() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        1,
        ResponseTemplate::new(200).set_body_json(page_body(2, vec![character_json("1", "Rick")])),
    )
    .await;
    mount_page(
        &server,
        2,
        ResponseTemplate::new(200).set_body_json(page_body(
            2,
            vec![character_json("1", "Rick"), character_json("2", "Morty")],
        )),
    )
    .await;

    let fetcher = fetcher_for(&server);
    let mut storage = SqliteStorage::new_in_memory().unwrap();

    let report = sync_characters(&fetcher, &mut storage, 1000).await;

    assert_eq!(report.fetched, 3);
    assert_eq!(report.inserted, 2);
    assert_eq!(storage.count_characters(None).unwrap(), 2);
}

#[tokio::test]
async fn test_resync_skips_existing_rows_and_records_runs() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        1,
        ResponseTemplate::new(200).set_body_json(page_body(
            1,
            vec![character_json("1", "Rick"), character_json("2", "Morty")],
        )),
    )
    .await;

    let fetcher = fetcher_for(&server);
    let mut storage = SqliteStorage::new_in_memory().unwrap();

    let first = sync_characters(&fetcher, &mut storage, 1000).await;
    let second = sync_characters(&fetcher, &mut storage, 1000).await;

    assert_eq!(first.inserted, 2);
    assert_eq!(second.fetched, 2);
    assert_eq!(second.inserted, 0);
    assert_eq!(storage.count_characters(None).unwrap(), 2);

    let runs = storage.recent_sync_runs(10).unwrap();
    assert_eq!(runs.len(), 2);
    assert!(runs.iter().all(|run| run.status == RunStatus::Completed));
    assert_eq!(runs[0].inserted, 0);
    assert_eq!(runs[1].inserted, 2);
}

/// Collects everything the fmt subscriber writes
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[tokio::test]
async fn test_failures_are_reported_through_logs() {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let server = MockServer::start().await;
    mount_page(
        &server,
        1,
        ResponseTemplate::new(200).set_body_json(page_body(2, vec![character_json("1", "Rick")])),
    )
    .await;
    mount_page(&server, 2, ResponseTemplate::new(503).set_body_string("maintenance")).await;

    let characters = fetcher_for(&server).fetch_all().await;
    assert_eq!(characters.len(), 1);

    let output = logs.contents();
    assert!(output.contains("Page request failed, skipping"), "{}", output);
    assert!(output.contains("HTTP 503 for page 2"), "{}", output);

    let failing = MockServer::start().await;
    mount_page(&failing, 1, ResponseTemplate::new(500)).await;
    assert!(fetcher_for(&failing).fetch_all().await.is_empty());

    let output = logs.contents();
    assert!(
        output.contains("First page request failed, aborting fetch"),
        "{}",
        output
    );
}
