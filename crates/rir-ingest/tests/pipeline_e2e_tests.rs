//! End-to-end pipeline runs over five mock registries

mod common;

use chrono::NaiveDate;
use common::{canonical_path, dated_path, mount_all, response, source_urls, DUPLICATED_START, FIXTURES};
use rir_ingest::clock::FixedClock;
use rir_ingest::config::IngestConfig;
use rir_ingest::pipeline;
use rir_ingest::IngestError;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn clock() -> Arc<FixedClock> {
    Arc::new(FixedClock(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()))
}

fn config(server: &MockServer, dir: &TempDir) -> IngestConfig {
    IngestConfig::builder()
        .sources(source_urls(server))
        .dest(dir.path().join("dist").join("delegated-registry-extended-latest"))
        .max_attempts(2)
        .initial_backoff(Duration::from_millis(1))
        .build()
}

fn query_strings(db: &Path, sql: &str) -> Vec<String> {
    let conn = Connection::open(db).unwrap();
    let mut stmt = conn.prepare(sql).unwrap();
    let rows = stmt.query_map([], |row| row.get::<_, String>(0)).unwrap();
    rows.collect::<rusqlite::Result<_>>().unwrap()
}

#[tokio::test]
async fn test_full_run_builds_database_and_dump() {
    let server = MockServer::start().await;
    mount_all(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let config = config(&server, &dir);

    let stats = pipeline::run(&config, clock()).await.unwrap();

    assert_eq!(stats.registries, 5);
    assert_eq!(stats.summaries, 10);
    assert_eq!(stats.records, 14);
    assert_eq!(stats.conflicts, 1);
    assert_eq!(stats.output, config.dump_path());

    let db = config.database_path();
    assert_eq!(
        query_strings(&db, "SELECT registry FROM version ORDER BY rowid"),
        vec!["afrinic", "arin", "lacnic", "apnic", "ripencc"]
    );
    assert_eq!(
        query_strings(&db, "SELECT start FROM record ORDER BY rowid"),
        vec![
            "1",
            "1228",
            "1916",
            "1.0.0.0",
            "1.0.10.0",
            "2.0.0.0",
            "2.16.0.0",
            "3.0.0.0",
            "41.0.0.0",
            "41.32.0.0",
            "143.54.0.0",
            "179.0.0.0",
            "185.0.0.0",
            "2001:200::",
        ]
    );

    // The newer RIPE NCC file wins over the older ARIN one
    let winner = query_strings(
        &db,
        &format!("SELECT registry || '/' || cc FROM record WHERE start = '{}'", DUPLICATED_START),
    );
    assert_eq!(winner, vec!["ripencc/NL"]);

    let tables = query_strings(&db, "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name");
    assert_eq!(tables, vec!["record", "version"]);

    let dump = std::fs::read_to_string(config.dump_path()).unwrap();
    assert!(dump.starts_with("-- PRAGMA foreign_keys=OFF;\n"));
    assert!(!dump.lines().any(|line| line.starts_with("PRAGMA")));
    assert_eq!(dump.lines().filter(|l| l.starts_with("INSERT INTO version VALUES(")).count(), 5);
    assert_eq!(dump.lines().filter(|l| l.starts_with("INSERT INTO record VALUES(")).count(), 14);
    assert!(dump.contains(
        "INSERT INTO version VALUES('2.3','afrinic',20240101,3,'1970-01-01','2023-12-31','+0000');"
    ));
    assert!(dump.contains("INSERT INTO record VALUES('lacnic',NULL,'ipv4','179.0.0.0',1024,NULL,'available',NULL);"));
    assert!(!dump.contains("summary"));
    assert!(dump.trim_end().ends_with("COMMIT;"));
}

#[tokio::test]
async fn test_stale_latest_uses_dated_file() {
    let server = MockServer::start().await;
    let lacnic = &FIXTURES[3];

    Mock::given(method("GET"))
        .and(path(canonical_path(lacnic.registry)))
        .respond_with(ResponseTemplate::new(404))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(dated_path(lacnic.registry, "20240101")))
        .respond_with(response(lacnic))
        .expect(1)
        .mount(&server)
        .await;
    mount_all(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let stats = pipeline::run(&config(&server, &dir), clock()).await.unwrap();

    assert_eq!(stats.registries, 5);
    assert_eq!(stats.records, 14);
}

#[tokio::test]
async fn test_unavailable_registry_fails_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(canonical_path(FIXTURES[0].registry)))
        .respond_with(ResponseTemplate::new(500))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_all(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let config = config(&server, &dir);
    let err = pipeline::run(&config, clock()).await.unwrap_err();

    assert!(matches!(err, IngestError::SourceUnavailable { .. }));
    assert!(err.url().unwrap().contains("afrinic"));
    assert!(!config.dump_path().exists());
}

#[tokio::test]
async fn test_malformed_document_names_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(canonical_path(FIXTURES[4].registry)))
        .respond_with(ResponseTemplate::new(200).set_body_string("# only a comment\n"))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_all(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let err = pipeline::run(&config(&server, &dir), clock()).await.unwrap_err();

    match err {
        IngestError::Document { url, .. } => assert!(url.contains("ripencc")),
        other => panic!("Expected Document error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_strict_conflicts_rejects_duplicates() {
    let server = MockServer::start().await;
    mount_all(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let mut config = config(&server, &dir);
    config.strict_conflicts = true;

    let err = pipeline::run(&config, clock()).await.unwrap_err();

    match err {
        IngestError::DuplicateResources { count, first } => {
            assert_eq!(count, 1);
            assert!(first.contains(DUPLICATED_START));
        },
        other => panic!("Expected DuplicateResources, got {:?}", other),
    }
    assert!(!config.database_path().exists());
}

#[tokio::test]
async fn test_rerun_is_idempotent_and_can_drop_database() {
    let server = MockServer::start().await;
    mount_all(&server).await;
    let dir = tempfile::tempdir().unwrap();

    let mut config = config(&server, &dir);
    pipeline::run(&config, clock()).await.unwrap();
    let first = std::fs::read_to_string(config.dump_path()).unwrap();

    config.remove_database = true;
    pipeline::run(&config, clock()).await.unwrap();
    let second = std::fs::read_to_string(config.dump_path()).unwrap();

    assert_eq!(first, second);
    assert!(!config.database_path().exists());
}
