//! End-to-end tests: write turns through the logger, read them back through
//! the history reader, against a file-backed database.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use assert_matches::assert_matches;
use chrono::{TimeZone, Utc};
use serde_json::{Value, json};

use chatlog_settings::DatabaseSettings;
use chatlog_store::sqlite::connection::{self, ConnectionConfig, PooledConnection};
use chatlog_store::sqlite::migrations::run_migrations;
use chatlog_store::{
    Addressing, ConnectionProvider, EventLogger, HistoryQuery, InteractionHistoryReader, Metadata,
    PoolProvider, SqliteProvider, StoreError, StructuredValue, decode, encode,
};

struct Harness {
    _dir: tempfile::TempDir,
    logger: EventLogger,
    reader: InteractionHistoryReader,
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chatlog.db");
    let provider: Arc<dyn ConnectionProvider> = Arc::new(SqliteProvider::new(DatabaseSettings {
        path: path.to_string_lossy().into_owned(),
        pool_size: 4,
        ..Default::default()
    }));
    Harness {
        _dir: dir,
        logger: EventLogger::new(provider.clone()).with_mute_errors(false),
        reader: InteractionHistoryReader::new(provider),
    }
}

fn meta(v: Value) -> Metadata {
    v.as_object().cloned().unwrap()
}

async fn log_at(h: &Harness, sender: &str, metadata: Value) {
    h.logger
        .log_interaction(sender, &[json!({"text": "ok"})], &json!({"text": "hi"}), &meta(metadata))
        .await
        .unwrap();
}

async fn seed_u1(h: &Harness) {
    for ts in [10, 20, 30] {
        log_at(h, "u1", json!({"pageId": "p1", "timestamp": ts})).await;
    }
}

fn stamps(items: &[chatlog_store::Interaction]) -> Vec<i64> {
    items.iter().filter_map(|i| i.timestamp).collect()
}

fn page_query() -> HistoryQuery {
    HistoryQuery::new("u1", Addressing::by_page("p1"))
}

#[tokio::test]
async fn windows_over_three_turns() {
    let h = harness();
    seed_u1(&h).await;

    let latest = h.reader.get_interactions(&page_query().limit(2)).await.unwrap();
    assert_eq!(stamps(&latest), vec![20, 30]);

    let before = h.reader.get_interactions(&page_query().limit(2).end_at(25)).await.unwrap();
    assert_eq!(stamps(&before), vec![10, 20]);

    let after = h.reader.get_interactions(&page_query().limit(2).start_at(15)).await.unwrap();
    assert_eq!(stamps(&after), vec![20, 30]);

    let bounded = h
        .reader
        .get_interactions(&page_query().end_at(30).start_at(15))
        .await
        .unwrap();
    assert_eq!(stamps(&bounded), vec![20, 30]);

    let inclusive = h
        .reader
        .get_interactions(&page_query().end_at(20).start_at(20))
        .await
        .unwrap();
    assert_eq!(stamps(&inclusive), vec![20]);

    let all = h.reader.get_interactions(&page_query().limit(0)).await.unwrap();
    assert_eq!(stamps(&all), vec![10, 20, 30]);
}

#[tokio::test]
async fn zero_start_anchor_reads_latest() {
    let h = harness();
    seed_u1(&h).await;
    let got = h.reader.get_interactions(&page_query().limit(2).start_at(0)).await.unwrap();
    assert_eq!(stamps(&got), vec![20, 30]);
}

#[tokio::test]
async fn zero_end_anchor_reads_latest_without_filter() {
    let h = harness();
    log_at(&h, "u1", json!({"pageId": "p1"})).await;
    seed_u1(&h).await;

    let got = h.reader.get_interactions(&page_query().limit(2).end_at(0)).await.unwrap();
    assert_eq!(stamps(&got), vec![20, 30]);

    // Without a range filter, turns that carry no timestamp are still read.
    let all = h.reader.get_interactions(&page_query().limit(0).end_at(0)).await.unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(all[0].timestamp, None);
}

#[tokio::test]
async fn fractional_timestamp_is_stored_as_null() {
    let h = harness();
    log_at(&h, "u1", json!({"pageId": "p1", "timestamp": 30.5})).await;
    log_at(&h, "u1", json!({"pageId": "p1", "timestamp": 40.0})).await;

    let got = h.reader.get_interactions(&page_query().limit(0)).await.unwrap();
    let stored: Vec<Option<i64>> = got.iter().map(|i| i.timestamp).collect();
    assert_eq!(stored, vec![None, Some(40)]);
    let after = h.reader.get_interactions(&page_query().start_at(30)).await.unwrap();
    assert_eq!(stamps(&after), vec![40]);
}

#[tokio::test]
async fn timestamps_compare_numerically() {
    let h = harness();
    for ts in [9, 10, 100] {
        log_at(&h, "u1", json!({"pageId": "p1", "timestamp": ts})).await;
    }
    let got = h.reader.get_interactions(&page_query().end_at(50)).await.unwrap();
    assert_eq!(stamps(&got), vec![9, 10]);
}

#[tokio::test]
async fn page_rows_are_not_visible_by_flag() {
    let h = harness();
    seed_u1(&h).await;
    log_at(&h, "u1", json!({"pageId": "p1", "timestamp": 40, "flag": "u1"})).await;

    let by_flag = h
        .reader
        .get_interactions(&HistoryQuery::new("u1", Addressing::ByFlag))
        .await
        .unwrap();
    assert_eq!(stamps(&by_flag), vec![40]);

    let other_page = h
        .reader
        .get_interactions(&HistoryQuery::new("u1", Addressing::by_page("p2")))
        .await
        .unwrap();
    assert!(other_page.is_empty());
}

#[tokio::test]
async fn error_turns_carry_err_and_others_do_not() {
    let h = harness();
    log_at(&h, "u1", json!({"pageId": "p1", "timestamp": 1})).await;
    let failure = std::io::Error::other(format!("   upstream timed out {}   ", "!".repeat(100)));
    h.logger
        .log_error(&failure, "u1", &[], &json!({"text": "hi"}), &meta(json!({"pageId": "p1", "timestamp": 2})))
        .await
        .unwrap();

    let got = h.reader.get_interactions(&page_query()).await.unwrap();
    assert_eq!(got.len(), 2);

    let ok = serde_json::to_value(&got[0]).unwrap();
    assert!(ok.get("err").is_none());

    let failed = serde_json::to_value(&got[1]).unwrap();
    let err = failed["err"].as_str().unwrap();
    assert!(err.starts_with("upstream timed out"));
    assert_eq!(err.chars().count(), 73);
}

#[tokio::test]
async fn dates_survive_storage_through_the_codec() {
    let h = harness();
    let at = Utc.timestamp_opt(1_600_000_000, 250_000_000).unwrap();
    let mut tree = BTreeMap::new();
    let _ = tree.insert("sentAt".to_string(), StructuredValue::DateTime(at));
    let _ = tree.insert("note".to_string(), StructuredValue::String("2020-09-13".into()));
    let request = encode(&StructuredValue::Object(tree.clone()));

    h.logger
        .log_interaction("u1", &[], &request, &meta(json!({"pageId": "p1", "timestamp": 1})))
        .await
        .unwrap();

    let got = h.reader.get_interactions(&page_query()).await.unwrap();
    assert_eq!(got[0].decoded_request(), StructuredValue::Object(tree));
    assert_eq!(decode(&got[0].request), got[0].decoded_request());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writers_and_a_late_reader() {
    let h = Arc::new(harness());
    let mut tasks = Vec::new();
    for ts in 0..32 {
        let h = h.clone();
        tasks.push(tokio::spawn(async move {
            log_at(&h, "u1", json!({"pageId": "p1", "timestamp": ts})).await;
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let got = h.reader.get_interactions(&page_query().limit(0)).await.unwrap();
    assert_eq!(stamps(&got), (0..32).collect::<Vec<_>>());
}

#[tokio::test]
async fn pool_provider_over_prepared_pool() {
    let pool = connection::new_in_memory(&ConnectionConfig::default()).unwrap();
    {
        let conn = pool.get().unwrap();
        let _ = run_migrations(&conn).unwrap();
    }
    let provider: Arc<dyn ConnectionProvider> = Arc::new(PoolProvider::new(pool));
    let logger = EventLogger::new(provider.clone());
    logger
        .log_interaction("bot", &[], &json!({}), &meta(json!({"flag": "u9", "timestamp": 3})))
        .await
        .unwrap();

    let got = InteractionHistoryReader::new(provider)
        .get_interactions(&HistoryQuery::new("u9", Addressing::ByFlag))
        .await
        .unwrap();
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].sender_id, "bot");
    assert_eq!(got[0].flag(), Some("u9"));
}

struct Unavailable;

#[async_trait]
impl ConnectionProvider for Unavailable {
    async fn connection(&self) -> chatlog_store::Result<PooledConnection> {
        Err(StoreError::Task("database offline".into()))
    }
}

#[tokio::test]
async fn provider_failures_follow_mute_policy() {
    let provider: Arc<dyn ConnectionProvider> = Arc::new(Unavailable);

    let muted = EventLogger::new(provider.clone());
    assert!(muted.log_interaction("u1", &[], &json!({}), &Metadata::new()).await.is_ok());

    let loud = EventLogger::new(provider.clone()).with_mute_errors(false);
    assert_matches!(
        loud.log_interaction("u1", &[], &json!({}), &Metadata::new()).await,
        Err(StoreError::Task(_))
    );

    let reader = InteractionHistoryReader::new(provider);
    assert_matches!(
        reader.get_interactions(&HistoryQuery::new("u1", Addressing::ByFlag)).await,
        Err(StoreError::Task(_))
    );
}
