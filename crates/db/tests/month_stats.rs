//! Integration tests for the month aggregates.

use std::collections::BTreeMap;

use chrono::Utc;
use db::{CreateLogEntry, LogStore, QueryContext, StatsMonth};
use serde_json::json;
use tempfile::TempDir;

async fn setup_store() -> (LogStore, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = LogStore::open(&temp_dir.path().join("test.db"))
        .await
        .expect("Failed to open store");
    store.init().await.expect("Failed to apply schema");
    (store, temp_dir)
}

async fn insert(store: &LogStore, payload: serde_json::Value) {
    let entry = CreateLogEntry::from_json(payload.to_string().as_bytes())
        .and_then(|create| create.into_log_entry(Utc::now()))
        .expect("valid payload");
    store.insert_log(&entry).await.expect("insert");
}

fn month(year: i32, month: u32) -> StatsMonth {
    StatsMonth::new(year, month).unwrap()
}

#[tokio::test]
async fn test_empty_february_is_zero_filled() {
    let (store, _temp_dir) = setup_store().await;
    let ctx = QueryContext::background();

    let summary = store.month_summary(&ctx, month(2024, 2)).await.unwrap();
    assert_eq!(summary.total, 0);
    assert_eq!(summary.daily.len(), 29);
    assert!(summary.daily.iter().all(|d| d.count == 0));
    assert!(summary.by_severity.is_empty());
    assert!(summary.by_service.is_empty());
    assert!(summary.by_attribute.is_empty());
}

#[tokio::test]
async fn test_month_boundaries_are_half_open() {
    let (store, _temp_dir) = setup_store().await;
    let ctx = QueryContext::background();

    for timestamp in [
        "2024-01-31T23:59:59.999999Z",
        "2024-02-01T00:00:00Z",
        "2024-02-29T23:59:59.999999Z",
        "2024-03-01T00:00:00Z",
    ] {
        insert(&store, json!({"timestamp": timestamp, "severity_text": "INFO"})).await;
    }

    assert_eq!(store.count_logs_by_month(&ctx, month(2024, 1)).await.unwrap(), 1);
    assert_eq!(store.count_logs_by_month(&ctx, month(2024, 2)).await.unwrap(), 2);
    assert_eq!(store.count_logs_by_month(&ctx, month(2024, 3)).await.unwrap(), 1);

    let per_day = store.count_logs_per_day(&ctx, month(2024, 2)).await.unwrap();
    assert_eq!(per_day, BTreeMap::from([(1, 1), (29, 1)]));
}

#[tokio::test]
async fn test_offsets_are_pinned_to_utc() {
    let (store, _temp_dir) = setup_store().await;
    let ctx = QueryContext::background();

    // Local March 1st, but still February 29th in UTC.
    insert(
        &store,
        json!({"timestamp": "2024-03-01T01:00:00+02:00", "severity_text": "INFO"}),
    )
    .await;

    assert_eq!(store.count_logs_by_month(&ctx, month(2024, 2)).await.unwrap(), 1);
    assert_eq!(store.count_logs_by_month(&ctx, month(2024, 3)).await.unwrap(), 0);
    let per_day = store.count_logs_per_day(&ctx, month(2024, 2)).await.unwrap();
    assert_eq!(per_day.get(&29), Some(&1));
}

#[tokio::test]
async fn test_december_does_not_leak_into_january() {
    let (store, _temp_dir) = setup_store().await;
    let ctx = QueryContext::background();

    insert(&store, json!({"timestamp": "2024-12-31T23:00:00Z", "severity_text": "INFO"})).await;
    insert(&store, json!({"timestamp": "2025-01-01T00:00:00Z", "severity_text": "INFO"})).await;

    assert_eq!(store.count_logs_by_month(&ctx, month(2024, 12)).await.unwrap(), 1);
    assert_eq!(store.count_logs_by_month(&ctx, month(2025, 1)).await.unwrap(), 1);
}

#[tokio::test]
async fn test_group_by_aggregates() {
    let (store, _temp_dir) = setup_store().await;
    let ctx = QueryContext::background();

    let payloads = [
        json!({"timestamp": "2024-06-03T08:00:00Z", "severity_text": "ERROR", "service_name": "api",
               "attributes": {"env": "prod", "user": "u1"}}),
        json!({"timestamp": "2024-06-03T09:00:00Z", "severity_text": "ERROR", "service_name": "api",
               "attributes": {"env": "prod"}}),
        json!({"timestamp": "2024-06-10T10:00:00Z", "severity_text": "INFO", "service_name": "worker",
               "attributes": {"env": "dev", "job": 4}}),
        json!({"timestamp": "2024-06-30T23:00:00Z", "severity_text": "WARN"}),
        // Other month, must not be counted anywhere.
        json!({"timestamp": "2024-07-01T00:00:00Z", "severity_text": "ERROR", "service_name": "api",
               "attributes": {"env": "prod"}}),
    ];
    for payload in payloads {
        insert(&store, payload).await;
    }

    let june = month(2024, 6);
    let summary = store.month_summary(&ctx, june).await.unwrap();

    assert_eq!(summary.total, 4);
    assert_eq!(
        summary.by_severity,
        BTreeMap::from([
            ("ERROR".to_string(), 2),
            ("INFO".to_string(), 1),
            ("WARN".to_string(), 1),
        ])
    );
    assert_eq!(
        summary.by_service,
        BTreeMap::from([("api".to_string(), 2), ("worker".to_string(), 1)])
    );
    assert_eq!(
        summary.by_attribute,
        BTreeMap::from([
            ("env".to_string(), 3),
            ("job".to_string(), 1),
            ("user".to_string(), 1),
        ])
    );

    assert_eq!(summary.daily.len(), 30);
    assert_eq!(summary.daily[2].count, 2);
    assert_eq!(summary.daily[9].count, 1);
    assert_eq!(summary.daily[29].count, 1);
    assert_eq!(summary.daily.iter().map(|d| d.count).sum::<i64>(), 4);
}
