//! Integration tests for the connection settings applied by `LogStore::open`.
//!
//! - journal_mode = WAL
//! - synchronous = NORMAL
//! - temp_store = MEMORY
//! - mmap_size = 64MB (debug builds)
//! - cache_size = -64000 (64MB)
//! - foreign_keys = ON

use db::LogStore;
use sqlx::{Executor, Row};
use tempfile::TempDir;

async fn setup_store() -> (LogStore, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = LogStore::open(&temp_dir.path().join("test.db"))
        .await
        .expect("Failed to open store");
    store.init().await.expect("Failed to apply schema");
    (store, temp_dir)
}

async fn pragma_i64(store: &LogStore, pragma: &str) -> i64 {
    let row = store
        .pool
        .fetch_one(sqlx::query(&format!("PRAGMA {pragma}")))
        .await
        .expect("Failed to query pragma");
    row.get(0)
}

#[tokio::test]
async fn test_sqlite_pragma_journal_mode_wal() {
    let (store, _temp_dir) = setup_store().await;

    let row = store
        .pool
        .fetch_one(sqlx::query("PRAGMA journal_mode"))
        .await
        .expect("Failed to query journal_mode");

    let journal_mode: String = row.get(0);
    assert_eq!(
        journal_mode.to_lowercase(),
        "wal",
        "Journal mode should be WAL"
    );
}

#[tokio::test]
async fn test_sqlite_pragma_synchronous_normal() {
    let (store, _temp_dir) = setup_store().await;
    // NORMAL = 1
    assert_eq!(pragma_i64(&store, "synchronous").await, 1);
}

#[tokio::test]
async fn test_sqlite_pragma_temp_store_memory() {
    let (store, _temp_dir) = setup_store().await;
    // MEMORY = 2
    assert_eq!(pragma_i64(&store, "temp_store").await, 2);
}

#[cfg(debug_assertions)]
#[tokio::test]
async fn test_sqlite_pragma_mmap_size() {
    let (store, _temp_dir) = setup_store().await;
    assert_eq!(pragma_i64(&store, "mmap_size").await, 67_108_864);
}

#[tokio::test]
async fn test_sqlite_pragma_cache_size() {
    let (store, _temp_dir) = setup_store().await;
    assert_eq!(pragma_i64(&store, "cache_size").await, -64000);
}

#[tokio::test]
async fn test_foreign_keys_enforced() {
    let (store, _temp_dir) = setup_store().await;
    assert_eq!(pragma_i64(&store, "foreign_keys").await, 1);

    let orphan = sqlx::query(
        "INSERT INTO attribute (log_id, key, value, value_type) VALUES ('missing', 'k', 'v', 'string')",
    )
    .execute(&store.pool)
    .await;
    assert!(orphan.is_err(), "attribute rows must reference a log");
}

#[tokio::test]
async fn test_sqlite_pragmas_applied_to_all_connections() {
    let (store, _temp_dir) = setup_store().await;

    for i in 0..3 {
        let mut conn = store
            .pool
            .acquire()
            .await
            .expect("Failed to acquire connection");

        let row = sqlx::query("PRAGMA temp_store")
            .fetch_one(&mut *conn)
            .await
            .expect("Failed to query temp_store");

        let temp_store: i32 = row.get(0);
        assert_eq!(
            temp_store, 2,
            "Connection {} should have temp_store = MEMORY",
            i
        );
    }
}
