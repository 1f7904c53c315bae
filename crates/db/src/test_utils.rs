//! Test utilities for database tests.
//!
//! Stores are backed by a file in a fresh temporary directory. The schema is
//! applied once to a template database, which every test then copies.

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use std::sync::OnceLock;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::OnceCell;

use crate::{LogStore, SchemaError};

static TEMPLATE_DIR: OnceLock<TempDir> = OnceLock::new();
static TEMPLATE_READY: OnceCell<()> = OnceCell::const_new();

fn get_template_dir() -> &'static TempDir {
    TEMPLATE_DIR.get_or_init(|| TempDir::new().expect("Failed to create template temp dir"))
}

async fn ensure_template_ready() {
    TEMPLATE_READY
        .get_or_init(|| async {
            let template_path = get_template_dir().path().join("template.db");

            let options = SqliteConnectOptions::new()
                .filename(&template_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Delete);

            let pool = SqlitePoolOptions::new()
                .min_connections(0)
                .max_connections(1)
                .connect_with(options)
                .await
                .expect("Failed to create template pool");

            LogStore::from_pool(pool.clone())
                .init()
                .await
                .expect("Failed to apply schema to template");

            pool.close().await;
        })
        .await;
}

/// Create a pool on a copy of the template database.
///
/// Returns the pool and the TempDir that must outlive it.
pub async fn create_test_pool() -> (SqlitePool, TempDir) {
    ensure_template_ready().await;

    let temp_dir = TempDir::new().expect("Failed to create test temp dir");
    let db_path = temp_dir.path().join("test.db");

    let template_path = get_template_dir().path().join("template.db");
    std::fs::copy(&template_path, &db_path).expect("Failed to copy template database");

    let options = SqliteConnectOptions::new()
        .filename(&db_path)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await
        .expect("Failed to create test pool");

    (pool, temp_dir)
}

/// A ready-to-use [`LogStore`] on a temporary database.
pub async fn create_test_store() -> (LogStore, TempDir) {
    let (pool, temp_dir) = create_test_pool().await;
    (LogStore::from_pool(pool), temp_dir)
}

/// Open a store through the production path (`open` + `init`) in a fresh
/// temporary directory. Slower than [`create_test_store`].
pub async fn open_test_store() -> Result<(LogStore, TempDir), SchemaError> {
    let temp_dir = TempDir::new()?;
    let store = LogStore::open(&temp_dir.path().join("loglens.sqlite")).await?;
    store.init().await?;
    Ok((store, temp_dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_test_pool() {
        let (pool, _temp_dir) = create_test_pool().await;

        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM log")
            .fetch_one(&pool)
            .await
            .expect("Failed to query log table");

        assert_eq!(result.0, 0);
    }

    #[tokio::test]
    async fn test_template_reuse() {
        let (pool1, _temp1) = create_test_pool().await;
        let (pool2, _temp2) = create_test_pool().await;

        let _: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM attribute")
            .fetch_one(&pool1)
            .await
            .expect("Pool 1 should work");

        let _: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM attribute")
            .fetch_one(&pool2)
            .await
            .expect("Pool 2 should work");
    }

    #[tokio::test]
    async fn test_open_and_init_twice() {
        let (store, temp_dir) = open_test_store().await.unwrap();
        // Init is idempotent
        store.init().await.unwrap();
        store.close().await.unwrap();

        let reopened = LogStore::open(&temp_dir.path().join("loglens.sqlite"))
            .await
            .unwrap();
        reopened.init().await.unwrap();
        reopened.close().await.unwrap();
    }
}
