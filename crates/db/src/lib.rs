use std::{path::Path, sync::Arc, time::Duration};

use sqlx::{
    Error, Executor, Pool, Sqlite,
    sqlite::{
        SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePoolOptions,
        SqliteSynchronous,
    },
};
use thiserror::Error as ThisError;
use tokio::sync::Mutex;

pub mod cancel;
pub mod models;
mod store;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod validation;

pub use cancel::QueryContext;
pub use models::{
    attribute::{AttributeKind, AttributeValue},
    log_entry::{
        CreateLogEntry, LogEntry,
        queries::{LogFilter, LogPage, Pagination},
        stats::{DailyCount, MonthSummary, StatsMonth},
    },
};
pub use validation::ValidationError;

// ============================================================================
// Connection Pool Configuration
// ============================================================================

/// Default maximum connections in the pool.
/// Reads fan out across connections; writes are serialized by `LogStore::write_lock`.
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Minimum idle connections to maintain.
const DEFAULT_MIN_CONNECTIONS: u32 = 1;

/// Connection acquisition timeout in seconds.
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Idle connection timeout in seconds (10 minutes).
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

/// Get max connections from environment or use default.
pub fn get_max_connections() -> u32 {
    std::env::var("LOGLENS_SQLITE_MAX_CONNECTIONS")
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .filter(|&n| n > 0 && n <= 100)
        .unwrap_or(DEFAULT_MAX_CONNECTIONS)
}

/// Apply performance pragmas to a SQLite connection.
/// These pragmas are applied on every new connection via `after_connect`.
///
/// - `temp_store = MEMORY` (2): GROUP BY / DISTINCT scratch tables stay in memory
/// - `mmap_size`: memory-mapped reads (64MB dev, 256MB prod)
/// - `synchronous = NORMAL`: must come AFTER mmap_size
/// - `cache_size = -64000`: 64MB page cache (negative = KB)
async fn apply_performance_pragmas(conn: &mut SqliteConnection) -> Result<(), Error> {
    conn.execute("PRAGMA temp_store = 2").await?;

    #[cfg(debug_assertions)]
    conn.execute("PRAGMA mmap_size = 67108864").await?; // 64MB

    #[cfg(not(debug_assertions))]
    conn.execute("PRAGMA mmap_size = 268435456").await?; // 256MB

    // mmap'ed writes can bypass fsync unless synchronous is set after mmap_size.
    conn.execute("PRAGMA synchronous = NORMAL").await?;

    conn.execute("PRAGMA cache_size = -64000").await?;

    Ok(())
}

// ============================================================================
// Errors
// ============================================================================

/// Failure while opening the database or applying the schema.
/// Fatal at startup: nothing should be served against an uninitialized schema.
#[derive(Debug, ThisError)]
pub enum SchemaError {
    #[error("failed to create database directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to open database: {0}")]
    Connect(#[from] sqlx::Error),
    #[error("failed to apply schema: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Failure of a single store operation. Never retried by the store.
#[derive(Debug, ThisError)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("query was cancelled")]
    Cancelled,
    #[error("query exceeded its deadline of {0:?}")]
    Timeout(Duration),
}

// ============================================================================
// Store
// ============================================================================

/// Process-wide handle on the log database.
///
/// Cloning is cheap; every clone shares the pool and the write lock.
#[derive(Clone)]
pub struct LogStore {
    pub pool: Pool<Sqlite>,
    write_lock: Arc<Mutex<()>>,
}

impl LogStore {
    /// Open (creating if missing) the SQLite database at `db_path`.
    ///
    /// Does NOT apply the schema; call [`LogStore::init`] before serving.
    pub async fn open(db_path: &Path) -> Result<LogStore, SchemaError> {
        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let max_connections = get_max_connections();

        tracing::info!(
            path = %db_path.display(),
            max_connections = max_connections,
            min_connections = DEFAULT_MIN_CONNECTIONS,
            "Initializing SQLite connection pool"
        );

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(DEFAULT_MIN_CONNECTIONS)
            .acquire_timeout(Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS))
            .idle_timeout(Some(Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS)))
            .after_connect(|conn, _meta| {
                Box::pin(async move { apply_performance_pragmas(conn).await })
            })
            .connect_with(options)
            .await?;

        Ok(Self::from_pool(pool))
    }

    /// Wrap an existing pool. The caller owns its configuration.
    pub fn from_pool(pool: Pool<Sqlite>) -> LogStore {
        LogStore {
            pool,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Create the `log`/`attribute` tables and their indexes if absent.
    ///
    /// Idempotent: already-applied migrations are skipped, so this runs on
    /// every startup.
    pub async fn init(&self) -> Result<(), SchemaError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Flush the WAL into the main database file and close every connection.
    pub async fn close(&self) -> Result<(), StoreError> {
        sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)")
            .execute(&self.pool)
            .await?;
        self.pool.close().await;
        Ok(())
    }
}
