//! Filtered, paginated reads over `log` joined with `attribute`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use super::{LOG_COLUMNS, LogEntry};
use crate::models::attribute::AttributeValue;

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Predicates for the logs page. Every predicate is optional; empty strings
/// count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFilter {
    pub severity: Option<String>,
    pub service: Option<String>,
    pub attr_key: Option<String>,
    pub attr_value: Option<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl LogFilter {
    pub fn severity(&self) -> Option<&str> {
        present(&self.severity)
    }

    pub fn service(&self) -> Option<&str> {
        present(&self.service)
    }

    /// The attribute predicate, only when both key and value are set.
    pub fn attribute(&self) -> Option<(&str, &str)> {
        Some((present(&self.attr_key)?, present(&self.attr_value)?))
    }

    pub fn is_empty(&self) -> bool {
        self.severity().is_none() && self.service().is_none() && self.attribute().is_none()
    }
}

/// Page number and size, always within bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Pagination {
    /// Clamp rather than reject: `page < 1` becomes 1 and `limit` is pinned
    /// to `1..=100`, defaulting to 20.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.filter(|p| *p >= 1).unwrap_or(1),
            limit: limit
                .unwrap_or(DEFAULT_PAGE_LIMIT)
                .clamp(1, MAX_PAGE_LIMIT),
        }
    }

    /// Build from raw query-string values. Unparseable values use the defaults.
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Self {
        let parse = |raw: Option<&str>| raw.and_then(|s| s.trim().parse::<i64>().ok());
        Self::new(parse(page), parse(limit))
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Number of pages needed for `total` rows; 0 when there are none.
    pub fn total_pages(&self, total: i64) -> i64 {
        if total <= 0 {
            0
        } else {
            (total + self.limit - 1) / self.limit
        }
    }
}

/// One page of results and the number of logs matching the filter overall.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LogPage {
    pub entries: Vec<LogEntry>,
    pub total_matching: i64,
}

/// Turn a user value into a literal-substring LIKE pattern (`ESCAPE '\'`).
pub(crate) fn like_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// `FROM`, optional `JOIN` and `WHERE` shared by the page and count queries so
/// both always see the same rows.
fn push_filter_clauses(builder: &mut QueryBuilder<'_, Sqlite>, filter: &LogFilter) {
    builder.push(" FROM log l");

    let attribute = filter.attribute();
    if attribute.is_some() {
        builder.push(" JOIN attribute a ON a.log_id = l.id");
    }

    let mut keyword = " WHERE ";
    if let Some(severity) = filter.severity() {
        builder
            .push(keyword)
            .push("l.severity_text = ")
            .push_bind(severity.to_string());
        keyword = " AND ";
    }
    if let Some(service) = filter.service() {
        builder
            .push(keyword)
            .push("l.service_name = ")
            .push_bind(service.to_string());
        keyword = " AND ";
    }
    if let Some((key, value)) = attribute {
        builder
            .push(keyword)
            .push("a.key = ")
            .push_bind(key.to_string())
            .push(" AND a.value LIKE ")
            .push_bind(like_pattern(value))
            .push(" ESCAPE '\\'");
    }
}

impl LogEntry {
    /// One page of logs matching `filter`, newest first, with the total
    /// number of matching logs.
    ///
    /// Page and count run in one read transaction so they agree with each
    /// other even while inserts land.
    pub async fn find_filtered(
        pool: &SqlitePool,
        filter: &LogFilter,
        pagination: Pagination,
    ) -> Result<LogPage, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let mut count_query = QueryBuilder::<Sqlite>::new("SELECT COUNT(DISTINCT l.id)");
        push_filter_clauses(&mut count_query, filter);
        let total_matching: i64 = count_query
            .build_query_scalar()
            .fetch_one(&mut *tx)
            .await?;

        let mut page_query = QueryBuilder::<Sqlite>::new("SELECT DISTINCT ");
        page_query.push(LOG_COLUMNS);
        push_filter_clauses(&mut page_query, filter);
        page_query
            .push(" ORDER BY l.timestamp DESC, l.id DESC LIMIT ")
            .push_bind(pagination.limit)
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let mut entries: Vec<LogEntry> = page_query
            .build_query_as()
            .fetch_all(&mut *tx)
            .await?;

        Self::load_attributes(&mut *tx, &mut entries).await?;
        tx.commit().await?;

        Ok(LogPage {
            entries,
            total_matching,
        })
    }

    /// Fill `attributes` for every entry with a single batched query.
    async fn load_attributes(
        conn: &mut SqliteConnection,
        entries: &mut [LogEntry],
    ) -> Result<(), sqlx::Error> {
        if entries.is_empty() {
            return Ok(());
        }

        let positions: HashMap<String, usize> = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();

        let mut builder = QueryBuilder::<Sqlite>::new(
            "SELECT log_id, key, value, value_type FROM attribute WHERE log_id IN (",
        );
        {
            let mut separated = builder.separated(", ");
            for entry in entries.iter() {
                separated.push_bind(entry.id.clone());
            }
        }
        builder.push(") ORDER BY log_id, id");

        let rows: Vec<(String, String, String, Option<String>)> =
            builder.build_query_as().fetch_all(&mut *conn).await?;

        for (log_id, key, value, value_type) in rows {
            if let Some(&i) = positions.get(&log_id) {
                entries[i]
                    .attributes
                    .insert(key, AttributeValue::from_stored(&value, value_type.as_deref()));
            }
        }

        Ok(())
    }

    /// Find a single log entry with its attributes.
    pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Self>, sqlx::Error> {
        let mut conn = pool.acquire().await?;

        let entry: Option<LogEntry> =
            sqlx::query_as(&format!("SELECT {LOG_COLUMNS} FROM log l WHERE l.id = $1"))
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;

        match entry {
            Some(entry) => {
                let mut found = [entry];
                Self::load_attributes(&mut *conn, &mut found).await?;
                let [entry] = found;
                Ok(Some(entry))
            }
            None => Ok(None),
        }
    }

    /// Every distinct attribute key, sorted.
    pub async fn attribute_keys(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT DISTINCT key FROM attribute ORDER BY key")
            .fetch_all(pool)
            .await
    }

    /// Every distinct non-null service name, sorted.
    pub async fn services(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT DISTINCT service_name FROM log WHERE service_name IS NOT NULL ORDER BY service_name",
        )
        .fetch_all(pool)
        .await
    }

    /// Every distinct stored severity text, exactly as ingested, sorted.
    pub async fn severities(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT DISTINCT severity_text FROM log ORDER BY severity_text")
            .fetch_all(pool)
            .await
    }

    pub async fn total_count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM log")
            .fetch_one(pool)
            .await
    }
}
