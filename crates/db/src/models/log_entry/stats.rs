//! Month-scoped aggregates for the statistics page.
//!
//! All aggregates are pinned to UTC and select rows by a half-open month
//! range on the stored timestamp text.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Months, NaiveDate, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use super::LogEntry;
use crate::validation::{MAX_STATS_YEAR, MIN_STATS_YEAR, ValidationError, parse_month, parse_year};

/// A calendar month in UTC, always within the accepted year range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct StatsMonth {
    pub year: i32,
    pub month: u32,
}

impl StatsMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, ValidationError> {
        if !(MIN_STATS_YEAR..=MAX_STATS_YEAR).contains(&year) {
            return Err(ValidationError::InvalidYear(year.to_string()));
        }
        if !(1..=12).contains(&month) {
            return Err(ValidationError::InvalidMonth(month.to_string()));
        }
        Ok(Self { year, month })
    }

    /// The month containing `now`.
    pub fn containing(now: DateTime<Utc>) -> Self {
        Self {
            year: now.year(),
            month: now.month(),
        }
    }

    /// Resolve raw `year`/`month` query values.
    ///
    /// When either is missing, empty or `0` the month containing `now` is
    /// used. Anything else must parse and be in range.
    pub fn from_query(
        year: Option<&str>,
        month: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        match (given(year), given(month)) {
            (Some(year), Some(month)) => Self::new(parse_year(year)?, parse_month(month)?),
            (year, month) => {
                // Unparseable input is still an error even when the other half is absent.
                if let Some(year) = year {
                    parse_year(year)?;
                }
                if let Some(month) = month {
                    parse_month(month)?;
                }
                Ok(Self::containing(now))
            }
        }
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Number of days in this month (28..=31).
    pub fn days_in_month(&self) -> u32 {
        self.first_day()
            .and_then(|first| {
                let next = first.checked_add_months(Months::new(1))?;
                Some(next.signed_duration_since(first).num_days() as u32)
            })
            .unwrap_or(31)
    }

    /// Previous month, if it is still within the accepted range.
    pub fn prev(&self) -> Option<Self> {
        let first = self.first_day()?.checked_sub_months(Months::new(1))?;
        Self::new(first.year(), first.month()).ok()
    }

    /// Next month, if it is still within the accepted range.
    pub fn next(&self) -> Option<Self> {
        let first = self.first_day()?.checked_add_months(Months::new(1))?;
        Self::new(first.year(), first.month()).ok()
    }

    /// Half-open text range `[YYYY-MM, YYYY-(MM+1))` over stored timestamps.
    ///
    /// December's upper bound is month `13`, which sorts after every December
    /// timestamp and before the following January.
    pub(crate) fn bounds(&self) -> (String, String) {
        (
            format!("{:04}-{:02}", self.year, self.month),
            format!("{:04}-{:02}", self.year, self.month + 1),
        )
    }

    /// Long display name, e.g. `February 2024`.
    pub fn label(&self) -> String {
        self.first_day()
            .map(|d| d.format("%B %Y").to_string())
            .unwrap_or_else(|| format!("{:04}-{:02}", self.year, self.month))
    }
}

/// A query value that was actually supplied (not missing, blank or `0`).
fn given(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty() && *s != "0")
}

/// Count for one day of a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub day: u32,
    pub count: i64,
}

/// Expand sparse per-day counts into one entry per day of `month`, in order.
/// Days beyond the month's length are dropped.
pub fn zero_fill_daily(month: StatsMonth, counts: &BTreeMap<u32, i64>) -> Vec<DailyCount> {
    (1..=month.days_in_month())
        .map(|day| DailyCount {
            day,
            count: counts.get(&day).copied().unwrap_or(0),
        })
        .collect()
}

/// Everything the statistics page shows for one month.
#[derive(Debug, Clone, Serialize)]
pub struct MonthSummary {
    pub month: StatsMonth,
    pub total: i64,
    pub by_severity: BTreeMap<String, i64>,
    pub daily: Vec<DailyCount>,
    pub by_service: BTreeMap<String, i64>,
    pub by_attribute: BTreeMap<String, i64>,
}

impl LogEntry {
    pub async fn count_by_month(pool: &SqlitePool, month: StatsMonth) -> Result<i64, sqlx::Error> {
        let (start, end) = month.bounds();
        sqlx::query_scalar("SELECT COUNT(*) FROM log WHERE timestamp >= $1 AND timestamp < $2")
            .bind(start)
            .bind(end)
            .fetch_one(pool)
            .await
    }

    pub async fn count_by_severity(
        pool: &SqlitePool,
        month: StatsMonth,
    ) -> Result<BTreeMap<String, i64>, sqlx::Error> {
        let (start, end) = month.bounds();
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"SELECT severity_text, COUNT(*)
               FROM log
               WHERE timestamp >= $1 AND timestamp < $2
               GROUP BY severity_text"#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().collect())
    }

    /// Sparse day-of-month → count. Days without logs are absent; see
    /// [`zero_fill_daily`].
    pub async fn count_per_day(
        pool: &SqlitePool,
        month: StatsMonth,
    ) -> Result<BTreeMap<u32, i64>, sqlx::Error> {
        let (start, end) = month.bounds();
        // Day is always characters 9-10 of the fixed-width timestamp.
        let rows: Vec<(i64, i64)> = sqlx::query_as(
            r#"SELECT CAST(substr(timestamp, 9, 2) AS INTEGER) AS day, COUNT(*)
               FROM log
               WHERE timestamp >= $1 AND timestamp < $2
               GROUP BY day
               ORDER BY day"#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(day, count)| (day as u32, count))
            .collect())
    }

    /// Counts per service; logs without a service are not counted.
    pub async fn count_by_service(
        pool: &SqlitePool,
        month: StatsMonth,
    ) -> Result<BTreeMap<String, i64>, sqlx::Error> {
        let (start, end) = month.bounds();
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"SELECT service_name, COUNT(*)
               FROM log
               WHERE timestamp >= $1 AND timestamp < $2 AND service_name IS NOT NULL
               GROUP BY service_name"#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().collect())
    }

    /// Number of distinct logs carrying each attribute key.
    pub async fn count_by_attribute(
        pool: &SqlitePool,
        month: StatsMonth,
    ) -> Result<BTreeMap<String, i64>, sqlx::Error> {
        let (start, end) = month.bounds();
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"SELECT a.key, COUNT(DISTINCT a.log_id)
               FROM attribute a
               JOIN log l ON l.id = a.log_id
               WHERE l.timestamp >= $1 AND l.timestamp < $2
               GROUP BY a.key"#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().collect())
    }
}
