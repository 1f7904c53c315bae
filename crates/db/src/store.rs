//! Store operations.
//!
//! Reads run inside a [`QueryContext`] and may run concurrently. Inserts are
//! serialized by the write lock and always run to completion.

use std::collections::BTreeMap;

use crate::{
    LogStore, QueryContext, StoreError,
    models::log_entry::{
        LogEntry,
        queries::{LogFilter, LogPage, Pagination},
        stats::{MonthSummary, StatsMonth, zero_fill_daily},
    },
};

impl LogStore {
    /// Insert one entry and all of its attributes atomically.
    ///
    /// The write lock is held from before `BEGIN` until after commit or
    /// rollback. On failure nothing from this entry is left behind.
    pub async fn insert_log(&self, entry: &LogEntry) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut tx = self.pool.begin().await?;
        if let Err(e) = LogEntry::insert(&mut *tx, entry).await {
            // Dropping the transaction would also roll back, but only lazily.
            let _ = tx.rollback().await;
            return Err(e.into());
        }
        tx.commit().await?;

        Ok(())
    }

    pub async fn get_logs_filtered(
        &self,
        ctx: &QueryContext,
        filter: &LogFilter,
        pagination: Pagination,
    ) -> Result<LogPage, StoreError> {
        ctx.run(LogEntry::find_filtered(&self.pool, filter, pagination))
            .await
    }

    pub async fn find_by_id(
        &self,
        ctx: &QueryContext,
        id: &str,
    ) -> Result<Option<LogEntry>, StoreError> {
        ctx.run(LogEntry::find_by_id(&self.pool, id)).await
    }

    pub async fn attribute_keys(&self, ctx: &QueryContext) -> Result<Vec<String>, StoreError> {
        ctx.run(LogEntry::attribute_keys(&self.pool)).await
    }

    pub async fn services(&self, ctx: &QueryContext) -> Result<Vec<String>, StoreError> {
        ctx.run(LogEntry::services(&self.pool)).await
    }

    pub async fn severities(&self, ctx: &QueryContext) -> Result<Vec<String>, StoreError> {
        ctx.run(LogEntry::severities(&self.pool)).await
    }

    pub async fn total_logs(&self, ctx: &QueryContext) -> Result<i64, StoreError> {
        ctx.run(LogEntry::total_count(&self.pool)).await
    }

    pub async fn count_logs_by_month(
        &self,
        ctx: &QueryContext,
        month: StatsMonth,
    ) -> Result<i64, StoreError> {
        ctx.run(LogEntry::count_by_month(&self.pool, month)).await
    }

    pub async fn count_logs_by_severity(
        &self,
        ctx: &QueryContext,
        month: StatsMonth,
    ) -> Result<BTreeMap<String, i64>, StoreError> {
        ctx.run(LogEntry::count_by_severity(&self.pool, month)).await
    }

    /// Sparse per-day counts. Use [`zero_fill_daily`] for a full month series.
    pub async fn count_logs_per_day(
        &self,
        ctx: &QueryContext,
        month: StatsMonth,
    ) -> Result<BTreeMap<u32, i64>, StoreError> {
        ctx.run(LogEntry::count_per_day(&self.pool, month)).await
    }

    pub async fn count_logs_by_service(
        &self,
        ctx: &QueryContext,
        month: StatsMonth,
    ) -> Result<BTreeMap<String, i64>, StoreError> {
        ctx.run(LogEntry::count_by_service(&self.pool, month)).await
    }

    pub async fn count_logs_by_attribute(
        &self,
        ctx: &QueryContext,
        month: StatsMonth,
    ) -> Result<BTreeMap<String, i64>, StoreError> {
        ctx.run(LogEntry::count_by_attribute(&self.pool, month))
            .await
    }

    /// All five month aggregates, queried concurrently.
    pub async fn month_summary(
        &self,
        ctx: &QueryContext,
        month: StatsMonth,
    ) -> Result<MonthSummary, StoreError> {
        let (total, by_severity, per_day, by_service, by_attribute) = tokio::try_join!(
            self.count_logs_by_month(ctx, month),
            self.count_logs_by_severity(ctx, month),
            self.count_logs_per_day(ctx, month),
            self.count_logs_by_service(ctx, month),
            self.count_logs_by_attribute(ctx, month),
        )?;

        Ok(MonthSummary {
            month,
            total,
            by_severity,
            daily: zero_fill_daily(month, &per_day),
            by_service,
            by_attribute,
        })
    }
}
