//! Paginated, filtered log listing as JSON (`/api/logs`) and HTML (`/`).
//!
//! Both share one loader so the page and the API always agree.

use axum::{
    Router,
    extract::{Path, Query, State},
    response::{Html, Json as ResponseJson},
    routing::get,
};
use db::{LogEntry, LogFilter, LogPage, Pagination, QueryContext, StoreError};
use serde::{Deserialize, Serialize};
use utils::response::ApiResponse;

use crate::{
    AppState,
    error::{ApiError, PageError},
    render::logs::{LogsView, logs_page},
};

/// Raw query parameters. Everything is optional text so that junk values
/// fall back to defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct LogsQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub severity: Option<String>,
    pub service: Option<String>,
    pub attr_key: Option<String>,
    pub attr_value: Option<String>,
}

impl LogsQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination::from_query(self.page.as_deref(), self.limit.as_deref())
    }

    pub fn filter(&self) -> LogFilter {
        LogFilter {
            severity: self.severity.clone(),
            service: self.service.clone(),
            attr_key: self.attr_key.clone(),
            attr_value: self.attr_value.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub entries: Vec<LogEntry>,
    /// Entries matching the filter, across all pages.
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
    pub attribute_keys: Vec<String>,
    pub services: Vec<String>,
    pub severities: Vec<String>,
    /// Entries in the store, ignoring the filter.
    pub total_logs: i64,
}

struct LoadedLogs {
    page: LogPage,
    pagination: Pagination,
    filter: LogFilter,
    attribute_keys: Vec<String>,
    services: Vec<String>,
    severities: Vec<String>,
    total_logs: i64,
}

async fn load_logs(state: &AppState, query: &LogsQuery) -> Result<LoadedLogs, StoreError> {
    // Queries run inside this future and are abandoned with it on disconnect.
    let ctx = QueryContext::new(state.config.query_timeout);

    let pagination = query.pagination();
    let filter = query.filter();

    let (page, attribute_keys, services, severities, total_logs) = tokio::try_join!(
        state.store.get_logs_filtered(&ctx, &filter, pagination),
        state.store.attribute_keys(&ctx),
        state.store.services(&ctx),
        state.store.severities(&ctx),
        state.store.total_logs(&ctx),
    )?;

    Ok(LoadedLogs {
        page,
        pagination,
        filter,
        attribute_keys,
        services,
        severities,
        total_logs,
    })
}

pub async fn list_logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Result<ResponseJson<ApiResponse<LogsResponse>>, ApiError> {
    let loaded = load_logs(&state, &query).await?;
    let total_pages = loaded.pagination.total_pages(loaded.page.total_matching);

    Ok(ResponseJson(ApiResponse::success(LogsResponse {
        entries: loaded.page.entries,
        total: loaded.page.total_matching,
        page: loaded.pagination.page,
        limit: loaded.pagination.limit,
        total_pages,
        attribute_keys: loaded.attribute_keys,
        services: loaded.services,
        severities: loaded.severities,
        total_logs: loaded.total_logs,
    })))
}

pub async fn get_log(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<ResponseJson<ApiResponse<LogEntry>>, ApiError> {
    let ctx = QueryContext::new(state.config.query_timeout);

    match state.store.find_by_id(&ctx, &id).await? {
        Some(entry) => Ok(ResponseJson(ApiResponse::success(entry))),
        None => Err(ApiError::NotFound(format!("log entry '{id}'"))),
    }
}

pub async fn logs_html(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Result<Html<String>, PageError> {
    let loaded = load_logs(&state, &query).await?;

    Ok(Html(logs_page(&LogsView {
        page: &loaded.page,
        pagination: loaded.pagination,
        filter: &loaded.filter,
        attribute_keys: &loaded.attribute_keys,
        services: &loaded.services,
        severities: &loaded.severities,
        total_logs: loaded.total_logs,
    })))
}

pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/api/logs", get(list_logs))
        .route("/api/logs/{id}", get(get_log))
}

pub fn page_router() -> Router<AppState> {
    Router::new().route("/", get(logs_html))
}
