//! Month statistics as JSON (`/api/stats`) and HTML (`/stats`).

use axum::{
    Router,
    extract::{Query, State},
    response::{Html, Json as ResponseJson},
    routing::get,
};
use chrono::Utc;
use db::{MonthSummary, QueryContext, StatsMonth};
use serde::Deserialize;
use utils::response::ApiResponse;

use crate::{
    AppState,
    error::{ApiError, PageError},
    render::stats::stats_page,
};

#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub year: Option<String>,
    pub month: Option<String>,
}

async fn load_summary(state: &AppState, query: &StatsQuery) -> Result<MonthSummary, ApiError> {
    let month = StatsMonth::from_query(query.year.as_deref(), query.month.as_deref(), Utc::now())?;

    let ctx = QueryContext::new(state.config.query_timeout);

    Ok(state.store.month_summary(&ctx, month).await?)
}

pub async fn month_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<ResponseJson<ApiResponse<MonthSummary>>, ApiError> {
    let summary = load_summary(&state, &query).await?;
    Ok(ResponseJson(ApiResponse::success(summary)))
}

pub async fn stats_html(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Html<String>, PageError> {
    let summary = load_summary(&state, &query).await?;
    Ok(Html(stats_page(&summary)))
}

pub fn api_router() -> Router<AppState> {
    Router::new().route("/api/stats", get(month_stats))
}

pub fn page_router() -> Router<AppState> {
    Router::new().route("/stats", get(stats_html))
}
