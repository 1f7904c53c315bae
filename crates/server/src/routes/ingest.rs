use axum::{Router, body::Bytes, extract::State, http::StatusCode, routing::post};
use chrono::Utc;
use db::CreateLogEntry;

use crate::{AppState, error::ApiError};

/// Accept one JSON log payload.
///
/// The body is taken raw so that malformed JSON is reported through the
/// same error envelope as every other validation failure.
pub async fn ingest_log(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let entry = CreateLogEntry::from_json(&body)?.into_log_entry(Utc::now())?;

    state.store.insert_log(&entry).await?;

    tracing::debug!(
        id = %entry.id,
        severity = %entry.severity_text,
        attributes = entry.attributes.len(),
        "ingested log entry"
    );
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> Router<AppState> {
    Router::new().route("/log", post(ingest_log))
}
