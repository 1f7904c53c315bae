use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
};
use db::{StoreError, ValidationError};
use thiserror::Error;
use utils::response::ApiResponse;

use crate::render;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Missing or malformed Authorization header")]
    Unauthorized,
    #[error("Invalid API key")]
    Forbidden,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(StoreError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Store(StoreError::Cancelled | StoreError::Timeout(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
        }
    }

    /// Message safe to show to the client. Database details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Store(StoreError::Database(_)) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    fn log(&self) {
        match self {
            ApiError::Store(StoreError::Database(error)) => {
                tracing::error!(?error, "store operation failed");
            }
            ApiError::Store(error) => tracing::warn!(%error, "query abandoned"),
            ApiError::Validation(error) => tracing::debug!(%error, "rejected request"),
            _ => {}
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status_code();
        (status, Json(ApiResponse::<()>::error(self.public_message()))).into_response()
    }
}

/// Error from an HTML handler, rendered as a page instead of JSON.
#[derive(Debug)]
pub struct PageError(pub ApiError);

impl From<ApiError> for PageError {
    fn from(error: ApiError) -> Self {
        PageError(error)
    }
}

impl From<ValidationError> for PageError {
    fn from(error: ValidationError) -> Self {
        PageError(error.into())
    }
}

impl From<StoreError> for PageError {
    fn from(error: StoreError) -> Self {
        PageError(error.into())
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        self.0.log();
        let status = self.0.status_code();
        let page = render::error_page(status, &self.0.public_message());
        (status, Html(page)).into_response()
    }
}
