use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request, StatusCode, header::WWW_AUTHENTICATE},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{
    Authorization, HeaderMapExt,
    authorization::{Basic, Bearer},
};
use tracing::{debug, warn};

use crate::{AppState, error::ApiError};

const BASIC_CHALLENGE: &str = "Basic realm=\"loglens\", charset=\"UTF-8\"";

/// Guards ingestion and the JSON API with the configured bearer key.
///
/// No usable bearer header is a 401; a well-formed but wrong key is a 403.
pub async fn require_api_key(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let token = match req.headers().typed_get::<Authorization<Bearer>>() {
        Some(Authorization(bearer)) => bearer,
        None => {
            debug!(uri = %req.uri(), "request without bearer token");
            return ApiError::Unauthorized.into_response();
        }
    };

    if !state.config.api_key_matches(token.token()) {
        warn!(uri = %req.uri(), "rejected invalid API key");
        return ApiError::Forbidden.into_response();
    }

    next.run(req).await
}

/// Guards the HTML pages with HTTP basic auth when credentials are configured.
pub async fn require_basic_auth(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(credentials) = state.config.ui_credentials.as_ref() else {
        return next.run(req).await;
    };

    let authorized = req
        .headers()
        .typed_get::<Authorization<Basic>>()
        .is_some_and(|Authorization(basic)| {
            credentials.matches(basic.username(), basic.password())
        });

    if !authorized {
        debug!(uri = %req.uri(), "basic auth challenge");
        return challenge();
    }

    next.run(req).await
}

fn challenge() -> Response {
    let mut response = (StatusCode::UNAUTHORIZED, "Authentication required").into_response();
    response
        .headers_mut()
        .insert(WWW_AUTHENTICATE, HeaderValue::from_static(BASIC_CHALLENGE));
    response
}
