use axum::{
    Router,
    http::{Request, header::HeaderName},
    middleware,
};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::{DefaultOnFailure, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, field};

use crate::{
    AppState,
    middleware::{require_api_key, require_basic_auth},
};

pub mod assets;
pub mod health;
pub mod ingest;
pub mod logs;
pub mod stats;

pub fn router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            let request_id = request
                .extensions()
                .get::<RequestId>()
                .and_then(|id| id.header_value().to_str().ok());
            let span = tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = field::Empty
            );
            if let Some(request_id) = request_id {
                span.record("request_id", field::display(request_id));
            }
            span
        })
        .on_response(DefaultOnResponse::new().level(Level::INFO))
        .on_failure(DefaultOnFailure::new().level(Level::ERROR));

    let public = Router::<AppState>::new()
        .merge(health::router())
        .merge(assets::router());

    let api = Router::<AppState>::new()
        .merge(ingest::router())
        .merge(logs::api_router())
        .merge(stats::api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    let pages = Router::<AppState>::new()
        .merge(logs::page_router())
        .merge(stats::page_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_basic_auth,
        ));

    Router::<AppState>::new()
        .merge(public)
        .merge(api)
        .merge(pages)
        .layer(trace_layer)
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            MakeRequestUuid {},
        ))
        .with_state(state)
}
