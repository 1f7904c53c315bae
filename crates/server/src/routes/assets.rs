use axum::{
    Router,
    extract::Path,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use utils::assets::ui_asset;

use crate::AppState;

pub async fn serve_asset(Path(path): Path<String>) -> Response {
    match ui_asset(&path) {
        Some(data) => {
            let mime = mime_guess::from_path(&path)
                .first_or_octet_stream()
                .to_string();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime)],
                data.into_owned(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/assets/{*path}", get(serve_asset))
}
