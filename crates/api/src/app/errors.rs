use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use cartaporte_infra::ResolveError;

pub fn resolve_error_to_response(err: &ResolveError) -> axum::response::Response {
    match err {
        ResolveError::NotFound { .. } => json_error(StatusCode::NOT_FOUND, "not_found", err.to_string()),
        ResolveError::InvalidInput(e) => json_error(StatusCode::BAD_REQUEST, "invalid_input", e.to_string()),
        ResolveError::Storage(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage_error", msg.clone())
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
