//! Error -> HTTP response mapping for the dispatch pipeline.
//!
//! Response shapes:
//! - 400 `{ "error": "<message>" }` for binding failures
//! - 403 `{ "message": ["<reason>", ...] }` for authorization failures
//! - 413 `{ "error": "<message>" }` for bodies over the configured limit
//! - 500 `{ "message": "Internal server error" }` for everything else

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use tollgate_auth::FailureReason;

pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

pub fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": message.into() })),
    )
        .into_response()
}

pub fn payload_too_large(limit: usize) -> Response {
    (
        StatusCode::PAYLOAD_TOO_LARGE,
        Json(json!({ "error": format!("request body exceeds {limit} bytes") })),
    )
        .into_response()
}

pub fn forbidden(reasons: &[FailureReason]) -> Response {
    (StatusCode::FORBIDDEN, Json(json!({ "message": reasons }))).into_response()
}

/// Generic 500. Never carries the underlying error.
pub fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": INTERNAL_ERROR_MESSAGE })),
    )
        .into_response()
}

/// Plain `{ "message": ... }` body with an arbitrary status, for actions.
pub fn json_message(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "message": message.into() }))).into_response()
}
