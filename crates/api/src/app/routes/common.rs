use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use tollgate_router::BoundArgs;
use tollgate_router::errors::bad_request;

use crate::app::errors::invalid_body;

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;

/// Whole, non-negative count from an optional numeric argument.
///
/// Fractions truncate; negatives fall back to `default`.
pub fn count(arg: Option<f64>, default: usize) -> usize {
    arg.filter(|n| *n >= 0.0).map_or(default, |n| n as usize)
}

pub fn page_limit(arg: Option<f64>) -> usize {
    count(arg, DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Typed body argument at `index`, or the 400 to answer with.
pub fn body<T: DeserializeOwned>(args: &BoundArgs, index: usize, name: &str) -> Result<T, Response> {
    match args.deserialize(index) {
        Ok(Some(value)) => Ok(value),
        Ok(None) => Err(bad_request(format!("{name} is required"))),
        Err(e) => Err(invalid_body(name, e)),
    }
}

pub fn ok_json(value: Value) -> Response {
    Json(value).into_response()
}
