// HTTP API module - JSON endpoints behind the dashboard
//
// Every response carries a `success` flag. Failures use a non-2xx status
// with `{"success": false, "error": "..."}`; validation happens here, before
// anything reaches the store.

mod dashboard;
mod day;
mod squares;
mod threads;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde_json::json;

pub use dashboard::{get_dashboard, get_thread_chains};
pub use day::{get_day_info, update_day_context};
pub use squares::toggle_status;
pub use threads::{add_thread, delete_thread, move_thread};

/// API error responses
/// Converted to HTTP status codes via IntoResponse
#[derive(Debug)]
pub enum ApiError {
    Internal(String),
    BadRequest(String),
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        if status.is_server_error() {
            tracing::error!("API error: {} - {}", status, message);
        } else {
            tracing::debug!("API error: {} - {}", status, message);
        }

        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::Internal(format!("{:#}", e))
    }
}

/// Strict `YYYY-MM-DD`
pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    let valid_shape = raw.len() == 10
        && raw
            .char_indices()
            .all(|(i, c)| if i == 4 || i == 7 { c == '-' } else { c.is_ascii_digit() });
    if !valid_shape {
        return Err(ApiError::BadRequest(format!(
            "Invalid date '{}', expected YYYY-MM-DD",
            raw
        )));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("Invalid date '{}'", raw)))
}

/// `{"success": true}` plus extra fields
pub(crate) fn ok_with(mut extra: serde_json::Value) -> Json<serde_json::Value> {
    if let Some(map) = extra.as_object_mut() {
        map.insert("success".to_string(), serde_json::Value::Bool(true));
        return Json(extra);
    }
    Json(json!({ "success": true, "data": extra }))
}
