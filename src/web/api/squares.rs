// Square endpoint - set one thread/day status

use super::{ok_with, parse_date, ApiError};
use crate::tracker::SquareStatus;
use crate::web::state::AppState;
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub thread_id: i64,
    pub date: String,
    pub status: String,
    #[serde(default)]
    pub miss_reason: Option<String>,
}

/// POST /api/toggle_status - Upsert a square and rebuild the thread's chains
///
/// The miss reason is only kept for `miss`. A failed chain rebuild is logged
/// and does not fail the request.
pub async fn toggle_status(
    State(state): State<AppState>,
    payload: Result<Json<ToggleRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(req) = payload?;
    let date = parse_date(&req.date)?;
    let status = SquareStatus::parse(&req.status).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "Invalid status '{}', expected empty, hit or miss",
            req.status
        ))
    })?;

    let reason = req.miss_reason.unwrap_or_default();
    if !state
        .store
        .set_square(req.thread_id, date, status, &reason)?
    {
        return Err(ApiError::NotFound(format!(
            "Thread {} not found",
            req.thread_id
        )));
    }

    Ok(ok_with(json!({
        "thread_id": req.thread_id,
        "date": date,
        "status": status,
    })))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::state;
    use super::*;
    use crate::tracker::{Cadence, NewThread};
    use chrono::NaiveDate;

    fn request(thread_id: i64, date: &str, status: &str, reason: Option<&str>) -> ToggleRequest {
        ToggleRequest {
            thread_id,
            date: date.to_string(),
            status: status.to_string(),
            miss_reason: reason.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_toggle_creates_chain() {
        let state = state();
        let thread = state
            .store
            .add_thread(
                NewThread {
                    name: "Walk".to_string(),
                    redacted: String::new(),
                    category: None,
                    sub_category: String::new(),
                    thread_type: "perpetual".to_string(),
                    cadence: Cadence::Weekly,
                },
                NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            )
            .unwrap();

        for date in ["2025-03-01", "2025-03-08"] {
            toggle_status(
                State(state.clone()),
                Ok(Json(request(thread.thread_id, date, "hit", None))),
            )
            .await
            .unwrap();
        }
        let response = toggle_status(
            State(state.clone()),
            Ok(Json(request(thread.thread_id, "2025-03-04", "miss", Some("rain")))),
        )
        .await
        .unwrap();
        assert_eq!(response.0["status"], "miss");

        let chains = state.store.chains_for_thread(thread.thread_id).unwrap();
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].duration, 2);
    }

    #[tokio::test]
    async fn test_unknown_thread_is_404() {
        let err = toggle_status(
            State(state()),
            Ok(Json(request(77, "2025-03-01", "hit", None))),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_invalid_status_is_400() {
        let err = toggle_status(
            State(state()),
            Ok(Json(request(1, "2025-03-01", "done", None))),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
