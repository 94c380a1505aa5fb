// Calendar endpoints - read and update one day's context

use super::{ok_with, parse_date, ApiError};
use crate::tracker::DayUpdate;
use crate::web::state::AppState;
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use serde_json::json;

/// Journal text shown for a date that has never been touched
const NO_DATA: &str = "No data for this day.";

#[derive(Debug, Deserialize)]
pub struct DayInfoRequest {
    pub date: String,
}

/// POST /api/get_day_info - Calendar fields for a date
///
/// Unknown dates answer with a placeholder and are not created.
pub async fn get_day_info(
    State(state): State<AppState>,
    payload: Result<Json<DayInfoRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(req) = payload?;
    let date = parse_date(&req.date)?;

    let body = match state.store.get_day(date)? {
        Some(day) => json!({
            "date": date,
            "exists": true,
            "comments": day.comments,
            "work": day.top_work_priority,
            "other": day.top_other_priority,
            "project": day.project_type_this_week,
            "meds": day.day_meds,
            "off": day.off_routine_flag,
            "off_reason": day.off_routine_reason,
            "date_40k": day.date_40k,
            "week_40k": day.week_40k,
        }),
        None => json!({
            "date": date,
            "exists": false,
            "comments": NO_DATA,
            "work": "",
            "other": "",
            "project": "",
            "meds": false,
            "off": false,
            "off_reason": "",
        }),
    };
    Ok(ok_with(body))
}

#[derive(Debug, Deserialize)]
pub struct UpdateDayRequest {
    /// Defaults to today
    pub date: Option<String>,
    pub top_work: Option<String>,
    pub top_other: Option<String>,
    pub project: Option<String>,
    pub meds: Option<bool>,
    pub off_routine: Option<bool>,
    pub off_reason: Option<String>,
    /// Appended to the journal when non-empty
    pub comments: Option<String>,
}

/// POST /api/update_day_context - Partial update of a day
pub async fn update_day_context(
    State(state): State<AppState>,
    payload: Result<Json<UpdateDayRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(req) = payload?;
    let now = state.clock.now();
    let date = match req.date.as_deref() {
        Some(raw) => parse_date(raw)?,
        None => now.date(),
    };

    let update = DayUpdate {
        top_work: req.top_work,
        top_other: req.top_other,
        project: req.project,
        meds: req.meds,
        off_routine: req.off_routine,
        off_reason: req.off_reason,
        note: req.comments,
    };
    let day = state.store.update_day(date, update, now.time())?;

    Ok(ok_with(json!({ "date": date, "comments": day.comments })))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{body_json, now, state};
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_unknown_day_placeholder() {
        let state = state();
        let response = get_day_info(
            State(state.clone()),
            Ok(Json(DayInfoRequest {
                date: "2025-01-01".to_string(),
            })),
        )
        .await
        .unwrap();

        assert_eq!(response.0["success"], true);
        assert_eq!(response.0["comments"], NO_DATA);
        assert_eq!(response.0["exists"], false);
        // Reading must not create the entry
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert!(state.store.get_day(date).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_defaults_to_today_and_stamps_journal() {
        let state = state();
        update_day_context(
            State(state.clone()),
            Ok(Json(UpdateDayRequest {
                date: None,
                top_work: Some("taxes".to_string()),
                top_other: None,
                project: None,
                meds: Some(true),
                off_routine: None,
                off_reason: None,
                comments: Some("filed the forms".to_string()),
            })),
        )
        .await
        .unwrap();

        let day = state.store.get_day(now().date()).unwrap().unwrap();
        assert_eq!(day.top_work_priority, "taxes");
        assert!(day.day_meds);
        assert_eq!(day.comments, "[14:07] filed the forms");

        let info = get_day_info(
            State(state),
            Ok(Json(DayInfoRequest {
                date: "2025-03-05".to_string(),
            })),
        )
        .await
        .unwrap();
        assert_eq!(info.0["work"], "taxes");
        assert_eq!(info.0["date_40k"], "25.10.3");
    }

    #[tokio::test]
    async fn test_bad_date_is_400() {
        let err = get_day_info(
            State(state()),
            Ok(Json(DayInfoRequest {
                date: "yesterday".to_string(),
            })),
        )
        .await
        .unwrap_err();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["success"], false);
    }
}
