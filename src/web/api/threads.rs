// Thread endpoints - create, soft delete, reorder

use super::{ok_with, ApiError};
use crate::tracker::{Cadence, MoveDirection, NewThread};
use crate::web::state::AppState;
use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use serde_json::json;

fn default_thread_type() -> String {
    "perpetual".to_string()
}

#[derive(Debug, Deserialize)]
pub struct AddThreadRequest {
    pub name: String,
    #[serde(default)]
    pub redacted: String,
    pub category: Option<String>,
    #[serde(default)]
    pub sub_category: String,
    #[serde(rename = "type", default = "default_thread_type")]
    pub thread_type: String,
    /// Defaults to daily
    pub cadence: Option<String>,
}

/// POST /api/add_thread - New active thread ranked on top
pub async fn add_thread(
    State(state): State<AppState>,
    payload: Result<Json<AddThreadRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(req) = payload?;

    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Thread name must not be empty".to_string()));
    }
    let cadence = match req.cadence.as_deref() {
        None => Cadence::Daily,
        Some(raw) => Cadence::parse(raw).ok_or_else(|| {
            let known: Vec<&str> = Cadence::ALL.iter().map(|c| c.as_str()).collect();
            ApiError::BadRequest(format!(
                "Unknown cadence '{}', expected one of {}",
                raw,
                known.join(", ")
            ))
        })?,
    };

    let thread = state.store.add_thread(
        NewThread {
            name,
            redacted: req.redacted,
            category: req.category.filter(|c| !c.trim().is_empty()),
            sub_category: req.sub_category,
            thread_type: req.thread_type,
            cadence,
        },
        state.clock.now().date(),
    )?;

    Ok(ok_with(json!({ "thread": thread })))
}

#[derive(Debug, Deserialize)]
pub struct ThreadIdRequest {
    pub id: i64,
}

/// POST /api/delete_thread - Soft delete with closure date
pub async fn delete_thread(
    State(state): State<AppState>,
    payload: Result<Json<ThreadIdRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(req) = payload?;
    if !state
        .store
        .delete_thread(req.id, state.clock.now().date())?
    {
        return Err(ApiError::NotFound(format!("Thread {} not found", req.id)));
    }
    Ok(ok_with(json!({ "id": req.id })))
}

#[derive(Debug, Deserialize)]
pub struct MoveThreadRequest {
    pub id: i64,
    pub direction: String,
}

/// POST /api/move_thread - Swap rank with the nearest active neighbour
///
/// `moved` is false when the thread is already at the edge.
pub async fn move_thread(
    State(state): State<AppState>,
    payload: Result<Json<MoveThreadRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(req) = payload?;
    let direction = match req.direction.as_str() {
        "up" => MoveDirection::Up,
        "down" => MoveDirection::Down,
        other => {
            return Err(ApiError::BadRequest(format!(
                "Invalid direction '{}', expected up or down",
                other
            )))
        }
    };

    match state.store.move_thread(req.id, direction)? {
        Some(moved) => Ok(ok_with(json!({ "id": req.id, "moved": moved }))),
        None => Err(ApiError::NotFound(format!("Thread {} not found", req.id))),
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{now, state};
    use super::*;

    fn add_request(name: &str, cadence: Option<&str>) -> AddThreadRequest {
        AddThreadRequest {
            name: name.to_string(),
            redacted: String::new(),
            category: Some("work".to_string()),
            sub_category: String::new(),
            thread_type: default_thread_type(),
            cadence: cadence.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_add_thread_defaults() {
        let state = state();
        let response = add_thread(State(state.clone()), Ok(Json(add_request("Read", None))))
            .await
            .unwrap();

        assert_eq!(response.0["success"], true);
        assert_eq!(response.0["thread"]["cadence"], "daily");
        assert_eq!(response.0["thread"]["type"], "perpetual");
        assert_eq!(response.0["thread"]["rank"], 1);
        assert_eq!(response.0["thread"]["created_at"], "2025-03-05");
    }

    #[tokio::test]
    async fn test_add_thread_validation() {
        let err = add_thread(State(state()), Ok(Json(add_request("  ", None))))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err = add_thread(
            State(state()),
            Ok(Json(add_request("Read", Some("fortnightly")))),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(msg) if msg.contains("3x_week")));
    }

    #[tokio::test]
    async fn test_delete_and_move() {
        let state = state();
        for name in ["a", "b"] {
            add_thread(State(state.clone()), Ok(Json(add_request(name, Some("weekly")))))
                .await
                .unwrap();
        }
        let threads = state.store.list_threads(true).unwrap();
        let (top, bottom) = (threads[0].thread_id, threads[1].thread_id);

        let moved = move_thread(
            State(state.clone()),
            Ok(Json(MoveThreadRequest {
                id: bottom,
                direction: "up".to_string(),
            })),
        )
        .await
        .unwrap();
        assert_eq!(moved.0["moved"], true);
        assert_eq!(state.store.list_threads(true).unwrap()[0].thread_id, bottom);

        let err = move_thread(
            State(state.clone()),
            Ok(Json(MoveThreadRequest {
                id: top,
                direction: "sideways".to_string(),
            })),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        delete_thread(State(state.clone()), Ok(Json(ThreadIdRequest { id: top })))
            .await
            .unwrap();
        let deleted = state.store.get_thread(top).unwrap().unwrap();
        assert_eq!(deleted.closed_date, Some(now().date()));

        let err = delete_thread(State(state), Ok(Json(ThreadIdRequest { id: 999 })))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
