use axum::{
    Json,
    extract::{Path, State},
};

use crate::error::ApiError;
use crate::state::AppState;

/// Lists every active call with its member participant ids.
pub async fn list_calls(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!(state.registry.snapshot()))
}

/// Member participant ids of one call.
pub async fn get_call(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let snapshot = state.registry.snapshot();
    match snapshot.get(&call_id) {
        Some(members) => Ok(Json(serde_json::json!({
            "call_id": call_id,
            "participants": members,
        }))),
        None => Err(ApiError::NotFound(format!("no active call '{call_id}'"))),
    }
}
