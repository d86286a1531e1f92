//! Health probe.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

/// GET /health - liveness plus a storage ping.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match state.storage.ping().await {
        Ok(()) => "up",
        Err(_) => "down",
    };

    Json(json!({
        "status": "ok",
        "database": database,
    }))
}
