//! Log source administration endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::error::Result;
use crate::sources;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSourceRequest {
    pub name: String,
    pub source_type: String,
    pub source_ip: Option<String>,
    pub api_key: Option<String>,
}

/// POST /api/sources
pub async fn create_log_source(
    State(state): State<AppState>,
    Json(request): Json<CreateSourceRequest>,
) -> Result<impl IntoResponse> {
    let source = sources::create_source(
        state.storage.as_ref(),
        request.name,
        request.source_type,
        request.source_ip,
        request.api_key,
    )
    .await?;

    info!(source_id = source.id, source = %source.name, "log source registered");
    Ok((StatusCode::CREATED, Json(source)))
}

/// GET /api/sources - newest first.
pub async fn get_log_sources(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let sources = sources::list_sources(state.storage.as_ref()).await?;
    Ok(Json(sources))
}
