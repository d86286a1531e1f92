//! Administrator-facing bulk CSV import.
//!
//! Session authentication for administrators lives in the excluded CRUD
//! layer in front of this service; this handler owns only the import
//! mechanics and accounting.

use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::error::{PipelineError, Result};
use crate::handlers::ingest::IngestResponse;
use crate::import;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ImportQuery {
    pub log_source_id: Option<i64>,
}

/// POST /api/import/csv - multipart upload with a `file` part and an
/// optional `log_source_id` part (or query parameter).
pub async fn import_csv(
    State(state): State<AppState>,
    Query(query): Query<ImportQuery>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    let mut file: Option<Vec<u8>> = None;
    let mut log_source_id = query.log_source_id;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PipelineError::invalid_input(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("file") => {
                let bytes = field.bytes().await.map_err(|e| {
                    PipelineError::invalid_input(format!("Failed to read upload: {}", e))
                })?;
                file = Some(bytes.to_vec());
            }
            Some("log_source_id") => {
                let text = field.text().await.map_err(|e| {
                    PipelineError::invalid_input(format!("Failed to read upload: {}", e))
                })?;
                if !text.trim().is_empty() {
                    log_source_id = Some(text.trim().parse().map_err(|_| {
                        PipelineError::invalid_input("Invalid log source ID")
                    })?);
                }
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| PipelineError::invalid_input("CSV file is required"))?;

    let outcome = import::import_csv(state.storage.as_ref(), &file, log_source_id).await?;
    let status = if outcome.inserted > 0 {
        StatusCode::CREATED
    } else {
        StatusCode::BAD_REQUEST
    };

    // Same accounting shape as the batch ingest endpoint.
    Ok((status, Json(IngestResponse::from(outcome))))
}
