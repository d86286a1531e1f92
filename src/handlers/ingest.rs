//! Ingestion endpoints for external log-emitting agents.
//!
//! Both endpoints authenticate via `X-API-Key` header or `api_key` query
//! parameter before touching the payload. The batch endpoint reports partial
//! failures as data, never as a hard error, as long as one record made it in.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{PipelineError, Result};
use crate::ingest::{self, IngestOutcome, MAX_ERRORS_SHOWN};
use crate::sources;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ApiKeyQuery {
    pub api_key: Option<String>,
}

/// Batch accounting response. `errors` is capped at the first
/// [`MAX_ERRORS_SHOWN`] entries; `error_count` always carries the full count.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub status: String,
    pub inserted: usize,
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_count: Option<usize>,
}

impl IngestResponse {
    fn new(status: &str, inserted: usize, total: usize, all_errors: Vec<String>) -> Self {
        let error_count = all_errors.len();
        let errors: Vec<String> = all_errors.into_iter().take(MAX_ERRORS_SHOWN).collect();
        Self {
            status: status.to_string(),
            inserted,
            total,
            errors: if errors.is_empty() { None } else { Some(errors) },
            error_count: if error_count == 0 {
                None
            } else {
                Some(error_count)
            },
        }
    }
}

impl From<IngestOutcome> for IngestResponse {
    fn from(outcome: IngestOutcome) -> Self {
        Self::new(
            outcome.status(),
            outcome.inserted,
            outcome.total,
            outcome.errors,
        )
    }
}

impl From<crate::import::ImportOutcome> for IngestResponse {
    fn from(outcome: crate::import::ImportOutcome) -> Self {
        Self::new(
            outcome.status(),
            outcome.inserted,
            outcome.total,
            outcome.errors,
        )
    }
}

fn api_key(headers: &HeaderMap, query: &ApiKeyQuery) -> Option<String> {
    headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .or_else(|| query.api_key.clone())
}

/// POST /api/ingest - one JSON object or an array of objects.
pub async fn ingest_events(
    State(state): State<AppState>,
    Query(query): Query<ApiKeyQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let key = api_key(&headers, &query);
    let source = sources::authenticate(state.storage.as_ref(), key.as_deref()).await?;

    if body.is_empty() {
        return Err(PipelineError::invalid_input("Empty payload"));
    }

    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| PipelineError::invalid_input(format!("Invalid JSON payload: {}", e)))?;

    let records = match payload {
        Value::Array(items) => items,
        obj @ Value::Object(_) => vec![obj],
        _ => {
            return Err(PipelineError::invalid_input(
                "Payload must be a JSON object or array",
            ))
        }
    };

    if records.is_empty() {
        return Err(PipelineError::invalid_input("Empty payload"));
    }

    let outcome = ingest::ingest_batch(state.storage.as_ref(), &source, records).await?;
    let status = if outcome.inserted > 0 {
        StatusCode::CREATED
    } else {
        StatusCode::BAD_REQUEST
    };

    Ok((status, Json(IngestResponse::from(outcome))))
}

/// POST /api/syslog - unstructured text body, one event per request.
pub async fn ingest_syslog(
    State(state): State<AppState>,
    Query(query): Query<ApiKeyQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let key = api_key(&headers, &query);
    let source = sources::authenticate(state.storage.as_ref(), key.as_deref()).await?;

    let body = String::from_utf8_lossy(&body);
    ingest::ingest_syslog(state.storage.as_ref(), &source, &body).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "status": "success",
            "message": "Syslog event received"
        })),
    ))
}
