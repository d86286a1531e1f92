//! Read-side log listing for dashboards.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::Event;
use crate::state::AppState;

const DEFAULT_LOGS_LIMIT: i64 = 100;
const DEFAULT_LATEST_LIMIT: i64 = 20;

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub severity: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct LatestQuery {
    pub limit: Option<i64>,
}

/// Listing view of an event; raw_log stays out of list responses.
#[derive(Debug, Serialize)]
pub struct LogEntry {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub severity: String,
    pub source_ip: Option<String>,
    pub source_host: Option<String>,
    pub event_type: Option<String>,
    pub message: String,
}

impl From<Event> for LogEntry {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            timestamp: event.timestamp,
            severity: event.severity.as_str().to_string(),
            source_ip: event.source_ip,
            source_host: event.source_host,
            event_type: event.event_type,
            message: event.message,
        }
    }
}

/// GET /api/logs - newest first, optional exact severity filter.
pub async fn get_logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Result<impl IntoResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_LOGS_LIMIT);
    let events = match query.severity.as_deref() {
        Some(severity) => {
            state
                .storage
                .events_by_severity(severity, limit)
                .await?
        }
        None => state.storage.latest_events(limit).await?,
    };

    let logs: Vec<LogEntry> = events.into_iter().map(LogEntry::from).collect();
    Ok(Json(logs))
}

/// GET /api/logs/latest
pub async fn get_latest_logs(
    State(state): State<AppState>,
    Query(query): Query<LatestQuery>,
) -> Result<impl IntoResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_LATEST_LIMIT);
    let events = state.storage.latest_events(limit).await?;
    let logs: Vec<LogEntry> = events.into_iter().map(LogEntry::from).collect();
    Ok(Json(logs))
}
