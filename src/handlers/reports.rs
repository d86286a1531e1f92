//! Daily report endpoint.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::error;

use crate::error::{PipelineError, Result};
use crate::reports;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub group: Option<String>,
    pub date: Option<String>,
}

/// GET /api/daily-report?group=<id>&date=YYYY-MM-DD
///
/// Generates and caches the report on first request for the (group, date)
/// key; later requests get the cached snapshot.
pub async fn get_daily_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse> {
    let group = query
        .group
        .ok_or_else(|| PipelineError::invalid_input("Group ID is required"))?;
    let group_id: i64 = group
        .trim()
        .parse()
        .map_err(|_| PipelineError::invalid_input("Invalid group ID"))?;

    let date = query
        .date
        .map(|s| {
            NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .map_err(|_| PipelineError::invalid_input("Invalid date format. Use YYYY-MM-DD"))
        })
        .transpose()?;

    let report = reports::get_or_create_daily_report(state.storage.as_ref(), group_id, date)
        .await
        .map_err(|e| {
            error!(group_id, error = %e, "report generation failed");
            PipelineError::internal("Unable to generate report")
        })?;

    Ok(Json(report))
}
