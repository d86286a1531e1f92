//! Ingestion pipeline: the partial-failure batch path and the single-record
//! syslog path.
//!
//! Authentication happens before any record work and rejects the whole
//! request. Inside a batch every record is isolated: a normalization or
//! persistence failure becomes one error string and the loop moves on.

use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{PipelineError, Result};
use crate::models::LogSource;
use crate::normalize;
use crate::storage::Storage;

/// Error strings beyond this many are summarized by `error_count` only.
pub const MAX_ERRORS_SHOWN: usize = 10;

/// Accounting for one batch request.
#[derive(Debug)]
pub struct IngestOutcome {
    pub inserted: usize,
    pub total: usize,
    pub errors: Vec<String>,
}

impl IngestOutcome {
    pub fn status(&self) -> &'static str {
        if self.inserted > 0 {
            "success"
        } else {
            "error"
        }
    }
}

/// Ingest an ordered batch of structured records for an authenticated source.
///
/// Returns the full accounting; the HTTP layer decides 201 vs 400 from
/// `inserted`. The source's delivery statistics are bumped once, by the
/// number of records actually persisted.
pub async fn ingest_batch(
    storage: &dyn Storage,
    source: &LogSource,
    records: Vec<Value>,
) -> Result<IngestOutcome> {
    let total = records.len();
    let mut inserted = 0usize;
    let mut errors = Vec::new();
    let now = Utc::now();

    for (idx, record) in records.iter().enumerate() {
        match normalize::normalize_json(record, now) {
            Ok(event) => {
                let event = event.with_source(source.id);
                match storage.insert_event(&event).await {
                    Ok(_) => inserted += 1,
                    Err(e) => {
                        warn!(source_id = source.id, idx, error = %e, "event insert failed");
                        errors.push(format!("Log {}: {}", idx, e));
                    }
                }
            }
            Err(reason) => errors.push(format!("Log {}: {}", idx, reason)),
        }
    }

    if inserted > 0 {
        if let Err(e) = storage.bump_source_stats(source.id, inserted as i64).await {
            warn!(source_id = source.id, error = %e, "source stats update failed");
            errors.push(format!("Failed to update source stats: {}", e));
        }
    }

    info!(
        source_id = source.id,
        inserted,
        total,
        failed = errors.len(),
        "batch ingest completed"
    );

    Ok(IngestOutcome {
        inserted,
        total,
        errors,
    })
}

/// Ingest a raw syslog body as a single event.
///
/// Unlike the batch path, any persistence failure here is fatal to the
/// request.
pub async fn ingest_syslog(storage: &dyn Storage, source: &LogSource, body: &str) -> Result<i64> {
    if body.trim().is_empty() {
        return Err(PipelineError::invalid_input("Empty syslog data"));
    }

    let event = normalize::normalize_syslog(body, source, Utc::now());
    let event_id = storage.insert_event(&event).await?;
    storage.bump_source_stats(source.id, 1).await?;

    info!(source_id = source.id, event_id, "syslog event received");
    Ok(event_id)
}
