//! Bulk CSV importer.
//!
//! Parses an uploaded export with the fixed column set
//! `Level, Operation, Details, Terminal IP Address, Source, Time` and
//! persists each row in isolation: a malformed or unpersistable row yields
//! one error entry and leaves sibling rows committed.

use std::collections::HashMap;

use chrono::Utc;
use tracing::{info, warn};

use crate::error::{PipelineError, Result};
use crate::normalize;
use crate::storage::Storage;

/// Accounting for one import pass.
#[derive(Debug)]
pub struct ImportOutcome {
    pub inserted: usize,
    pub total: usize,
    pub errors: Vec<String>,
}

impl ImportOutcome {
    pub fn status(&self) -> &'static str {
        if self.inserted > 0 {
            "success"
        } else {
            "error"
        }
    }
}

/// Import CSV data, optionally attributing rows to a log source.
///
/// The source's counters are bumped once after the pass, by the number of
/// rows that made it in; a failed counter update is reported as an extra
/// error entry but never retracts committed event rows.
pub async fn import_csv(
    storage: &dyn Storage,
    data: &[u8],
    log_source_id: Option<i64>,
) -> Result<ImportOutcome> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(data);

    let headers = reader
        .headers()
        .map_err(|e| PipelineError::invalid_input(format!("Invalid CSV header: {}", e)))?
        .clone();

    let mut inserted = 0usize;
    let mut total = 0usize;
    let mut errors = Vec::new();
    let now = Utc::now();

    for (idx, record) in reader.records().enumerate() {
        total += 1;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                errors.push(format!("Row {}: {}", idx, e));
                continue;
            }
        };

        let row: HashMap<String, String> = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.trim().to_string(), v.to_string()))
            .collect();

        let mut event = normalize::normalize_csv_row(&row, now);
        event.log_source_id = log_source_id;

        if event.message.is_empty() {
            errors.push(format!("Row {}: message is required", idx));
            continue;
        }

        match storage.insert_event(&event).await {
            Ok(_) => inserted += 1,
            Err(e) => {
                warn!(idx, error = %e, "CSV row insert failed");
                errors.push(format!("Row {}: {}", idx, e));
            }
        }
    }

    // Counters are best-effort; the event rows are authoritative.
    if let Some(source_id) = log_source_id {
        if inserted > 0 {
            if let Err(e) = storage.bump_source_stats(source_id, inserted as i64).await {
                warn!(source_id, error = %e, "source stats update failed");
                errors.push(format!("Failed to update source stats: {}", e));
            }
        }
    }

    info!(inserted, total, failed = errors.len(), "CSV import completed");

    Ok(ImportOutcome {
        inserted,
        total,
        errors,
    })
}
