//! Source registry: API-key authentication and source administration.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{PipelineError, Result};
use crate::models::{LogSource, NewLogSource};
use crate::storage::Storage;

/// Authenticate an ingest client by API key.
///
/// A missing credential and an invalid (or deactivated) credential are
/// distinct failures, mirrored by 401 vs 403 at the HTTP boundary. Lookup has
/// no side effects.
pub async fn authenticate(storage: &dyn Storage, api_key: Option<&str>) -> Result<LogSource> {
    let api_key = match api_key {
        Some(key) if !key.is_empty() => key,
        _ => return Err(PipelineError::unauthorized("API key required")),
    };

    match storage.find_active_source_by_key(api_key).await? {
        Some(source) => {
            debug!(source_id = source.id, source = %source.name, "source authenticated");
            Ok(source)
        }
        None => {
            warn!("rejected ingest request with unknown or inactive API key");
            Err(PipelineError::forbidden("Invalid API key"))
        }
    }
}

/// Register a new log source. A v4 UUID key is generated when the caller does
/// not supply one.
pub async fn create_source(
    storage: &dyn Storage,
    name: String,
    source_type: String,
    source_ip: Option<String>,
    api_key: Option<String>,
) -> Result<LogSource> {
    if name.trim().is_empty() {
        return Err(PipelineError::invalid_input("Source name is required"));
    }
    if source_type.trim().is_empty() {
        return Err(PipelineError::invalid_input("Source type is required"));
    }

    let new = NewLogSource {
        name,
        source_type,
        source_ip,
        api_key: api_key.unwrap_or_else(|| Uuid::new_v4().to_string()),
    };
    storage.create_source(&new).await
}

pub async fn list_sources(storage: &dyn Storage) -> Result<Vec<LogSource>> {
    storage.list_sources().await
}
