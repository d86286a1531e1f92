//! Log source identities: the registry of clients allowed to submit events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered ingest client. Sources are never deleted, only deactivated;
/// an inactive source's API key stops authenticating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSource {
    pub id: i64,
    pub name: String,
    pub source_type: String,
    pub source_ip: Option<String>,
    pub api_key: String,
    pub is_active: bool,
    pub total_logs_received: i64,
    pub last_received: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Registration shape for a new source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLogSource {
    pub name: String,
    pub source_type: String,
    pub source_ip: Option<String>,
    pub api_key: String,
}
