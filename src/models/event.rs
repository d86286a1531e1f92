//! Canonical event model shared by every ingestion path.
//!
//! All three input shapes (JSON object, raw syslog text, CSV row) normalize
//! into [`NewEvent`] before touching storage; [`Event`] is the persisted row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event severity levels, stored upper-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }

    /// Lenient parse: unknown or missing tokens fall back to INFO so a source
    /// sending an odd severity label does not lose the record.
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_uppercase().as_str() {
            "WARNING" => Severity::Warning,
            "ERROR" => Severity::Error,
            "CRITICAL" => Severity::Critical,
            _ => Severity::Info,
        }
    }

    /// Vocabulary translation for the bulk CSV import's `Level` column.
    pub fn from_csv_level(level: &str) -> Self {
        match level.trim() {
            "Warning" => Severity::Warning,
            "Major" => Severity::Error,
            "Critical" => Severity::Critical,
            _ => Severity::Info,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted log event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub source_ip: Option<String>,
    pub source_host: Option<String>,
    pub event_type: Option<String>,
    pub message: String,
    pub raw_log: Option<String>,
    pub user_id: Option<i64>,
    pub log_source_id: Option<i64>,
}

/// Insert shape for one event. Immutable after insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub source_ip: Option<String>,
    pub source_host: Option<String>,
    pub event_type: Option<String>,
    pub message: String,
    pub raw_log: Option<String>,
    pub user_id: Option<i64>,
    pub log_source_id: Option<i64>,
}

impl NewEvent {
    pub fn new(severity: Severity, message: String, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            severity,
            source_ip: None,
            source_host: None,
            event_type: None,
            message,
            raw_log: None,
            user_id: None,
            log_source_id: None,
        }
    }

    pub fn with_source(mut self, log_source_id: i64) -> Self {
        self.log_source_id = Some(log_source_id);
        self
    }
}
