//! Event normalization: maps the three accepted input shapes (JSON object,
//! raw syslog text, CSV row) into the canonical [`NewEvent`].
//!
//! Normalization is lenient about optional fields and field-name variants;
//! the only per-record rejection is a message that would end up empty.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::models::{LogSource, NewEvent, Severity};

/// Raw syslog bodies are stored whole in `raw_log` but the message column is
/// capped at this many characters.
pub const SYSLOG_MESSAGE_MAX: usize = 500;

/// Timestamp layouts accepted from the CSV `Time` column, tried in order
/// after RFC 3339.
const CSV_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%m/%d/%Y %H:%M:%S"];

/// Normalize one structured record from a JSON batch.
///
/// `now` is the ingestion time, used when the record carries no usable
/// timestamp. The error string is a per-record reason; it never aborts the
/// surrounding batch.
pub fn normalize_json(record: &Value, now: DateTime<Utc>) -> Result<NewEvent, String> {
    let obj = match record.as_object() {
        Some(obj) => obj,
        None => return Err("record is not a JSON object".to_string()),
    };

    let message = obj
        .get("message")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    if message.is_empty() {
        return Err("message is required".to_string());
    }

    let severity = obj
        .get("severity")
        .and_then(|v| v.as_str())
        .map(Severity::from_token)
        .unwrap_or(Severity::Info);

    let timestamp = obj
        .get("timestamp")
        .and_then(|v| v.as_str())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(now);

    let source_ip = string_field(obj, &["source_ip", "host"]);
    let source_host = string_field(obj, &["source_host", "hostname"]);
    let event_type = string_field(obj, &["event_type", "type"]);

    // Unmapped shapes still keep their full payload for audit.
    let raw_log = obj
        .get("raw_log")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .unwrap_or_else(|| canonical_json(record));

    Ok(NewEvent {
        timestamp,
        severity,
        source_ip,
        source_host,
        event_type,
        message,
        raw_log: Some(raw_log),
        user_id: None,
        log_source_id: None,
    })
}

/// Normalize a raw syslog body into a single event attributed to `source`.
/// The caller has already rejected empty bodies.
pub fn normalize_syslog(body: &str, source: &LogSource, now: DateTime<Utc>) -> NewEvent {
    let message: String = body.chars().take(SYSLOG_MESSAGE_MAX).collect();

    NewEvent {
        timestamp: now,
        severity: Severity::Info,
        source_ip: source.source_ip.clone(),
        source_host: Some(source.name.clone()),
        event_type: Some("SYSLOG".to_string()),
        message,
        raw_log: Some(body.to_string()),
        user_id: None,
        log_source_id: Some(source.id),
    }
}

/// Normalize one CSV row (header -> value) from the bulk import.
///
/// The message is `"<Operation> - <Details>"`; because of the separator it is
/// never empty, even when both columns are blank.
pub fn normalize_csv_row(row: &HashMap<String, String>, now: DateTime<Utc>) -> NewEvent {
    let severity = row
        .get("Level")
        .map(|level| Severity::from_csv_level(level))
        .unwrap_or(Severity::Info);

    let operation = row.get("Operation").map(String::as_str).unwrap_or_default();
    let details = row.get("Details").map(String::as_str).unwrap_or_default();
    let message = format!("{} - {}", operation, details);

    let timestamp = row
        .get("Time")
        .and_then(|s| parse_csv_time(s))
        .unwrap_or(now);

    NewEvent {
        timestamp,
        severity,
        source_ip: non_empty(row.get("Terminal IP Address")),
        source_host: non_empty(row.get("Source")),
        event_type: non_empty(row.get("Operation")),
        message,
        raw_log: Some(canonical_row(row)),
        user_id: None,
        log_source_id: None,
    }
}

/// Stable key-sorted JSON text, so the audit fallback for unmapped payloads
/// is deterministic and testable.
pub fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let fields: Vec<String> = keys
                .into_iter()
                .map(|k| {
                    format!(
                        "{}:{}",
                        Value::String(k.clone()),
                        canonical_json(&map[k])
                    )
                })
                .collect();
            format!("{{{}}}", fields.join(","))
        }
        Value::Array(items) => {
            let fields: Vec<String> = items.iter().map(canonical_json).collect();
            format!("[{}]", fields.join(","))
        }
        other => other.to_string(),
    }
}

fn canonical_row(row: &HashMap<String, String>) -> String {
    let map: serde_json::Map<String, Value> = row
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    canonical_json(&Value::Object(map))
}

fn string_field(
    obj: &serde_json::Map<String, Value>,
    names: &[&str],
) -> Option<String> {
    names
        .iter()
        .find_map(|name| obj.get(*name))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

fn parse_csv_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    CSV_TIME_FORMATS.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(raw, fmt)
            .ok()
            .map(|naive| naive.and_utc())
    })
}
