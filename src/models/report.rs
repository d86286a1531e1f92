//! Cached daily activity reports, one row per (group, date).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityReport {
    pub id: i64,
    pub group_id: i64,
    pub report_date: NaiveDate,
    pub total_users: i64,
    pub active_users: i64,
    pub total_events: i64,
    pub critical_events: i64,
    pub unusual_behavior_count: i64,
    pub missing_work_count: i64,
    pub rule_violations: i64,
    pub summary: String,
    pub created_at: DateTime<Utc>,
}

/// Insert shape for a freshly computed report. The (group_id, report_date)
/// pair is unique at the storage layer; concurrent generation races resolve
/// by the second insert becoming a no-op.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewActivityReport {
    pub group_id: i64,
    pub report_date: NaiveDate,
    pub total_users: i64,
    pub active_users: i64,
    pub total_events: i64,
    pub critical_events: i64,
    pub unusual_behavior_count: i64,
    pub missing_work_count: i64,
    pub rule_violations: i64,
    pub summary: String,
}
