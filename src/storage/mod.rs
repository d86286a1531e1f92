//! Storage abstraction for the ingestion and reporting paths.
//!
//! The trait keeps handlers and services backend-agnostic: production runs on
//! Postgres, the test suites on the in-memory implementation.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{ActivityReport, Event, LogSource, NewActivityReport, NewEvent, NewLogSource};

pub use memory::MemoryStorage;
pub use postgres::PgStorage;

#[async_trait]
pub trait Storage: Send + Sync {
    // ------------------------------------------------------------------
    // Source registry
    // ------------------------------------------------------------------

    /// Exact-match lookup of an active source by API key. No side effects.
    async fn find_active_source_by_key(&self, api_key: &str) -> Result<Option<LogSource>>;

    async fn create_source(&self, new: &NewLogSource) -> Result<LogSource>;

    async fn list_sources(&self) -> Result<Vec<LogSource>>;

    /// Single atomic arithmetic update of a source's delivery statistics:
    /// `total_logs_received += delta`, `last_received = now`. One call per
    /// request, not one per record, to bound write amplification.
    async fn bump_source_stats(&self, source_id: i64, delta: i64) -> Result<()>;

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    async fn insert_event(&self, event: &NewEvent) -> Result<i64>;

    async fn latest_events(&self, limit: i64) -> Result<Vec<Event>>;

    /// Exact-match severity filter; an unknown severity string simply
    /// matches nothing.
    async fn events_by_severity(&self, severity: &str, limit: i64) -> Result<Vec<Event>>;

    // ------------------------------------------------------------------
    // Report inputs (users/groups are owned by the excluded CRUD layer;
    // this service only counts them)
    // ------------------------------------------------------------------

    async fn count_users_in_group(&self, group_id: i64) -> Result<i64>;

    async fn count_active_users_in_group(&self, group_id: i64, date: NaiveDate) -> Result<i64>;

    /// Events on `date`, across all groups.
    async fn count_events_on(&self, date: NaiveDate) -> Result<i64>;

    /// CRITICAL events on `date`, across all groups.
    async fn count_critical_events_on(&self, date: NaiveDate) -> Result<i64>;

    // ------------------------------------------------------------------
    // Reports
    // ------------------------------------------------------------------

    async fn find_report(&self, group_id: i64, date: NaiveDate) -> Result<Option<ActivityReport>>;

    /// Insert a computed report. A concurrent insert for the same
    /// (group_id, report_date) is a no-op, not an error; a missing group is
    /// a storage error (foreign key).
    async fn insert_report(&self, new: &NewActivityReport) -> Result<()>;

    // ------------------------------------------------------------------
    // Health
    // ------------------------------------------------------------------

    async fn ping(&self) -> Result<()>;
}
