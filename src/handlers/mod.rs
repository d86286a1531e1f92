//! HTTP handlers, grouped by surface.

pub mod health;
pub mod import;
pub mod ingest;
pub mod logs;
pub mod reports;
pub mod sources;

pub use health::health_check;
pub use import::import_csv;
pub use ingest::{ingest_events, ingest_syslog};
pub use logs::{get_latest_logs, get_logs};
pub use reports::get_daily_report;
pub use sources::{create_log_source, get_log_sources};
