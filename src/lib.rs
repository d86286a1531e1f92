//! SIEM log ingestion pipeline and reporting aggregator.
//!
//! Accepts event submissions from API-key authenticated sources in three
//! shapes (JSON batches, raw syslog text, bulk CSV uploads), normalizes them
//! into one canonical event record, persists them with per-record isolation,
//! tracks per-source delivery statistics, and serves cached daily activity
//! reports per group.

pub mod config;
pub mod error;
pub mod handlers;
pub mod import;
pub mod ingest;
pub mod models;
pub mod normalize;
pub mod reports;
pub mod router;
pub mod sources;
pub mod state;
pub mod storage;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use router::create_router;
pub use state::AppState;
