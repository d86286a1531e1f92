//! Postgres-backed storage.
//!
//! All SQL lives here; callers never see sqlx types. Statement failures are
//! wrapped into `PipelineError::DatabaseError` with enough context to log.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{Pool, Postgres, Row};
use std::time::Duration;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::error::{PipelineError, Result};
use crate::models::{
    ActivityReport, Event, LogSource, NewActivityReport, NewEvent, NewLogSource, Severity,
};
use crate::storage::Storage;

#[derive(Debug, Clone)]
pub struct PgStorage {
    pool: Pool<Postgres>,
}

impl PgStorage {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(&config.connect_url())
            .await
            .map_err(|e| PipelineError::database(format!("Failed to create connection pool: {}", e)))?;

        info!("Database connection pool created");
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| PipelineError::database(format!("Failed to run migrations: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

fn source_from_row(row: &PgRow) -> Result<LogSource> {
    Ok(LogSource {
        id: row.try_get("id").map_err(db_err)?,
        name: row.try_get("name").map_err(db_err)?,
        source_type: row.try_get("source_type").map_err(db_err)?,
        source_ip: row.try_get("source_ip").map_err(db_err)?,
        api_key: row
            .try_get::<Option<String>, _>("api_key")
            .map_err(db_err)?
            .unwrap_or_default(),
        is_active: row.try_get("is_active").map_err(db_err)?,
        total_logs_received: row.try_get("total_logs_received").map_err(db_err)?,
        last_received: row.try_get("last_received").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
    })
}

fn event_from_row(row: &PgRow) -> Result<Event> {
    let severity: String = row.try_get("severity").map_err(db_err)?;
    Ok(Event {
        id: row.try_get("id").map_err(db_err)?,
        timestamp: row.try_get("timestamp").map_err(db_err)?,
        severity: Severity::from_token(&severity),
        source_ip: row.try_get("source_ip").map_err(db_err)?,
        source_host: row.try_get("source_host").map_err(db_err)?,
        event_type: row.try_get("event_type").map_err(db_err)?,
        message: row.try_get("message").map_err(db_err)?,
        raw_log: row.try_get("raw_log").map_err(db_err)?,
        user_id: row.try_get("user_id").map_err(db_err)?,
        log_source_id: row.try_get("log_source_id").map_err(db_err)?,
    })
}

fn report_from_row(row: &PgRow) -> Result<ActivityReport> {
    Ok(ActivityReport {
        id: row.try_get("id").map_err(db_err)?,
        group_id: row.try_get("group_id").map_err(db_err)?,
        report_date: row.try_get("report_date").map_err(db_err)?,
        total_users: row.try_get("total_users").map_err(db_err)?,
        active_users: row.try_get("active_users").map_err(db_err)?,
        total_events: row.try_get("total_events").map_err(db_err)?,
        critical_events: row.try_get("critical_events").map_err(db_err)?,
        unusual_behavior_count: row.try_get("unusual_behavior_count").map_err(db_err)?,
        missing_work_count: row.try_get("missing_work_count").map_err(db_err)?,
        rule_violations: row.try_get("rule_violations").map_err(db_err)?,
        summary: row
            .try_get::<Option<String>, _>("summary")
            .map_err(db_err)?
            .unwrap_or_default(),
        created_at: row.try_get("created_at").map_err(db_err)?,
    })
}

fn db_err(e: sqlx::Error) -> PipelineError {
    PipelineError::database(e.to_string())
}

#[async_trait]
impl Storage for PgStorage {
    async fn find_active_source_by_key(&self, api_key: &str) -> Result<Option<LogSource>> {
        let row = sqlx::query(
            "SELECT * FROM log_sources WHERE api_key = $1 AND is_active = TRUE",
        )
        .bind(api_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PipelineError::database(format!("Failed to look up API key: {}", e)))?;

        row.as_ref().map(source_from_row).transpose()
    }

    async fn create_source(&self, new: &NewLogSource) -> Result<LogSource> {
        let row = sqlx::query(
            r#"
            INSERT INTO log_sources (name, source_type, source_ip, api_key)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&new.name)
        .bind(&new.source_type)
        .bind(&new.source_ip)
        .bind(&new.api_key)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PipelineError::database(format!("Failed to create log source: {}", e)))?;

        source_from_row(&row)
    }

    async fn list_sources(&self) -> Result<Vec<LogSource>> {
        let rows = sqlx::query("SELECT * FROM log_sources ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PipelineError::database(format!("Failed to list log sources: {}", e)))?;

        rows.iter().map(source_from_row).collect()
    }

    async fn bump_source_stats(&self, source_id: i64, delta: i64) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE log_sources
            SET total_logs_received = total_logs_received + $1, last_received = NOW()
            WHERE id = $2
            "#,
        )
        .bind(delta)
        .bind(source_id)
        .execute(&self.pool)
        .await
        .map_err(|e| PipelineError::database(format!("Failed to update source stats: {}", e)))?;

        Ok(())
    }

    async fn insert_event(&self, event: &NewEvent) -> Result<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO syslog_events
                (timestamp, severity, source_ip, source_host, event_type, message,
                 raw_log, user_id, log_source_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(event.timestamp)
        .bind(event.severity.as_str())
        .bind(&event.source_ip)
        .bind(&event.source_host)
        .bind(&event.event_type)
        .bind(&event.message)
        .bind(&event.raw_log)
        .bind(event.user_id)
        .bind(event.log_source_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PipelineError::database(format!("Failed to insert event: {}", e)))?;

        row.try_get("id").map_err(db_err)
    }

    async fn latest_events(&self, limit: i64) -> Result<Vec<Event>> {
        let rows = sqlx::query("SELECT * FROM syslog_events ORDER BY timestamp DESC LIMIT $1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| PipelineError::database(format!("Failed to fetch events: {}", e)))?;

        rows.iter().map(event_from_row).collect()
    }

    async fn events_by_severity(&self, severity: &str, limit: i64) -> Result<Vec<Event>> {
        let rows = sqlx::query(
            "SELECT * FROM syslog_events WHERE severity = $1 ORDER BY timestamp DESC LIMIT $2",
        )
        .bind(severity)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PipelineError::database(format!("Failed to fetch events: {}", e)))?;

        rows.iter().map(event_from_row).collect()
    }

    async fn count_users_in_group(&self, group_id: i64) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE group_id = $1")
            .bind(group_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PipelineError::database(format!("Failed to count users: {}", e)))
    }

    async fn count_active_users_in_group(&self, group_id: i64, date: NaiveDate) -> Result<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE group_id = $1 AND last_login::date = $2",
        )
        .bind(group_id)
        .bind(date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PipelineError::database(format!("Failed to count active users: {}", e)))
    }

    async fn count_events_on(&self, date: NaiveDate) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM syslog_events WHERE timestamp::date = $1")
            .bind(date)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PipelineError::database(format!("Failed to count events: {}", e)))
    }

    async fn count_critical_events_on(&self, date: NaiveDate) -> Result<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM syslog_events WHERE severity = 'CRITICAL' AND timestamp::date = $1",
        )
        .bind(date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PipelineError::database(format!("Failed to count critical events: {}", e)))
    }

    async fn find_report(&self, group_id: i64, date: NaiveDate) -> Result<Option<ActivityReport>> {
        let row = sqlx::query(
            "SELECT * FROM activity_reports WHERE group_id = $1 AND report_date = $2",
        )
        .bind(group_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PipelineError::database(format!("Failed to fetch report: {}", e)))?;

        row.as_ref().map(report_from_row).transpose()
    }

    async fn insert_report(&self, new: &NewActivityReport) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO activity_reports
                (group_id, report_date, total_users, active_users, total_events,
                 critical_events, unusual_behavior_count, missing_work_count,
                 rule_violations, summary)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (group_id, report_date) DO NOTHING
            "#,
        )
        .bind(new.group_id)
        .bind(new.report_date)
        .bind(new.total_users)
        .bind(new.active_users)
        .bind(new.total_events)
        .bind(new.critical_events)
        .bind(new.unusual_behavior_count)
        .bind(new.missing_work_count)
        .bind(new.rule_violations)
        .bind(&new.summary)
        .execute(&self.pool)
        .await
        .map_err(|e| PipelineError::database(format!("Failed to insert report: {}", e)))?;

        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| PipelineError::database(format!("Health check failed: {}", e)))?;
        Ok(())
    }
}
