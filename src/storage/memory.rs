//! In-memory storage backend.
//!
//! Backs the test suites and local experimentation without a running
//! Postgres. Mirrors the relational backend's observable behavior, including
//! the unique (group_id, report_date) key and the group foreign key on
//! report inserts. Failure-injection knobs let tests exercise the
//! partial-failure paths deterministically.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::error::{PipelineError, Result};
use crate::models::{
    ActivityReport, Event, Group, LogSource, NewActivityReport, NewEvent, NewLogSource, Severity,
    User,
};
use crate::storage::Storage;

#[derive(Default)]
struct Inner {
    sources: Vec<LogSource>,
    events: Vec<Event>,
    users: Vec<User>,
    groups: Vec<Group>,
    reports: Vec<ActivityReport>,
    next_source_id: i64,
    next_event_id: i64,
    next_user_id: i64,
    next_group_id: i64,
    next_report_id: i64,
}

#[derive(Default)]
pub struct MemoryStorage {
    inner: Mutex<Inner>,
    /// When set, `insert_event` fails for any message containing this marker.
    insert_poison: Mutex<Option<String>>,
    /// When set, `bump_source_stats` fails.
    fail_stats: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_inserts_containing(&self, marker: &str) {
        *self.insert_poison.lock().unwrap() = Some(marker.to_string());
    }

    pub fn fail_stats_updates(&self, fail: bool) {
        self.fail_stats.store(fail, Ordering::SeqCst);
    }

    pub fn add_source(
        &self,
        name: &str,
        source_type: &str,
        source_ip: Option<&str>,
        api_key: &str,
        is_active: bool,
    ) -> LogSource {
        let mut inner = self.inner.lock().unwrap();
        inner.next_source_id += 1;
        let source = LogSource {
            id: inner.next_source_id,
            name: name.to_string(),
            source_type: source_type.to_string(),
            source_ip: source_ip.map(|s| s.to_string()),
            api_key: api_key.to_string(),
            is_active,
            total_logs_received: 0,
            last_received: None,
            created_at: Utc::now(),
        };
        inner.sources.push(source.clone());
        source
    }

    pub fn add_group(&self, name: &str) -> i64 {
        let mut inner = self.inner.lock().unwrap();
        inner.next_group_id += 1;
        let id = inner.next_group_id;
        inner.groups.push(Group {
            id,
            name: name.to_string(),
            description: None,
            created_at: Utc::now(),
        });
        id
    }

    pub fn add_user(
        &self,
        username: &str,
        group_id: Option<i64>,
        last_login: Option<DateTime<Utc>>,
    ) -> i64 {
        let mut inner = self.inner.lock().unwrap();
        inner.next_user_id += 1;
        let id = inner.next_user_id;
        inner.users.push(User {
            id,
            username: username.to_string(),
            email: format!("{}@example.test", username),
            role: "User".to_string(),
            group_id,
            created_at: Utc::now(),
            last_login,
            is_active: true,
        });
        id
    }

    pub fn events(&self) -> Vec<Event> {
        self.inner.lock().unwrap().events.clone()
    }

    pub fn source(&self, id: i64) -> Option<LogSource> {
        self.inner
            .lock()
            .unwrap()
            .sources
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn find_active_source_by_key(&self, api_key: &str) -> Result<Option<LogSource>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .sources
            .iter()
            .find(|s| s.api_key == api_key && s.is_active)
            .cloned())
    }

    async fn create_source(&self, new: &NewLogSource) -> Result<LogSource> {
        let mut inner = self.inner.lock().unwrap();
        if inner.sources.iter().any(|s| s.api_key == new.api_key) {
            return Err(PipelineError::database(
                "duplicate key value violates unique constraint \"log_sources_api_key_key\"",
            ));
        }
        inner.next_source_id += 1;
        let source = LogSource {
            id: inner.next_source_id,
            name: new.name.clone(),
            source_type: new.source_type.clone(),
            source_ip: new.source_ip.clone(),
            api_key: new.api_key.clone(),
            is_active: true,
            total_logs_received: 0,
            last_received: None,
            created_at: Utc::now(),
        };
        inner.sources.push(source.clone());
        Ok(source)
    }

    async fn list_sources(&self) -> Result<Vec<LogSource>> {
        let inner = self.inner.lock().unwrap();
        let mut sources = inner.sources.clone();
        sources.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sources)
    }

    async fn bump_source_stats(&self, source_id: i64, delta: i64) -> Result<()> {
        if self.fail_stats.load(Ordering::SeqCst) {
            return Err(PipelineError::database("stats update failed"));
        }
        let mut inner = self.inner.lock().unwrap();
        if let Some(source) = inner.sources.iter_mut().find(|s| s.id == source_id) {
            source.total_logs_received += delta;
            source.last_received = Some(Utc::now());
        }
        Ok(())
    }

    async fn insert_event(&self, event: &NewEvent) -> Result<i64> {
        if let Some(marker) = self.insert_poison.lock().unwrap().as_deref() {
            if event.message.contains(marker) {
                return Err(PipelineError::database("insert failed"));
            }
        }
        let mut inner = self.inner.lock().unwrap();
        inner.next_event_id += 1;
        let id = inner.next_event_id;
        inner.events.push(Event {
            id,
            timestamp: event.timestamp,
            severity: event.severity,
            source_ip: event.source_ip.clone(),
            source_host: event.source_host.clone(),
            event_type: event.event_type.clone(),
            message: event.message.clone(),
            raw_log: event.raw_log.clone(),
            user_id: event.user_id,
            log_source_id: event.log_source_id,
        });
        Ok(id)
    }

    async fn latest_events(&self, limit: i64) -> Result<Vec<Event>> {
        let inner = self.inner.lock().unwrap();
        let mut events = inner.events.clone();
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        events.truncate(limit.max(0) as usize);
        Ok(events)
    }

    async fn events_by_severity(&self, severity: &str, limit: i64) -> Result<Vec<Event>> {
        let inner = self.inner.lock().unwrap();
        let mut events: Vec<Event> = inner
            .events
            .iter()
            .filter(|e| e.severity.as_str() == severity)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        events.truncate(limit.max(0) as usize);
        Ok(events)
    }

    async fn count_users_in_group(&self, group_id: i64) -> Result<i64> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .users
            .iter()
            .filter(|u| u.group_id == Some(group_id))
            .count() as i64)
    }

    async fn count_active_users_in_group(&self, group_id: i64, date: NaiveDate) -> Result<i64> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .users
            .iter()
            .filter(|u| u.group_id == Some(group_id))
            .filter(|u| u.last_login.map(|t| t.date_naive()) == Some(date))
            .count() as i64)
    }

    async fn count_events_on(&self, date: NaiveDate) -> Result<i64> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .events
            .iter()
            .filter(|e| e.timestamp.date_naive() == date)
            .count() as i64)
    }

    async fn count_critical_events_on(&self, date: NaiveDate) -> Result<i64> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .events
            .iter()
            .filter(|e| e.severity == Severity::Critical && e.timestamp.date_naive() == date)
            .count() as i64)
    }

    async fn find_report(&self, group_id: i64, date: NaiveDate) -> Result<Option<ActivityReport>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .reports
            .iter()
            .find(|r| r.group_id == group_id && r.report_date == date)
            .cloned())
    }

    async fn insert_report(&self, new: &NewActivityReport) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.groups.iter().any(|g| g.id == new.group_id) {
            return Err(PipelineError::database(
                "insert or update on table \"activity_reports\" violates foreign key constraint",
            ));
        }
        // Unique (group_id, report_date): the losing insert of a race is a
        // no-op, matching ON CONFLICT DO NOTHING.
        if inner
            .reports
            .iter()
            .any(|r| r.group_id == new.group_id && r.report_date == new.report_date)
        {
            return Ok(());
        }
        inner.next_report_id += 1;
        let id = inner.next_report_id;
        inner.reports.push(ActivityReport {
            id,
            group_id: new.group_id,
            report_date: new.report_date,
            total_users: new.total_users,
            active_users: new.active_users,
            total_events: new.total_events,
            critical_events: new.critical_events,
            unusual_behavior_count: new.unusual_behavior_count,
            missing_work_count: new.missing_work_count,
            rule_violations: new.rule_violations,
            summary: new.summary.clone(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
