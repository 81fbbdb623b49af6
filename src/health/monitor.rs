use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use super::notifier::Notifier;
use super::reporter::{health_path, SYSTEM_HEALTH_PATH};
use crate::error::Result;
use crate::state::StoreHandle;
use crate::types::{SystemHealthRecord, SystemStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobCheck {
    pub job: String,
    pub status: CheckStatus,
    pub message: String,
}

impl JobCheck {
    fn ok(job: &str, message: String) -> Self {
        Self { job: job.to_string(), status: CheckStatus::Ok, message }
    }

    fn error(job: &str, message: String) -> Self {
        Self { job: job.to_string(), status: CheckStatus::Error, message }
    }

    pub fn is_ok(&self) -> bool {
        self.status == CheckStatus::Ok
    }
}

/// Outcome of one monitor pass.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorReport {
    pub checks: Vec<JobCheck>,
    pub system: SystemHealthRecord,
    pub notified: bool,
}

/// Evaluates a raw health record against a staleness threshold.
///
/// Works on the stored JSON rather than [`crate::types::HealthRecord`] so a
/// record with a broken `last_run` is reported as such instead of as missing.
pub fn evaluate(job: &str, record: Option<&Value>, max_hours: i64, now: DateTime<Utc>) -> JobCheck {
    let Some(record) = record else {
        return JobCheck::error(job, format!("{job}: no health record found"));
    };

    let last_run = record
        .get("last_run")
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok());
    let Some(last_run) = last_run else {
        return JobCheck::error(job, format!("{job}: last_run missing or unparseable"));
    };

    let hours = now.signed_duration_since(last_run.with_timezone(&Utc)).num_seconds() as f64 / 3600.0;
    if hours > max_hours as f64 {
        return JobCheck::error(job, format!("{job}: last run {hours:.1}h ago (max {max_hours}h)"));
    }

    let status = record.get("status").and_then(Value::as_str).unwrap_or("unknown");
    if status != "success" {
        let detail = record
            .get("error_message")
            .and_then(Value::as_str)
            .map(|m| format!(": {m}"))
            .unwrap_or_default();
        return JobCheck::error(job, format!("{job}: last run status {status}{detail}"));
    }

    JobCheck::ok(job, format!("{job}: last run {hours:.1}h ago"))
}

pub struct Monitor<'a> {
    store: &'a StoreHandle,
    notifier: &'a dyn Notifier,
    jobs: Vec<(String, i64)>,
}

impl<'a> Monitor<'a> {
    pub fn new(store: &'a StoreHandle, notifier: &'a dyn Notifier, jobs: Vec<(String, i64)>) -> Self {
        Self { store, notifier, jobs }
    }

    pub async fn check(&self, job: &str, max_hours: i64, now: DateTime<Utc>) -> Result<JobCheck> {
        let record = self.store.get(&health_path(job)).await?;
        Ok(evaluate(job, record.as_ref(), max_hours, now))
    }

    /// Checks every configured job, writes `health/system`, and sends one
    /// aggregated notification when anything is degraded.
    pub async fn check_all(&self, now: DateTime<Utc>) -> Result<MonitorReport> {
        let mut checks = Vec::with_capacity(self.jobs.len());
        for (job, max_hours) in &self.jobs {
            let check = self.check(job, *max_hours, now).await?;
            if check.is_ok() {
                info!("[MONITOR] {}", check.message);
            } else {
                warn!("[MONITOR] {}", check.message);
            }
            checks.push(check);
        }

        let issues: Vec<String> = checks.iter().filter(|c| !c.is_ok()).map(|c| c.message.clone()).collect();
        let system = SystemHealthRecord {
            last_check: now,
            status: if issues.is_empty() { SystemStatus::Healthy } else { SystemStatus::Error },
            issues,
        };
        self.store.set_as(SYSTEM_HEALTH_PATH, &system).await?;

        let mut notified = false;
        if !system.issues.is_empty() {
            let text = format!(
                "Pipeline health degraded ({} issue(s)):\n{}",
                system.issues.len(),
                system.issues.iter().map(|i| format!("- {i}")).collect::<Vec<_>>().join("\n"),
            );
            match self.notifier.notify(&text).await {
                Ok(()) => notified = true,
                Err(e) => error!("[MONITOR] notification failed: {e}"),
            }
        }

        info!(
            jobs = checks.len(),
            issues = system.issues.len(),
            "[MONITOR] system status {:?}",
            system.status,
        );
        Ok(MonitorReport { checks, system, notified })
    }
}
