use chrono::{DateTime, Utc};
use serde_json::{json, Map};
use tracing::{error, info};

use crate::error::{AppError, Result};
use crate::state::StoreHandle;
use crate::types::{HealthRecord, RunStatus};

pub const HEALTH_ROOT: &str = "health";
pub const SYSTEM_HEALTH_PATH: &str = "health/system";

pub fn health_path(job: &str) -> String {
    StoreHandle::child(HEALTH_ROOT, job)
}

/// Outcome counters of one job run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounts {
    pub processed: u32,
    pub pending: u32,
    pub failed: u32,
}

/// Writes the per-job health snapshot at `health/{job}`.
pub struct HealthReporter<'a> {
    store: &'a StoreHandle,
    job: String,
    started_at: DateTime<Utc>,
}

impl<'a> HealthReporter<'a> {
    pub fn new(store: &'a StoreHandle, job: &str, started_at: DateTime<Utc>) -> Self {
        Self {
            store,
            job: job.to_string(),
            started_at,
        }
    }

    pub fn job(&self) -> &str {
        &self.job
    }

    /// Partial update stamping the run start; the rest of the record is left alone.
    pub async fn mark_started(&self) -> Result<()> {
        let mut partial = Map::new();
        partial.insert("last_started".to_string(), json!(self.started_at));
        self.store.update(&health_path(&self.job), &partial).await
    }

    pub async fn record_success(&self, counts: RunCounts, now: DateTime<Utc>) -> Result<()> {
        let record = self.build(RunStatus::Success, counts, None, now);
        self.store.set_as(&health_path(&self.job), &record).await?;
        info!(
            job = %self.job,
            processed = counts.processed,
            pending = counts.pending,
            failed = counts.failed,
            "[HEALTH] {} success: {} processed, {} pending, {} failed",
            self.job, counts.processed, counts.pending, counts.failed,
        );
        Ok(())
    }

    pub async fn record_error(&self, counts: RunCounts, message: &str, now: DateTime<Utc>) -> Result<()> {
        let record = self.build(RunStatus::Error, counts, Some(message.to_string()), now);
        self.store.set_as(&health_path(&self.job), &record).await
    }

    /// Error write that never fails the caller; a secondary failure is only logged.
    pub async fn record_error_best_effort(&self, counts: RunCounts, message: &str, now: DateTime<Utc>) {
        if let Err(e) = self.record_error(counts, message, now).await {
            error!(job = %self.job, "[HEALTH] failed to record error status: {e}");
        }
    }

    fn build(
        &self,
        status: RunStatus,
        counts: RunCounts,
        error_message: Option<String>,
        now: DateTime<Utc>,
    ) -> HealthRecord {
        let elapsed = now.signed_duration_since(self.started_at);
        HealthRecord {
            last_run: now,
            status,
            processed_count: counts.processed,
            pending_count: counts.pending,
            failed_count: counts.failed,
            last_started: Some(self.started_at),
            duration_secs: Some(elapsed.num_milliseconds().max(0) as f64 / 1000.0),
            error_message,
        }
    }
}

/// Force-write a health record, as the `set-health` tool does.
/// The monitor's own record at `health/system` is not a job and is refused.
pub async fn force_status(
    store: &StoreHandle,
    job: &str,
    status: RunStatus,
    message: Option<&str>,
    now: DateTime<Utc>,
) -> Result<HealthRecord> {
    if health_path(job) == SYSTEM_HEALTH_PATH {
        return Err(AppError::Config(format!("'{job}' is reserved for the system health record")));
    }
    let reporter = HealthReporter::new(store, job, now);
    let record = reporter.build(status, RunCounts::default(), message.map(str::to_string), now);
    store.set_as(&health_path(job), &record).await?;
    Ok(record)
}
