use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::{sleep, Instant};
use tracing::{error, info, warn};

use crate::config::JobSettings;
use crate::error::Result;
use crate::fetcher::{ApiClient, HttpTransport, ReqwestTransport};
use crate::health::{HealthReporter, RunCounts};
use crate::selector::Selection;
use crate::state::StoreHandle;

/// What a sync job selects, how it derives one record, and where the record lives.
#[async_trait]
pub trait SyncStrategy: Send + Sync {
    type Item: Send + Sync;
    type Record: Serialize + Send + Sync;

    /// Key under `health/`.
    fn job_name(&self) -> &'static str;

    async fn select(
        &self,
        store: &StoreHandle,
        now: DateTime<Utc>,
        settings: &JobSettings,
    ) -> Result<Selection<Self::Item>>;

    async fn derive<T: HttpTransport>(
        &self,
        client: &ApiClient<T>,
        item: &Self::Item,
        now: DateTime<Utc>,
    ) -> Result<Self::Record>;

    fn record_path(&self, item: &Self::Item) -> String;

    /// Short label for log lines.
    fn describe(&self, item: &Self::Item) -> String;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub selected: usize,
    pub total_pending: usize,
    pub processed: usize,
    pub failed: usize,
}

impl RunReport {
    /// Items still waiting after this run.
    pub fn pending(&self) -> usize {
        self.total_pending.saturating_sub(self.processed)
    }

    pub fn counts(&self) -> RunCounts {
        RunCounts {
            processed: self.processed as u32,
            pending: self.pending() as u32,
            failed: self.failed as u32,
        }
    }
}

/// Drives one invocation: select, then fetch/aggregate/store each item
/// sequentially, then report health.
pub struct JobRunner<'a, S, T = ReqwestTransport> {
    strategy: S,
    client: &'a ApiClient<T>,
    store: &'a StoreHandle,
    settings: JobSettings,
}

impl<'a, S: SyncStrategy, T: HttpTransport> JobRunner<'a, S, T> {
    pub fn new(strategy: S, client: &'a ApiClient<T>, store: &'a StoreHandle, settings: JobSettings) -> Self {
        Self { strategy, client, store, settings }
    }

    pub async fn run(&self) -> Result<RunReport> {
        self.run_at(Utc::now()).await
    }

    /// Run with `started_at` as the selection clock. Later timestamps advance
    /// from it by the elapsed runtime.
    pub async fn run_at(&self, started_at: DateTime<Utc>) -> Result<RunReport> {
        let clock = Instant::now();
        let reporter = HealthReporter::new(self.store, self.strategy.job_name(), started_at);

        match self.execute(&reporter, started_at, clock).await {
            Ok(report) => Ok(report),
            Err(e) => {
                error!(job = reporter.job(), "[JOB] {} failed: {e}", reporter.job());
                reporter
                    .record_error_best_effort(RunCounts::default(), &e.to_string(), advance(started_at, clock))
                    .await;
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        reporter: &HealthReporter<'_>,
        started_at: DateTime<Utc>,
        clock: Instant,
    ) -> Result<RunReport> {
        let job = self.strategy.job_name();

        self.store.initialize().await?;
        if let Err(e) = reporter.mark_started().await {
            warn!(job, "[JOB] could not stamp start time: {e}");
        }

        let selection = self.strategy.select(self.store, started_at, &self.settings).await?;
        let mut report = RunReport {
            selected: selection.items.len(),
            total_pending: selection.total_pending,
            ..RunReport::default()
        };
        info!(
            job,
            selected = report.selected,
            pending = report.total_pending,
            "[JOB] {job}: {} selected of {} pending",
            report.selected,
            report.total_pending,
        );

        for (idx, item) in selection.items.iter().enumerate() {
            if idx > 0 {
                sleep(self.settings.inter_item_delay).await;
            }
            let label = self.strategy.describe(item);

            let record = match self.strategy.derive(self.client, item, advance(started_at, clock)).await {
                Ok(record) => record,
                Err(e) => {
                    report.failed += 1;
                    warn!(job, item = %label, "[JOB] {job}: {label} skipped: {e}");
                    continue;
                }
            };

            match self.store.set_as(&self.strategy.record_path(item), &record).await {
                Ok(()) => {
                    report.processed += 1;
                    info!(job, item = %label, "[JOB] {job}: {label} stored");
                }
                Err(e) => {
                    report.failed += 1;
                    error!(job, item = %label, "[JOB] {job}: {label} commit failed: {e}");
                    if e.is_store_unavailable() {
                        if let Err(e) = self.store.reinitialize().await {
                            error!(job, "[JOB] store reinitialize failed: {e}");
                        }
                    }
                }
            }
        }

        self.client.log_latency();
        info!(
            job,
            processed = report.processed,
            failed = report.failed,
            remaining = report.pending(),
            "[JOB] {job} complete: {} processed, {} failed, {} still pending",
            report.processed,
            report.failed,
            report.pending(),
        );

        if let Err(e) = reporter.record_success(report.counts(), advance(started_at, clock)).await {
            error!(job, "[HEALTH] failed to record success status: {e}");
        }
        Ok(report)
    }
}

fn advance(started_at: DateTime<Utc>, clock: Instant) -> DateTime<Utc> {
    chrono::Duration::from_std(clock.elapsed())
        .map(|d| started_at + d)
        .unwrap_or(started_at)
}
