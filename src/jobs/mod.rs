pub mod fixtures;
pub mod h2h;
pub mod runner;
pub mod team_stats;

use std::process::ExitCode;

use tracing::error;

pub use fixtures::FixturesStrategy;
pub use h2h::HeadToHeadStrategy;
pub use runner::{JobRunner, RunReport, SyncStrategy};
pub use team_stats::TeamStatsStrategy;

use crate::config::{Config, JobSettings};
use crate::fetcher::ApiClient;
use crate::health::{HealthReporter, RunCounts};
use crate::state::StoreHandle;

/// Entry point shared by the sync binaries: 0 on a completed run (including
/// "nothing to do"), 1 on any run-level failure.
pub async fn run_job<S: SyncStrategy>(cfg: &Config, strategy: S, settings: JobSettings) -> ExitCode {
    let store = StoreHandle::new(&cfg.store_url, cfg.store_credential.as_deref());
    let job = strategy.job_name();

    let client = match ApiClient::from_config(cfg) {
        Ok(c) => c,
        Err(e) => {
            error!(job, "[JOB] {job} cannot start: {e}");
            HealthReporter::new(&store, job, chrono::Utc::now())
                .record_error_best_effort(RunCounts::default(), &e.to_string(), chrono::Utc::now())
                .await;
            return ExitCode::FAILURE;
        }
    };

    match JobRunner::new(strategy, &client, &store, settings).run().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}
