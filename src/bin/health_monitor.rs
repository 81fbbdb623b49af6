use std::process::ExitCode;

use chrono::Utc;
use tracing::{error, info};

use fixture_sync::config::Config;
use fixture_sync::error::Result;
use fixture_sync::health::{notifier, Monitor};
use fixture_sync::state::StoreHandle;
use fixture_sync::types::SystemStatus;

/// Exits 0 whenever the check completed, degraded or not.
#[tokio::main]
async fn main() -> ExitCode {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            return ExitCode::FAILURE;
        }
    };
    fixture_sync::init_tracing(&cfg.log_level);

    match run(&cfg).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Health monitor failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cfg: &Config) -> Result<()> {
    let store = StoreHandle::new(&cfg.store_url, cfg.store_credential.as_deref());
    store.initialize().await?;
    let notifier = notifier::from_config(cfg)?;

    let report = Monitor::new(&store, notifier.as_ref(), cfg.monitor_jobs.clone())
        .check_all(Utc::now())
        .await?;

    match report.system.status {
        SystemStatus::Healthy => info!("All {} jobs healthy", report.checks.len()),
        SystemStatus::Error => info!(
            "{} issue(s) found, notification {}",
            report.system.issues.len(),
            if report.notified { "sent" } else { "not sent" },
        ),
    }
    Ok(())
}
