use std::process::ExitCode;

use chrono::Utc;
use clap::Parser;
use tracing::{error, info};

use fixture_sync::config::Config;
use fixture_sync::health::reporter::force_status;
use fixture_sync::state::StoreHandle;
use fixture_sync::types::RunStatus;

/// Force-write a job health record.
#[derive(Parser, Debug)]
#[command(name = "set-health", version)]
struct Args {
    /// Job name, written to health/<component>
    #[arg(long)]
    component: String,

    /// success or error
    #[arg(long)]
    status: RunStatus,

    #[arg(long)]
    message: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            return ExitCode::FAILURE;
        }
    };
    fixture_sync::init_tracing(&cfg.log_level);

    let store = StoreHandle::new(&cfg.store_url, cfg.store_credential.as_deref());
    match force_status(&store, &args.component, args.status, args.message.as_deref(), Utc::now()).await {
        Ok(record) => {
            info!("health/{} set to {}", args.component, record.status);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to write health/{}: {e}", args.component);
            ExitCode::FAILURE
        }
    }
}
