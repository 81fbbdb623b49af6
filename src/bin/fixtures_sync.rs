use std::process::ExitCode;

use fixture_sync::config::{Config, JobSettings};
use fixture_sync::jobs::{run_job, FixturesStrategy};

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

    run_job(&cfg, FixturesStrategy, JobSettings::head_to_head()).await
}
