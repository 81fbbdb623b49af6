pub mod aggregator;
pub mod api;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod health;
pub mod jobs;
pub mod selector;
pub mod state;
pub mod types;

use tracing_subscriber::EnvFilter;

/// Console logging for every binary, filtered by LOG_LEVEL.
pub fn init_tracing(log_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .init();
}
