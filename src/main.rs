use std::sync::Arc;

use tracing::{error, info};

use fixture_sync::api::{router, ApiState};
use fixture_sync::config::Config;
use fixture_sync::error::Result;
use fixture_sync::state::StoreHandle;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    fixture_sync::init_tracing(&cfg.log_level);

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Store ---
    let store = StoreHandle::new(&cfg.store_url, cfg.store_credential.as_deref());
    store.initialize().await?;
    info!("Store ready at {}", redact(&cfg.store_url));

    // --- HTTP API server ---
    let app = router(ApiState { store: Arc::new(store) });
    let bind_addr = format!("0.0.0.0:{}", cfg.status_api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Status API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Drop any query string (it may carry a token) before logging the URL.
fn redact(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
