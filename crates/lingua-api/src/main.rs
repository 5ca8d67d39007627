//! Lingua API Server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p lingua-api
//! ```
//!
//! Configuration is loaded from environment variables (and `.env`).

use lingua_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "Server failed to start");
        eprintln!("lingua-api: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;

    if let Err(e) = try_init_tracing_with_config(&TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        env = ?config.app.env,
        port = config.api.port,
        registry = ?config.registry.backend,
        "Configuration loaded"
    );

    lingua_api::run(config).await?;

    Ok(())
}
