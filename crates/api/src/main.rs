//! DCRM Fault Classification Server - Main Entry Point
//!
//! Usage: `dcrm-server [server.toml]`.

use anyhow::Context;
use api::{init_logging, run_server, ServerConfig};
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = ServerConfig::load(config_path.as_deref())
        .context("Failed to load server configuration")?;

    init_logging(&config.logging)?;

    info!("=== DCRM Fault Classification API v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Model artifact: {}", config.model_path.display());

    run_server(config).await
}
