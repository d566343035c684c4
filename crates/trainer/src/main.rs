//! DCRM Classifier Training - Entry Point
//!
//! Usage: `dcrm-train [config.toml]`. Settings not in the file fall back to
//! `DCRM_*` environment variables and then to built-in defaults.

use anyhow::Context;
use std::path::PathBuf;
use telemetry::init_logging;
use tracing::info;
use trainer::{TrainingConfig, TrainingPipeline};

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = TrainingConfig::load(config_path.as_deref())
        .context("Failed to load training configuration")?;

    init_logging(&config.logging)?;

    info!("=== DCRM Classifier Training v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Training configuration: {:?}", config);

    let report = TrainingPipeline::new(config)
        .run()
        .context("Training run failed")?;

    println!("{}", report.evaluation);
    println!("Feature Importances:");
    for (name, importance) in &report.feature_importances {
        println!("{name}: {importance:.4}");
    }
    if let Some(path) = &report.model_path {
        println!();
        println!("Model saved as {}", path.display());
    }
    info!("Report: {}", serde_json::to_string(&report)?);

    Ok(())
}
