//! Server Settings

use crate::rate_limit::RateLimitConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use telemetry::LoggingConfig;
use waveform_sim::DEFAULT_NUM_SAMPLES;

/// API server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: String,
    /// Model artifact written by `dcrm-train`
    pub model_path: PathBuf,
    /// Samples per simulated or streamed waveform
    pub num_samples: usize,
    /// Install the Prometheus recorder and serve `/metrics`
    pub metrics_enabled: bool,
    pub logging: LoggingConfig,
    pub rate_limit: RateLimitConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            model_path: PathBuf::from("models/dcrm_fault_classifier.model"),
            num_samples: DEFAULT_NUM_SAMPLES,
            metrics_enabled: true,
            logging: LoggingConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from an optional TOML file, then `DCRM_*` environment variables
    /// (nested keys separated by `__`, e.g. `DCRM_RATE_LIMIT__ENABLED`)
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder
            .add_source(
                config::Environment::with_prefix("DCRM")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
