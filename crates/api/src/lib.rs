//! DCRM Fault Classification API Server
//!
//! REST API that classifies DC resistance waveforms with the trained model
//! and serves synthetic waveforms for the monitoring dashboard.

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use inference_engine::InferenceEngine;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_governor::GovernorLayer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

pub mod rate_limit;
mod routes;
mod service;
mod settings;

pub use rate_limit::{create_governor_config, RateLimitConfig, RateLimitError};
pub use routes::classify::{PredictRequest, PredictionResponse, SimulateRequest, SimulationResponse};
pub use service::{Classification, ClassificationService, ServiceError, Simulation};
pub use settings::ServerConfig;
pub use telemetry::{init_logging, LoggingConfig};

/// Application state shared across handlers
pub struct AppState {
    /// Classification front end
    pub service: ClassificationService,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
    /// Prometheus handle, when the recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new application state
    pub fn new(service: ClassificationService, metrics: Option<PrometheusHandle>) -> Self {
        Self {
            service,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
            metrics,
        }
    }
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::health::index))
        .route("/metrics", get(routes::health::metrics))
        .route("/api/v1/health", get(routes::health::health))
        .route("/api/v1/stream", get(routes::stream::get_stream))
        .route("/api/v1/predict", post(routes::classify::predict))
        .route("/api/v1/simulate", post(routes::classify::simulate))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the server
pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let engine = InferenceEngine::load_or_unloaded(&config.model_path);
    if !engine.is_loaded() {
        warn!("Serving without a model; predictions will return 503 until one is trained");
    }

    let metrics = if config.metrics_enabled {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(handle)
    } else {
        None
    };

    let service = ClassificationService::new(Arc::new(engine), config.num_samples);
    let state = Arc::new(AppState::new(service, metrics));
    let mut app = create_router(state);

    if config.rate_limit.enabled {
        let governor = create_governor_config(&config.rate_limit)?;
        info!(
            "Rate limiting enabled: burst {} replenished every {}s",
            config.rate_limit.burst_size, config.rate_limit.per_second
        );
        app = app.layer(GovernorLayer { config: governor });
    }

    info!("Starting API server on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
