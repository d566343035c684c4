//! Health and Introspection Routes

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::unix_timestamp;
use crate::AppState;

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: f64,
}

/// Service description
#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub message: String,
    pub version: String,
    pub status: String,
    pub endpoints: BTreeMap<&'static str, &'static str>,
}

/// Health check handler
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        model_loaded: state.service.model_loaded(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        timestamp: unix_timestamp(),
    })
}

/// Service info and endpoint list
pub async fn index(State(state): State<Arc<AppState>>) -> Json<IndexResponse> {
    let endpoints = BTreeMap::from([
        ("GET /api/v1/health", "Check API health"),
        ("GET /api/v1/stream", "Get simulated real-time waveform data"),
        ("POST /api/v1/predict", "Analyze waveform and predict faults"),
        ("POST /api/v1/simulate", "Generate and analyze a synthetic waveform"),
        ("GET /metrics", "Prometheus metrics"),
    ]);

    Json(IndexResponse {
        message: "DCRM Real-Time Monitoring API".to_string(),
        version: state.version.clone(),
        status: "active".to_string(),
        endpoints,
    })
}

/// Prometheus text exposition
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::NOT_FOUND,
            "metrics exporter not installed".to_string(),
        ),
    }
}
