//! Stream Route

use axum::{extract::State, Json};
use feature_engine::FaultType;
use serde::Serialize;
use std::sync::Arc;

use super::unix_timestamp;
use crate::AppState;

/// One simulated waveform for the live dashboard
#[derive(Debug, Serialize)]
pub struct StreamResponse {
    pub success: bool,
    pub waveform: Vec<f64>,
    pub time: Vec<f64>,
    pub simulated_type: FaultType,
    pub timestamp: f64,
}

/// Random synthetic waveform, biased toward normal, without classification
pub async fn get_stream(State(state): State<Arc<AppState>>) -> Json<StreamResponse> {
    let (fault_type, waveform) = state.service.stream();
    Json(StreamResponse {
        success: true,
        waveform: waveform.resistance,
        time: waveform.time,
        simulated_type: fault_type,
        timestamp: unix_timestamp(),
    })
}
