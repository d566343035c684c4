//! Prediction and Simulation Routes

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    Json,
};
use data_validator::ValidationError;
use feature_engine::FaultType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::{unix_timestamp, FeaturesExtracted};
use crate::service::{Classification, ServiceError};
use crate::AppState;

/// Body of `POST /api/v1/predict`
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub waveform: Option<Vec<f64>>,
    pub time: Option<Vec<f64>>,
}

/// Body of `POST /api/v1/simulate`; every field is optional
#[derive(Debug, Default, Deserialize)]
pub struct SimulateRequest {
    pub fault_type: Option<String>,
    pub seed: Option<u64>,
}

/// Prediction result
#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub success: bool,
    pub predicted_fault: FaultType,
    /// Probability per label, in percent
    pub confidence: BTreeMap<FaultType, f64>,
    pub features_extracted: FeaturesExtracted,
    pub timestamp: f64,
}

impl From<&Classification> for PredictionResponse {
    fn from(c: &Classification) -> Self {
        Self {
            success: true,
            predicted_fault: c.prediction.fault_type,
            confidence: c
                .prediction
                .probabilities
                .iter()
                .map(|(&label, &p)| (label, p * 100.0))
                .collect(),
            features_extracted: FeaturesExtracted::from(&c.features),
            timestamp: unix_timestamp(),
        }
    }
}

/// Simulation result: the generated waveform plus its prediction
#[derive(Debug, Serialize)]
pub struct SimulationResponse {
    #[serde(flatten)]
    pub prediction: PredictionResponse,
    pub waveform: Vec<f64>,
    pub time: Vec<f64>,
    pub simulated_type: FaultType,
}

/// Classify a client-supplied waveform
pub async fn predict(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ServiceError> {
    let Json(request) = payload?;
    let waveform = request
        .waveform
        .ok_or(ValidationError::MissingField("waveform"))?;

    let classification = state.service.classify(&waveform, request.time.as_deref())?;
    Ok(Json(PredictionResponse::from(&classification)))
}

/// Generate a synthetic waveform and classify it.
///
/// An empty body simulates a normal waveform.
pub async fn simulate(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<SimulationResponse>, ServiceError> {
    let request: SimulateRequest = if body.iter().all(u8::is_ascii_whitespace) {
        SimulateRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ServiceError::BadRequest(e.to_string()))?
    };

    let fault_type = match request.fault_type.as_deref() {
        Some(name) => name.parse::<FaultType>()?,
        None => FaultType::Normal,
    };

    let simulation = state.service.simulate(fault_type, request.seed)?;
    Ok(Json(SimulationResponse {
        prediction: PredictionResponse::from(&simulation.classification),
        waveform: simulation.waveform.resistance,
        time: simulation.waveform.time,
        simulated_type: simulation.fault_type,
    }))
}
