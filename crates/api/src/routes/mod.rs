//! HTTP Routes

pub mod classify;
pub mod health;
pub mod stream;

use axum::{
    extract::rejection::JsonRejection,
    response::{IntoResponse, Response},
    Json,
};
use feature_engine::FeatureVector;
use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::service::ServiceError;

/// Seconds since the Unix epoch, with sub-second precision
pub(crate) fn unix_timestamp() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Feature subset reported with every prediction
#[derive(Debug, Serialize)]
pub struct FeaturesExtracted {
    pub num_peaks: usize,
    pub max_peak_height: f64,
    pub mean: f64,
    pub std: f64,
    pub plateau_duration: f64,
    pub max_slope: f64,
    pub min_slope: f64,
}

impl From<&FeatureVector> for FeaturesExtracted {
    fn from(f: &FeatureVector) -> Self {
        Self {
            num_peaks: f.num_peaks,
            max_peak_height: f.max_peak_height,
            mean: f.mean,
            std: f.std,
            plateau_duration: f.plateau_duration,
            max_slope: f.max_slope,
            min_slope: f.min_slope,
        }
    }
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        metrics::counter!("dcrm_prediction_errors_total", "kind" => self.kind()).increment(1);

        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}
