//! Fault Classification Engine
//!
//! Random forest training and inference over DCRM feature vectors, plus the
//! persisted model artifact and the load-once engine used by the API.

mod artifact;
mod engine;
mod forest;
mod model;

pub use artifact::{decode_model, encode_model, load_model, save_model, ARTIFACT_VERSION};
pub use engine::{FaultClassifier, InferenceEngine, Prediction};
pub use forest::{ForestConfig, MaxFeatures, RandomForest};
pub use model::{TrainedModel, TrainingSample};

use thiserror::Error;

/// Errors during training and inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("Invalid training data: {0}")]
    InvalidTrainingData(String),
    #[error("Model artifact I/O error: {0}")]
    Io(String),
    #[error("Model artifact encoding error: {0}")]
    Serialization(String),
    #[error("Incompatible model artifact: {0}")]
    IncompatibleArtifact(String),
}

impl From<std::io::Error> for InferenceError {
    fn from(err: std::io::Error) -> Self {
        InferenceError::Io(err.to_string())
    }
}

impl From<postcard::Error> for InferenceError {
    fn from(err: postcard::Error) -> Self {
        InferenceError::Serialization(err.to_string())
    }
}
