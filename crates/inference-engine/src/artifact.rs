//! Model Artifact Persistence
//!
//! A model is stored as a postcard-encoded envelope: magic tag, format
//! version and the trained model itself.

use crate::model::TrainedModel;
use crate::InferenceError;
use feature_engine::FEATURE_VERSION;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

const ARTIFACT_MAGIC: [u8; 4] = *b"DCRM";

/// Current envelope format version
pub const ARTIFACT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct ModelArtifact {
    magic: [u8; 4],
    format_version: u32,
    model: TrainedModel,
}

#[derive(Serialize)]
struct ModelArtifactRef<'a> {
    magic: [u8; 4],
    format_version: u32,
    model: &'a TrainedModel,
}

/// Encode a model into artifact bytes
pub fn encode_model(model: &TrainedModel) -> Result<Vec<u8>, InferenceError> {
    let artifact = ModelArtifactRef {
        magic: ARTIFACT_MAGIC,
        format_version: ARTIFACT_VERSION,
        model,
    };
    Ok(postcard::to_allocvec(&artifact)?)
}

/// Decode artifact bytes, rejecting foreign or incompatible artifacts
pub fn decode_model(bytes: &[u8]) -> Result<TrainedModel, InferenceError> {
    let artifact: ModelArtifact = postcard::from_bytes(bytes)?;

    if artifact.magic != ARTIFACT_MAGIC {
        return Err(InferenceError::IncompatibleArtifact(
            "not a DCRM model artifact".to_string(),
        ));
    }
    if artifact.format_version != ARTIFACT_VERSION {
        return Err(InferenceError::IncompatibleArtifact(format!(
            "artifact format v{}, expected v{}",
            artifact.format_version, ARTIFACT_VERSION
        )));
    }
    if artifact.model.feature_version() != FEATURE_VERSION {
        return Err(InferenceError::IncompatibleArtifact(format!(
            "model trained on feature set v{}, extractor is v{}",
            artifact.model.feature_version(),
            FEATURE_VERSION
        )));
    }

    Ok(artifact.model)
}

/// Write a model artifact to `path`
pub fn save_model(model: &TrainedModel, path: impl AsRef<Path>) -> Result<(), InferenceError> {
    let path = path.as_ref();
    let bytes = encode_model(model)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, &bytes)?;
    info!("Saved model artifact to {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// Read a model artifact from `path`
pub fn load_model(path: impl AsRef<Path>) -> Result<TrainedModel, InferenceError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let model = decode_model(&bytes)?;
    info!("Loaded model artifact from {} ({} trees)", path.display(), model.forest().n_trees());
    Ok(model)
}
