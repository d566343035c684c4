//! Inference Engine Implementation

use crate::artifact::load_model;
use crate::model::TrainedModel;
use crate::InferenceError;
use feature_engine::{ExtractionConfig, FaultType, FeatureVector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, error, info};

/// Prediction result from inference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Detected fault type
    pub fault_type: FaultType,
    /// Probability of the detected fault (0.0 to 1.0)
    pub confidence: f64,
    /// Probability of every fault type, summing to 1
    pub probabilities: BTreeMap<FaultType, f64>,
    /// Timestamp when prediction was made
    pub timestamp_ms: u64,
}

impl Prediction {
    /// Build a prediction from a full probability map
    pub fn from_probabilities(probabilities: BTreeMap<FaultType, f64>) -> Self {
        let (fault_type, confidence) = probabilities
            .iter()
            .fold((FaultType::Normal, f64::NEG_INFINITY), |best, (&f, &p)| {
                if p > best.1 {
                    (f, p)
                } else {
                    best
                }
            });

        let timestamp_ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            fault_type,
            confidence,
            probabilities,
            timestamp_ms,
        }
    }
}

/// Anything that can classify feature vectors. The API holds one behind an
/// `Arc`, so tests can swap in a stub.
pub trait FaultClassifier: Send + Sync {
    /// Whether predictions can be served
    fn is_loaded(&self) -> bool;

    /// Extraction settings callers must use to build feature vectors
    fn extraction_config(&self) -> ExtractionConfig {
        ExtractionConfig::default()
    }

    /// Classify one feature vector
    fn classify(&self, features: &FeatureVector) -> Result<Prediction, InferenceError>;
}

enum ModelState {
    Unloaded { reason: String },
    Loaded(TrainedModel),
}

/// Load-once inference engine.
///
/// Either holds a trained model for its whole lifetime or remembers why
/// loading failed; there is no way to unload or swap the model afterwards.
pub struct InferenceEngine {
    state: ModelState,
}

impl InferenceEngine {
    /// Load a model artifact, failing if it cannot be read
    pub fn load(path: impl AsRef<Path>) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        info!("Loading DCRM fault classifier from {}", path.display());
        let model = load_model(path)?;
        Ok(Self {
            state: ModelState::Loaded(model),
        })
    }

    /// Load a model artifact, falling back to an unloaded engine that reports
    /// the failure on every prediction
    pub fn load_or_unloaded(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(engine) => engine,
            Err(e) => {
                error!("Error loading model from {}: {}", path.display(), e);
                Self {
                    state: ModelState::Unloaded {
                        reason: e.to_string(),
                    },
                }
            }
        }
    }

    fn model(&self) -> Result<&TrainedModel, InferenceError> {
        match &self.state {
            ModelState::Loaded(model) => Ok(model),
            ModelState::Unloaded { reason } => Err(InferenceError::ModelUnavailable(reason.clone())),
        }
    }

    /// Most probable fault type
    pub fn predict(&self, features: &FeatureVector) -> Result<FaultType, InferenceError> {
        Ok(self.model()?.predict(features))
    }

    /// Fault type with per-label probabilities
    pub fn predict_with_confidence(&self, features: &FeatureVector) -> Result<Prediction, InferenceError> {
        let start = std::time::Instant::now();
        let probabilities = self.model()?.predict_with_confidence(features);
        let prediction = Prediction::from_probabilities(probabilities);
        debug!(
            "Prediction: {} (conf={:.2}) in {}us",
            prediction.fault_type,
            prediction.confidence,
            start.elapsed().as_micros()
        );
        Ok(prediction)
    }

    /// Check if a model is loaded
    pub fn is_loaded(&self) -> bool {
        matches!(self.state, ModelState::Loaded(_))
    }
}

impl FaultClassifier for InferenceEngine {
    fn is_loaded(&self) -> bool {
        InferenceEngine::is_loaded(self)
    }

    fn extraction_config(&self) -> ExtractionConfig {
        self.model()
            .map(|m| *m.extraction_config())
            .unwrap_or_default()
    }

    fn classify(&self, features: &FeatureVector) -> Result<Prediction, InferenceError> {
        self.predict_with_confidence(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::save_model;
    use crate::forest::ForestConfig;
    use crate::model::TrainingSample;
    use feature_engine::FeatureExtractor;
    use waveform_sim::WaveformGenerator;

    fn trained() -> TrainedModel {
        let mut generator = WaveformGenerator::new(12);
        let extractor = FeatureExtractor::default();
        let mut samples = Vec::new();
        for label in FaultType::ALL {
            for _ in 0..10 {
                let waveform = generator.generate(label, 1000);
                samples.push(TrainingSample {
                    features: extractor.extract(&waveform.resistance, None),
                    label,
                });
            }
        }
        let config = ForestConfig {
            n_estimators: 20,
            ..Default::default()
        };
        TrainedModel::fit(&samples, ExtractionConfig::default(), &config).unwrap()
    }

    #[test]
    fn test_missing_artifact_leaves_engine_unloaded() {
        let dir = tempfile::tempdir().unwrap();
        let engine = InferenceEngine::load_or_unloaded(dir.path().join("missing.model"));
        assert!(!engine.is_loaded());
        assert!(matches!(
            engine.predict(&FeatureVector::default()),
            Err(InferenceError::ModelUnavailable(_))
        ));
        assert!(matches!(
            engine.classify(&FeatureVector::default()),
            Err(InferenceError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn test_loaded_engine_predicts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dcrm.model");
        save_model(&trained(), &path).unwrap();

        let engine = InferenceEngine::load(&path).unwrap();
        assert!(engine.is_loaded());

        let waveform = WaveformGenerator::new(500).generate(FaultType::Plateau, 1000);
        let features = FeatureExtractor::new(engine.extraction_config()).extract(&waveform.resistance, None);

        let prediction = engine.predict_with_confidence(&features).unwrap();
        assert_eq!(prediction.probabilities.len(), 4);
        assert!((prediction.probabilities.values().sum::<f64>() - 1.0).abs() < 1e-9);
        assert_eq!(prediction.fault_type, engine.predict(&features).unwrap());
        assert_eq!(prediction.confidence, prediction.probabilities[&prediction.fault_type]);
    }

    #[test]
    fn test_engine_is_shareable_across_threads() {
        let engine = std::sync::Arc::new(InferenceEngine {
            state: ModelState::Loaded(trained()),
        });
        let handles: Vec<_> = (0..4)
            .map(|seed| {
                let engine = engine.clone();
                std::thread::spawn(move || {
                    let waveform = WaveformGenerator::new(seed).generate(FaultType::Spike, 1000);
                    let features = FeatureExtractor::default().extract(&waveform.resistance, None);
                    engine.predict_with_confidence(&features).unwrap().probabilities
                })
            })
            .collect();

        for handle in handles {
            let probabilities = handle.join().unwrap();
            assert!((probabilities.values().sum::<f64>() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_prediction_picks_highest_probability() {
        let probabilities = BTreeMap::from([
            (FaultType::Normal, 0.1),
            (FaultType::Spike, 0.6),
            (FaultType::Plateau, 0.2),
            (FaultType::Unstable, 0.1),
        ]);
        let prediction = Prediction::from_probabilities(probabilities);
        assert_eq!(prediction.fault_type, FaultType::Spike);
        assert_eq!(prediction.confidence, 0.6);
    }
}
