//! Trained Fault Model

use crate::forest::{argmax, ForestConfig, RandomForest, Row};
use crate::InferenceError;
use feature_engine::{ExtractionConfig, FaultType, FeatureVector, FEATURE_NAMES, FEATURE_VERSION};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// One labeled feature vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub features: FeatureVector,
    pub label: FaultType,
}

/// Immutable classifier mapping feature vectors to fault labels.
///
/// Carries the extraction settings it was trained with so that serving
/// extracts features exactly the way training did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    /// Labels seen during training, in forest class-index order
    classes: Vec<FaultType>,
    forest: RandomForest,
    extraction: ExtractionConfig,
    feature_version: u32,
}

impl TrainedModel {
    /// Fit a model on labeled samples
    pub fn fit(
        samples: &[TrainingSample],
        extraction: ExtractionConfig,
        config: &ForestConfig,
    ) -> Result<Self, InferenceError> {
        let classes: Vec<FaultType> = samples
            .iter()
            .map(|s| s.label)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let x: Vec<Row> = samples.iter().map(|s| s.features.to_array()).collect();
        let y: Vec<usize> = samples
            .iter()
            .filter_map(|s| classes.iter().position(|&c| c == s.label))
            .collect();

        let forest = RandomForest::fit(&x, &y, classes.len(), config)?;
        info!("Trained model over classes {:?}", classes);

        Ok(Self {
            classes,
            forest,
            extraction,
            feature_version: FEATURE_VERSION,
        })
    }

    /// Most probable fault label
    pub fn predict(&self, features: &FeatureVector) -> FaultType {
        let proba = self.forest.predict_proba(&features.to_array());
        self.classes[argmax(&proba)]
    }

    /// Probability of every fault label. Labels absent from training are
    /// reported with probability 0, so the map always has four entries
    /// summing to 1.
    pub fn predict_with_confidence(&self, features: &FeatureVector) -> BTreeMap<FaultType, f64> {
        let proba = self.forest.predict_proba(&features.to_array());
        let mut confidence: BTreeMap<FaultType, f64> =
            FaultType::ALL.iter().map(|&f| (f, 0.0)).collect();
        for (class, p) in self.classes.iter().zip(proba) {
            confidence.insert(*class, p);
        }
        confidence
    }

    /// Feature importances paired with feature names
    pub fn feature_importances(&self) -> Vec<(&'static str, f64)> {
        FEATURE_NAMES
            .iter()
            .copied()
            .zip(self.forest.feature_importances().iter().copied())
            .collect()
    }

    /// Labels the model can predict
    pub fn classes(&self) -> &[FaultType] {
        &self.classes
    }

    /// Extraction settings the model was trained with
    pub fn extraction_config(&self) -> &ExtractionConfig {
        &self.extraction
    }

    /// Feature algorithm version the model was trained with
    pub fn feature_version(&self) -> u32 {
        self.feature_version
    }

    /// Underlying forest
    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feature_engine::FeatureExtractor;
    use waveform_sim::WaveformGenerator;

    fn synthetic_samples(per_class: usize, seed: u64) -> Vec<TrainingSample> {
        let mut generator = WaveformGenerator::new(seed);
        let extractor = FeatureExtractor::default();
        let mut samples = Vec::new();
        for label in FaultType::ALL {
            for _ in 0..per_class {
                let waveform = generator.generate(label, 1000);
                samples.push(TrainingSample {
                    features: extractor.extract(&waveform.resistance, None),
                    label,
                });
            }
        }
        samples
    }

    fn small_forest() -> ForestConfig {
        ForestConfig {
            n_estimators: 30,
            ..Default::default()
        }
    }

    #[test]
    fn test_model_predicts_generated_labels() {
        let samples = synthetic_samples(20, 1);
        let model = TrainedModel::fit(&samples, ExtractionConfig::default(), &small_forest()).unwrap();
        assert_eq!(model.classes(), &FaultType::ALL);

        let held_out = synthetic_samples(5, 99);
        let correct = held_out
            .iter()
            .filter(|s| model.predict(&s.features) == s.label)
            .count();
        assert!(correct as f64 / held_out.len() as f64 > 0.7);
    }

    #[test]
    fn test_confidence_covers_all_labels() {
        let samples: Vec<TrainingSample> = synthetic_samples(10, 2)
            .into_iter()
            .filter(|s| s.label != FaultType::Unstable)
            .collect();
        let model = TrainedModel::fit(&samples, ExtractionConfig::default(), &small_forest()).unwrap();

        let confidence = model.predict_with_confidence(&samples[0].features);
        assert_eq!(confidence.len(), 4);
        assert_eq!(confidence[&FaultType::Unstable], 0.0);
        assert!((confidence.values().sum::<f64>() - 1.0).abs() < 1e-9);
        assert_ne!(model.predict(&samples[0].features), FaultType::Unstable);
    }

    #[test]
    fn test_feature_importances_named() {
        let model =
            TrainedModel::fit(&synthetic_samples(10, 3), ExtractionConfig::default(), &small_forest())
                .unwrap();
        let importances = model.feature_importances();
        assert_eq!(importances.len(), 9);
        assert_eq!(importances[0].0, "num_peaks");
        assert!((importances.iter().map(|(_, v)| v).sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_training_set_fails() {
        let result = TrainedModel::fit(&[], ExtractionConfig::default(), &small_forest());
        assert!(matches!(result, Err(InferenceError::InvalidTrainingData(_))));
    }
}
