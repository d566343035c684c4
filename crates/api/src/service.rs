//! Classification Service
//!
//! Transport-independent request handling: validation, feature extraction
//! and classification against the injected classifier.

use axum::http::StatusCode;
use data_validator::{ValidationError, Validator};
use feature_engine::{FaultType, FeatureExtractor, FeatureVector, ParseFaultTypeError, PlateauUnits};
use inference_engine::{FaultClassifier, InferenceError, Prediction};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};
use waveform_sim::{Waveform, WaveformGenerator};

/// Errors surfaced to API clients
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    UnknownFaultType(#[from] ParseFaultTypeError),

    #[error("Invalid request body: {0}")]
    BadRequest(String),

    #[error("This model measures plateau duration in time units; send the 'time' axis")]
    TimeAxisRequired,

    #[error("Model not loaded: {0}")]
    ModelUnavailable(String),

    #[error("Inference failed: {0}")]
    Inference(String),
}

impl ServiceError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_)
            | ServiceError::UnknownFaultType(_)
            | ServiceError::BadRequest(_)
            | ServiceError::TimeAxisRequired => StatusCode::BAD_REQUEST,
            ServiceError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label for the error counter
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation",
            ServiceError::UnknownFaultType(_) => "unknown_fault_type",
            ServiceError::BadRequest(_) => "bad_request",
            ServiceError::TimeAxisRequired => "time_axis_required",
            ServiceError::ModelUnavailable(_) => "model_unavailable",
            ServiceError::Inference(_) => "inference",
        }
    }
}

impl From<InferenceError> for ServiceError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::ModelUnavailable(reason) => ServiceError::ModelUnavailable(reason),
            other => ServiceError::Inference(other.to_string()),
        }
    }
}

/// Features and prediction for one waveform
#[derive(Debug, Clone)]
pub struct Classification {
    pub features: FeatureVector,
    pub prediction: Prediction,
}

/// A generated waveform together with its classification
#[derive(Debug, Clone)]
pub struct Simulation {
    pub fault_type: FaultType,
    pub waveform: Waveform,
    pub classification: Classification,
}

/// Stateless classification front end shared by all handlers
#[derive(Clone)]
pub struct ClassificationService {
    classifier: Arc<dyn FaultClassifier>,
    validator: Validator,
    num_samples: usize,
}

impl ClassificationService {
    /// Create a new service
    pub fn new(classifier: Arc<dyn FaultClassifier>, num_samples: usize) -> Self {
        Self {
            classifier,
            validator: Validator::default(),
            num_samples,
        }
    }

    /// Whether the classifier can serve predictions
    pub fn model_loaded(&self) -> bool {
        self.classifier.is_loaded()
    }

    /// Samples per generated waveform
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Validate, extract and classify a waveform.
    ///
    /// Invalid input is rejected before the extractor or classifier runs. A
    /// model that measures plateaus in time units also needs the time axis.
    pub fn classify(
        &self,
        waveform: &[f64],
        time: Option<&[f64]>,
    ) -> Result<Classification, ServiceError> {
        let result = self.classify_inner(waveform, time);
        if let Err(e) = &result {
            warn!("Classification rejected: {}", e);
        }
        result
    }

    fn classify_inner(
        &self,
        waveform: &[f64],
        time: Option<&[f64]>,
    ) -> Result<Classification, ServiceError> {
        self.validator.validate_waveform(waveform)?;
        if let Some(time) = time {
            self.validator.validate_time_axis(waveform, time)?;
        }
        if !self.classifier.is_loaded() {
            return Err(ServiceError::ModelUnavailable(
                "no trained model is available".to_string(),
            ));
        }

        let config = self.classifier.extraction_config();
        if config.plateau_units == PlateauUnits::Time && time.is_none() {
            return Err(ServiceError::TimeAxisRequired);
        }

        let start = Instant::now();
        let extractor = FeatureExtractor::new(config);
        let features = extractor.extract(waveform, time);
        let prediction = self.classifier.classify(&features)?;
        let elapsed = start.elapsed();

        metrics::histogram!("dcrm_inference_latency_seconds").record(elapsed.as_secs_f64());
        metrics::counter!("dcrm_predictions_total", "fault" => prediction.fault_type.as_str())
            .increment(1);
        debug!(
            "Classified {} samples as {} in {}us",
            waveform.len(),
            prediction.fault_type,
            elapsed.as_micros()
        );

        Ok(Classification {
            features,
            prediction,
        })
    }

    /// Generate a waveform of `fault_type` and classify it
    pub fn simulate(&self, fault_type: FaultType, seed: Option<u64>) -> Result<Simulation, ServiceError> {
        let mut generator = match seed {
            Some(seed) => WaveformGenerator::new(seed),
            None => WaveformGenerator::from_entropy(),
        };
        let waveform = generator.generate(fault_type, self.num_samples);
        let classification = self.classify(&waveform.resistance, Some(&waveform.time))?;
        Ok(Simulation {
            fault_type,
            waveform,
            classification,
        })
    }

    /// Random waveform from the stream mix, without classification
    pub fn stream(&self) -> (FaultType, Waveform) {
        WaveformGenerator::from_entropy().generate_random(self.num_samples)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use feature_engine::ExtractionConfig;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use trainer::{LabeledWaveform, TrainingConfig, TrainingPipeline};

    /// Classifier stub that always answers `answer` and counts calls
    pub(crate) struct StubClassifier {
        pub loaded: bool,
        pub answer: FaultType,
        pub config: ExtractionConfig,
        pub calls: AtomicUsize,
    }

    impl StubClassifier {
        pub(crate) fn loaded(answer: FaultType) -> Self {
            Self {
                loaded: true,
                answer,
                config: ExtractionConfig::default(),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn with_config(mut self, config: ExtractionConfig) -> Self {
            self.config = config;
            self
        }

        pub(crate) fn unloaded() -> Self {
            Self {
                loaded: false,
                answer: FaultType::Normal,
                config: ExtractionConfig::default(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl FaultClassifier for StubClassifier {
        fn is_loaded(&self) -> bool {
            self.loaded
        }

        fn extraction_config(&self) -> ExtractionConfig {
            self.config
        }

        fn classify(&self, _features: &FeatureVector) -> Result<Prediction, InferenceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.loaded {
                return Err(InferenceError::ModelUnavailable("stub".to_string()));
            }
            let probabilities: BTreeMap<FaultType, f64> = FaultType::ALL
                .iter()
                .map(|&f| (f, if f == self.answer { 0.7 } else { 0.1 }))
                .collect();
            Ok(Prediction::from_probabilities(probabilities))
        }
    }

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64).collect()
    }

    #[test]
    fn test_short_waveform_never_reaches_classifier() {
        let stub = Arc::new(StubClassifier::loaded(FaultType::Spike));
        let service = ClassificationService::new(stub.clone(), 1000);

        let result = service.classify(&ramp(9), None);
        assert!(matches!(
            result,
            Err(ServiceError::Validation(ValidationError::TooShort { len: 9, min: 10 }))
        ));
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);

        service.classify(&ramp(10), None).unwrap();
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_non_finite_and_mismatched_time_rejected() {
        let stub = Arc::new(StubClassifier::loaded(FaultType::Normal));
        let service = ClassificationService::new(stub.clone(), 1000);

        let mut waveform = ramp(20);
        waveform[4] = f64::NAN;
        assert_eq!(service.classify(&waveform, None).unwrap_err().status(), StatusCode::BAD_REQUEST);

        let err = service.classify(&ramp(20), Some(&ramp(19))).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::TimeAxisMismatch { .. })
        ));
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unloaded_model_is_service_unavailable() {
        let stub = Arc::new(StubClassifier::unloaded());
        let service = ClassificationService::new(stub.clone(), 1000);

        let err = service.classify(&ramp(50), None).unwrap_err();
        assert!(matches!(err, ServiceError::ModelUnavailable(_)));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!service.model_loaded());
    }

    #[test]
    fn test_simulate_is_reproducible_with_seed() {
        let service = ClassificationService::new(Arc::new(StubClassifier::loaded(FaultType::Plateau)), 500);

        let a = service.simulate(FaultType::Plateau, Some(3)).unwrap();
        let b = service.simulate(FaultType::Plateau, Some(3)).unwrap();
        assert_eq!(a.waveform, b.waveform);
        assert_eq!(a.waveform.len(), 500);
        assert_eq!(a.classification.features, b.classification.features);
        assert_eq!(a.classification.prediction.fault_type, FaultType::Plateau);
    }

    #[test]
    fn test_time_units_match_training_features() {
        let config = ExtractionConfig {
            plateau_units: PlateauUnits::Time,
            ..Default::default()
        };
        let stub = Arc::new(StubClassifier::loaded(FaultType::Plateau).with_config(config));
        let service = ClassificationService::new(stub.clone(), 1000);

        let simulated = service.simulate(FaultType::Plateau, Some(5)).unwrap();
        let waveform = &simulated.waveform;
        let pipeline = TrainingPipeline::new(TrainingConfig {
            extraction: config,
            ..Default::default()
        });
        let trained = pipeline.extract(&LabeledWaveform {
            label: FaultType::Plateau,
            resistance: waveform.resistance.clone(),
            time: Some(waveform.time.clone()),
        });

        assert_eq!(simulated.classification.features, trained);
        let predicted = service
            .classify(&waveform.resistance, Some(&waveform.time))
            .unwrap();
        assert_eq!(predicted.features, trained);

        // Without the axis the count would silently change units
        let err = service.classify(&waveform.resistance, None).unwrap_err();
        assert!(matches!(err, ServiceError::TimeAxisRequired));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(stub.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_stream_uses_configured_length() {
        let service = ClassificationService::new(Arc::new(StubClassifier::unloaded()), 300);
        let (_, waveform) = service.stream();
        assert_eq!(waveform.len(), 300);
        assert_eq!(waveform.time.len(), 300);
    }
}
