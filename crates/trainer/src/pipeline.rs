//! Training Pipeline
//!
//! One batch pass: assemble the dataset, extract features, split, fit,
//! evaluate and persist. Nothing is written unless every earlier step
//! succeeds.

use crate::dataset::{Dataset, DatasetError, LabeledWaveform};
use crate::evaluation::Evaluation;
use crate::split::stratified_split;
use feature_engine::{ExtractionConfig, FaultType, FeatureExtractor, FeatureVector, PlateauUnits};
use inference_engine::{save_model, ForestConfig, InferenceError, TrainedModel, TrainingSample};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use telemetry::LoggingConfig;
use thiserror::Error;
use tracing::info;
use waveform_sim::DEFAULT_NUM_SAMPLES;

/// Errors that abort a training run
#[derive(Debug, Error)]
pub enum TrainingError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("Dataset is empty")]
    EmptyDataset,

    #[error("No samples left for {0} after the train/test split")]
    EmptyPartition(&'static str),

    #[error(transparent)]
    Model(#[from] InferenceError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for TrainingError {
    fn from(err: config::ConfigError) -> Self {
        TrainingError::Config(err.to_string())
    }
}

/// Where training waveforms come from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataSource {
    /// Balanced set from the synthetic generator
    #[default]
    Synthetic,
    /// Labeled CSV file
    Csv { path: PathBuf },
}

/// Training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Dataset source
    pub source: DataSource,
    /// Synthetic waveforms per fault type
    pub samples_per_class: usize,
    /// Samples per synthetic waveform
    pub num_samples: usize,
    /// Share of each label held out for evaluation
    pub test_fraction: f64,
    /// Seed for the generator and the split
    pub seed: u64,
    /// Random forest hyperparameters
    pub forest: ForestConfig,
    /// Feature extraction settings, stored with the model
    pub extraction: ExtractionConfig,
    /// Where the model artifact is written
    pub output: PathBuf,
    /// Optional CSV export of the assembled dataset
    pub export_dataset: Option<PathBuf>,
    pub logging: LoggingConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            source: DataSource::Synthetic,
            samples_per_class: 100,
            num_samples: DEFAULT_NUM_SAMPLES,
            test_fraction: 0.2,
            seed: 42,
            forest: ForestConfig::default(),
            extraction: ExtractionConfig::default(),
            output: PathBuf::from("models/dcrm_fault_classifier.model"),
            export_dataset: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl TrainingConfig {
    /// Load from an optional TOML file, then `DCRM_*` environment variables
    /// (nested keys separated by `__`, e.g. `DCRM_FOREST__N_ESTIMATORS`)
    pub fn load(path: Option<&Path>) -> Result<Self, TrainingError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix("DCRM")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

/// Outcome of a training run
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub train_size: usize,
    pub test_size: usize,
    pub evaluation: Evaluation,
    /// Mean decrease in impurity per feature, in feature-vector order
    pub feature_importances: Vec<(String, f64)>,
    /// Artifact location, once persisted
    pub model_path: Option<PathBuf>,
}

/// Batch training pipeline
pub struct TrainingPipeline {
    config: TrainingConfig,
}

impl TrainingPipeline {
    /// Create a new pipeline
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Assemble the dataset named by the configuration
    pub fn load_dataset(&self) -> Result<Dataset, TrainingError> {
        let dataset = match &self.config.source {
            DataSource::Synthetic => Dataset::synthetic(
                self.config.samples_per_class,
                self.config.num_samples,
                self.config.seed,
            ),
            DataSource::Csv { path } => Dataset::load_csv(path)?,
        };
        if dataset.is_empty() {
            return Err(TrainingError::EmptyDataset);
        }
        Ok(dataset)
    }

    /// Features of one waveform, computed with the extraction settings that
    /// are stored in the model
    pub fn extract(&self, sample: &LabeledWaveform) -> FeatureVector {
        FeatureExtractor::new(self.config.extraction)
            .extract(&sample.resistance, sample.time.as_deref())
    }

    /// Fit and evaluate on `dataset` without persisting anything
    pub fn train(&self, dataset: &Dataset) -> Result<(TrainedModel, TrainingReport), TrainingError> {
        if dataset.is_empty() {
            return Err(TrainingError::EmptyDataset);
        }
        if self.config.extraction.plateau_units == PlateauUnits::Time && !dataset.has_time_axis() {
            return Err(TrainingError::Config(
                "time plateau units need a time axis on every waveform; CSV datasets have none"
                    .to_string(),
            ));
        }

        info!("Extracting features from {} waveforms", dataset.len());
        let samples: Vec<TrainingSample> = dataset
            .samples()
            .iter()
            .map(|s| TrainingSample {
                features: self.extract(s),
                label: s.label,
            })
            .collect();

        let split = stratified_split(&dataset.labels(), self.config.test_fraction, self.config.seed);
        if split.train.is_empty() {
            return Err(TrainingError::EmptyPartition("training"));
        }
        if split.test.is_empty() {
            return Err(TrainingError::EmptyPartition("testing"));
        }
        info!("Training set: {} samples", split.train.len());
        info!("Testing set: {} samples", split.test.len());

        let train: Vec<TrainingSample> = split.train.iter().map(|&i| samples[i].clone()).collect();
        info!("Training random forest ({} trees)", self.config.forest.n_estimators);
        let model = TrainedModel::fit(&train, self.config.extraction, &self.config.forest)?;

        let truth: Vec<FaultType> = split.test.iter().map(|&i| samples[i].label).collect();
        let predicted: Vec<FaultType> = split
            .test
            .iter()
            .map(|&i| model.predict(&samples[i].features))
            .collect();
        let evaluation = Evaluation::compute(&truth, &predicted);
        info!("Test accuracy: {:.2}%", evaluation.accuracy * 100.0);

        let feature_importances = model
            .feature_importances()
            .into_iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect();

        let report = TrainingReport {
            train_size: split.train.len(),
            test_size: split.test.len(),
            evaluation,
            feature_importances,
            model_path: None,
        };
        Ok((model, report))
    }

    /// Full run: dataset, optional export, training, evaluation, persistence
    pub fn run(&self) -> Result<TrainingReport, TrainingError> {
        let dataset = self.load_dataset()?;
        if let Some(path) = &self.config.export_dataset {
            dataset.write_csv(path)?;
        }

        let (model, mut report) = self.train(&dataset)?;
        save_model(&model, &self.config.output)?;
        report.model_path = Some(self.config.output.clone());
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inference_engine::load_model;

    fn small_config(dir: &Path) -> TrainingConfig {
        TrainingConfig {
            samples_per_class: 50,
            forest: ForestConfig {
                n_estimators: 50,
                ..Default::default()
            },
            output: dir.join("model.bin"),
            ..Default::default()
        }
    }

    #[test]
    fn test_synthetic_training_beats_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let config = small_config(dir.path());
        let report = TrainingPipeline::new(config.clone()).run().unwrap();

        assert_eq!(report.train_size, 160);
        assert_eq!(report.test_size, 40);
        assert!(report.evaluation.accuracy > 0.7, "accuracy {}", report.evaluation.accuracy);
        assert_eq!(report.feature_importances.len(), 9);
        assert_eq!(report.model_path.as_deref(), Some(config.output.as_path()));

        let model = load_model(&config.output).unwrap();
        assert_eq!(model.classes(), &FaultType::ALL);
    }

    #[test]
    fn test_dataset_export_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrainingConfig {
            samples_per_class: 10,
            forest: ForestConfig {
                n_estimators: 10,
                ..Default::default()
            },
            export_dataset: Some(dir.path().join("dataset.csv")),
            ..small_config(dir.path())
        };
        TrainingPipeline::new(config).run().unwrap();

        let exported = Dataset::load_csv(dir.path().join("dataset.csv")).unwrap();
        assert_eq!(exported.len(), 40);
    }

    #[test]
    fn test_empty_dataset_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrainingConfig {
            samples_per_class: 0,
            ..small_config(dir.path())
        };
        let output = config.output.clone();
        let result = TrainingPipeline::new(config).run();
        assert!(matches!(result, Err(TrainingError::EmptyDataset)));
        assert!(!output.exists());
    }

    #[test]
    fn test_unreadable_csv_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrainingConfig {
            source: DataSource::Csv {
                path: dir.path().join("missing.csv"),
            },
            ..small_config(dir.path())
        };
        let output = config.output.clone();
        let result = TrainingPipeline::new(config).run();
        assert!(matches!(result, Err(TrainingError::Dataset(DatasetError::Io(_)))));
        assert!(!output.exists());
    }

    fn time_units() -> ExtractionConfig {
        ExtractionConfig {
            plateau_units: PlateauUnits::Time,
            ..Default::default()
        }
    }

    #[test]
    fn test_time_units_use_the_generator_time_axis() {
        let dir = tempfile::tempdir().unwrap();
        let config = TrainingConfig {
            samples_per_class: 10,
            forest: ForestConfig {
                n_estimators: 10,
                ..Default::default()
            },
            extraction: time_units(),
            ..small_config(dir.path())
        };
        let pipeline = TrainingPipeline::new(config.clone());
        let dataset = pipeline.load_dataset().unwrap();

        let plateau = dataset
            .samples()
            .iter()
            .find(|s| s.label == FaultType::Plateau)
            .unwrap();
        let time = plateau.time.as_deref().unwrap();
        let count = FeatureExtractor::default()
            .extract(&plateau.resistance, None)
            .plateau_duration;
        let scaled = pipeline.extract(plateau).plateau_duration;
        assert!(count > 0.0);
        assert!((scaled - count * (time[1] - time[0])).abs() < 1e-9);

        pipeline.run().unwrap();
        let model = load_model(&config.output).unwrap();
        assert_eq!(model.extraction_config().plateau_units, PlateauUnits::Time);
    }

    #[test]
    fn test_time_units_reject_csv_without_time_axis() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("dataset.csv");
        Dataset::synthetic(5, 100, 3).write_csv(&csv).unwrap();

        let config = TrainingConfig {
            source: DataSource::Csv { path: csv },
            extraction: time_units(),
            ..small_config(dir.path())
        };
        let output = config.output.clone();
        let result = TrainingPipeline::new(config).run();
        assert!(matches!(result, Err(TrainingError::Config(_))));
        assert!(!output.exists());
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.toml");
        std::fs::write(
            &path,
            r#"
samples_per_class = 25
seed = 7
output = "out/custom.model"

[source]
kind = "csv"
path = "data/dcrm.csv"

[forest]
n_estimators = 12

[extraction]
plateau_units = "time"

[logging]
json = true
"#,
        )
        .unwrap();

        let config = TrainingConfig::load(Some(&path)).unwrap();
        assert_eq!(config.samples_per_class, 25);
        assert_eq!(config.seed, 7);
        assert_eq!(config.forest.n_estimators, 12);
        assert_eq!(config.forest.max_depth, Some(10));
        assert_eq!(
            config.source,
            DataSource::Csv {
                path: PathBuf::from("data/dcrm.csv")
            }
        );
        assert_eq!(config.extraction.plateau_units, PlateauUnits::Time);
        assert_eq!(config.test_fraction, 0.2);
        assert!(config.logging.json);
        assert_eq!(config.logging.level, "info");
    }
}
