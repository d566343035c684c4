//! DCRM Classifier Training
//!
//! Builds a labeled dataset (CSV or synthetic), extracts features with the
//! shared extractor, fits the random forest, reports held-out metrics and
//! writes the model artifact the API server loads.

mod dataset;
mod evaluation;
mod pipeline;
mod split;

pub use dataset::{Dataset, DatasetError, LabeledWaveform, LABEL_COLUMN};
pub use evaluation::{ClassMetrics, Evaluation};
pub use pipeline::{DataSource, TrainingConfig, TrainingError, TrainingPipeline, TrainingReport};
pub use split::{stratified_split, Split};
