//! Feature Engineering Engine
//!
//! Turns a DCRM resistance waveform into the fixed nine-element feature vector
//! shared by the trainer and the live inference service.

mod features;
mod label;
mod peaks;
mod statistics;

pub use features::{
    extract_features, ExtractionConfig, FeatureExtractor, FeatureVector, PlateauUnits, Smoothing, FEATURE_DIMENSION,
    FEATURE_NAMES, FEATURE_VERSION, PEAK_DISTANCE, PEAK_HEIGHT, PLATEAU_THRESHOLD,
};
pub use label::{FaultType, ParseFaultTypeError};
pub use peaks::find_peaks;
pub use statistics::StatisticalFeatures;
