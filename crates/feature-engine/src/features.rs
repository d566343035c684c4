//! Feature Vector Assembly

use crate::peaks::find_peaks;
use crate::statistics::StatisticalFeatures;
use data_validator::{normalize, SavitzkyGolay};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::trace;

/// Number of features in the vector
pub const FEATURE_DIMENSION: usize = 9;

/// Bumped whenever the extraction algorithm changes meaning. Stored in model
/// artifacts so a model is never served with a different extractor.
pub const FEATURE_VERSION: u32 = 1;

/// Feature names, in vector order
pub const FEATURE_NAMES: [&str; FEATURE_DIMENSION] = [
    "num_peaks",
    "max_peak_height",
    "mean",
    "std",
    "min",
    "max",
    "plateau_duration",
    "max_slope",
    "min_slope",
];

/// Minimum normalized height of a counted peak
pub const PEAK_HEIGHT: f64 = 0.6;

/// Minimum separation between counted peaks, in samples
pub const PEAK_DISTANCE: usize = 20;

/// Normalized level above which a sample counts toward the plateau
pub const PLATEAU_THRESHOLD: f64 = 0.5;

/// Unit of `plateau_duration`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlateauUnits {
    /// Raw count of samples above the threshold
    #[default]
    Samples,
    /// Sample count scaled by the time axis step, when a time axis is given
    Time,
}

/// Pre-normalization conditioning
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Smoothing {
    /// Use the raw waveform
    #[default]
    None,
    /// Savitzky-Golay polynomial smoothing
    SavitzkyGolay(SavitzkyGolay),
}

/// Extraction settings. Persisted with every trained model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub smoothing: Smoothing,
    pub plateau_units: PlateauUnits,
}

/// Feature vector for ML inference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Peaks at or above [`PEAK_HEIGHT`]
    pub num_peaks: usize,
    /// Tallest counted peak, 0 when there are none
    pub max_peak_height: f64,
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    pub min: f64,
    pub max: f64,
    /// Samples above [`PLATEAU_THRESHOLD`], optionally in time units
    pub plateau_duration: f64,
    pub max_slope: f64,
    pub min_slope: f64,
}

impl FeatureVector {
    /// Values in [`FEATURE_NAMES`] order
    pub fn to_array(&self) -> [f64; FEATURE_DIMENSION] {
        [
            self.num_peaks as f64,
            self.max_peak_height,
            self.mean,
            self.std,
            self.min,
            self.max,
            self.plateau_duration,
            self.max_slope,
            self.min_slope,
        ]
    }
}

/// Feature extractor shared by training and serving
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    config: ExtractionConfig,
}

impl FeatureExtractor {
    /// Create a new feature extractor
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract the nine features from a raw or already-normalized waveform.
    ///
    /// The waveform is always (re)normalized first, so callers may pass either.
    /// Degenerate input never fails: an empty waveform yields the zero vector,
    /// a constant one yields zero peaks and zero slopes.
    pub fn extract(&self, signal: &[f64], time: Option<&[f64]>) -> FeatureVector {
        if signal.is_empty() {
            return FeatureVector::default();
        }

        let conditioned = match self.config.smoothing {
            Smoothing::None => Cow::Borrowed(signal),
            Smoothing::SavitzkyGolay(filter) => Cow::Owned(filter.smooth(signal)),
        };
        let norm = normalize(&conditioned);

        let peaks = find_peaks(&norm, PEAK_HEIGHT, PEAK_DISTANCE);
        let max_peak_height = peaks.iter().map(|&i| norm[i]).fold(0.0, f64::max);

        let stats = StatisticalFeatures::compute(&norm);

        let above = StatisticalFeatures::count_above(&norm, PLATEAU_THRESHOLD) as f64;
        let plateau_duration = match (self.config.plateau_units, time) {
            (PlateauUnits::Time, Some(t)) if t.len() >= 2 => above * (t[1] - t[0]),
            _ => above,
        };

        trace!(
            "Extracted features: peaks={}, plateau={:.1}, slopes=[{:.4}, {:.4}]",
            peaks.len(),
            plateau_duration,
            stats.min_slope,
            stats.max_slope
        );

        FeatureVector {
            num_peaks: peaks.len(),
            max_peak_height,
            mean: stats.mean,
            std: stats.std_dev,
            min: stats.min,
            max: stats.max,
            plateau_duration,
            max_slope: stats.max_slope,
            min_slope: stats.min_slope,
        }
    }
}

/// Extract features with the default configuration
pub fn extract_features(signal: &[f64], time: Option<&[f64]>) -> FeatureVector {
    FeatureExtractor::default().extract(signal, time)
}
