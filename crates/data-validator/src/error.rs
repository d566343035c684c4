//! Validation Error Types

use thiserror::Error;

/// Errors during waveform validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Waveform has fewer samples than the extractor can meaningfully handle
    #[error("Waveform too short (minimum {min} points, got {len})")]
    TooShort { len: usize, min: usize },

    /// NaN or infinite sample
    #[error("Waveform sample {index} is not a finite number")]
    NonFinite { index: usize },

    /// Time axis does not line up with the waveform
    #[error("Time axis length {time_len} does not match waveform length {len}")]
    TimeAxisMismatch { len: usize, time_len: usize },

    /// Missing required field
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}
