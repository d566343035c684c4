//! Waveform Validator

use crate::error::ValidationError;
use tracing::debug;

/// Shortest waveform accepted for classification. Peak detection enforces a
/// 20-sample separation, so anything shorter degenerates.
pub const MIN_WAVEFORM_LEN: usize = 10;

/// Validator for incoming waveforms
#[derive(Debug, Clone)]
pub struct Validator {
    min_len: usize,
}

impl Validator {
    /// Validate a waveform: long enough and every sample finite
    pub fn validate_waveform(&self, waveform: &[f64]) -> Result<(), ValidationError> {
        if waveform.len() < self.min_len {
            debug!("Rejecting waveform with {} samples", waveform.len());
            return Err(ValidationError::TooShort {
                len: waveform.len(),
                min: self.min_len,
            });
        }

        if let Some(index) = waveform.iter().position(|v| !v.is_finite()) {
            return Err(ValidationError::NonFinite { index });
        }

        Ok(())
    }

    /// Validate an optional time axis against its waveform
    pub fn validate_time_axis(&self, waveform: &[f64], time: &[f64]) -> Result<(), ValidationError> {
        if time.len() != waveform.len() {
            return Err(ValidationError::TimeAxisMismatch {
                len: waveform.len(),
                time_len: time.len(),
            });
        }

        if let Some(index) = time.iter().position(|v| !v.is_finite()) {
            return Err(ValidationError::NonFinite { index });
        }

        Ok(())
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self {
            min_len: MIN_WAVEFORM_LEN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_waveform() {
        let validator = Validator::default();
        assert!(validator.validate_waveform(&[2.5; 10]).is_ok());
        assert!(validator.validate_waveform(&[2.5; 1000]).is_ok());
    }

    #[test]
    fn test_too_short() {
        let validator = Validator::default();
        assert_eq!(
            validator.validate_waveform(&[1.0; 9]),
            Err(ValidationError::TooShort { len: 9, min: 10 })
        );
        assert!(validator.validate_waveform(&[]).is_err());
    }

    #[test]
    fn test_non_finite_sample() {
        let validator = Validator::default();
        let mut waveform = vec![1.0; 20];
        waveform[7] = f64::NAN;
        assert_eq!(
            validator.validate_waveform(&waveform),
            Err(ValidationError::NonFinite { index: 7 })
        );
    }

    #[test]
    fn test_time_axis_mismatch() {
        let validator = Validator::default();
        let waveform = vec![1.0; 20];
        let time: Vec<f64> = (0..19).map(|i| i as f64).collect();
        assert!(matches!(
            validator.validate_time_axis(&waveform, &time),
            Err(ValidationError::TimeAxisMismatch { len: 20, time_len: 19 })
        ));
    }

    #[test]
    fn test_error_message() {
        let err = ValidationError::TooShort { len: 3, min: 10 };
        assert_eq!(err.to_string(), "Waveform too short (minimum 10 points, got 3)");
    }
}
