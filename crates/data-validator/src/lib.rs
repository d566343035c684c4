//! Waveform Validation and Normalization
//!
//! Provides input validation, min-max normalization and Savitzky-Golay
//! smoothing for DCRM resistance waveforms.

mod error;
mod filter;
mod normalizer;
mod validator;

pub use error::ValidationError;
pub use filter::SavitzkyGolay;
pub use normalizer::{normalize, NORMALIZATION_EPSILON};
pub use validator::{Validator, MIN_WAVEFORM_LEN};
