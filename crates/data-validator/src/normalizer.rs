//! Min-Max Normalization

/// Added to the range denominator so a constant waveform maps to all zeros
pub const NORMALIZATION_EPSILON: f64 = 1e-10;

/// Rescale a waveform into [0, 1].
///
/// Computes `(x - min) / (max - min + NORMALIZATION_EPSILON)` for every sample.
/// A constant waveform therefore becomes all zeros rather than NaN, and an empty
/// waveform stays empty.
pub fn normalize(signal: &[f64]) -> Vec<f64> {
    if signal.is_empty() {
        return Vec::new();
    }

    let min = signal.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = signal.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let denom = max - min + NORMALIZATION_EPSILON;

    signal.iter().map(|&x| (x - min) / denom).collect()
}
