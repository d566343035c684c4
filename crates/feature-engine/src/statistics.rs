//! Statistical Features Computation

/// Summary statistics of a (normalized) waveform
#[derive(Debug, Clone, Default)]
pub struct StatisticalFeatures {
    /// Mean value
    pub mean: f64,
    /// Population standard deviation
    pub std_dev: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
    /// Largest first difference
    pub max_slope: f64,
    /// Smallest first difference
    pub min_slope: f64,
}

impl StatisticalFeatures {
    /// Compute statistical features from a slice of values
    pub fn compute(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let n = values.len() as f64;

        // Mean
        let mean = values.iter().sum::<f64>() / n;

        // Min/Max
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        // Population variance (divide by n, not n - 1)
        let variance = values.iter().map(|&v| (v - mean) * (v - mean)).sum::<f64>() / n;
        let std_dev = variance.sqrt();

        // Slope extrema; a single sample has no differences and keeps the zero sentinel
        let (max_slope, min_slope) = if values.len() >= 2 {
            values
                .windows(2)
                .map(|w| w[1] - w[0])
                .fold((f64::NEG_INFINITY, f64::INFINITY), |(hi, lo), d| (hi.max(d), lo.min(d)))
        } else {
            (0.0, 0.0)
        };

        Self {
            mean,
            std_dev,
            min,
            max,
            max_slope,
            min_slope,
        }
    }

    /// Count of samples strictly above `threshold`
    pub fn count_above(values: &[f64], threshold: f64) -> usize {
        values.iter().filter(|&&v| v > threshold).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_computation() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let stats = StatisticalFeatures::compute(&values);
        assert!((stats.mean - 3.0).abs() < 0.001);
    }

    #[test]
    fn test_std_dev_is_population() {
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let stats = StatisticalFeatures::compute(&values);
        // Population std dev is exactly 2.0 here (sample std dev would be ~2.14)
        assert!((stats.std_dev - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_slopes() {
        let stats = StatisticalFeatures::compute(&[0.0, 0.5, 0.2, 0.9]);
        assert!((stats.max_slope - 0.7).abs() < 1e-12);
        assert!((stats.min_slope + 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_single_value_slopes_default_to_zero() {
        let stats = StatisticalFeatures::compute(&[0.4]);
        assert_eq!(stats.max_slope, 0.0);
        assert_eq!(stats.min_slope, 0.0);
        assert_eq!(stats.std_dev, 0.0);
    }

    #[test]
    fn test_count_above_is_strict() {
        assert_eq!(StatisticalFeatures::count_above(&[0.5, 0.51, 0.9, 0.1], 0.5), 2);
    }

    #[test]
    fn test_empty_values() {
        let values: Vec<f64> = vec![];
        let stats = StatisticalFeatures::compute(&values);
        assert_eq!(stats.mean, 0.0);
    }
}
