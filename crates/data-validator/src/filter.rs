//! Savitzky-Golay Smoothing Filter

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Least-squares polynomial smoothing over a sliding window.
///
/// Interior samples use the centered window. The first and last `window / 2`
/// samples are taken from the polynomial fitted to the first and last full
/// window, so the output has the same length as the input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavitzkyGolay {
    /// Window length in samples (odd)
    pub window: usize,
    /// Degree of the fitted polynomial
    pub polyorder: usize,
}

impl Default for SavitzkyGolay {
    fn default() -> Self {
        Self {
            window: 51,
            polyorder: 3,
        }
    }
}

impl SavitzkyGolay {
    /// Create a new filter
    pub fn new(window: usize, polyorder: usize) -> Self {
        Self { window, polyorder }
    }

    /// Window actually used for a signal of `len` samples: clamped to the
    /// signal length and forced odd.
    fn effective_window(&self, len: usize) -> usize {
        let window = self.window.min(len);
        if window % 2 == 0 {
            window.saturating_sub(1)
        } else {
            window
        }
    }

    /// Smooth a signal. Signals too short for the configured polynomial are
    /// returned unchanged.
    pub fn smooth(&self, signal: &[f64]) -> Vec<f64> {
        let n = signal.len();
        let window = self.effective_window(n);
        if window <= self.polyorder {
            return signal.to_vec();
        }
        if window != self.window {
            debug!("Savitzky-Golay window shrunk from {} to {} for {} samples", self.window, window, n);
        }

        let half = window / 2;
        let Some(center) = fit_coefficients(window, self.polyorder, half) else {
            return signal.to_vec();
        };

        let mut out = vec![0.0; n];
        for i in half..n - half {
            out[i] = dot(&center, &signal[i - half..=i + half]);
        }

        let head = &signal[..window];
        let tail = &signal[n - window..];
        for pos in 0..half {
            let Some(coeffs) = fit_coefficients(window, self.polyorder, pos) else {
                return signal.to_vec();
            };
            out[pos] = dot(&coeffs, head);

            let mirrored = window - 1 - pos;
            let Some(coeffs) = fit_coefficients(window, self.polyorder, mirrored) else {
                return signal.to_vec();
            };
            out[n - window + mirrored] = dot(&coeffs, tail);
        }

        out
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Convolution weights that evaluate the least-squares polynomial fitted to a
/// window at sample `eval_pos` of that window.
fn fit_coefficients(window: usize, polyorder: usize, eval_pos: usize) -> Option<Vec<f64>> {
    let half = (window / 2) as f64;
    let terms = polyorder + 1;
    let xs: Vec<f64> = (0..window).map(|k| k as f64 - half).collect();
    let x0 = eval_pos as f64 - half;

    // Normal equations: (AᵀA) c = v, with v = [1, x0, x0², ...]
    let mut gram = vec![vec![0.0; terms]; terms];
    for (r, row) in gram.iter_mut().enumerate() {
        for (c, cell) in row.iter_mut().enumerate() {
            *cell = xs.iter().map(|x| x.powi((r + c) as i32)).sum();
        }
    }
    let rhs: Vec<f64> = (0..terms).map(|m| x0.powi(m as i32)).collect();
    let c = solve(gram, rhs)?;

    Some(
        xs.iter()
            .map(|x| c.iter().enumerate().map(|(m, cm)| cm * x.powi(m as i32)).sum())
            .collect(),
    )
}

/// Gaussian elimination with partial pivoting
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}
