//! Stratified Train/Test Split

use feature_engine::FaultType;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;

/// Indices of the two partitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split sample indices so every label keeps its share in both partitions.
///
/// Each label contributes `round(count * test_fraction)` samples to the test
/// partition, but never all of them: a label with at least two samples keeps
/// one for training. Deterministic for a fixed seed.
pub fn stratified_split(labels: &[FaultType], test_fraction: f64, seed: u64) -> Split {
    let fraction = test_fraction.clamp(0.0, 1.0);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut by_label: BTreeMap<FaultType, Vec<usize>> = BTreeMap::new();
    for (i, label) in labels.iter().enumerate() {
        by_label.entry(*label).or_default().push(i);
    }

    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();
    for indices in by_label.values_mut() {
        indices.shuffle(&mut rng);
        let n = indices.len();
        let mut n_test = (n as f64 * fraction).round() as usize;
        if n > 1 {
            n_test = n_test.min(n - 1);
        }
        test.extend_from_slice(&indices[..n_test]);
        train.extend_from_slice(&indices[n_test..]);
    }

    train.shuffle(&mut rng);
    test.shuffle(&mut rng);
    Split { train, test }
}
