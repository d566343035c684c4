//! Random Forest Classifier
//!
//! Bagged CART trees split on Gini impurity, with a random feature subset
//! considered at every node. Class probabilities are the mean of the per-tree
//! leaf class frequencies.

use crate::InferenceError;
use feature_engine::FEATURE_DIMENSION;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// One feature row
pub type Row = [f64; FEATURE_DIMENSION];

/// Features examined at each split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// floor(sqrt(n_features))
    Sqrt,
    /// Every feature
    All,
    /// A fixed number, clamped to [1, n_features]
    Fixed(usize),
}

impl MaxFeatures {
    fn resolve(self, n_features: usize) -> usize {
        let n = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Fixed(k) => k,
        };
        n.clamp(1, n_features)
    }
}

/// Forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum tree depth (root is depth 0); `None` grows until pure
    pub max_depth: Option<usize>,
    /// Smallest node that may still be split
    pub min_samples_split: usize,
    /// Smallest allowed child
    pub min_samples_leaf: usize,
    /// Features tried per split
    pub max_features: MaxFeatures,
    /// Train each tree on a bootstrap resample
    pub bootstrap: bool,
    /// Seed for bootstrap and feature sampling
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            max_depth: Some(10),
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        distribution: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A single CART tree stored as a flat node arena (root at index 0)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Class distribution of the leaf reached by `row`
    fn leaf_distribution(&self, row: &Row) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { distribution } => return distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

struct Candidate {
    feature: usize,
    threshold: f64,
    weighted_gini: f64,
}

struct TreeBuilder<'a> {
    x: &'a [Row],
    y: &'a [usize],
    n_classes: usize,
    config: &'a ForestConfig,
    n_try: usize,
    rng: StdRng,
    nodes: Vec<Node>,
    importances: Row,
}

fn gini(counts: &[usize], n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f64;
    1.0 - counts.iter().map(|&c| (c as f64 / n).powi(2)).sum::<f64>()
}

impl<'a> TreeBuilder<'a> {
    fn class_counts(&self, samples: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &i in samples {
            counts[self.y[i]] += 1;
        }
        counts
    }

    fn leaf(&mut self, counts: &[usize], n: usize) -> usize {
        let distribution = counts.iter().map(|&c| c as f64 / n as f64).collect();
        self.nodes.push(Node::Leaf { distribution });
        self.nodes.len() - 1
    }

    fn build(&mut self, samples: Vec<usize>, depth: usize) -> usize {
        let n = samples.len();
        let counts = self.class_counts(&samples);
        let impurity = gini(&counts, n);

        let depth_reached = self.config.max_depth.is_some_and(|d| depth >= d);
        if impurity <= 0.0 || n < self.config.min_samples_split || depth_reached {
            return self.leaf(&counts, n);
        }

        let Some(split) = self.best_split(&samples, &counts) else {
            return self.leaf(&counts, n);
        };

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| self.x[i][split.feature] <= split.threshold);

        self.importances[split.feature] += n as f64 * (impurity - split.weighted_gini);

        let id = self.nodes.len();
        self.nodes.push(Node::Leaf {
            distribution: Vec::new(),
        });
        let left = self.build(left, depth + 1);
        let right = self.build(right, depth + 1);
        self.nodes[id] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        id
    }

    fn best_split(&mut self, samples: &[usize], counts: &[usize]) -> Option<Candidate> {
        let n = samples.len();
        let min_leaf = self.config.min_samples_leaf.max(1);

        let mut features: Vec<usize> = (0..FEATURE_DIMENSION).collect();
        features.shuffle(&mut self.rng);

        let mut best: Option<Candidate> = None;
        let mut order = samples.to_vec();

        for &feature in &features[..self.n_try] {
            order.sort_by(|&a, &b| self.x[a][feature].total_cmp(&self.x[b][feature]));

            let mut left_counts = vec![0usize; self.n_classes];
            let mut right_counts = counts.to_vec();

            for pos in 0..n - 1 {
                let class = self.y[order[pos]];
                left_counts[class] += 1;
                right_counts[class] -= 1;

                let current = self.x[order[pos]][feature];
                let next = self.x[order[pos + 1]][feature];
                if current == next {
                    continue;
                }

                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }

                let weighted_gini = (n_left as f64 * gini(&left_counts, n_left)
                    + n_right as f64 * gini(&right_counts, n_right))
                    / n as f64;

                if best.as_ref().map_or(true, |b| weighted_gini < b.weighted_gini) {
                    let mut threshold = current + (next - current) / 2.0;
                    if threshold >= next {
                        threshold = current;
                    }
                    best = Some(Candidate {
                        feature,
                        threshold,
                        weighted_gini,
                    });
                }
            }
        }

        best
    }
}

/// Bagged ensemble of decision trees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_classes: usize,
    importances: Row,
    config: ForestConfig,
}

impl RandomForest {
    /// Fit a forest on rows `x` with class indices `y` in `0..n_classes`
    pub fn fit(
        x: &[Row],
        y: &[usize],
        n_classes: usize,
        config: &ForestConfig,
    ) -> Result<Self, InferenceError> {
        if x.is_empty() {
            return Err(InferenceError::InvalidTrainingData("empty dataset".to_string()));
        }
        if x.len() != y.len() {
            return Err(InferenceError::InvalidTrainingData(format!(
                "{} feature rows but {} labels",
                x.len(),
                y.len()
            )));
        }
        if let Some(&bad) = y.iter().find(|&&c| c >= n_classes) {
            return Err(InferenceError::InvalidTrainingData(format!(
                "class index {} out of range for {} classes",
                bad, n_classes
            )));
        }
        if config.n_estimators == 0 {
            return Err(InferenceError::InvalidTrainingData(
                "n_estimators must be at least 1".to_string(),
            ));
        }
        if x.iter().flatten().any(|v| !v.is_finite()) {
            return Err(InferenceError::InvalidTrainingData(
                "feature rows contain non-finite values".to_string(),
            ));
        }

        info!(
            "Fitting random forest: {} trees, max_depth={:?}, {} samples, {} classes",
            config.n_estimators,
            config.max_depth,
            x.len(),
            n_classes
        );

        let n_try = config.max_features.resolve(FEATURE_DIMENSION);
        let mut master = StdRng::seed_from_u64(config.seed);
        let mut trees = Vec::with_capacity(config.n_estimators);
        let mut importances = [0.0; FEATURE_DIMENSION];

        for t in 0..config.n_estimators {
            let mut rng = StdRng::seed_from_u64(master.gen());
            let samples: Vec<usize> = if config.bootstrap {
                (0..x.len()).map(|_| rng.gen_range(0..x.len())).collect()
            } else {
                (0..x.len()).collect()
            };

            let mut builder = TreeBuilder {
                x,
                y,
                n_classes,
                config,
                n_try,
                rng,
                nodes: Vec::new(),
                importances: [0.0; FEATURE_DIMENSION],
            };
            builder.build(samples, 0);

            let total: f64 = builder.importances.iter().sum();
            if total > 0.0 {
                for (acc, v) in importances.iter_mut().zip(builder.importances.iter()) {
                    *acc += v / total;
                }
            }

            debug!("Tree {} built with {} nodes", t, builder.nodes.len());
            trees.push(DecisionTree {
                nodes: builder.nodes,
            });
        }

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for v in &mut importances {
                *v /= total;
            }
        }

        Ok(Self {
            trees,
            n_classes,
            importances,
            config: config.clone(),
        })
    }

    /// Mean class distribution over all trees; sums to 1
    pub fn predict_proba(&self, row: &Row) -> Vec<f64> {
        let mut proba = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (acc, p) in proba.iter_mut().zip(tree.leaf_distribution(row)) {
                *acc += p;
            }
        }
        let n_trees = self.trees.len().max(1) as f64;
        for p in &mut proba {
            *p /= n_trees;
        }
        proba
    }

    /// Most probable class index; ties go to the lower index
    pub fn predict(&self, row: &Row) -> usize {
        argmax(&self.predict_proba(row))
    }

    /// Mean decrease in impurity per feature, normalized to sum to 1
    pub fn feature_importances(&self) -> &Row {
        &self.importances
    }

    /// Number of trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Number of classes
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Hyperparameters used for fitting
    pub fn config(&self) -> &ForestConfig {
        &self.config
    }
}

pub(crate) fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(bi, bv), (i, &v)| if v > bv { (i, v) } else { (bi, bv) })
        .0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(a: f64, b: f64) -> Row {
        let mut r = [0.0; FEATURE_DIMENSION];
        r[0] = a;
        r[3] = b;
        r
    }

    fn separable() -> (Vec<Row>, Vec<usize>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for i in 0..30 {
            let jitter = i as f64 * 0.01;
            x.push(row(0.1 + jitter, 5.0));
            y.push(0);
            x.push(row(0.9 + jitter, 5.0));
            y.push(1);
            x.push(row(0.5 + jitter, 50.0));
            y.push(2);
        }
        (x, y)
    }

    #[test]
    fn test_fits_separable_data() {
        let (x, y) = separable();
        let config = ForestConfig {
            n_estimators: 25,
            max_features: MaxFeatures::All,
            ..Default::default()
        };
        let forest = RandomForest::fit(&x, &y, 3, &config).unwrap();

        assert_eq!(forest.n_trees(), 25);
        assert_eq!(forest.predict(&row(0.12, 5.0)), 0);
        assert_eq!(forest.predict(&row(0.95, 5.0)), 1);
        assert_eq!(forest.predict(&row(0.55, 50.0)), 2);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let (x, y) = separable();
        let forest = RandomForest::fit(&x, &y, 3, &ForestConfig::default()).unwrap();
        for point in [row(0.0, 0.0), row(0.5, 20.0), row(2.0, 100.0)] {
            let proba = forest.predict_proba(&point);
            assert_eq!(proba.len(), 3);
            assert!((proba.iter().sum::<f64>() - 1.0).abs() < 1e-9);
            assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
        }
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (x, y) = separable();
        let config = ForestConfig {
            n_estimators: 10,
            ..Default::default()
        };
        let a = RandomForest::fit(&x, &y, 3, &config).unwrap();
        let b = RandomForest::fit(&x, &y, 3, &config).unwrap();

        let point = row(0.47, 30.0);
        assert_eq!(a.predict_proba(&point), b.predict_proba(&point));
        assert_eq!(a.feature_importances(), b.feature_importances());
    }

    #[test]
    fn test_importances_favour_informative_features() {
        let (x, y) = separable();
        let config = ForestConfig {
            n_estimators: 20,
            max_features: MaxFeatures::All,
            ..Default::default()
        };
        let forest = RandomForest::fit(&x, &y, 3, &config).unwrap();
        let importances = forest.feature_importances();

        assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(importances[0] + importances[3] > 0.99);
    }

    #[test]
    fn test_max_depth_zero_yields_stumps() {
        let (x, y) = separable();
        let config = ForestConfig {
            n_estimators: 3,
            max_depth: Some(0),
            ..Default::default()
        };
        let forest = RandomForest::fit(&x, &y, 3, &config).unwrap();
        assert!(forest.trees.iter().all(|t| t.nodes.len() == 1));
    }

    #[test]
    fn test_rejects_invalid_training_data() {
        let config = ForestConfig::default();
        assert!(RandomForest::fit(&[], &[], 3, &config).is_err());
        assert!(RandomForest::fit(&[row(0.0, 0.0)], &[0, 1], 3, &config).is_err());
        assert!(RandomForest::fit(&[row(0.0, 0.0)], &[5], 3, &config).is_err());
        assert!(RandomForest::fit(&[row(f64::NAN, 0.0)], &[0], 3, &config).is_err());
    }

    #[test]
    fn test_argmax_ties_go_low() {
        assert_eq!(argmax(&[0.25, 0.5, 0.5]), 1);
        assert_eq!(argmax(&[1.0]), 0);
    }
}
