//! Held-out Evaluation

use feature_engine::FaultType;
use serde::Serialize;
use std::fmt;

/// Precision, recall and F1 for one label
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label: FaultType,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Number of test samples with this true label
    pub support: usize,
}

/// Classification report over a labeled test partition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    pub accuracy: f64,
    /// One entry per label, in `FaultType::ALL` order
    pub per_class: Vec<ClassMetrics>,
    pub macro_precision: f64,
    pub macro_recall: f64,
    pub macro_f1: f64,
    /// Rows are true labels, columns predicted labels, both in `FaultType::ALL` order
    pub confusion_matrix: [[usize; 4]; 4],
}

impl Evaluation {
    /// Compare predictions against ground truth.
    ///
    /// Undefined ratios (no predictions or no support for a label) are
    /// reported as 0. Macro averages cover labels present in either slice.
    pub fn compute(truth: &[FaultType], predicted: &[FaultType]) -> Self {
        let mut confusion = [[0usize; 4]; 4];
        for (t, p) in truth.iter().zip(predicted) {
            confusion[t.index()][p.index()] += 1;
        }

        let total: usize = confusion.iter().flatten().sum();
        let correct: usize = (0..4).map(|i| confusion[i][i]).sum();
        let accuracy = ratio(correct, total);

        let per_class: Vec<ClassMetrics> = FaultType::ALL
            .iter()
            .map(|&label| {
                let i = label.index();
                let tp = confusion[i][i];
                let support: usize = confusion[i].iter().sum();
                let predicted_count: usize = confusion.iter().map(|row| row[i]).sum();
                let precision = ratio(tp, predicted_count);
                let recall = ratio(tp, support);
                let f1 = if precision + recall > 0.0 {
                    2.0 * precision * recall / (precision + recall)
                } else {
                    0.0
                };
                ClassMetrics {
                    label,
                    precision,
                    recall,
                    f1,
                    support,
                }
            })
            .collect();

        let present: Vec<&ClassMetrics> = per_class
            .iter()
            .filter(|m| m.support > 0 || confusion.iter().any(|row| row[m.label.index()] > 0))
            .collect();
        let average = |f: fn(&ClassMetrics) -> f64| {
            if present.is_empty() {
                0.0
            } else {
                present.iter().map(|m| f(m)).sum::<f64>() / present.len() as f64
            }
        };

        let macro_precision = average(|m| m.precision);
        let macro_recall = average(|m| m.recall);
        let macro_f1 = average(|m| m.f1);

        Self {
            accuracy,
            macro_precision,
            macro_recall,
            macro_f1,
            per_class,
            confusion_matrix: confusion,
        }
    }

    /// Metrics for one label
    pub fn class(&self, label: FaultType) -> &ClassMetrics {
        &self.per_class[label.index()]
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Test Accuracy: {:.2}%", self.accuracy * 100.0)?;
        writeln!(f)?;
        writeln!(f, "{:>10} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        for m in &self.per_class {
            writeln!(
                f,
                "{:>10} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                m.label.as_str(), m.precision, m.recall, m.f1, m.support
            )?;
        }
        let support: usize = self.per_class.iter().map(|m| m.support).sum();
        writeln!(
            f,
            "{:>10} {:>9.2} {:>9.2} {:>9.2} {:>9}",
            "macro avg", self.macro_precision, self.macro_recall, self.macro_f1, support
        )?;
        writeln!(f)?;
        writeln!(f, "Confusion Matrix (rows = true, cols = predicted):")?;
        write!(f, "{:>10}", "")?;
        for label in FaultType::ALL {
            write!(f, " {:>9}", label.as_str())?;
        }
        writeln!(f)?;
        for label in FaultType::ALL {
            write!(f, "{:>10}", label.as_str())?;
            for count in &self.confusion_matrix[label.index()] {
                write!(f, " {:>9}", count)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
