//! Binary classification scores

use crate::artifact::ClassificationMetricArtifact;
use crate::error::{AdClickError, Result};
use ndarray::Array1;

/// Confusion counts with `1` as the positive label
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionCounts {
    pub tp: usize,
    pub fp: usize,
    pub tn: usize,
    pub fn_: usize,
}

impl ConfusionCounts {
    pub fn from_labels(y_true: &Array1<i64>, y_pred: &Array1<i64>) -> Self {
        let mut counts = Self::default();
        for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
            match (t == 1, p == 1) {
                (true, true) => counts.tp += 1,
                (false, true) => counts.fp += 1,
                (false, false) => counts.tn += 1,
                (true, false) => counts.fn_ += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.tp + self.fp + self.tn + self.fn_
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Fraction of matching labels
pub fn accuracy_score(y_true: &Array1<i64>, y_pred: &Array1<i64>) -> f64 {
    let correct = y_true.iter().zip(y_pred.iter()).filter(|(t, p)| t == p).count();
    ratio(correct, y_true.len())
}

/// Accuracy, F1, precision and recall. Undefined ratios score 0.
pub fn classification_score(
    y_true: &Array1<i64>,
    y_pred: &Array1<i64>,
) -> Result<ClassificationMetricArtifact> {
    if y_true.len() != y_pred.len() {
        return Err(AdClickError::ShapeError {
            expected: format!("{} predictions", y_true.len()),
            actual: format!("{} predictions", y_pred.len()),
        });
    }

    let c = ConfusionCounts::from_labels(y_true, y_pred);
    let precision = ratio(c.tp, c.tp + c.fp);
    let recall = ratio(c.tp, c.tp + c.fn_);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    Ok(ClassificationMetricArtifact {
        accuracy: ratio(c.tp + c.tn, c.total()),
        f1_score: f1,
        precision_score: precision,
        recall_score: recall,
    })
}
