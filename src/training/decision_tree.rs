//! Regression tree used as the boosting base learner

use crate::error::{AdClickError, Result};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with prediction value
    Leaf { value: f64, n_samples: usize },
    /// Internal node; samples with `x[feature_idx] <= threshold` go left
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

/// Best split found for one feature
#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

/// Least-squares regression tree.
///
/// Splits minimise the squared error of the target. Leaf values are
/// `sum(target) / sum(hessian)`, which is the plain mean when every hessian
/// is one and a Newton step when fitting boosting residuals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    n_features: usize,
    feature_importances: Option<Array1<f64>>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTree {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            n_features: 0,
            feature_importances: None,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Fit with unit hessians, so leaves predict the mean target
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let ones = Array1::ones(y.len());
        self.fit_with_hessian(x, y, &ones)
    }

    pub fn fit_with_hessian(
        &mut self,
        x: &Array2<f64>,
        target: &Array1<f64>,
        hessian: &Array1<f64>,
    ) -> Result<&mut Self> {
        let n_samples = x.nrows();
        if n_samples != target.len() || n_samples != hessian.len() {
            return Err(AdClickError::ShapeError {
                expected: format!("{} targets and hessians", n_samples),
                actual: format!("{} targets, {} hessians", target.len(), hessian.len()),
            });
        }
        if n_samples == 0 {
            return Err(AdClickError::TrainingError(
                "cannot fit a tree on zero samples".to_string(),
            ));
        }

        self.n_features = x.ncols();
        let mut importances = vec![0.0; self.n_features];
        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build_tree(x, target, hessian, &indices, 0, &mut importances));

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.feature_importances = Some(Array1::from_vec(importances));
        Ok(self)
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        target: &Array1<f64>,
        hessian: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        importances: &mut [f64],
    ) -> TreeNode {
        let n_samples = indices.len();
        let leaf = || TreeNode::Leaf {
            value: Self::leaf_value(target, hessian, indices),
            n_samples,
        };

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d);
        if should_stop {
            return leaf();
        }

        let Some(best) = self.find_best_split(x, target, indices) else {
            return leaf();
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, best.feature_idx]] <= best.threshold);

        importances[best.feature_idx] += best.gain;

        let left = Box::new(self.build_tree(x, target, hessian, &left_indices, depth + 1, importances));
        let right = Box::new(self.build_tree(x, target, hessian, &right_indices, depth + 1, importances));

        TreeNode::Split {
            feature_idx: best.feature_idx,
            threshold: best.threshold,
            left,
            right,
            n_samples,
        }
    }

    /// Scan every feature in parallel. Gain is the reduction in total squared
    /// error; ties go to the lowest feature index.
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        target: &Array1<f64>,
        indices: &[usize],
    ) -> Option<SplitCandidate> {
        let n = indices.len();
        let total_sum: f64 = indices.iter().map(|&i| target[i]).sum();
        let parent_score = total_sum * total_sum / n as f64;
        let min_leaf = self.min_samples_leaf;

        let per_feature: Vec<Option<SplitCandidate>> = (0..x.ncols())
            .into_par_iter()
            .map(|feature_idx| {
                let mut order: Vec<(f64, f64)> = indices
                    .iter()
                    .map(|&i| (x[[i, feature_idx]], target[i]))
                    .collect();
                order.sort_by(|a, b| a.0.total_cmp(&b.0));

                let mut best: Option<SplitCandidate> = None;
                let mut left_sum = 0.0;
                for k in 0..n - 1 {
                    left_sum += order[k].1;
                    let left_count = k + 1;
                    let right_count = n - left_count;
                    if order[k].0 == order[k + 1].0
                        || left_count < min_leaf
                        || right_count < min_leaf
                    {
                        continue;
                    }

                    let right_sum = total_sum - left_sum;
                    let score = left_sum * left_sum / left_count as f64
                        + right_sum * right_sum / right_count as f64;
                    let gain = score - parent_score;
                    if gain > 1e-12 && best.map_or(true, |b| gain > b.gain) {
                        best = Some(SplitCandidate {
                            feature_idx,
                            threshold: (order[k].0 + order[k + 1].0) / 2.0,
                            gain,
                        });
                    }
                }
                best
            })
            .collect();

        per_feature
            .into_iter()
            .flatten()
            .fold(None, |acc: Option<SplitCandidate>, cand| match acc {
                Some(b) if b.gain >= cand.gain => Some(b),
                _ => Some(cand),
            })
    }

    fn leaf_value(target: &Array1<f64>, hessian: &Array1<f64>, indices: &[usize]) -> f64 {
        let numerator: f64 = indices.iter().map(|&i| target[i]).sum();
        let denominator: f64 = indices.iter().map(|&i| hessian[i]).sum();
        if denominator.abs() < 1e-12 {
            0.0
        } else {
            numerator / denominator
        }
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(AdClickError::ModelNotFitted)?;
        if x.ncols() != self.n_features {
            return Err(AdClickError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        Ok(x.rows()
            .into_iter()
            .map(|row| Self::predict_sample(root, &row.to_vec()))
            .collect())
    }

    fn predict_sample(node: &TreeNode, sample: &[f64]) -> f64 {
        match node {
            TreeNode::Leaf { value, .. } => *value,
            TreeNode::Split { feature_idx, threshold, left, right, .. } => {
                if sample[*feature_idx] <= *threshold {
                    Self::predict_sample(left, sample)
                } else {
                    Self::predict_sample(right, sample)
                }
            }
        }
    }

    pub fn feature_importances(&self) -> Option<&Array1<f64>> {
        self.feature_importances.as_ref()
    }

    pub fn get_depth(&self) -> usize {
        fn depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + depth(left).max(depth(right)),
            }
        }
        self.root.as_ref().map_or(0, depth)
    }

    pub fn get_n_leaves(&self) -> usize {
        fn leaves(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => leaves(left) + leaves(right),
            }
        }
        self.root.as_ref().map_or(0, leaves)
    }
}
