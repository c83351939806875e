//! Gradient boosted trees for binary classification
//!
//! Log-loss boosting: every round fits a regression tree to the residuals
//! `y - p` on a row subsample, with Newton leaf values, then moves the
//! log-odds of every training row by `learning_rate * tree(x)`.

use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::decision_tree::DecisionTree;
use crate::config::BoostingParams;
use crate::error::{AdClickError, Result};

const PROBA_EPS: f64 = 1e-6;

/// Gradient Boosting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingConfig {
    /// Number of boosting rounds (trees)
    pub n_estimators: usize,
    /// Learning rate (shrinkage)
    pub learning_rate: f64,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum samples per leaf
    pub min_samples_leaf: usize,
    /// Row subsample ratio for each tree
    pub subsample: f64,
    /// Random seed
    pub random_state: Option<u64>,
}

impl Default for GradientBoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 1,
            subsample: 1.0,
            random_state: Some(42),
        }
    }
}

impl From<&BoostingParams> for GradientBoostingConfig {
    fn from(params: &BoostingParams) -> Self {
        Self {
            n_estimators: params.n_estimators,
            learning_rate: params.learning_rate,
            max_depth: params.max_depth,
            subsample: params.subsample,
            random_state: params.random_state,
            ..Default::default()
        }
    }
}

fn sigmoid(log_odds: f64) -> f64 {
    1.0 / (1.0 + (-log_odds).exp())
}

/// Gradient Boosting Classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingClassifier {
    config: GradientBoostingConfig,
    trees: Vec<DecisionTree>,
    initial_log_odds: f64,
    n_features: usize,
    feature_importances: Vec<f64>,
}

impl GradientBoostingClassifier {
    pub fn new(config: GradientBoostingConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            initial_log_odds: 0.0,
            n_features: 0,
            feature_importances: Vec::new(),
        }
    }

    pub fn config(&self) -> &GradientBoostingConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Fit on 0/1 labels
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        let n_samples = x.nrows();
        let n_features = x.ncols();
        if n_samples != y.len() {
            return Err(AdClickError::ShapeError {
                expected: format!("{} labels", n_samples),
                actual: format!("{} labels", y.len()),
            });
        }
        if n_samples == 0 || n_features == 0 {
            return Err(AdClickError::TrainingError(format!(
                "cannot fit on a {}x{} matrix",
                n_samples, n_features
            )));
        }
        if let Some(bad) = y.iter().find(|&&v| v != 0 && v != 1) {
            return Err(AdClickError::TrainingError(format!(
                "labels must be 0 or 1, found {}",
                bad
            )));
        }

        let y: Array1<f64> = y.mapv(|v| v as f64);
        let p = y.mean().unwrap_or(0.5).clamp(PROBA_EPS, 1.0 - PROBA_EPS);
        self.initial_log_odds = (p / (1.0 - p)).ln();

        let mut log_odds = Array1::from_elem(n_samples, self.initial_log_odds);
        let mut rng = match self.config.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        self.trees.clear();
        self.n_features = n_features;
        self.feature_importances = vec![0.0; n_features];

        for round in 0..self.config.n_estimators {
            let probs = log_odds.mapv(sigmoid);
            let residuals = &y - &probs;
            let hessian = probs.mapv(|p| p * (1.0 - p));

            let sample_indices = self.subsample_indices(n_samples, &mut rng);

            let x_sub = x.select(Axis(0), &sample_indices);
            let r_sub = residuals.select(Axis(0), &sample_indices);
            let h_sub = hessian.select(Axis(0), &sample_indices);

            let mut tree = DecisionTree::new()
                .with_max_depth(self.config.max_depth)
                .with_min_samples_leaf(self.config.min_samples_leaf);
            tree.fit_with_hessian(&x_sub, &r_sub, &h_sub)?;

            // every row moves, sampled or not
            let update = tree.predict(x)?;
            log_odds.scaled_add(self.config.learning_rate, &update);

            if let Some(tree_importance) = tree.feature_importances() {
                for (total, &imp) in self.feature_importances.iter_mut().zip(tree_importance) {
                    *total += imp;
                }
            }

            if (round + 1) % 25 == 0 {
                debug!(round = round + 1, loss = Self::log_loss(&y, &log_odds), "Boosting progress");
            }

            self.trees.push(tree);
        }

        let total: f64 = self.feature_importances.iter().sum();
        if total > 0.0 {
            for imp in &mut self.feature_importances {
                *imp /= total;
            }
        }

        Ok(())
    }

    /// Predict class labels
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<i64>> {
        let probs = self.predict_proba(x)?;
        Ok(probs.mapv(|p| if p >= 0.5 { 1 } else { 0 }))
    }

    /// Probability of the positive class
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if !self.is_fitted() {
            return Err(AdClickError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(AdClickError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        let mut log_odds = Array1::from_elem(x.nrows(), self.initial_log_odds);
        for tree in &self.trees {
            let tree_pred = tree.predict(x)?;
            log_odds.scaled_add(self.config.learning_rate, &tree_pred);
        }

        Ok(log_odds.mapv(sigmoid))
    }

    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn log_loss(y: &Array1<f64>, log_odds: &Array1<f64>) -> f64 {
        let n = y.len().max(1) as f64;
        y.iter()
            .zip(log_odds.iter())
            .map(|(&yi, &lo)| {
                let p = sigmoid(lo).clamp(PROBA_EPS, 1.0 - PROBA_EPS);
                -(yi * p.ln() + (1.0 - yi) * (1.0 - p).ln())
            })
            .sum::<f64>()
            / n
    }

    /// Sorted row subsample of size `ceil(n * subsample)`
    fn subsample_indices(&self, n: usize, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
        let ratio = self.config.subsample;
        let mut indices: Vec<usize> = (0..n).collect();
        if ratio >= 1.0 {
            return indices;
        }
        let sample_size = ((n as f64) * ratio).ceil().max(1.0) as usize;
        indices.shuffle(rng);
        indices.truncate(sample_size);
        indices.sort_unstable();
        indices
    }
}
