//! SMOTE followed by ENN cleaning

use crate::error::{AdClickError, Result};
use crate::synthetic::{class_counts, EditedNearestNeighbours, ResampleResult, Sampler, SMOTE};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Oversample the minority class with SMOTE, then clean every class with
/// edited nearest neighbours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SMOTEENN {
    smote: SMOTE,
    enn: EditedNearestNeighbours,
}

impl SMOTEENN {
    pub fn new() -> Self {
        Self {
            smote: SMOTE::new(),
            enn: EditedNearestNeighbours::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.smote = self.smote.with_seed(seed);
        self
    }
}

impl Default for SMOTEENN {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for SMOTEENN {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        self.smote.fit(x, y)
    }

    fn resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        let before = class_counts(y);
        let oversampled = self.smote.resample(x, y)?;
        let cleaned = self.enn.resample(&oversampled.x, &oversampled.y)?;
        let after = class_counts(&cleaned.y);

        if let Some(lost) = before.keys().find(|class| !after.contains_key(class)) {
            return Err(AdClickError::TransformationError(format!(
                "resampling removed every sample of class {}",
                lost
            )));
        }

        info!(
            before = ?before,
            after = ?after,
            synthetic = oversampled.n_synthetic.iter().sum::<usize>(),
            removed = cleaned.n_removed,
            "Training data rebalanced"
        );

        Ok(ResampleResult {
            x: cleaned.x,
            y: cleaned.y,
            n_synthetic: oversampled.n_synthetic,
            n_removed: cleaned.n_removed,
        })
    }
}
