//! SMOTE oversampling

use crate::error::{AdClickError, Result};
use crate::synthetic::{class_counts, class_indices, nearest_rows, rows_of, ResampleResult, Sampler};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// SMOTE (Synthetic Minority Over-sampling Technique)
///
/// Grows the minority class up to the majority count. Each synthetic row is
/// placed on the segment between a random minority sample and one of its
/// `k_neighbors` nearest minority neighbours.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SMOTE {
    k_neighbors: usize,
    seed: Option<u64>,
    target_counts: Option<BTreeMap<i64, usize>>,
}

impl SMOTE {
    pub fn new() -> Self {
        Self {
            k_neighbors: 5,
            seed: None,
            target_counts: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn interpolate(point: &[f64], neighbor: &[f64], gap: f64) -> Vec<f64> {
        point
            .iter()
            .zip(neighbor.iter())
            .map(|(&p, &n)| p + gap * (n - p))
            .collect()
    }
}

impl Default for SMOTE {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for SMOTE {
    fn fit(&mut self, _x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        let counts = class_counts(y);
        if counts.len() < 2 {
            return Err(AdClickError::TransformationError(
                "SMOTE needs at least 2 classes".to_string(),
            ));
        }

        let max_count = counts.values().copied().max().unwrap_or(0);
        // Smallest class wins; equal counts resolve to the lowest label
        let minority = counts
            .iter()
            .min_by_key(|(_, &count)| count)
            .map(|(&class, _)| class);

        let targets = counts
            .iter()
            .map(|(&class, &count)| {
                let target = if Some(class) == minority { max_count } else { count };
                (class, target)
            })
            .collect();

        self.target_counts = Some(targets);
        Ok(())
    }

    fn resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        let targets = self
            .target_counts
            .as_ref()
            .ok_or(AdClickError::ModelNotFitted)?;
        if x.nrows() != y.len() {
            return Err(AdClickError::ShapeError {
                expected: format!("{} labels", x.nrows()),
                actual: format!("{} labels", y.len()),
            });
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let indices = class_indices(y);
        let counts = class_counts(y);
        let n_features = x.ncols();

        let mut synthetic_x: Vec<Vec<f64>> = Vec::new();
        let mut synthetic_y: Vec<i64> = Vec::new();
        let mut n_synthetic = Vec::with_capacity(targets.len());

        for (&class, &target_count) in targets {
            let current_count = counts.get(&class).copied().unwrap_or(0);
            let n_to_generate = target_count.saturating_sub(current_count);
            if n_to_generate == 0 {
                n_synthetic.push(0);
                continue;
            }

            let class_samples = rows_of(x, indices.get(&class).map(Vec::as_slice).unwrap_or(&[]));
            if class_samples.len() < 2 {
                return Err(AdClickError::TransformationError(format!(
                    "class {} has {} sample(s); SMOTE needs at least 2",
                    class,
                    class_samples.len()
                )));
            }

            let k = self.k_neighbors.min(class_samples.len() - 1);
            let neighbors: Vec<Vec<usize>> = (0..class_samples.len())
                .into_par_iter()
                .map(|i| nearest_rows(&class_samples, i, k))
                .collect();

            for _ in 0..n_to_generate {
                let idx = rng.gen_range(0..class_samples.len());
                let nn = neighbors[idx][rng.gen_range(0..neighbors[idx].len())];
                let gap: f64 = rng.gen();
                synthetic_x.push(Self::interpolate(&class_samples[idx], &class_samples[nn], gap));
                synthetic_y.push(class);
            }

            debug!(class, generated = n_to_generate, k, "SMOTE generated samples");
            n_synthetic.push(n_to_generate);
        }

        let n_original = x.nrows();
        let n_total = n_original + synthetic_x.len();
        let x_out = Array2::from_shape_fn((n_total, n_features), |(i, j)| {
            if i < n_original {
                x[[i, j]]
            } else {
                synthetic_x[i - n_original][j]
            }
        });
        let y_out = Array1::from_iter(y.iter().copied().chain(synthetic_y));

        Ok(ResampleResult {
            x: x_out,
            y: y_out,
            n_synthetic,
            n_removed: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolates_towards_five_neighbours() {
        assert_eq!(SMOTE::default().k_neighbors, 5);
    }

    fn imbalanced() -> (Array2<f64>, Array1<i64>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..40 {
            rows.extend_from_slice(&[i as f64 * 0.1, 0.0]);
            labels.push(0);
        }
        for i in 0..10 {
            rows.extend_from_slice(&[10.0 + i as f64 * 0.1, 5.0]);
            labels.push(1);
        }
        (
            Array2::from_shape_vec((50, 2), rows).unwrap(),
            Array1::from_vec(labels),
        )
    }

    #[test]
    fn test_smote_balances_minority() {
        let (x, y) = imbalanced();
        let mut smote = SMOTE::new().with_seed(42);
        let result = smote.fit_resample(&x, &y).unwrap();

        let counts = class_counts(&result.y);
        assert_eq!(counts[&0], 40);
        assert_eq!(counts[&1], 40);
        assert_eq!(result.n_synthetic, vec![0, 30]);
        // originals first, unchanged
        assert_eq!(result.x.slice(ndarray::s![..50, ..]), x);
    }

    #[test]
    fn test_synthetic_rows_stay_inside_minority_hull() {
        let (x, y) = imbalanced();
        let result = SMOTE::new().with_seed(7).fit_resample(&x, &y).unwrap();
        for row in result.x.rows().into_iter().skip(50) {
            assert!(row[0] >= 10.0 && row[0] <= 10.9 + 1e-12);
            assert_eq!(row[1], 5.0);
        }
    }

    #[test]
    fn test_seed_is_deterministic() {
        let (x, y) = imbalanced();
        let a = SMOTE::new().with_seed(3).fit_resample(&x, &y).unwrap();
        let b = SMOTE::new().with_seed(3).fit_resample(&x, &y).unwrap();
        assert_eq!(a.x, b.x);
    }

    #[test]
    fn test_single_minority_sample_fails() {
        let x = Array2::from_shape_vec((4, 1), vec![0.0, 1.0, 2.0, 9.0]).unwrap();
        let y = Array1::from_vec(vec![0, 0, 0, 1]);
        let err = SMOTE::new().with_seed(1).fit_resample(&x, &y).unwrap_err();
        assert!(matches!(err, AdClickError::TransformationError(_)));
    }

    #[test]
    fn test_single_class_fails() {
        let x = Array2::zeros((3, 2));
        let y = Array1::from_vec(vec![1, 1, 1]);
        assert!(SMOTE::new().fit(&x, &y).is_err());
    }
}
