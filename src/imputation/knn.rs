//! KNN-based imputation

use crate::error::{AdClickError, Result};
use crate::imputation::{is_missing, Imputer};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Heap entry; ties on distance are broken by row index
#[derive(Debug, Clone, Copy)]
struct DistanceIdx(f64, usize);

impl PartialEq for DistanceIdx {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DistanceIdx {}

impl PartialOrd for DistanceIdx {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DistanceIdx {
    fn cmp(&self, other: &Self) -> Ordering {
        // Max heap: the farthest candidate sits on top
        self.0
            .partial_cmp(&other.0)
            .unwrap_or(Ordering::Equal)
            .then(self.1.cmp(&other.1))
    }
}

/// KNN-based imputer; a missing value is the plain mean of its neighbours
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KNNImputer {
    /// Number of neighbors
    n_neighbors: usize,
    /// Training data (complete rows only)
    complete_data: Option<Array2<f64>>,
    /// Feature means for fallback
    feature_means: Option<Array1<f64>>,
}

impl KNNImputer {
    pub fn new(n_neighbors: usize) -> Self {
        Self {
            n_neighbors: n_neighbors.max(1),
            complete_data: None,
            feature_means: None,
        }
    }

    /// Euclidean distance over the coordinates present in both rows,
    /// rescaled to the full width.
    fn distance(a: &[f64], b: &[f64]) -> f64 {
        let mut count = 0usize;
        let mut accum = 0.0f64;
        for (&ai, &bi) in a.iter().zip(b.iter()) {
            if is_missing(ai) || is_missing(bi) {
                continue;
            }
            count += 1;
            let d = ai - bi;
            accum += d * d;
        }

        if count == 0 {
            return f64::INFINITY;
        }
        (accum * a.len() as f64 / count as f64).sqrt()
    }

    /// k nearest complete rows, closest first
    fn find_neighbors(&self, data: &Array2<f64>, sample: &[f64]) -> Vec<usize> {
        let k = self.n_neighbors;
        let mut heap: BinaryHeap<DistanceIdx> = BinaryHeap::with_capacity(k + 1);
        let mut row_buf: Vec<f64> = Vec::with_capacity(data.ncols());

        for (i, row) in data.rows().into_iter().enumerate() {
            let dist = match row.as_slice() {
                Some(slice) => Self::distance(sample, slice),
                None => {
                    row_buf.clear();
                    row_buf.extend(row.iter().copied());
                    Self::distance(sample, &row_buf)
                }
            };
            if !dist.is_finite() {
                continue;
            }

            let candidate = DistanceIdx(dist, i);
            if heap.len() < k {
                heap.push(candidate);
            } else if let Some(top) = heap.peek() {
                if candidate < *top {
                    heap.pop();
                    heap.push(candidate);
                }
            }
        }

        heap.into_sorted_vec()
            .into_iter()
            .map(|DistanceIdx(_, i)| i)
            .collect()
    }

    fn impute_value(
        data: &Array2<f64>,
        means: &Array1<f64>,
        neighbors: &[usize],
        feature_idx: usize,
    ) -> f64 {
        if neighbors.is_empty() {
            return means[feature_idx];
        }
        let sum: f64 = neighbors.iter().map(|&idx| data[[idx, feature_idx]]).sum();
        sum / neighbors.len() as f64
    }
}

impl Default for KNNImputer {
    fn default() -> Self {
        Self::new(5)
    }
}

impl Imputer for KNNImputer {
    fn fit(&mut self, x: &Array2<f64>) -> Result<()> {
        let complete_rows: Vec<usize> = x
            .rows()
            .into_iter()
            .enumerate()
            .filter(|(_, row)| !row.iter().any(|&v| is_missing(v)))
            .map(|(i, _)| i)
            .collect();

        if complete_rows.is_empty() {
            return Err(AdClickError::TransformationError(
                "No complete rows found for KNN imputation".to_string(),
            ));
        }

        let complete_data = x.select(Axis(0), &complete_rows);
        let feature_means = complete_data.mean_axis(Axis(0)).ok_or_else(|| {
            AdClickError::TransformationError("Failed to compute means".to_string())
        })?;

        self.complete_data = Some(complete_data);
        self.feature_means = Some(feature_means);
        Ok(())
    }

    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (data, means) = match (&self.complete_data, &self.feature_means) {
            (Some(d), Some(m)) => (d, m),
            _ => return Err(AdClickError::ModelNotFitted),
        };
        if x.ncols() != data.ncols() {
            return Err(AdClickError::ShapeError {
                expected: format!("{} columns", data.ncols()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        let mut result = x.clone();
        let mut row_buf: Vec<f64> = Vec::with_capacity(x.ncols());

        for (row_idx, row) in x.rows().into_iter().enumerate() {
            if !row.iter().any(|&v| is_missing(v)) {
                continue;
            }

            row_buf.clear();
            row_buf.extend(row.iter().copied());
            let neighbors = self.find_neighbors(data, &row_buf);

            for (j, &v) in row_buf.iter().enumerate() {
                if is_missing(v) {
                    result[[row_idx, j]] = Self::impute_value(data, means, &neighbors, j);
                }
            }
        }

        Ok(result)
    }
}
