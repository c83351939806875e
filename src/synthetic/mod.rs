//! Class rebalancing for the training split
//!
//! - SMOTE oversampling of the minority class
//! - Edited nearest neighbours cleaning
//! - SMOTEENN, the two chained

mod combined;
mod enn;
mod smote;

pub use combined::SMOTEENN;
pub use enn::EditedNearestNeighbours;
pub use smote::SMOTE;

use crate::error::Result;
use ndarray::{Array1, Array2};
use std::collections::BTreeMap;

/// Result of resampling
#[derive(Debug, Clone)]
pub struct ResampleResult {
    /// Resampled features
    pub x: Array2<f64>,
    /// Resampled labels
    pub y: Array1<i64>,
    /// Synthetic samples generated per class, in label order
    pub n_synthetic: Vec<usize>,
    /// Samples removed by cleaning
    pub n_removed: usize,
}

/// Trait for samplers
pub trait Sampler: Send + Sync {
    /// Fit the sampler on data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()>;

    /// Resample data
    fn resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult>;

    /// Fit and resample in one step
    fn fit_resample(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        self.fit(x, y)?;
        self.resample(x, y)
    }
}

/// Class distribution, ordered by label
pub fn class_counts(y: &Array1<i64>) -> BTreeMap<i64, usize> {
    let mut counts = BTreeMap::new();
    for &label in y.iter() {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Row indices for each class, ordered by label
pub fn class_indices(y: &Array1<i64>) -> BTreeMap<i64, Vec<usize>> {
    let mut indices = BTreeMap::new();
    for (i, &label) in y.iter().enumerate() {
        indices.entry(label).or_insert_with(Vec::new).push(i);
    }
    indices
}

pub(crate) fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(ai, bi)| (ai - bi).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// The `k` rows of `data` closest to row `of`, excluding `of` itself.
/// Ties are broken by row index so results are reproducible.
pub(crate) fn nearest_rows(data: &[Vec<f64>], of: usize, k: usize) -> Vec<usize> {
    let point = &data[of];
    let mut dists: Vec<(f64, usize)> = data
        .iter()
        .enumerate()
        .filter(|(j, _)| *j != of)
        .map(|(j, row)| (euclidean(point, row), j))
        .collect();
    let k = k.min(dists.len());
    if k == 0 {
        return Vec::new();
    }
    let cmp = |a: &(f64, usize), b: &(f64, usize)| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1));
    dists.select_nth_unstable_by(k - 1, cmp);
    dists.truncate(k);
    dists.sort_by(cmp);
    dists.into_iter().map(|(_, j)| j).collect()
}

pub(crate) fn rows_of(x: &Array2<f64>, indices: &[usize]) -> Vec<Vec<f64>> {
    indices.iter().map(|&i| x.row(i).to_vec()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_counts_ordered() {
        let y = Array1::from_vec(vec![1, 0, 0, 1, 0]);
        let counts: Vec<(i64, usize)> = class_counts(&y).into_iter().collect();
        assert_eq!(counts, vec![(0, 3), (1, 2)]);
        assert_eq!(class_indices(&y)[&1], vec![0, 3]);
    }

    #[test]
    fn test_nearest_rows_excludes_self_and_breaks_ties() {
        let data = vec![vec![0.0], vec![1.0], vec![1.0], vec![5.0], vec![0.0]];
        assert_eq!(nearest_rows(&data, 0, 3), vec![4, 1, 2]);
        assert_eq!(nearest_rows(&data, 3, 10).len(), 4);
    }
}
