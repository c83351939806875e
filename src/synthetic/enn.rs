//! Edited nearest neighbours cleaning

use crate::error::{AdClickError, Result};
use crate::synthetic::{class_counts, nearest_rows, rows_of, ResampleResult, Sampler};
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Drops every sample whose `n_neighbors` nearest neighbours do not all
/// carry its own label. Every class is cleaned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditedNearestNeighbours {
    n_neighbors: usize,
}

impl EditedNearestNeighbours {
    pub fn new() -> Self {
        Self { n_neighbors: 3 }
    }
}

impl Default for EditedNearestNeighbours {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for EditedNearestNeighbours {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(AdClickError::ShapeError {
                expected: format!("{} labels", x.nrows()),
                actual: format!("{} labels", y.len()),
            });
        }
        Ok(())
    }

    fn resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        if x.nrows() != y.len() {
            return Err(AdClickError::ShapeError {
                expected: format!("{} labels", x.nrows()),
                actual: format!("{} labels", y.len()),
            });
        }

        let all: Vec<usize> = (0..x.nrows()).collect();
        let samples = rows_of(x, &all);

        let keep: Vec<usize> = (0..samples.len())
            .into_par_iter()
            .filter(|&i| {
                nearest_rows(&samples, i, self.n_neighbors)
                    .into_iter()
                    .all(|j| y[j] == y[i])
            })
            .collect();

        let n_removed = x.nrows() - keep.len();
        debug!(
            removed = n_removed,
            remaining = keep.len(),
            counts = ?class_counts(y),
            "ENN cleaning finished"
        );

        Ok(ResampleResult {
            x: x.select(Axis(0), &keep),
            y: y.select(Axis(0), &keep),
            n_synthetic: vec![0; class_counts(y).len()],
            n_removed,
        })
    }
}
