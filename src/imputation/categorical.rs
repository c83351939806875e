//! KNN imputation over one-hot encoded categories
//!
//! Each encoded categorical group is collapsed into a single integer code
//! before the neighbour search (`0` is the dropped first level, `i` the i-th
//! kept level). Imputed codes are rounded, clamped into the level range and
//! expanded back into indicators, so a decoded value is always a level that
//! was seen at fit time.

use crate::error::{AdClickError, Result};
use crate::imputation::{is_missing, Imputer, KNNImputer};
use crate::preprocessing::CategoryLevels;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// One column of the pre-encoding layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Slot {
    /// Passed through as a single numeric column
    Numeric(String),
    /// Expanded into `levels.len() - 1` indicator columns
    Category(CategoryLevels),
}

impl Slot {
    /// Number of encoded columns this slot occupies
    pub fn width(&self) -> usize {
        match self {
            Slot::Numeric(_) => 1,
            Slot::Category(levels) => levels.n_indicators(),
        }
    }
}

/// Maps between indicator columns and compact category codes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCodec {
    slots: Vec<Slot>,
}

impl CategoryCodec {
    pub fn new(slots: Vec<Slot>) -> Self {
        Self { slots }
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Width of the indicator matrix
    pub fn encoded_width(&self) -> usize {
        self.slots.iter().map(Slot::width).sum()
    }

    /// Width of the code matrix
    pub fn compact_width(&self) -> usize {
        self.slots.len()
    }

    /// Replace every indicator group by its code. A group with any NaN
    /// indicator yields a NaN code.
    pub fn collapse(&self, encoded: &Array2<f64>) -> Result<Array2<f64>> {
        if encoded.ncols() != self.encoded_width() {
            return Err(AdClickError::ShapeError {
                expected: format!("{} encoded columns", self.encoded_width()),
                actual: format!("{} columns", encoded.ncols()),
            });
        }

        let mut compact = Array2::zeros((encoded.nrows(), self.compact_width()));
        for (i, row) in encoded.rows().into_iter().enumerate() {
            let mut offset = 0;
            for (j, slot) in self.slots.iter().enumerate() {
                let width = slot.width();
                compact[[i, j]] = match slot {
                    Slot::Numeric(_) => row[offset],
                    Slot::Category(_) => {
                        let group = row.slice(ndarray::s![offset..offset + width]);
                        if group.iter().any(|&v| is_missing(v)) {
                            f64::NAN
                        } else {
                            group
                                .iter()
                                .position(|&v| v >= 0.5)
                                .map(|k| (k + 1) as f64)
                                .unwrap_or(0.0)
                        }
                    }
                };
                offset += width;
            }
        }
        Ok(compact)
    }

    /// Snap a raw code onto the nearest valid level index
    pub fn snap(code: f64, n_levels: usize) -> usize {
        let max = n_levels.saturating_sub(1) as f64;
        code.round().clamp(0.0, max) as usize
    }

    /// Expand codes back into indicators; category codes are snapped first.
    pub fn expand(&self, compact: &Array2<f64>) -> Result<Array2<f64>> {
        if compact.ncols() != self.compact_width() {
            return Err(AdClickError::ShapeError {
                expected: format!("{} code columns", self.compact_width()),
                actual: format!("{} columns", compact.ncols()),
            });
        }

        let mut encoded = Array2::zeros((compact.nrows(), self.encoded_width()));
        for (i, row) in compact.rows().into_iter().enumerate() {
            let mut offset = 0;
            for (j, slot) in self.slots.iter().enumerate() {
                match slot {
                    Slot::Numeric(_) => encoded[[i, offset]] = row[j],
                    Slot::Category(levels) => {
                        if is_missing(row[j]) {
                            for k in 0..levels.n_indicators() {
                                encoded[[i, offset + k]] = f64::NAN;
                            }
                        } else {
                            let code = Self::snap(row[j], levels.levels.len());
                            if code > 0 {
                                encoded[[i, offset + code - 1]] = 1.0;
                            }
                        }
                    }
                }
                offset += slot.width();
            }
        }
        Ok(encoded)
    }

    /// Level names of every category slot for one code row
    pub fn decode_row<'a>(&'a self, codes: &[f64]) -> Vec<Option<&'a str>> {
        self.slots
            .iter()
            .zip(codes.iter())
            .filter_map(|(slot, &code)| match slot {
                Slot::Numeric(_) => None,
                Slot::Category(_) if is_missing(code) => Some(None),
                Slot::Category(levels) => {
                    let idx = Self::snap(code, levels.levels.len());
                    Some(levels.levels.get(idx).map(String::as_str))
                }
            })
            .collect()
    }
}

/// KNN imputer that keeps one-hot groups consistent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalKnnImputer {
    codec: CategoryCodec,
    knn: KNNImputer,
}

impl CategoricalKnnImputer {
    pub fn new(slots: Vec<Slot>, n_neighbors: usize) -> Self {
        Self {
            codec: CategoryCodec::new(slots),
            knn: KNNImputer::new(n_neighbors),
        }
    }

    pub fn codec(&self) -> &CategoryCodec {
        &self.codec
    }

    /// Impute in code space without re-expanding
    pub fn transform_codes(&self, encoded: &Array2<f64>) -> Result<Array2<f64>> {
        let compact = self.codec.collapse(encoded)?;
        let mut imputed = self.knn.transform(&compact)?;
        for (j, slot) in self.codec.slots().iter().enumerate() {
            if let Slot::Category(levels) = slot {
                let n_levels = levels.levels.len();
                imputed
                    .column_mut(j)
                    .mapv_inplace(|c| CategoryCodec::snap(c, n_levels) as f64);
            }
        }
        Ok(imputed)
    }
}

impl Imputer for CategoricalKnnImputer {
    fn fit(&mut self, x: &Array2<f64>) -> Result<()> {
        let compact = self.codec.collapse(x)?;
        self.knn.fit(&compact)
    }

    fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let codes = self.transform_codes(x)?;
        self.codec.expand(&codes)
    }
}
