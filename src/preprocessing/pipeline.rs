//! Fitted feature pipeline: drop, encode, impute, scale

use crate::config::Schema;
use crate::error::{AdClickError, Result};
use crate::imputation::{CategoricalKnnImputer, Imputer};
use crate::utils::{array2_to_frame, columns_to_array2};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::info;

use super::{ColumnDropper, ColumnScaler, OneHotEncoder};

/// The four feature stages in their fixed order. Fit on training features
/// only, then reuse for every other frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturePipeline {
    dropper: ColumnDropper,
    encoder: OneHotEncoder,
    imputer: Option<CategoricalKnnImputer>,
    scaler: ColumnScaler,
    knn_neighbors: usize,
    feature_names: Vec<String>,
    is_fitted: bool,
}

impl FeaturePipeline {
    pub fn new(schema: &Schema, knn_neighbors: usize) -> Self {
        Self {
            dropper: ColumnDropper::new(schema.drop_columns.clone()),
            encoder: OneHotEncoder::new(schema.encoded_columns()),
            imputer: None,
            scaler: ColumnScaler::new(schema.num_features.clone(), schema.mm_columns.clone()),
            knn_neighbors,
            feature_names: Vec::new(),
            is_fitted: false,
        }
    }

    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<Array2<f64>> {
        let start = Instant::now();

        let dropped = self.dropper.transform(df)?;
        let encoded = self.encoder.fit_transform(&dropped)?;
        let names = self.encoder.output_columns().to_vec();

        let matrix = columns_to_array2(&encoded, &names)?;
        let mut imputer = CategoricalKnnImputer::new(self.encoder.slots(), self.knn_neighbors);
        let imputed = imputer.fit_transform(&matrix)?;

        let frame = array2_to_frame(&imputed, &names)?;
        let scaled = self.scaler.fit_transform(&frame)?;
        let features = columns_to_array2(&scaled, &names)?;

        self.imputer = Some(imputer);
        self.feature_names = names;
        self.is_fitted = true;

        info!(
            rows = features.nrows(),
            features = features.ncols(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Feature pipeline fitted"
        );
        Ok(features)
    }

    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let imputer = match (&self.imputer, self.is_fitted) {
            (Some(imputer), true) => imputer,
            _ => return Err(AdClickError::ModelNotFitted),
        };

        let dropped = self.dropper.transform(df)?;
        let encoded = self.encoder.transform(&dropped)?;
        let matrix = columns_to_array2(&encoded, &self.feature_names)?;
        let imputed = imputer.transform(&matrix)?;
        let frame = array2_to_frame(&imputed, &self.feature_names)?;
        let scaled = self.scaler.transform(&frame)?;
        columns_to_array2(&scaled, &self.feature_names)
    }

    /// Encoded column names, in output order
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn encoder(&self) -> &OneHotEncoder {
        &self.encoder
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        crate::utils::save_json(path, self)
    }

    pub fn load(path: &Path) -> Result<Self> {
        crate::utils::load_json(path)
    }
}
