//! Feature transformation stage
//!
//! Fits the [`FeaturePipeline`] on the training split, applies it to the
//! test split, rebalances the training pair and writes both matrices with
//! the label as their last column.

use crate::artifact::{DataIngestionArtifact, DataTransformationArtifact, DataValidationArtifact};
use crate::config::{DataTransformationConfig, Schema};
use crate::error::{AdClickError, Result};
use crate::preprocessing::FeaturePipeline;
use crate::synthetic::{Sampler, SMOTEENN};
use crate::utils::{load_csv, save_array};
use ndarray::{concatenate, Array1, Array2, Axis};
use polars::prelude::*;
use tracing::info;

/// Split the target column off `df`. Every label must be 0 or 1.
pub fn split_target(df: &DataFrame, target: &str) -> Result<(DataFrame, Array1<i64>)> {
    let column = df
        .column(target)
        .map_err(|_| AdClickError::FeatureNotFound(target.to_string()))?;
    let as_int = column.strict_cast(&DataType::Int64).map_err(|e| {
        AdClickError::TransformationError(format!("target '{}' is not integral: {}", target, e))
    })?;

    let labels = as_int
        .i64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| match v {
            Some(label @ (0 | 1)) => Ok(label),
            Some(other) => Err(AdClickError::TransformationError(format!(
                "target '{}' has non-binary label {} at row {}",
                target, other, row
            ))),
            None => Err(AdClickError::TransformationError(format!(
                "target '{}' is missing at row {}",
                target, row
            ))),
        })
        .collect::<Result<Vec<i64>>>()?;

    Ok((df.drop(target)?, Array1::from_vec(labels)))
}

/// Append `y` to `x` as a trailing column
pub fn with_label_column(x: &Array2<f64>, y: &Array1<i64>) -> Result<Array2<f64>> {
    if x.nrows() != y.len() {
        return Err(AdClickError::ShapeError {
            expected: format!("{} labels", x.nrows()),
            actual: format!("{} labels", y.len()),
        });
    }
    let label = y.mapv(|v| v as f64).insert_axis(Axis(1));
    Ok(concatenate(Axis(1), &[x.view(), label.view()])?)
}

/// Split a persisted matrix back into features and labels
pub fn split_label_column(data: &Array2<f64>) -> Result<(Array2<f64>, Array1<i64>)> {
    if data.ncols() < 2 {
        return Err(AdClickError::ShapeError {
            expected: "at least one feature column and a label column".to_string(),
            actual: format!("{} columns", data.ncols()),
        });
    }
    let last = data.ncols() - 1;
    let x = data.slice(ndarray::s![.., ..last]).to_owned();
    let y = data.column(last).mapv(|v| v.round() as i64);
    Ok((x, y))
}

pub struct DataTransformation {
    ingestion: DataIngestionArtifact,
    validation: DataValidationArtifact,
    config: DataTransformationConfig,
    schema: Schema,
}

impl DataTransformation {
    pub fn new(
        ingestion: DataIngestionArtifact,
        validation: DataValidationArtifact,
        config: DataTransformationConfig,
        schema: Schema,
    ) -> Self {
        Self {
            ingestion,
            validation,
            config,
            schema,
        }
    }

    pub fn initiate_data_transformation(&self) -> Result<DataTransformationArtifact> {
        if !self.validation.validation_status {
            return Err(AdClickError::TransformationError(self.validation.message.clone()));
        }

        let train = load_csv(&self.ingestion.train_file_path)?;
        let test = load_csv(&self.ingestion.test_file_path)?;
        let target = &self.schema.target_column;

        let (train_features, train_labels) = split_target(&train, target)?;
        let (test_features, test_labels) = split_target(&test, target)?;

        let mut pipeline = FeaturePipeline::new(&self.schema, self.config.knn_neighbors);
        let x_train = pipeline.fit_transform(&train_features)?;
        let x_test = pipeline.transform(&test_features)?;
        info!(
            features = ?pipeline.feature_names(),
            "Applied preprocessing to training and testing features"
        );

        let resampled = SMOTEENN::new()
            .with_seed(self.config.resample_seed)
            .fit_resample(&x_train, &train_labels)?;

        let train_arr = with_label_column(&resampled.x, &resampled.y)?;
        let test_arr = with_label_column(&x_test, &test_labels)?;

        save_array(&self.config.transformed_train_file_path, &train_arr)?;
        save_array(&self.config.transformed_test_file_path, &test_arr)?;
        pipeline.save(&self.config.transformed_object_file_path)?;

        info!(
            train_shape = ?train_arr.dim(),
            test_shape = ?test_arr.dim(),
            object = %self.config.transformed_object_file_path.display(),
            "Data transformation completed"
        );

        Ok(DataTransformationArtifact {
            transformed_object_file_path: self.config.transformed_object_file_path.clone(),
            transformed_train_file_path: self.config.transformed_train_file_path.clone(),
            transformed_test_file_path: self.config.transformed_test_file_path.clone(),
        })
    }
}
