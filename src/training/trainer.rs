//! Model training stage

use crate::artifact::{DataTransformationArtifact, ModelTrainerArtifact};
use crate::config::{ModelHyperparameters, ModelTrainerConfig};
use crate::error::{AdClickError, Result};
use crate::inference::AdClickModel;
use crate::preprocessing::FeaturePipeline;
use crate::training::{accuracy_score, classification_score, GradientBoostingClassifier, GradientBoostingConfig};
use crate::transformation::split_label_column;
use crate::utils::{load_array, save_json};
use serde::Serialize;
use std::time::Instant;
use tracing::{info, warn};

/// `{model_name, parameters}` document written next to the bundle
#[derive(Debug, Serialize)]
struct ParametersDocument<'a> {
    model_name: &'a str,
    parameters: &'a crate::config::BoostingParams,
}

pub struct ModelTrainer {
    transformation: DataTransformationArtifact,
    config: ModelTrainerConfig,
    hyperparameters: ModelHyperparameters,
    target_column: String,
}

impl ModelTrainer {
    pub fn new(
        transformation: DataTransformationArtifact,
        config: ModelTrainerConfig,
        hyperparameters: ModelHyperparameters,
        target_column: impl Into<String>,
    ) -> Self {
        Self {
            transformation,
            config,
            hyperparameters,
            target_column: target_column.into(),
        }
    }

    pub fn initiate_model_trainer(&self) -> Result<ModelTrainerArtifact> {
        let train = load_array(&self.transformation.transformed_train_file_path)?;
        let test = load_array(&self.transformation.transformed_test_file_path)?;
        let (x_train, y_train) = split_label_column(&train)?;
        let (x_test, y_test) = split_label_column(&test)?;
        if x_train.ncols() != x_test.ncols() {
            return Err(AdClickError::ShapeError {
                expected: format!("{} test features", x_train.ncols()),
                actual: format!("{} test features", x_test.ncols()),
            });
        }

        let params = &self.hyperparameters.hyperparameters;
        info!(
            model = %self.hyperparameters.model_name,
            n_estimators = params.n_estimators,
            max_depth = params.max_depth,
            learning_rate = params.learning_rate,
            subsample = params.subsample,
            rows = x_train.nrows(),
            features = x_train.ncols(),
            "Training classifier"
        );

        let start = Instant::now();
        let mut classifier = GradientBoostingClassifier::new(GradientBoostingConfig::from(params));
        classifier
            .fit(&x_train, &y_train)
            .map_err(|e| AdClickError::TrainingError(e.to_string()))?;

        let train_accuracy = accuracy_score(&y_train, &classifier.predict(&x_train)?);
        info!(
            train_accuracy,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Classifier fitted"
        );

        let expected = self.hyperparameters.expected_model_score;
        if train_accuracy < expected {
            warn!(train_accuracy, expected, "Trained model is below the expected score");
            return Err(AdClickError::BelowExpectedScore {
                accuracy: train_accuracy,
                expected,
            });
        }

        let metric_artifact = classification_score(&y_test, &classifier.predict(&x_test)?)?;
        info!(
            accuracy = metric_artifact.accuracy,
            f1 = metric_artifact.f1_score,
            precision = metric_artifact.precision_score,
            recall = metric_artifact.recall_score,
            "Test metrics"
        );

        let pipeline = FeaturePipeline::load(&self.transformation.transformed_object_file_path)?;
        let model = AdClickModel::new(
            self.hyperparameters.model_name.clone(),
            self.target_column.clone(),
            pipeline,
            classifier,
        )?;
        model.save(&self.config.trained_model_file_path)?;
        save_json(
            &self.config.parameters_file_path,
            &ParametersDocument {
                model_name: &self.hyperparameters.model_name,
                parameters: params,
            },
        )?;
        save_json(&self.config.metrics_file_path, &metric_artifact)?;

        info!(path = %self.config.trained_model_file_path.display(), "Model trainer completed");

        Ok(ModelTrainerArtifact {
            trained_model_file_path: self.config.trained_model_file_path.clone(),
            parameters_file_path: self.config.parameters_file_path.clone(),
            metrics_file_path: self.config.metrics_file_path.clone(),
            train_accuracy,
            metric_artifact,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::save_array;
    use ndarray::Array2;
    use std::path::Path;

    fn stage(dir: &Path, expected_model_score: f64) -> ModelTrainer {
        ModelTrainer::new(
            DataTransformationArtifact {
                transformed_object_file_path: dir.join("preprocessing.json"),
                transformed_train_file_path: dir.join("train.json"),
                transformed_test_file_path: dir.join("test.json"),
            },
            ModelTrainerConfig {
                trained_model_file_path: dir.join("out/model.json"),
                parameters_file_path: dir.join("out/parameters.json"),
                metrics_file_path: dir.join("out/metrics.json"),
            },
            ModelHyperparameters {
                expected_model_score,
                ..Default::default()
            },
            "click",
        )
    }

    #[test]
    fn test_below_expected_score_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        // identical rows with alternating labels cannot be separated
        let data = Array2::from_shape_fn((20, 3), |(i, j)| if j == 2 { (i % 2) as f64 } else { 1.0 });
        save_array(&dir.path().join("train.json"), &data).unwrap();
        save_array(&dir.path().join("test.json"), &data).unwrap();

        let err = stage(dir.path(), 0.9).initiate_model_trainer().unwrap_err();
        match err {
            AdClickError::BelowExpectedScore { accuracy, expected } => {
                assert!((accuracy - 0.5).abs() < 1e-12);
                assert_eq!(expected, 0.9);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!dir.path().join("out/model.json").exists());
    }

    #[test]
    fn test_feature_width_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        save_array(&dir.path().join("train.json"), &Array2::zeros((4, 3))).unwrap();
        save_array(&dir.path().join("test.json"), &Array2::zeros((4, 2))).unwrap();
        assert!(matches!(
            stage(dir.path(), 0.1).initiate_model_trainer(),
            Err(AdClickError::ShapeError { .. })
        ));
    }
}
