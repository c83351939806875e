//! Model evaluation against the production bundle
//!
//! Both models score the raw test split through their own bundled
//! preprocessing, so a production model trained on an older category table
//! is still judged on its own encoding.

use crate::artifact::{DataIngestionArtifact, ModelEvaluationArtifact, ModelTrainerArtifact};
use crate::config::ModelEvaluationConfig;
use crate::error::{AdClickError, Result};
use crate::inference::AdClickModel;
use crate::storage::ModelRegistry;
use crate::training::classification_score;
use crate::transformation::split_target;
use crate::utils::load_csv;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluateModelResponse {
    pub trained_model_f1_score: f64,
    pub best_model_f1_score: Option<f64>,
    pub is_model_accepted: bool,
    pub difference: f64,
}

impl EvaluateModelResponse {
    /// A missing production model counts as an F1 of zero. Acceptance needs
    /// a gain strictly above `threshold`.
    pub fn compare(trained: f64, best: Option<f64>, threshold: f64) -> Self {
        let difference = trained - best.unwrap_or(0.0);
        Self {
            trained_model_f1_score: trained,
            best_model_f1_score: best,
            is_model_accepted: difference > threshold,
            difference,
        }
    }
}

pub struct ModelEvaluation {
    ingestion: DataIngestionArtifact,
    trainer: ModelTrainerArtifact,
    config: ModelEvaluationConfig,
    registry: Arc<dyn ModelRegistry>,
}

impl ModelEvaluation {
    pub fn new(
        ingestion: DataIngestionArtifact,
        trainer: ModelTrainerArtifact,
        config: ModelEvaluationConfig,
        registry: Arc<dyn ModelRegistry>,
    ) -> Self {
        Self {
            ingestion,
            trainer,
            config,
            registry,
        }
    }

    /// The production bundle, or `None` when the registry is empty
    pub fn get_best_model(&self) -> Result<Option<AdClickModel>> {
        if !self.registry.is_model_present(&self.config.model_key)? {
            return Ok(None);
        }
        self.registry.load_model(&self.config.model_key).map(Some)
    }

    fn f1_on(model: &AdClickModel, test: &DataFrame) -> Result<f64> {
        let (features, y_true) = split_target(test, &model.target_column)?;
        let y_pred = model.predict(&features)?;
        Ok(classification_score(&y_true, &y_pred)?.f1_score)
    }

    pub fn evaluate_model(&self) -> Result<EvaluateModelResponse> {
        let test = load_csv(&self.ingestion.test_file_path)?;

        let trained = AdClickModel::load(&self.trainer.trained_model_file_path)?;
        let trained_f1 = Self::f1_on(&trained, &test)?;

        let best_f1 = match self.get_best_model()? {
            Some(best) => Some(Self::f1_on(&best, &test)?),
            None => None,
        };

        Ok(EvaluateModelResponse::compare(
            trained_f1,
            best_f1,
            self.config.changed_threshold_score,
        ))
    }

    pub fn initiate_model_evaluation(&self) -> Result<ModelEvaluationArtifact> {
        let response = self
            .evaluate_model()
            .map_err(|e| AdClickError::EvaluationError(e.to_string()))?;

        info!(
            trained_f1 = response.trained_model_f1_score,
            best_f1 = ?response.best_model_f1_score,
            difference = response.difference,
            accepted = response.is_model_accepted,
            "Model evaluation completed"
        );

        Ok(ModelEvaluationArtifact {
            is_model_accepted: response.is_model_accepted,
            changed_accuracy: response.difference,
            trained_model_f1_score: response.trained_model_f1_score,
            best_model_f1_score: response.best_model_f1_score,
            registry_model_key: self.config.model_key.clone(),
            trained_model_path: self.trainer.trained_model_file_path.clone(),
        })
    }
}
