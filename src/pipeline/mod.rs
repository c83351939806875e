//! End-to-end training pipeline
//!
//! `Ingest -> Validate -> Transform -> Train -> Evaluate -> Push`, strictly
//! sequential with no retries. A failed validation or a rejected model ends
//! the run early; every other failure carries the stage it came from.

use crate::artifact::*;
use crate::config::{AppConfig, ModelHyperparameters, Schema, TrainingPipelineConfig};
use crate::error::AdClickError;
use crate::evaluation::ModelEvaluation;
use crate::ingestion::DataIngestion;
use crate::pusher::ModelPusher;
use crate::storage::{DocumentStore, ModelRegistry};
use crate::training::ModelTrainer;
use crate::transformation::DataTransformation;
use crate::validation::DataValidation;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PipelineStage {
    Ingestion,
    Validation,
    Transformation,
    Training,
    Evaluation,
    Push,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Ingestion => "data_ingestion",
            PipelineStage::Validation => "data_validation",
            PipelineStage::Transformation => "data_transformation",
            PipelineStage::Training => "model_trainer",
            PipelineStage::Evaluation => "model_evaluation",
            PipelineStage::Push => "model_pusher",
        };
        f.write_str(name)
    }
}

/// Why a run was aborted
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[source] AdClickError),

    #[error("Data ingestion failed: {0}")]
    Ingestion(#[source] AdClickError),

    #[error("Data validation rejected the input: {0}")]
    ValidationFailed(String),

    #[error("Data validation failed: {0}")]
    Validation(#[source] AdClickError),

    #[error("Data transformation failed: {0}")]
    Transformation(#[source] AdClickError),

    #[error("Model training failed: {0}")]
    Training(#[source] AdClickError),

    #[error("Trained model is not better than the production model (difference {difference:.4})")]
    ModelNotAccepted {
        trained_model_f1_score: f64,
        best_model_f1_score: Option<f64>,
        difference: f64,
    },

    #[error("Model evaluation failed: {0}")]
    Evaluation(#[source] AdClickError),

    #[error("Model push failed: {0}")]
    Push(#[source] AdClickError),
}

impl PipelineError {
    /// Stage the run stopped in; `None` for configuration errors
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            PipelineError::Config(_) => None,
            PipelineError::Ingestion(_) => Some(PipelineStage::Ingestion),
            PipelineError::ValidationFailed(_) | PipelineError::Validation(_) => {
                Some(PipelineStage::Validation)
            }
            PipelineError::Transformation(_) => Some(PipelineStage::Transformation),
            PipelineError::Training(_) => Some(PipelineStage::Training),
            PipelineError::ModelNotAccepted { .. } | PipelineError::Evaluation(_) => {
                Some(PipelineStage::Evaluation)
            }
            PipelineError::Push(_) => Some(PipelineStage::Push),
        }
    }
}

/// Artifacts of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub artifact_dir: PathBuf,
    pub ingestion: DataIngestionArtifact,
    pub validation: DataValidationArtifact,
    pub transformation: DataTransformationArtifact,
    pub trainer: ModelTrainerArtifact,
    pub evaluation: ModelEvaluationArtifact,
    pub pusher: ModelPusherArtifact,
}

pub struct TrainPipeline {
    app: AppConfig,
    config: TrainingPipelineConfig,
    schema: Schema,
    hyperparameters: ModelHyperparameters,
    store: Arc<dyn DocumentStore>,
    registry: Arc<dyn ModelRegistry>,
}

impl TrainPipeline {
    pub fn new(
        app: AppConfig,
        store: Arc<dyn DocumentStore>,
        registry: Arc<dyn ModelRegistry>,
    ) -> Result<Self, PipelineError> {
        let schema = app.load_schema().map_err(PipelineError::Config)?;
        let hyperparameters = app.load_hyperparameters().map_err(PipelineError::Config)?;
        let config = TrainingPipelineConfig::now(&app.artifact_dir);
        Ok(Self {
            app,
            config,
            schema,
            hyperparameters,
            store,
            registry,
        })
    }

    /// Replace the run directory settings
    pub fn with_pipeline_config(mut self, config: TrainingPipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_hyperparameters(mut self, hyperparameters: ModelHyperparameters) -> Self {
        self.hyperparameters = hyperparameters;
        self
    }

    pub fn pipeline_config(&self) -> &TrainingPipelineConfig {
        &self.config
    }

    pub fn start_data_ingestion(&self) -> Result<DataIngestionArtifact, PipelineError> {
        info!(stage = %PipelineStage::Ingestion, "Starting stage");
        DataIngestion::new(self.config.data_ingestion(&self.app), self.store.clone())
            .initiate_data_ingestion()
            .map_err(PipelineError::Ingestion)
    }

    pub fn start_data_validation(
        &self,
        ingestion: &DataIngestionArtifact,
    ) -> Result<DataValidationArtifact, PipelineError> {
        info!(stage = %PipelineStage::Validation, "Starting stage");
        DataValidation::new(
            ingestion.clone(),
            self.config.data_validation(),
            self.schema.clone(),
        )
        .initiate_data_validation()
        .map_err(PipelineError::Validation)
    }

    pub fn start_data_transformation(
        &self,
        ingestion: &DataIngestionArtifact,
        validation: &DataValidationArtifact,
    ) -> Result<DataTransformationArtifact, PipelineError> {
        info!(stage = %PipelineStage::Transformation, "Starting stage");
        DataTransformation::new(
            ingestion.clone(),
            validation.clone(),
            self.config.data_transformation(&self.app),
            self.schema.clone(),
        )
        .initiate_data_transformation()
        .map_err(PipelineError::Transformation)
    }

    pub fn start_model_trainer(
        &self,
        transformation: &DataTransformationArtifact,
    ) -> Result<ModelTrainerArtifact, PipelineError> {
        info!(stage = %PipelineStage::Training, "Starting stage");
        ModelTrainer::new(
            transformation.clone(),
            self.config.model_trainer(),
            self.hyperparameters.clone(),
            self.schema.target_column.clone(),
        )
        .initiate_model_trainer()
        .map_err(PipelineError::Training)
    }

    pub fn start_model_evaluation(
        &self,
        ingestion: &DataIngestionArtifact,
        trainer: &ModelTrainerArtifact,
    ) -> Result<ModelEvaluationArtifact, PipelineError> {
        info!(stage = %PipelineStage::Evaluation, "Starting stage");
        ModelEvaluation::new(
            ingestion.clone(),
            trainer.clone(),
            self.config.model_evaluation(&self.app),
            self.registry.clone(),
        )
        .initiate_model_evaluation()
        .map_err(PipelineError::Evaluation)
    }

    pub fn start_model_pusher(
        &self,
        evaluation: &ModelEvaluationArtifact,
    ) -> Result<ModelPusherArtifact, PipelineError> {
        info!(stage = %PipelineStage::Push, "Starting stage");
        ModelPusher::new(
            evaluation.clone(),
            self.config.model_pusher(&self.app),
            self.registry.clone(),
        )
        .initiate_model_pusher()
        .map_err(PipelineError::Push)
    }

    pub fn run_pipeline(&self) -> Result<PipelineReport, PipelineError> {
        let start = Instant::now();
        info!(artifact_dir = %self.config.artifact_dir.display(), "Training pipeline started");

        let result = self.run_stages();
        match &result {
            Ok(report) => info!(
                f1 = report.evaluation.trained_model_f1_score,
                location = %report.pusher.registry_location,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Training pipeline completed"
            ),
            Err(e @ PipelineError::ModelNotAccepted { .. }) => {
                warn!(error = %e, "Training pipeline stopped")
            }
            Err(e) => error!(
                error = %e,
                stage = %e.stage().map(|s| s.to_string()).unwrap_or_else(|| "config".to_string()),
                "Training pipeline aborted"
            ),
        }
        result
    }

    fn run_stages(&self) -> Result<PipelineReport, PipelineError> {
        let ingestion = self.start_data_ingestion()?;

        let validation = self.start_data_validation(&ingestion)?;
        if !validation.validation_status {
            return Err(PipelineError::ValidationFailed(validation.message));
        }

        let transformation = self.start_data_transformation(&ingestion, &validation)?;
        let trainer = self.start_model_trainer(&transformation)?;

        let evaluation = self.start_model_evaluation(&ingestion, &trainer)?;
        if !evaluation.is_model_accepted {
            return Err(PipelineError::ModelNotAccepted {
                trained_model_f1_score: evaluation.trained_model_f1_score,
                best_model_f1_score: evaluation.best_model_f1_score,
                difference: evaluation.changed_accuracy,
            });
        }

        let pusher = self.start_model_pusher(&evaluation)?;

        Ok(PipelineReport {
            artifact_dir: self.config.artifact_dir.clone(),
            ingestion,
            validation,
            transformation,
            trainer,
            evaluation,
            pusher,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_stage() {
        let err = PipelineError::Training(AdClickError::BelowExpectedScore {
            accuracy: 0.4,
            expected: 0.6,
        });
        assert_eq!(err.stage(), Some(PipelineStage::Training));
        assert!(err.to_string().contains("below the expected score"));

        let rejected = PipelineError::ModelNotAccepted {
            trained_model_f1_score: 0.5,
            best_model_f1_score: Some(0.6),
            difference: -0.1,
        };
        assert_eq!(rejected.stage(), Some(PipelineStage::Evaluation));
        assert_eq!(PipelineStage::Push.to_string(), "model_pusher");
    }
}
