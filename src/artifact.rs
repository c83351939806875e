//! Stage outputs handed from one pipeline stage to the next
//!
//! Each artifact only references files its own stage wrote.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataIngestionArtifact {
    pub feature_store_file_path: PathBuf,
    pub train_file_path: PathBuf,
    pub test_file_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataValidationArtifact {
    pub validation_status: bool,
    pub message: String,
    pub report_file_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTransformationArtifact {
    pub transformed_object_file_path: PathBuf,
    pub transformed_train_file_path: PathBuf,
    pub transformed_test_file_path: PathBuf,
}

/// Scores of a binary classifier, positive class `1`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassificationMetricArtifact {
    pub accuracy: f64,
    pub f1_score: f64,
    pub precision_score: f64,
    pub recall_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelTrainerArtifact {
    pub trained_model_file_path: PathBuf,
    pub parameters_file_path: PathBuf,
    pub metrics_file_path: PathBuf,
    pub train_accuracy: f64,
    pub metric_artifact: ClassificationMetricArtifact,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEvaluationArtifact {
    pub is_model_accepted: bool,
    /// F1 gain of the trained model over the production one
    pub changed_accuracy: f64,
    pub trained_model_f1_score: f64,
    pub best_model_f1_score: Option<f64>,
    pub registry_model_key: String,
    pub trained_model_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPusherArtifact {
    pub bucket_dir: PathBuf,
    pub model_key: String,
    pub registry_location: String,
}
