//! Pipeline configuration
//!
//! Everything a run needs is carried in explicit structs: [`AppConfig`] holds
//! the environment-level settings, [`TrainingPipelineConfig`] derives the
//! per-stage paths for a single timestamped run, and the YAML documents are
//! loaded into [`Schema`] and [`ModelHyperparameters`].

mod hyperparams;
mod schema;

pub use hyperparams::{BoostingParams, ModelHyperparameters};
pub use schema::{ColumnSpec, Schema};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default document collection holding raw impressions
pub const DEFAULT_COLLECTION: &str = "Ad_click_proj_data";
/// Registry key of the production model bundle
pub const DEFAULT_MODEL_KEY: &str = "model.json";
/// Timestamp format of a run directory
pub const TIMESTAMP_FORMAT: &str = "%m_%d_%Y_%H_%M_%S";

/// Environment-level settings shared by the CLI, the pipeline and the server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root under which each run creates its timestamped directory
    pub artifact_dir: PathBuf,
    /// Directory of the JSON-lines document store
    pub data_dir: PathBuf,
    /// Collection of raw records
    pub collection_name: String,
    /// Directory acting as the model bucket
    pub bucket_dir: PathBuf,
    /// Key of the production model inside the bucket
    pub model_key: String,
    /// Column schema YAML
    pub schema_path: PathBuf,
    /// Hyperparameter YAML
    pub model_config_path: PathBuf,
    /// Fraction of records placed in the test subset
    pub train_test_split_ratio: f64,
    /// Seed of the train/test shuffle
    pub split_random_state: u64,
    /// Neighbours used by KNN imputation
    pub knn_neighbors: usize,
    /// Seed of the class rebalancer
    pub resample_seed: u64,
    /// Web server host
    pub host: String,
    /// Web server port
    pub port: u16,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            artifact_dir: env_or("ARTIFACT_DIR", "artifact").into(),
            data_dir: env_or("DATA_DIR", "data").into(),
            collection_name: env_or("COLLECTION_NAME", DEFAULT_COLLECTION),
            bucket_dir: env_or("MODEL_BUCKET_DIR", "model-registry").into(),
            model_key: env_or("MODEL_KEY", DEFAULT_MODEL_KEY),
            schema_path: env_or("SCHEMA_FILE_PATH", "config/schema.yaml").into(),
            model_config_path: env_or("MODEL_CONFIG_FILE_PATH", "config/model.yaml").into(),
            train_test_split_ratio: env_parse("TRAIN_TEST_SPLIT_RATIO", 0.2),
            split_random_state: env_parse("SPLIT_RANDOM_STATE", 42),
            knn_neighbors: env_parse("KNN_NEIGHBORS", 5),
            resample_seed: env_parse("RESAMPLE_SEED", 42),
            host: env_or("APP_HOST", "0.0.0.0"),
            port: env_parse("APP_PORT", 5000),
        }
    }
}

impl AppConfig {
    /// Point every on-disk location below `root`
    pub fn rooted_at(mut self, root: &Path) -> Self {
        self.artifact_dir = root.join("artifact");
        self.data_dir = root.join("data");
        self.bucket_dir = root.join("model-registry");
        self
    }

    pub fn with_schema_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_path = path.into();
        self
    }

    pub fn with_model_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_config_path = path.into();
        self
    }

    /// Load the column schema referenced by this config
    pub fn load_schema(&self) -> crate::error::Result<Schema> {
        Schema::from_file(&self.schema_path)
    }

    /// Load the hyperparameters referenced by this config
    pub fn load_hyperparameters(&self) -> crate::error::Result<ModelHyperparameters> {
        ModelHyperparameters::from_file(&self.model_config_path)
    }
}

/// Paths and settings for one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingPipelineConfig {
    pub artifact_dir: PathBuf,
    pub timestamp: String,
}

impl TrainingPipelineConfig {
    pub fn new(artifact_root: &Path, timestamp: DateTime<Local>) -> Self {
        let timestamp = timestamp.format(TIMESTAMP_FORMAT).to_string();
        Self {
            artifact_dir: artifact_root.join(&timestamp),
            timestamp,
        }
    }

    /// Run config stamped with the current local time
    pub fn now(artifact_root: &Path) -> Self {
        Self::new(artifact_root, Local::now())
    }

    pub fn data_ingestion(&self, app: &AppConfig) -> DataIngestionConfig {
        let root = self.artifact_dir.join("data_ingestion");
        DataIngestionConfig {
            feature_store_file_path: root.join("feature_store").join("data.csv"),
            training_file_path: root.join("ingested").join("train.csv"),
            testing_file_path: root.join("ingested").join("test.csv"),
            train_test_split_ratio: app.train_test_split_ratio,
            random_state: app.split_random_state,
            collection_name: app.collection_name.clone(),
        }
    }

    pub fn data_validation(&self) -> DataValidationConfig {
        DataValidationConfig {
            report_file_path: self
                .artifact_dir
                .join("data_validation")
                .join("report.json"),
        }
    }

    pub fn data_transformation(&self, app: &AppConfig) -> DataTransformationConfig {
        let root = self.artifact_dir.join("data_transformation");
        DataTransformationConfig {
            transformed_train_file_path: root.join("transformed").join("train.json"),
            transformed_test_file_path: root.join("transformed").join("test.json"),
            transformed_object_file_path: root
                .join("transformed_object")
                .join("preprocessing.json"),
            knn_neighbors: app.knn_neighbors,
            resample_seed: app.resample_seed,
        }
    }

    pub fn model_trainer(&self) -> ModelTrainerConfig {
        let root = self.artifact_dir.join("model_trainer").join("trained_model");
        ModelTrainerConfig {
            trained_model_file_path: root.join("model.json"),
            parameters_file_path: root.join("parameters.json"),
            metrics_file_path: root.join("metrics.json"),
        }
    }

    pub fn model_evaluation(&self, app: &AppConfig) -> ModelEvaluationConfig {
        ModelEvaluationConfig {
            changed_threshold_score: 0.0,
            model_key: app.model_key.clone(),
        }
    }

    pub fn model_pusher(&self, app: &AppConfig) -> ModelPusherConfig {
        ModelPusherConfig {
            bucket_dir: app.bucket_dir.clone(),
            model_key: app.model_key.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataIngestionConfig {
    pub feature_store_file_path: PathBuf,
    pub training_file_path: PathBuf,
    pub testing_file_path: PathBuf,
    pub train_test_split_ratio: f64,
    pub random_state: u64,
    pub collection_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataValidationConfig {
    pub report_file_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataTransformationConfig {
    pub transformed_train_file_path: PathBuf,
    pub transformed_test_file_path: PathBuf,
    pub transformed_object_file_path: PathBuf,
    pub knn_neighbors: usize,
    pub resample_seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelTrainerConfig {
    pub trained_model_file_path: PathBuf,
    pub parameters_file_path: PathBuf,
    pub metrics_file_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEvaluationConfig {
    /// Minimum F1 improvement required for acceptance (exclusive)
    pub changed_threshold_score: f64,
    pub model_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPusherConfig {
    pub bucket_dir: PathBuf,
    pub model_key: String,
}
