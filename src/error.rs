//! Error types for the ad-click pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, AdClickError>;

/// Main error type shared by every stage
#[derive(Error, Debug)]
pub enum AdClickError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Ingestion error: {0}")]
    IngestionError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Transformation error: {0}")]
    TransformationError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Model accuracy {accuracy:.4} is below the expected score {expected:.4}")]
    BelowExpectedScore { accuracy: f64, expected: f64 },

    #[error("Evaluation error: {0}")]
    EvaluationError(String),

    #[error("Registry error: {0}")]
    RegistryError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<polars::error::PolarsError> for AdClickError {
    fn from(err: polars::error::PolarsError) -> Self {
        AdClickError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for AdClickError {
    fn from(err: serde_json::Error) -> Self {
        AdClickError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for AdClickError {
    fn from(err: serde_yaml::Error) -> Self {
        AdClickError::ConfigError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for AdClickError {
    fn from(err: ndarray::ShapeError) -> Self {
        AdClickError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
