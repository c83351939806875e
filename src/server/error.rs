//! Error types for the server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::error::AdClickError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AdClickError> for ServerError {
    fn from(err: AdClickError) -> Self {
        match err {
            AdClickError::InvalidInput(_)
            | AdClickError::FeatureNotFound(_)
            | AdClickError::ShapeError { .. } => ServerError::BadRequest(err.to_string()),
            AdClickError::RegistryError(_) => ServerError::ModelUnavailable(err.to_string()),
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for ServerError {
    fn from(err: tokio::task::JoinError) -> Self {
        ServerError::Internal(format!("worker task failed: {}", err))
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServerError::ModelUnavailable(msg) => {
                tracing::warn!(detail = %msg, "Prediction requested without a usable model");
                (StatusCode::SERVICE_UNAVAILABLE, msg.clone())
            }
            ServerError::Internal(msg) => {
                tracing::error!(detail = %msg, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
        };

        let body = Json(json!({
            "status": false,
            "error": message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
