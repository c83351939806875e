//! adclick - Ad-click prediction
//!
//! A staged training pipeline over raw ad impressions and a small web front
//! end that scores one impression at a time.
//!
//! # Modules
//!
//! ## Pipeline stages
//! - [`ingestion`] - Export the raw collection and split train/test
//! - [`validation`] - Column count and drift checks
//! - [`transformation`] - Fit the feature pipeline and rebalance classes
//! - [`training`] - Gradient-boosted trees and classification metrics
//! - [`evaluation`] - Compare against the production model
//! - [`pusher`] - Promote an accepted model to the registry
//! - [`pipeline`] - Run every stage in order
//!
//! ## Building blocks
//! - [`preprocessing`] - Column dropping, one-hot encoding, scaling
//! - [`imputation`] - KNN imputation that keeps categories valid
//! - [`synthetic`] - SMOTE, edited nearest neighbours, SMOTEENN
//! - [`storage`] - Document store and model registry
//! - [`config`] - Environment, schema and hyperparameters
//!
//! ## Services
//! - [`inference`] - Model bundle and form predictor
//! - [`server`] - HTTP server
//! - [`cli`] - Command-line interface

pub mod error;

pub mod artifact;
pub mod config;
pub mod storage;
pub mod utils;

pub mod ingestion;
pub mod validation;
pub mod transformation;
pub mod training;
pub mod evaluation;
pub mod pusher;
pub mod pipeline;

pub mod preprocessing;
pub mod imputation;
pub mod synthetic;

pub mod inference;
pub mod server;
pub mod cli;

pub use error::{AdClickError, Result};
pub use config::{AppConfig, ModelHyperparameters, Schema};
pub use inference::{AdClickModel, AdForm, AdPredictor, Prediction};
pub use pipeline::{PipelineError, PipelineReport, TrainPipeline};
pub use storage::{DocumentStore, FileModelRegistry, JsonLinesStore, MemoryDocumentStore, ModelRegistry};
