//! Model hyperparameters loaded from YAML

use crate::error::{AdClickError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Boosting settings exposed to the YAML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    pub subsample: f64,
    #[serde(default)]
    pub random_state: Option<u64>,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 5,
            learning_rate: 0.1,
            subsample: 0.8,
            random_state: Some(42),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelHyperparameters {
    #[serde(default = "default_model_name")]
    pub model_name: String,
    /// Training accuracy floor below which the trained model is rejected
    pub expected_model_score: f64,
    pub hyperparameters: BoostingParams,
}

fn default_model_name() -> String {
    "GradientBoostingClassifier".to_string()
}

impl Default for ModelHyperparameters {
    fn default() -> Self {
        Self {
            model_name: default_model_name(),
            expected_model_score: 0.6,
            hyperparameters: BoostingParams::default(),
        }
    }
}

impl ModelHyperparameters {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AdClickError::ConfigError(format!(
                "cannot read model config {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let params: Self = serde_yaml::from_str(content)?;
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        let hp = &self.hyperparameters;
        if hp.n_estimators == 0 {
            return Err(AdClickError::InvalidParameter {
                name: "n_estimators".to_string(),
                value: "0".to_string(),
                reason: "at least one tree is required".to_string(),
            });
        }
        if !(hp.learning_rate > 0.0) {
            return Err(AdClickError::InvalidParameter {
                name: "learning_rate".to_string(),
                value: hp.learning_rate.to_string(),
                reason: "must be positive".to_string(),
            });
        }
        if !(hp.subsample > 0.0 && hp.subsample <= 1.0) {
            return Err(AdClickError::InvalidParameter {
                name: "subsample".to_string(),
                value: hp.subsample.to_string(),
                reason: "must be in (0, 1]".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.expected_model_score) {
            return Err(AdClickError::InvalidParameter {
                name: "expected_model_score".to_string(),
                value: self.expected_model_score.to_string(),
                reason: "must be in [0, 1]".to_string(),
            });
        }
        Ok(())
    }
}
