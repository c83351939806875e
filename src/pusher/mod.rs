//! Publishing an accepted model to the registry

use crate::artifact::{ModelEvaluationArtifact, ModelPusherArtifact};
use crate::config::ModelPusherConfig;
use crate::error::{AdClickError, Result};
use crate::storage::ModelRegistry;
use std::sync::Arc;
use tracing::info;

pub struct ModelPusher {
    evaluation: ModelEvaluationArtifact,
    config: ModelPusherConfig,
    registry: Arc<dyn ModelRegistry>,
}

impl ModelPusher {
    pub fn new(
        evaluation: ModelEvaluationArtifact,
        config: ModelPusherConfig,
        registry: Arc<dyn ModelRegistry>,
    ) -> Self {
        Self {
            evaluation,
            config,
            registry,
        }
    }

    pub fn initiate_model_pusher(&self) -> Result<ModelPusherArtifact> {
        if !self.evaluation.is_model_accepted {
            return Err(AdClickError::RegistryError(
                "refusing to push a model that was not accepted".to_string(),
            ));
        }

        let location = self
            .registry
            .upload_model(&self.evaluation.trained_model_path, &self.config.model_key)?;
        info!(key = %self.config.model_key, location = %location, "Model pushed");

        Ok(ModelPusherArtifact {
            bucket_dir: self.config.bucket_dir.clone(),
            model_key: self.config.model_key.clone(),
            registry_location: location,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileModelRegistry;
    use std::fs;

    fn evaluation(path: std::path::PathBuf, accepted: bool) -> ModelEvaluationArtifact {
        ModelEvaluationArtifact {
            is_model_accepted: accepted,
            changed_accuracy: 0.1,
            trained_model_f1_score: 0.6,
            best_model_f1_score: Some(0.5),
            registry_model_key: "model.json".to_string(),
            trained_model_path: path,
        }
    }

    #[test]
    fn test_push_accepted_model() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("model.json");
        fs::write(&source, b"{}").unwrap();
        let bucket = dir.path().join("bucket");

        let pusher = ModelPusher::new(
            evaluation(source, true),
            ModelPusherConfig {
                bucket_dir: bucket.clone(),
                model_key: "model.json".to_string(),
            },
            Arc::new(FileModelRegistry::new(&bucket)),
        );
        let artifact = pusher.initiate_model_pusher().unwrap();
        assert!(bucket.join("model.json").is_file());
        assert_eq!(artifact.model_key, "model.json");
    }

    #[test]
    fn test_rejected_model_is_not_pushed() {
        let dir = tempfile::tempdir().unwrap();
        let bucket = dir.path().join("bucket");
        let pusher = ModelPusher::new(
            evaluation(dir.path().join("model.json"), false),
            ModelPusherConfig {
                bucket_dir: bucket.clone(),
                model_key: "model.json".to_string(),
            },
            Arc::new(FileModelRegistry::new(&bucket)),
        );
        assert!(pusher.initiate_model_pusher().is_err());
        assert!(!bucket.exists());
    }
}
