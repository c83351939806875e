//! Application state management

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::AppConfig;
use crate::inference::AdPredictor;
use crate::storage::{DocumentStore, FileModelRegistry, JsonLinesStore, ModelRegistry};

/// Application state shared across handlers. Holds no model: every
/// prediction reads the current bundle from the registry.
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn DocumentStore>,
    pub registry: Arc<dyn ModelRegistry>,
    /// Serializes training runs
    pub training_lock: Mutex<()>,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Filesystem-backed store and registry under the configured directories
    pub fn new(config: AppConfig) -> Self {
        let store = Arc::new(JsonLinesStore::new(config.data_dir.clone()));
        let registry = Arc::new(FileModelRegistry::new(config.bucket_dir.clone()));
        Self::with_backends(config, store, registry)
    }

    pub fn with_backends(
        config: AppConfig,
        store: Arc<dyn DocumentStore>,
        registry: Arc<dyn ModelRegistry>,
    ) -> Self {
        Self {
            config,
            store,
            registry,
            training_lock: Mutex::new(()),
            started_at: chrono::Utc::now(),
        }
    }

    pub fn predictor(&self) -> AdPredictor {
        AdPredictor::new(self.registry.clone(), self.config.model_key.clone())
    }
}
