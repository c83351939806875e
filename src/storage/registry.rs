//! Model registry: where the production bundle lives

use crate::error::{AdClickError, Result};
use crate::inference::AdClickModel;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// A bucket of model bundles addressed by key
pub trait ModelRegistry: Send + Sync {
    fn is_model_present(&self, key: &str) -> Result<bool>;

    /// Deserialize the bundle stored under `key`
    fn load_model(&self, key: &str) -> Result<AdClickModel>;

    /// Copy a serialized bundle from `source` to `key`, returning its location
    fn upload_model(&self, source: &Path, key: &str) -> Result<String>;
}

/// Registry backed by a local directory
#[derive(Debug, Clone)]
pub struct FileModelRegistry {
    bucket_dir: PathBuf,
}

impl FileModelRegistry {
    pub fn new(bucket_dir: impl Into<PathBuf>) -> Self {
        Self {
            bucket_dir: bucket_dir.into(),
        }
    }

    pub fn bucket_dir(&self) -> &Path {
        &self.bucket_dir
    }

    fn key_path(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        if key.is_empty()
            || relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(AdClickError::RegistryError(format!("invalid model key '{}'", key)));
        }
        Ok(self.bucket_dir.join(relative))
    }
}

impl ModelRegistry for FileModelRegistry {
    fn is_model_present(&self, key: &str) -> Result<bool> {
        Ok(self.key_path(key)?.is_file())
    }

    fn load_model(&self, key: &str) -> Result<AdClickModel> {
        let path = self.key_path(key)?;
        if !path.is_file() {
            return Err(AdClickError::RegistryError(format!(
                "no model stored under '{}'",
                key
            )));
        }
        AdClickModel::load(&path)
    }

    fn upload_model(&self, source: &Path, key: &str) -> Result<String> {
        let target = self.key_path(key)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        // Readers must never see a partially written bundle
        let staging = target.with_extension("uploading");
        fs::copy(source, &staging).map_err(|e| {
            AdClickError::RegistryError(format!("cannot upload {}: {}", source.display(), e))
        })?;
        fs::rename(&staging, &target)?;
        info!(source = %source.display(), target = %target.display(), "Model uploaded to registry");
        Ok(target.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_escaping_keys() {
        let registry = FileModelRegistry::new("/tmp/bucket");
        assert!(registry.key_path("../model.json").is_err());
        assert!(registry.key_path("/etc/passwd").is_err());
        assert!(registry.key_path("").is_err());
        assert!(registry.key_path("prod/model.json").is_ok());
    }

    #[test]
    fn test_missing_model() {
        let dir = tempfile::tempdir().unwrap();
        let registry = FileModelRegistry::new(dir.path());
        assert!(!registry.is_model_present("model.json").unwrap());
        let err = registry.load_model("model.json").unwrap_err();
        assert!(matches!(err, AdClickError::RegistryError(_)));
    }

    #[test]
    fn test_upload_copies_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("trained.json");
        fs::write(&source, b"{}").unwrap();

        let registry = FileModelRegistry::new(dir.path().join("bucket"));
        let location = registry.upload_model(&source, "model.json").unwrap();
        assert!(location.ends_with("model.json"));
        assert!(registry.is_model_present("model.json").unwrap());
        assert!(!dir.path().join("bucket/model.uploading").exists());
    }
}
