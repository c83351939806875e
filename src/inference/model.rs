//! The persisted model bundle: fitted feature pipeline plus classifier

use crate::error::{AdClickError, Result};
use crate::preprocessing::FeaturePipeline;
use crate::training::GradientBoostingClassifier;
use crate::utils::{load_json, save_json};
use chrono::{DateTime, Utc};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::debug;

/// Raw records in, click labels out. Serialized as one JSON document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdClickModel {
    pub model_name: String,
    pub target_column: String,
    pub created_at: DateTime<Utc>,
    pipeline: FeaturePipeline,
    classifier: GradientBoostingClassifier,
}

impl AdClickModel {
    pub fn new(
        model_name: impl Into<String>,
        target_column: impl Into<String>,
        pipeline: FeaturePipeline,
        classifier: GradientBoostingClassifier,
    ) -> Result<Self> {
        if !pipeline.is_fitted() || !classifier.is_fitted() {
            return Err(AdClickError::ModelNotFitted);
        }
        Ok(Self {
            model_name: model_name.into(),
            target_column: target_column.into(),
            created_at: Utc::now(),
            pipeline,
            classifier,
        })
    }

    pub fn pipeline(&self) -> &FeaturePipeline {
        &self.pipeline
    }

    pub fn classifier(&self) -> &GradientBoostingClassifier {
        &self.classifier
    }

    /// Run raw records through the bundled preprocessing. A target column,
    /// if present, is ignored.
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let features = if df.column(&self.target_column).is_ok() {
            df.drop(&self.target_column)?
        } else {
            df.clone()
        };
        self.pipeline.transform(&features)
    }

    pub fn predict(&self, df: &DataFrame) -> Result<Array1<i64>> {
        let start = Instant::now();
        let x = self.transform(df)?;
        let labels = self.classifier.predict(&x)?;
        debug!(
            rows = labels.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "Predicted click labels"
        );
        Ok(labels)
    }

    pub fn predict_proba(&self, df: &DataFrame) -> Result<Array1<f64>> {
        let x = self.transform(df)?;
        self.classifier.predict_proba(&x)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        save_json(path, self)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(AdClickError::RegistryError(format!(
                "model bundle not found: {}",
                path.display()
            )));
        }
        load_json(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Schema;
    use crate::training::GradientBoostingConfig;

    fn schema() -> Schema {
        Schema::from_yaml_str(
            r#"
columns:
  - age: float
  - device_type: category
  - click: int
numerical_columns: [age, click]
categorical_columns: [device_type]
num_features: [age]
target_column: click
"#,
        )
        .unwrap()
    }

    fn frame() -> DataFrame {
        let n = 40;
        let ages: Vec<f64> = (0..n).map(|i| 18.0 + i as f64).collect();
        let devices: Vec<&str> = (0..n).map(|i| if i % 2 == 0 { "Mobile" } else { "Desktop" }).collect();
        let clicks: Vec<i64> = (0..n).map(|i| (i % 2 == 0) as i64).collect();
        df! { "age" => ages, "device_type" => devices, "click" => clicks }.unwrap()
    }

    fn fitted_model() -> AdClickModel {
        let df = frame();
        let mut pipeline = FeaturePipeline::new(&schema(), 5);
        let x = pipeline.fit_transform(&df.drop("click").unwrap()).unwrap();
        let y: Array1<i64> = df
            .column("click")
            .unwrap()
            .i64()
            .unwrap()
            .into_no_null_iter()
            .collect();
        let mut classifier = GradientBoostingClassifier::new(GradientBoostingConfig {
            n_estimators: 10,
            ..Default::default()
        });
        classifier.fit(&x, &y).unwrap();
        AdClickModel::new("GradientBoostingClassifier", "click", pipeline, classifier).unwrap()
    }

    #[test]
    fn test_predict_ignores_target_column() {
        let model = fitted_model();
        let with_target = model.predict(&frame()).unwrap();
        let without = model.predict(&frame().drop("click").unwrap()).unwrap();
        assert_eq!(with_target, without);
        assert_eq!(with_target[0], 1);
        assert_eq!(with_target[1], 0);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let model = fitted_model();
        model.save(&path).unwrap();

        let loaded = AdClickModel::load(&path).unwrap();
        assert_eq!(loaded.model_name, "GradientBoostingClassifier");
        assert_eq!(loaded.predict(&frame()).unwrap(), model.predict(&frame()).unwrap());
    }

    #[test]
    fn test_unfitted_parts_rejected() {
        let pipeline = FeaturePipeline::new(&schema(), 5);
        let classifier = GradientBoostingClassifier::new(GradientBoostingConfig::default());
        assert!(matches!(
            AdClickModel::new("m", "click", pipeline, classifier),
            Err(AdClickError::ModelNotFitted)
        ));
    }

    #[test]
    fn test_load_missing_bundle() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            AdClickModel::load(&dir.path().join("nope.json")),
            Err(AdClickError::RegistryError(_))
        ));
    }
}
