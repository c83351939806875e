//! Data ingestion
//!
//! Pulls every raw record out of the document store, exports them to the
//! feature-store CSV, then writes one seeded train/test split.

mod sample;

pub use sample::{generate_impressions, SampleConfig};

use crate::artifact::DataIngestionArtifact;
use crate::config::DataIngestionConfig;
use crate::error::{AdClickError, Result};
use crate::storage::{Document, DocumentStore};
use crate::utils::save_csv;
use polars::prelude::*;
use rand::prelude::*;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

/// Store-internal identifier, never exported
pub const INTERNAL_ID_FIELD: &str = "_id";
/// Sentinel string for a missing value in raw records
pub const MISSING_TOKEN: &str = "na";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Integer,
    Float,
    Text,
}

#[derive(Debug, Clone)]
struct RawColumn {
    name: String,
    kind: ColumnKind,
}

/// A value that counts as present: not absent, not null, not the `"na"` token
fn present(value: Option<&Value>) -> Option<&Value> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s == MISSING_TOKEN => None,
        Some(v) => Some(v),
    }
}

fn infer_columns(documents: &[Document]) -> Vec<RawColumn> {
    let mut order: Vec<String> = Vec::new();
    let mut seen = HashSet::new();
    for doc in documents {
        for key in doc.keys() {
            if key != INTERNAL_ID_FIELD && seen.insert(key.clone()) {
                order.push(key.clone());
            }
        }
    }

    order
        .into_iter()
        .map(|name| {
            let mut any_value = false;
            let mut all_int = true;
            let mut all_number = true;
            for doc in documents {
                if let Some(v) = present(doc.get(&name)) {
                    any_value = true;
                    match v {
                        Value::Number(n) => all_int &= n.is_i64(),
                        _ => all_number = false,
                    }
                }
            }
            let kind = if !any_value || !all_number {
                ColumnKind::Text
            } else if all_int {
                ColumnKind::Integer
            } else {
                ColumnKind::Float
            };
            RawColumn { name, kind }
        })
        .collect()
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Flatten documents into a typed frame, dropping `_id` and mapping `"na"` to null.
/// A column is numeric only when every present value is a JSON number.
pub fn documents_to_frame(documents: &[Document]) -> Result<DataFrame> {
    let columns: Vec<Column> = infer_columns(documents)
        .into_iter()
        .map(|col| {
            let values = documents.iter().map(|d| present(d.get(&col.name)));
            let name: PlSmallStr = col.name.as_str().into();
            match col.kind {
                ColumnKind::Integer => {
                    Column::new(name, values.map(|v| v.and_then(Value::as_i64)).collect::<Vec<_>>())
                }
                ColumnKind::Float => {
                    Column::new(name, values.map(|v| v.and_then(Value::as_f64)).collect::<Vec<_>>())
                }
                ColumnKind::Text => {
                    Column::new(name, values.map(|v| v.map(text_of)).collect::<Vec<Option<String>>>())
                }
            }
        })
        .collect();

    Ok(DataFrame::new(columns)?)
}

/// Shuffle `0..n` with `seed` and cut off `ceil(n * test_ratio)` test rows
pub fn split_indices(n: usize, test_ratio: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(AdClickError::InvalidParameter {
            name: "train_test_split_ratio".to_string(),
            value: test_ratio.to_string(),
            reason: "must be in (0, 1)".to_string(),
        });
    }
    let n_test = (n as f64 * test_ratio).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(AdClickError::IngestionError(format!(
            "cannot split {} records with test ratio {}",
            n, test_ratio
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    let train = indices.split_off(n_test);
    Ok((train, indices))
}

fn take_rows(df: &DataFrame, rows: &[usize]) -> Result<DataFrame> {
    let idx: Vec<IdxSize> = rows.iter().map(|&i| i as IdxSize).collect();
    Ok(df.take(&IdxCa::from_vec("idx".into(), idx))?)
}

/// Ingestion stage
pub struct DataIngestion {
    config: DataIngestionConfig,
    store: Arc<dyn DocumentStore>,
}

impl DataIngestion {
    pub fn new(config: DataIngestionConfig, store: Arc<dyn DocumentStore>) -> Self {
        Self { config, store }
    }

    /// Export the whole collection to the feature-store CSV
    pub fn export_data_to_feature_store(&self) -> Result<DataFrame> {
        let collection = &self.config.collection_name;
        info!(collection = %collection, "Exporting records from document store");

        let documents = self.store.fetch_all(collection)?;
        if documents.is_empty() {
            return Err(AdClickError::IngestionError(format!(
                "collection '{}' is empty",
                collection
            )));
        }

        let mut df = documents_to_frame(&documents)?;
        info!(rows = df.height(), cols = df.width(), "Records converted to frame");

        save_csv(&self.config.feature_store_file_path, &mut df)?;
        Ok(df)
    }

    /// Split `df` and write train/test CSVs
    pub fn split_data_as_train_test(&self, df: &DataFrame) -> Result<(DataFrame, DataFrame)> {
        let (train_idx, test_idx) = split_indices(
            df.height(),
            self.config.train_test_split_ratio,
            self.config.random_state,
        )?;
        let mut train = take_rows(df, &train_idx)?;
        let mut test = take_rows(df, &test_idx)?;

        save_csv(&self.config.training_file_path, &mut train)?;
        save_csv(&self.config.testing_file_path, &mut test)?;
        info!(
            train_rows = train.height(),
            test_rows = test.height(),
            ratio = self.config.train_test_split_ratio,
            "Performed train/test split"
        );
        Ok((train, test))
    }

    pub fn initiate_data_ingestion(&self) -> Result<DataIngestionArtifact> {
        let df = self.export_data_to_feature_store()?;
        self.split_data_as_train_test(&df)?;

        let artifact = DataIngestionArtifact {
            feature_store_file_path: self.config.feature_store_file_path.clone(),
            train_file_path: self.config.training_file_path.clone(),
            test_file_path: self.config.testing_file_path.clone(),
        };
        info!(
            train = %artifact.train_file_path.display(),
            test = %artifact.test_file_path.display(),
            "Data ingestion completed"
        );
        Ok(artifact)
    }
}
