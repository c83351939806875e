//! Column schema loaded from YAML

use crate::error::{AdClickError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One declared column and its type label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub dtype: String,
}

/// On-disk shape: `columns` is a list of single-entry maps (`- age: float`)
#[derive(Debug, Deserialize)]
struct RawSchema {
    columns: Vec<BTreeMap<String, String>>,
    #[serde(default)]
    numerical_columns: Vec<String>,
    #[serde(default)]
    categorical_columns: Vec<String>,
    #[serde(default)]
    drop_columns: Vec<String>,
    #[serde(default)]
    num_features: Vec<String>,
    #[serde(default)]
    mm_columns: Vec<String>,
    #[serde(default = "default_target")]
    target_column: String,
}

fn default_target() -> String {
    "click".to_string()
}

/// Roles of every column in the raw collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub columns: Vec<ColumnSpec>,
    pub numerical_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub drop_columns: Vec<String>,
    /// Standard-scaled after encoding
    pub num_features: Vec<String>,
    /// Min-max scaled after encoding
    pub mm_columns: Vec<String>,
    pub target_column: String,
}

impl Schema {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AdClickError::ConfigError(format!("cannot read schema {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let raw: RawSchema = serde_yaml::from_str(content)?;

        let mut columns = Vec::with_capacity(raw.columns.len());
        for entry in raw.columns {
            if entry.len() != 1 {
                return Err(AdClickError::ConfigError(format!(
                    "schema column entries need exactly one name, got {}",
                    entry.len()
                )));
            }
            for (name, dtype) in entry {
                columns.push(ColumnSpec { name, dtype });
            }
        }

        let schema = Self {
            columns,
            numerical_columns: raw.numerical_columns,
            categorical_columns: raw.categorical_columns,
            drop_columns: raw.drop_columns,
            num_features: raw.num_features,
            mm_columns: raw.mm_columns,
            target_column: raw.target_column,
        };
        schema.check()?;
        Ok(schema)
    }

    fn check(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(AdClickError::ConfigError("schema declares no columns".to_string()));
        }
        if let Some(overlap) = self
            .categorical_columns
            .iter()
            .find(|c| self.numerical_columns.contains(c))
        {
            return Err(AdClickError::ConfigError(format!(
                "column '{}' is declared both numerical and categorical",
                overlap
            )));
        }
        if self.categorical_columns.contains(&self.target_column) {
            return Err(AdClickError::ConfigError(format!(
                "target column '{}' cannot be categorical",
                self.target_column
            )));
        }
        Ok(())
    }

    /// Number of columns an ingested table must have
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Categorical columns that survive the drop step and get one-hot encoded
    pub fn encoded_columns(&self) -> Vec<String> {
        self.categorical_columns
            .iter()
            .filter(|c| !self.drop_columns.contains(c))
            .cloned()
            .collect()
    }
}
