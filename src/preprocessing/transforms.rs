//! Column-level frame transforms

use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Drops a fixed list of columns. Absent ones are skipped: serving frames
/// never carry them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnDropper {
    columns: Vec<String>,
}

impl ColumnDropper {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut result = df.clone();
        for col in &self.columns {
            if result.column(col).is_ok() {
                info!(column = %col, "Dropping column");
                result = result.drop(col)?;
            } else {
                debug!(column = %col, "Column to drop not in frame");
            }
        }
        Ok(result)
    }
}
