//! One-hot encoding with the first level dropped

use crate::error::{AdClickError, Result};
use crate::imputation::Slot;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Sorted levels of one categorical column; `levels[0]` is the baseline
/// that gets no indicator column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLevels {
    pub column: String,
    pub levels: Vec<String>,
}

impl CategoryLevels {
    pub fn new(column: &str, mut levels: Vec<String>) -> Self {
        levels.sort();
        levels.dedup();
        Self {
            column: column.to_string(),
            levels,
        }
    }

    pub fn baseline(&self) -> Option<&str> {
        self.levels.first().map(String::as_str)
    }

    pub fn n_indicators(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    /// Index of `value` in the sorted level list
    pub fn code_of(&self, value: &str) -> Option<usize> {
        self.levels.binary_search_by(|l| l.as_str().cmp(value)).ok()
    }

    /// `{column}_{level}` for every non-baseline level
    pub fn indicator_names(&self) -> Vec<String> {
        self.levels
            .iter()
            .skip(1)
            .map(|level| format!("{}_{}", self.column, level))
            .collect()
    }
}

fn string_values(column: &Column) -> Result<Vec<Option<String>>> {
    let as_str = column.cast(&DataType::String)?;
    Ok(as_str
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Encodes the configured categorical columns, passing every other column
/// through as Float64. Missing and unseen categories produce nulls in every
/// indicator of their group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotEncoder {
    columns: Vec<String>,
    input_columns: Vec<String>,
    categories: Vec<CategoryLevels>,
    output_columns: Vec<String>,
    is_fitted: bool,
}

impl OneHotEncoder {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            input_columns: Vec::new(),
            categories: Vec::new(),
            output_columns: Vec::new(),
            is_fitted: false,
        }
    }

    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();

        let mut categories = Vec::with_capacity(self.columns.len());
        for col_name in &self.columns {
            let column = df
                .column(col_name)
                .map_err(|_| AdClickError::FeatureNotFound(col_name.clone()))?;
            let levels: BTreeSet<String> = string_values(column)?.into_iter().flatten().collect();
            if levels.is_empty() {
                return Err(AdClickError::TransformationError(format!(
                    "categorical column '{}' has no observed values",
                    col_name
                )));
            }
            debug!(column = %col_name, levels = levels.len(), "Fitted category levels");
            categories.push(CategoryLevels::new(col_name, levels.into_iter().collect()));
        }

        self.output_columns = names
            .iter()
            .flat_map(|name| match categories.iter().find(|c| &c.column == name) {
                Some(levels) => levels.indicator_names(),
                None => vec![name.clone()],
            })
            .collect();
        self.input_columns = names;
        self.categories = categories;
        self.is_fitted = true;
        Ok(self)
    }

    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(AdClickError::ModelNotFitted);
        }

        let mut out: Vec<Column> = Vec::with_capacity(self.output_columns.len());
        for name in &self.input_columns {
            let column = df
                .column(name)
                .map_err(|_| AdClickError::FeatureNotFound(name.clone()))?;

            match self.categories.iter().find(|c| &c.column == name) {
                Some(levels) => out.extend(self.encode_column(column, levels)?),
                None => {
                    let numeric = column.strict_cast(&DataType::Float64).map_err(|e| {
                        AdClickError::TransformationError(format!(
                            "column '{}' is neither categorical nor numeric: {}",
                            name, e
                        ))
                    })?;
                    out.push(numeric);
                }
            }
        }

        Ok(DataFrame::new(out)?)
    }

    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?;
        self.transform(df)
    }

    fn encode_column(&self, column: &Column, levels: &CategoryLevels) -> Result<Vec<Column>> {
        let values = string_values(column)?;
        let mut unseen = 0usize;
        let codes: Vec<Option<usize>> = values
            .iter()
            .map(|v| {
                v.as_deref().and_then(|s| {
                    let code = levels.code_of(s);
                    if code.is_none() {
                        unseen += 1;
                    }
                    code
                })
            })
            .collect();
        if unseen > 0 {
            warn!(
                column = %levels.column,
                count = unseen,
                "Unseen categories treated as missing"
            );
        }

        Ok(levels
            .indicator_names()
            .into_iter()
            .enumerate()
            .map(|(k, indicator)| {
                let level_code = k + 1;
                let values: Vec<Option<f64>> = codes
                    .iter()
                    .map(|c| c.map(|c| if c == level_code { 1.0 } else { 0.0 }))
                    .collect();
                Column::new(indicator.as_str().into(), values)
            })
            .collect())
    }

    pub fn categories(&self) -> &[CategoryLevels] {
        &self.categories
    }

    pub fn input_columns(&self) -> &[String] {
        &self.input_columns
    }

    pub fn output_columns(&self) -> &[String] {
        &self.output_columns
    }

    /// Column layout before expansion, in input order
    pub fn slots(&self) -> Vec<Slot> {
        self.input_columns
            .iter()
            .map(|name| match self.categories.iter().find(|c| &c.column == name) {
                Some(levels) => Slot::Category(levels.clone()),
                None => Slot::Numeric(name.clone()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        df! {
            "age" => [Some(25i64), Some(40), None, Some(33)],
            "device_type" => [Some("Mobile"), Some("Desktop"), Some("Tablet"), None],
        }
        .unwrap()
    }

    #[test]
    fn test_levels_sorted_and_first_dropped() {
        let mut encoder = OneHotEncoder::new(vec!["device_type".to_string()]);
        encoder.fit(&frame()).unwrap();

        let levels = &encoder.categories()[0];
        assert_eq!(levels.levels, vec!["Desktop", "Mobile", "Tablet"]);
        assert_eq!(levels.baseline(), Some("Desktop"));
        assert_eq!(
            encoder.output_columns(),
            &["age", "device_type_Mobile", "device_type_Tablet"]
        );
    }

    #[test]
    fn test_encode_values() {
        let mut encoder = OneHotEncoder::new(vec!["device_type".to_string()]);
        let out = encoder.fit_transform(&frame()).unwrap();

        let mobile = out.column("device_type_Mobile").unwrap().f64().unwrap();
        let tablet = out.column("device_type_Tablet").unwrap().f64().unwrap();
        assert_eq!(mobile.get(0), Some(1.0));
        assert_eq!(tablet.get(0), Some(0.0));
        // baseline: all zeros
        assert_eq!(mobile.get(1), Some(0.0));
        assert_eq!(tablet.get(1), Some(0.0));
        assert_eq!(tablet.get(2), Some(1.0));
        // missing: all null
        assert_eq!(mobile.get(3), None);
        assert_eq!(tablet.get(3), None);

        let age = out.column("age").unwrap();
        assert_eq!(age.dtype(), &DataType::Float64);
        assert_eq!(age.null_count(), 1);
    }

    #[test]
    fn test_unseen_category_becomes_missing() {
        let mut encoder = OneHotEncoder::new(vec!["device_type".to_string()]);
        encoder.fit(&frame()).unwrap();

        let test = df! {
            "age" => [30i64],
            "device_type" => ["Smart TV"],
        }
        .unwrap();
        let out = encoder.transform(&test).unwrap();
        assert_eq!(out.column("device_type_Mobile").unwrap().null_count(), 1);
        assert_eq!(out.column("device_type_Tablet").unwrap().null_count(), 1);
    }

    #[test]
    fn test_missing_column_at_transform() {
        let mut encoder = OneHotEncoder::new(vec!["device_type".to_string()]);
        encoder.fit(&frame()).unwrap();
        let test = df! { "age" => [30i64] }.unwrap();
        let err = encoder.transform(&test).unwrap_err();
        assert!(matches!(err, AdClickError::FeatureNotFound(c) if c == "device_type"));
    }

    #[test]
    fn test_slots_follow_input_order() {
        let mut encoder = OneHotEncoder::new(vec!["device_type".to_string()]);
        encoder.fit(&frame()).unwrap();
        let slots = encoder.slots();
        assert_eq!(slots.len(), 2);
        assert!(matches!(&slots[0], Slot::Numeric(n) if n == "age"));
        assert!(matches!(&slots[1], Slot::Category(l) if l.n_indicators() == 2));
    }
}
