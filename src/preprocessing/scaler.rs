//! Feature scaling implementations

use crate::error::{AdClickError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Type of scaler to use
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScalerType {
    /// Standard scaling (z-score with population std): (x - mean) / std
    Standard,
    /// Min-Max scaling: (x - min) / (max - min)
    MinMax,
}

/// Parameters for a fitted scaler
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScalerParams {
    center: f64, // mean or min
    scale: f64,  // std or range
}

/// Feature scaler over named DataFrame columns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    scaler_type: ScalerType,
    params: BTreeMap<String, ScalerParams>,
    is_fitted: bool,
}

impl Scaler {
    pub fn new(scaler_type: ScalerType) -> Self {
        Self {
            scaler_type,
            params: BTreeMap::new(),
            is_fitted: false,
        }
    }

    /// Fit the scaler on `columns`; every column must exist
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        self.params.clear();
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| AdClickError::FeatureNotFound(col_name.clone()))?;
            let params = self.compute_params(column.as_materialized_series())?;
            self.params.insert(col_name.clone(), params);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Scale the fitted columns in place, leaving the rest untouched
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(AdClickError::ModelNotFitted);
        }

        let replacements: Vec<Series> = self
            .params
            .iter()
            .map(|(col_name, params)| {
                let column = df
                    .column(col_name)
                    .map_err(|_| AdClickError::FeatureNotFound(col_name.clone()))?;
                Self::scale_series(column.as_materialized_series(), params)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut result = df.clone();
        for scaled in replacements {
            result.with_column(scaled)?;
        }
        Ok(result)
    }

    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[String]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    fn compute_params(&self, series: &Series) -> Result<ScalerParams> {
        let as_f64 = series.cast(&DataType::Float64)?;
        let ca = as_f64.f64()?;

        match self.scaler_type {
            ScalerType::Standard => {
                let mean = ca.mean().unwrap_or(0.0);
                let std = ca.std(0).unwrap_or(1.0);
                Ok(ScalerParams {
                    center: mean,
                    scale: if std == 0.0 { 1.0 } else { std },
                })
            }
            ScalerType::MinMax => {
                let min = ca.min().unwrap_or(0.0);
                let max = ca.max().unwrap_or(1.0);
                let range = max - min;
                Ok(ScalerParams {
                    center: min,
                    scale: if range == 0.0 { 1.0 } else { range },
                })
            }
        }
    }

    fn scale_series(series: &Series, params: &ScalerParams) -> Result<Series> {
        let as_f64 = series.cast(&DataType::Float64)?;
        let scaled: Float64Chunked = as_f64
            .f64()?
            .into_iter()
            .map(|opt| opt.map(|v| (v - params.center) / params.scale))
            .collect();

        Ok(scaled.with_name(series.name().clone()).into_series())
    }
}

/// Standard scaling on one column list, min-max on another, passthrough for
/// everything else. Column order is preserved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnScaler {
    standard_columns: Vec<String>,
    minmax_columns: Vec<String>,
    standard: Scaler,
    minmax: Scaler,
}

impl ColumnScaler {
    pub fn new(standard_columns: Vec<String>, minmax_columns: Vec<String>) -> Self {
        Self {
            standard_columns,
            minmax_columns,
            standard: Scaler::new(ScalerType::Standard),
            minmax: Scaler::new(ScalerType::MinMax),
        }
    }

    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        self.standard.fit(df, &self.standard_columns)?;
        self.minmax.fit(df, &self.minmax_columns)?;
        Ok(self)
    }

    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let df = self.standard.transform(df)?;
        self.minmax.transform(&df)
    }

    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<DataFrame> {
        self.fit(df)?;
        self.transform(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        df! {
            "a" => [1.0, 2.0, 3.0, 4.0, 5.0],
            "b" => [10.0, 20.0, 30.0, 40.0, 50.0],
            "c" => [7.0, 7.0, 7.0, 7.0, 7.0],
        }
        .unwrap()
    }

    #[test]
    fn test_standard_scaler_uses_population_std() {
        let mut scaler = Scaler::new(ScalerType::Standard);
        let result = scaler.fit_transform(&frame(), &["a".to_string()]).unwrap();

        let col = result.column("a").unwrap().f64().unwrap();
        assert!(col.mean().unwrap().abs() < 1e-10);
        // population std of 1..=5 is sqrt(2)
        let first = col.get(0).unwrap();
        assert!((first - (-2.0 / 2.0f64.sqrt())).abs() < 1e-10);
    }

    #[test]
    fn test_minmax_scaler() {
        let mut scaler = Scaler::new(ScalerType::MinMax);
        let result = scaler.fit_transform(&frame(), &["b".to_string()]).unwrap();

        let col = result.column("b").unwrap().f64().unwrap();
        assert!((col.min().unwrap() - 0.0).abs() < 1e-10);
        assert!((col.max().unwrap() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_constant_column_keeps_unit_scale() {
        let mut scaler = Scaler::new(ScalerType::Standard);
        let result = scaler.fit_transform(&frame(), &["c".to_string()]).unwrap();
        let col = result.column("c").unwrap().f64().unwrap();
        assert!(col.into_iter().all(|v| v == Some(0.0)));
    }

    #[test]
    fn test_column_scaler_passthrough_and_order() {
        let mut scaler = ColumnScaler::new(vec!["a".to_string()], vec!["b".to_string()]);
        let result = scaler.fit_transform(&frame()).unwrap();

        let names: Vec<&str> = result.get_column_names().iter().map(|s| s.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(result.column("c").unwrap().f64().unwrap().get(0), Some(7.0));
        assert_eq!(result.column("b").unwrap().f64().unwrap().get(4), Some(1.0));
    }

    #[test]
    fn test_missing_scaled_column() {
        let mut scaler = ColumnScaler::new(vec!["nope".to_string()], Vec::new());
        let err = scaler.fit(&frame()).unwrap_err();
        assert!(matches!(err, AdClickError::FeatureNotFound(c) if c == "nope"));
    }
}
