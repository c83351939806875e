//! Utility functions and types

pub mod data_loader;

pub use data_loader::{load_array, load_csv, load_json, save_array, save_csv, save_json};

use ndarray::Array2;
use polars::prelude::*;

use crate::error::{AdClickError, Result};

/// Extract named columns from a DataFrame into a row-major `Array2<f64>`.
/// Nulls become NaN so downstream imputation can see them.
pub fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = col_names.len();

    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|col_name| {
            let column = df
                .column(col_name)
                .map_err(|_| AdClickError::FeatureNotFound(col_name.clone()))?;
            let as_f64 = column.strict_cast(&DataType::Float64).map_err(|e| {
                AdClickError::DataError(format!("column '{}' is not numeric: {}", col_name, e))
            })?;
            let values: Vec<f64> = as_f64
                .f64()?
                .into_iter()
                .map(|v| v.unwrap_or(f64::NAN))
                .collect();
            Ok(values)
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| col_data[c][r]))
}

/// Inverse of [`columns_to_array2`]: NaN cells become nulls
pub fn array2_to_frame(values: &Array2<f64>, col_names: &[String]) -> Result<DataFrame> {
    if values.ncols() != col_names.len() {
        return Err(AdClickError::ShapeError {
            expected: format!("{} columns", col_names.len()),
            actual: format!("{} columns", values.ncols()),
        });
    }
    let columns: Vec<Column> = col_names
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let col: Vec<Option<f64>> = values
                .column(j)
                .iter()
                .map(|&v| if v.is_nan() { None } else { Some(v) })
                .collect();
            Column::new(name.as_str().into(), col)
        })
        .collect();
    Ok(DataFrame::new(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_columns_to_array2_maps_nulls() {
        let df = DataFrame::new(vec![
            Column::new("a".into(), &[Some(1i64), None]),
            Column::new("b".into(), &[0.5, 1.5]),
        ])
        .unwrap();
        let arr = columns_to_array2(&df, &["b".to_string(), "a".to_string()]).unwrap();
        assert_eq!(arr[[0, 0]], 0.5);
        assert_eq!(arr[[0, 1]], 1.0);
        assert!(arr[[1, 1]].is_nan());
    }

    #[test]
    fn test_missing_column_is_reported() {
        let df = DataFrame::new(vec![Column::new("a".into(), &[1.0])]).unwrap();
        let err = columns_to_array2(&df, &["zzz".to_string()]).unwrap_err();
        assert!(matches!(err, AdClickError::FeatureNotFound(name) if name == "zzz"));
    }

    #[test]
    fn test_array_frame_round_trip() {
        let arr = Array2::from_shape_vec((2, 2), vec![1.0, f64::NAN, 3.0, 4.0]).unwrap();
        let names = vec!["x".to_string(), "y".to_string()];
        let df = array2_to_frame(&arr, &names).unwrap();
        assert_eq!(df.column("y").unwrap().null_count(), 1);
        let back = columns_to_array2(&df, &names).unwrap();
        assert_eq!(back[[1, 0]], 3.0);
        assert!(back[[0, 1]].is_nan());
    }
}
