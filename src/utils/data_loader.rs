//! Artifact persistence: CSV tables, JSON documents and arrays

use crate::error::{AdClickError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{de::DeserializeOwned, Serialize};
use std::fs::{self, File};
use std::path::Path;

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Load a headered CSV file, inferring column types
pub fn load_csv(path: &Path) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(AdClickError::DataError(format!(
            "CSV file not found: {}",
            path.display()
        )));
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(10_000))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

/// Write a frame as headered CSV, creating parent directories
pub fn save_csv(path: &Path, df: &mut DataFrame) -> Result<()> {
    ensure_parent(path)?;
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}

/// Serialize `value` as pretty JSON
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

/// Persist a numeric matrix (features with the label as the last column)
pub fn save_array(path: &Path, array: &Array2<f64>) -> Result<()> {
    ensure_parent(path)?;
    let json = serde_json::to_string(array)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn load_array(path: &Path) -> Result<Array2<f64>> {
    load_json(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_round_trip_keeps_nulls() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/train.csv");

        let mut df = DataFrame::new(vec![
            Column::new("age".into(), &[Some(21.0), None, Some(40.5)]),
            Column::new("gender".into(), &[Some("Male"), Some("Female"), None]),
        ])
        .unwrap();
        save_csv(&path, &mut df).unwrap();

        let loaded = load_csv(&path).unwrap();
        assert_eq!(loaded.shape(), (3, 2));
        assert_eq!(loaded.column("age").unwrap().null_count(), 1);
        assert_eq!(loaded.column("gender").unwrap().null_count(), 1);
    }

    #[test]
    fn test_missing_csv() {
        let err = load_csv(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, AdClickError::DataError(_)));
    }

    #[test]
    fn test_array_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arr.json");
        let arr = Array2::from_shape_vec((2, 3), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        save_array(&path, &arr).unwrap();
        assert_eq!(load_array(&path).unwrap(), arr);
    }
}
