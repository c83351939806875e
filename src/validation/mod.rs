//! Data validation against the column schema

use crate::artifact::{DataIngestionArtifact, DataValidationArtifact};
use crate::config::{DataValidationConfig, Schema};
use crate::error::Result;
use crate::utils::{load_csv, save_json};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

/// JSON report written next to the run artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub validation_status: bool,
    pub message: String,
}

pub struct DataValidation {
    ingestion: DataIngestionArtifact,
    config: DataValidationConfig,
    schema: Schema,
}

impl DataValidation {
    pub fn new(ingestion: DataIngestionArtifact, config: DataValidationConfig, schema: Schema) -> Self {
        Self {
            ingestion,
            config,
            schema,
        }
    }

    /// True iff the frame has exactly as many columns as the schema declares
    pub fn validate_column_numbers(&self, df: &DataFrame) -> bool {
        let status = df.width() == self.schema.column_count();
        info!(
            expected = self.schema.column_count(),
            actual = df.width(),
            status,
            "Checked column count"
        );
        status
    }

    /// True iff every schema numerical and categorical column is present
    pub fn validate_column_presence(&self, df: &DataFrame) -> bool {
        let names: Vec<&str> = df.get_column_names().iter().map(|s| s.as_str()).collect();
        let missing_num: Vec<&String> = self
            .schema
            .numerical_columns
            .iter()
            .filter(|c| !names.contains(&c.as_str()))
            .collect();
        let missing_cat: Vec<&String> = self
            .schema
            .categorical_columns
            .iter()
            .filter(|c| !names.contains(&c.as_str()))
            .collect();

        if !missing_num.is_empty() {
            info!(columns = ?missing_num, "Missing numerical columns");
        }
        if !missing_cat.is_empty() {
            info!(columns = ?missing_cat, "Missing categorical columns");
        }
        missing_num.is_empty() && missing_cat.is_empty()
    }

    /// Run every check on test and train, then write the report
    pub fn validate(&self, train: &DataFrame, test: &DataFrame) -> ValidationReport {
        let mut message = String::new();

        if !self.validate_column_numbers(test) {
            message.push_str("Columns are missing in testing dataframe. ");
        }
        if !self.validate_column_numbers(train) {
            message.push_str("Columns are missing in training dataframe. ");
        }
        if !self.validate_column_presence(test) {
            message.push_str("Columns are missing in testing dataframe. ");
        }
        if !self.validate_column_presence(train) {
            message.push_str("Columns are missing in training dataframe. ");
        }

        ValidationReport {
            validation_status: message.is_empty(),
            message: message.trim().to_string(),
        }
    }

    pub fn initiate_data_validation(&self) -> Result<DataValidationArtifact> {
        let test = load_csv(&self.ingestion.test_file_path)?;
        let train = load_csv(&self.ingestion.train_file_path)?;

        let report = self.validate(&train, &test);
        save_json(&self.config.report_file_path, &report)?;

        info!(
            status = report.validation_status,
            message = %report.message,
            report = %self.config.report_file_path.display(),
            "Data validation completed"
        );

        Ok(DataValidationArtifact {
            validation_status: report.validation_status,
            message: report.message,
            report_file_path: self.config.report_file_path.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn schema() -> Schema {
        Schema::from_yaml_str(
            r#"
columns:
  - age: float
  - gender: category
  - click: int
numerical_columns: [age, click]
categorical_columns: [gender]
"#,
        )
        .unwrap()
    }

    fn validator() -> DataValidation {
        DataValidation::new(
            DataIngestionArtifact {
                feature_store_file_path: PathBuf::from("unused.csv"),
                train_file_path: PathBuf::from("unused_train.csv"),
                test_file_path: PathBuf::from("unused_test.csv"),
            },
            DataValidationConfig {
                report_file_path: PathBuf::from("unused.json"),
            },
            schema(),
        )
    }

    fn good_frame() -> DataFrame {
        df! {
            "age" => [21.0, 35.0],
            "gender" => ["Male", "Female"],
            "click" => [0i64, 1],
        }
        .unwrap()
    }

    #[test]
    fn test_column_numbers() {
        let v = validator();
        assert!(v.validate_column_numbers(&good_frame()));

        let extra = good_frame().hstack(&[Column::new("x".into(), &[1, 2])]).unwrap();
        assert!(!v.validate_column_numbers(&extra));
        assert!(!v.validate_column_numbers(&good_frame().drop("gender").unwrap()));
    }

    #[test]
    fn test_column_presence() {
        let v = validator();
        assert!(v.validate_column_presence(&good_frame()));

        let renamed = df! {
            "age" => [21.0],
            "sex" => ["Male"],
            "click" => [0i64],
        }
        .unwrap();
        assert!(!v.validate_column_presence(&renamed));
    }

    #[test]
    fn test_train_and_test_checked_independently() {
        let v = validator();
        let bad = good_frame().drop("gender").unwrap();

        let report = v.validate(&good_frame(), &bad);
        assert!(!report.validation_status);
        assert_eq!(
            report.message,
            "Columns are missing in testing dataframe. Columns are missing in testing dataframe."
        );

        let report = v.validate(&bad, &good_frame());
        assert_eq!(
            report.message,
            "Columns are missing in training dataframe. Columns are missing in training dataframe."
        );

        let report = v.validate(&good_frame(), &good_frame());
        assert!(report.validation_status);
        assert!(report.message.is_empty());
    }

    #[test]
    fn test_report_written() {
        let dir = tempfile::tempdir().unwrap();
        let train_path = dir.path().join("train.csv");
        let test_path = dir.path().join("test.csv");
        crate::utils::save_csv(&train_path, &mut good_frame()).unwrap();
        crate::utils::save_csv(&test_path, &mut good_frame()).unwrap();

        let validation = DataValidation::new(
            DataIngestionArtifact {
                feature_store_file_path: dir.path().join("fs.csv"),
                train_file_path: train_path,
                test_file_path: test_path,
            },
            DataValidationConfig {
                report_file_path: dir.path().join("validation/report.json"),
            },
            schema(),
        );
        let artifact = validation.initiate_data_validation().unwrap();
        assert!(artifact.validation_status);

        let report: ValidationReport = crate::utils::load_json(&artifact.report_file_path).unwrap();
        assert!(report.validation_status);
    }
}
