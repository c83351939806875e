//! Integration test: raw impressions through the feature pipeline and rebalancer

use adclick::config::Schema;
use adclick::ingestion::{documents_to_frame, generate_impressions, SampleConfig};
use adclick::preprocessing::FeaturePipeline;
use adclick::synthetic::{class_counts, Sampler, SMOTEENN};
use adclick::transformation::split_target;
use polars::prelude::*;
use std::path::Path;

fn schema() -> Schema {
    Schema::from_file(&Path::new(env!("CARGO_MANIFEST_DIR")).join("config").join("schema.yaml"))
        .unwrap()
}

fn raw_frame(n_records: usize, seed: u64) -> DataFrame {
    let documents = generate_impressions(&SampleConfig {
        n_records,
        seed,
        missing_time_of_day: 0.15,
        ..SampleConfig::default()
    });
    documents_to_frame(&documents).unwrap()
}

#[test]
fn test_feature_layout_from_raw_records() {
    let schema = schema();
    let raw = raw_frame(400, 1);
    assert_eq!(raw.width(), schema.column_count());
    assert!(raw.column("time_of_day").unwrap().null_count() > 0);

    let (features, labels) = split_target(&raw, &schema.target_column).unwrap();
    let mut pipeline = FeaturePipeline::new(&schema, 5);
    let x = pipeline.fit_transform(&features).unwrap();

    assert_eq!(x.nrows(), labels.len());
    // age plus 2 + 2 + 2 + 4 + 3 indicators
    assert_eq!(x.ncols(), 14);
    let names = pipeline.feature_names();
    assert!(names.contains(&"age".to_string()));
    assert!(names.contains(&"browsing_history_Social Media".to_string()));
    assert!(!names.iter().any(|n| n == "id" || n.starts_with("full_name")));
    assert!(!names.iter().any(|n| n.ends_with("_Desktop") || n.ends_with("_Afternoon")));
    assert!(!x.iter().any(|v| v.is_nan()));
}

#[test]
fn test_fitted_pipeline_applies_to_new_records() {
    let schema = schema();
    let (train, _) = split_target(&raw_frame(400, 1), &schema.target_column).unwrap();
    let (test, _) = split_target(&raw_frame(50, 2), &schema.target_column).unwrap();

    let mut pipeline = FeaturePipeline::new(&schema, 5);
    let fitted = pipeline.fit_transform(&train).unwrap();
    let applied = pipeline.transform(&test).unwrap();

    assert_eq!(applied.ncols(), fitted.ncols());
    assert_eq!(applied.nrows(), 50);
    assert!(!applied.iter().any(|v| v.is_nan()));
}

#[test]
fn test_rebalanced_training_matrix() {
    let schema = schema();
    let (features, labels) = split_target(&raw_frame(500, 3), &schema.target_column).unwrap();
    let mut pipeline = FeaturePipeline::new(&schema, 5);
    let x = pipeline.fit_transform(&features).unwrap();

    let before = class_counts(&labels);
    assert!(before[&0] > before[&1]);

    let mut sampler = SMOTEENN::new().with_seed(42);
    let result = sampler.fit_resample(&x, &labels).unwrap();
    let after = class_counts(&result.y);

    assert_eq!(result.x.nrows(), result.y.len());
    assert_eq!(result.x.ncols(), x.ncols());
    assert!(result.n_synthetic[1] > 0);
    assert_eq!(after.len(), 2);
    assert!(result.x.nrows() <= 2 * before[&0]);
}
