//! Integration test: boosting on encoded impressions

use adclick::config::Schema;
use adclick::evaluation::EvaluateModelResponse;
use adclick::ingestion::{documents_to_frame, generate_impressions, SampleConfig};
use adclick::preprocessing::FeaturePipeline;
use adclick::training::{classification_score, GradientBoostingClassifier, GradientBoostingConfig};
use adclick::transformation::split_target;
use ndarray::{Array1, Array2};
use std::path::Path;

fn encoded(n_records: usize, seed: u64, pipeline: &mut FeaturePipeline, fit: bool) -> (Array2<f64>, Array1<i64>) {
    let schema = pipeline_schema();
    let documents = generate_impressions(&SampleConfig {
        n_records,
        seed,
        ..SampleConfig::default()
    });
    let raw = documents_to_frame(&documents).unwrap();
    let (features, labels) = split_target(&raw, &schema.target_column).unwrap();
    let x = if fit {
        pipeline.fit_transform(&features).unwrap()
    } else {
        pipeline.transform(&features).unwrap()
    };
    (x, labels)
}

fn pipeline_schema() -> Schema {
    Schema::from_file(&Path::new(env!("CARGO_MANIFEST_DIR")).join("config").join("schema.yaml"))
        .unwrap()
}

#[test]
fn test_boosting_learns_click_rule() {
    let mut pipeline = FeaturePipeline::new(&pipeline_schema(), 5);
    let (x_train, y_train) = encoded(800, 10, &mut pipeline, true);
    let (x_test, y_test) = encoded(200, 11, &mut pipeline, false);

    let mut model = GradientBoostingClassifier::new(GradientBoostingConfig {
        max_depth: 4,
        ..GradientBoostingConfig::default()
    });
    model.fit(&x_train, &y_train).unwrap();

    let metrics = classification_score(&y_test, &model.predict(&x_test).unwrap()).unwrap();
    assert!(metrics.accuracy > 0.9, "accuracy {}", metrics.accuracy);
    assert!(metrics.f1_score > 0.8, "f1 {}", metrics.f1_score);

    // age and the device indicators carry the signal
    let names = pipeline.feature_names();
    let importances = model.feature_importances();
    let (top, _) = importances
        .iter()
        .enumerate()
        .fold((0, f64::MIN), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
    assert!(names[top] == "age" || names[top].starts_with("device_type_"), "top {}", names[top]);
}

#[test]
fn test_acceptance_is_strict() {
    let first = EvaluateModelResponse::compare(0.82, None, 0.0);
    assert!(first.is_model_accepted);
    assert_eq!(first.difference, 0.82);

    let tie = EvaluateModelResponse::compare(0.82, Some(0.82), 0.0);
    assert!(!tie.is_model_accepted);

    let worse = EvaluateModelResponse::compare(0.70, Some(0.82), 0.0);
    assert!(!worse.is_model_accepted);
    assert!(worse.difference < 0.0);
}
