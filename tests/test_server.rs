//! Integration test: HTTP routes

use adclick::config::AppConfig;
use adclick::ingestion::{generate_impressions, SampleConfig};
use adclick::server::{create_router, AppState, TRAIN_SUCCESS};
use adclick::storage::{DocumentStore, FileModelRegistry, MemoryDocumentStore};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceExt;

fn test_state(root: &Path, records: usize) -> Arc<AppState> {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    let config = AppConfig::default()
        .rooted_at(root)
        .with_schema_path(manifest.join("config").join("schema.yaml"))
        .with_model_config_path(manifest.join("config").join("model.yaml"));

    let store = MemoryDocumentStore::new();
    if records > 0 {
        let documents = generate_impressions(&SampleConfig {
            n_records: records,
            ..SampleConfig::default()
        });
        store.insert_many(&config.collection_name, &documents).unwrap();
    }
    let registry = FileModelRegistry::new(&config.bucket_dir);
    Arc::new(AppState::with_backends(config, Arc::new(store), Arc::new(registry)))
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn form_post(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(test_state(dir.path(), 0));
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["model_present"], false);
}

#[tokio::test]
async fn test_root_serves_form() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(test_state(dir.path(), 0));
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_string(response).await;
    assert!(html.contains("<form method=\"post\""));
    assert!(html.contains("name=\"device_type_Mobile\""));
}

#[tokio::test]
async fn test_predict_without_model() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(test_state(dir.path(), 0));
    let response = app.oneshot(form_post("age=30")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["status"], false);
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_train_reports_failure() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(test_state(dir.path(), 0));
    let response = app
        .oneshot(Request::builder().uri("/train").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.starts_with("Error Occurred!"));
}

#[tokio::test]
async fn test_train_then_predict() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(test_state(dir.path(), 1000));

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/train").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_string(response).await, TRAIN_SUCCESS);

    let response = app
        .clone()
        .oneshot(form_post("age=21&device_type_Mobile=1&gender_Male=0"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("User Will Click Ad"));

    let response = app
        .clone()
        .oneshot(form_post("age=21&device_type_Mobile=1&device_type_Tablet=1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.oneshot(form_post("age=inf&device_type_Mobile=1")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["status"], false);
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = create_router(test_state(dir.path(), 0));
    let response = app
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(json["status"], false);
}
