//! HTTP request handlers

use std::sync::Arc;
use axum::{
    extract::{Form, State},
    response::Html,
    Json,
};
use tracing::{error, info};

use crate::inference::AdForm;
use crate::pipeline::TrainPipeline;

use super::error::Result;
use super::state::AppState;

pub const TRAIN_SUCCESS: &str = "Training successful!!!";

const INDICATOR_FIELDS: &[(&str, &str)] = &[
    ("gender_Male", "Gender: Male"),
    ("gender_Non_Binary", "Gender: Non-Binary"),
    ("device_type_Mobile", "Device: Mobile"),
    ("device_type_Tablet", "Device: Tablet"),
    ("ad_position_Side", "Ad position: Side"),
    ("ad_position_Top", "Ad position: Top"),
    ("browsing_history_Entertainment", "Browsing: Entertainment"),
    ("browsing_history_News", "Browsing: News"),
    ("browsing_history_Shopping", "Browsing: Shopping"),
    ("browsing_history_Social_Media", "Browsing: Social Media"),
    ("time_of_day_Evening", "Time of day: Evening"),
    ("time_of_day_Morning", "Time of day: Morning"),
    ("time_of_day_Night", "Time of day: Night"),
];

const INDEX_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Ad Click Prediction</title>
    <style>
        body { font-family: sans-serif; max-width: 640px; margin: 2rem auto; color: #222; }
        label { display: flex; justify-content: space-between; margin: .3rem 0; }
        input { width: 5rem; }
        .result { margin-top: 1.5rem; font-size: 1.3rem; font-weight: bold; }
    </style>
</head>
<body>
    <h1>Ad Click Prediction</h1>
    <p>Set an indicator to 1 to select that level. Leave a whole group at 0 for its first level
    (Female, Desktop, Bottom, Education, Afternoon).</p>
    <form method="post" action="/">
        <label>Age <input type="number" name="age" step="any" required></label>
{{fields}}
        <button type="submit">Predict</button>
    </form>
    <div class="result">{{prediction}}</div>
</body>
</html>
"#;

/// Render the form page, optionally with a prediction message
pub fn render_index(prediction: Option<&str>) -> String {
    let fields: String = INDICATOR_FIELDS
        .iter()
        .map(|(name, label)| {
            format!(
                "        <label>{} <input type=\"number\" name=\"{}\" min=\"0\" max=\"1\" value=\"0\"></label>\n",
                label, name
            )
        })
        .collect();
    INDEX_TEMPLATE
        .replace("{{fields}}", fields.trim_end())
        .replace("{{prediction}}", prediction.unwrap_or(""))
}

pub async fn serve_index() -> Html<String> {
    Html(render_index(None))
}

pub async fn predict(
    State(state): State<Arc<AppState>>,
    Form(form): Form<AdForm>,
) -> Result<Html<String>> {
    let predictor = state.predictor();
    let prediction = tokio::task::spawn_blocking(move || predictor.predict(&form)).await??;
    Ok(Html(render_index(Some(&prediction.message))))
}

pub async fn train(State(state): State<Arc<AppState>>) -> String {
    let _guard = state.training_lock.lock().await;
    info!("Training requested over HTTP");

    let config = state.config.clone();
    let store = state.store.clone();
    let registry = state.registry.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        TrainPipeline::new(config, store, registry)?.run_pipeline()
    })
    .await;

    match outcome {
        Ok(Ok(_)) => TRAIN_SUCCESS.to_string(),
        Ok(Err(e)) => format!("Error Occurred! {}", e),
        Err(e) => {
            error!(error = %e, "Training task panicked");
            format!("Error Occurred! {}", e)
        }
    }
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let model_present = state
        .registry
        .is_model_present(&state.config.model_key)
        .unwrap_or(false);
    let uptime = chrono::Utc::now().signed_duration_since(state.started_at);
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "model_present": model_present,
        "uptime_secs": uptime.num_seconds(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_index_lists_every_indicator() {
        let page = render_index(Some("User Will Click Ad"));
        for (name, _) in INDICATOR_FIELDS {
            assert!(page.contains(&format!("name=\"{}\"", name)));
        }
        assert!(page.contains("User Will Click Ad"));
        assert!(!page.contains("{{"));
    }
}
