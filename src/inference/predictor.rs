//! Single-impression prediction from the web form

use crate::error::{AdClickError, Result};
use crate::inference::AdClickModel;
use crate::preprocessing::CategoryLevels;
use crate::storage::ModelRegistry;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

pub const CLICK_MESSAGE: &str = "User Will Click Ad";
pub const NO_CLICK_MESSAGE: &str = "User Will Not Click Ad";

/// Form fields posted by the prediction page. Every indicator is `"1"` when
/// its level is selected; an all-zero group means the group's first level.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdForm {
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub gender_Male: Option<String>,
    #[serde(default)]
    pub gender_Non_Binary: Option<String>,
    #[serde(default)]
    pub device_type_Mobile: Option<String>,
    #[serde(default)]
    pub device_type_Tablet: Option<String>,
    #[serde(default)]
    pub ad_position_Side: Option<String>,
    #[serde(default)]
    pub ad_position_Top: Option<String>,
    #[serde(default)]
    pub browsing_history_Entertainment: Option<String>,
    #[serde(default)]
    pub browsing_history_News: Option<String>,
    #[serde(default)]
    pub browsing_history_Shopping: Option<String>,
    #[serde(default)]
    pub browsing_history_Social_Media: Option<String>,
    #[serde(default)]
    pub time_of_day_Evening: Option<String>,
    #[serde(default)]
    pub time_of_day_Morning: Option<String>,
    #[serde(default)]
    pub time_of_day_Night: Option<String>,
}

impl AdForm {
    /// Non-empty fields keyed by sanitized name
    pub fn fields(&self) -> Result<BTreeMap<String, String>> {
        let value = serde_json::to_value(self)?;
        let mut fields = BTreeMap::new();
        if let serde_json::Value::Object(map) = value {
            for (name, v) in map {
                if let serde_json::Value::String(s) = v {
                    if !s.trim().is_empty() {
                        fields.insert(sanitize_field_name(&name), s.trim().to_string());
                    }
                }
            }
        }
        Ok(fields)
    }
}

/// Map every non-alphanumeric character to `_`
pub fn sanitize_field_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Finite numbers only; `NaN` and `inf` are rejected like any other junk
fn parse_number(field: &str, raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AdClickError::InvalidInput(format!("field '{}' is not a number: '{}'", field, raw)))
}

/// Resolve one indicator group to a level of `levels`
fn resolve_category(levels: &CategoryLevels, fields: &BTreeMap<String, String>) -> Result<String> {
    let mut selected: Option<&str> = None;
    for level in levels.levels.iter().skip(1) {
        let name = sanitize_field_name(&format!("{}_{}", levels.column, level));
        let on = match fields.get(&name) {
            Some(raw) => parse_number(&name, raw)? >= 0.5,
            None => false,
        };
        if on {
            if let Some(previous) = selected {
                return Err(AdClickError::InvalidInput(format!(
                    "both '{}' and '{}' selected for {}",
                    previous, level, levels.column
                )));
            }
            selected = Some(level);
        }
    }

    match selected.or_else(|| levels.baseline()) {
        Some(level) => Ok(level.to_string()),
        None => Err(AdClickError::InvalidInput(format!(
            "column '{}' has no fitted levels",
            levels.column
        ))),
    }
}

/// Rebuild the raw one-row frame the bundled pipeline expects
pub fn form_to_frame(model: &AdClickModel, fields: &BTreeMap<String, String>) -> Result<DataFrame> {
    let encoder = model.pipeline().encoder();
    let mut columns = Vec::with_capacity(encoder.input_columns().len());

    for name in encoder.input_columns() {
        match encoder.categories().iter().find(|c| &c.column == name) {
            Some(levels) => {
                let level = resolve_category(levels, fields)?;
                columns.push(Column::new(name.as_str().into(), [level.as_str()]));
            }
            None => {
                let key = sanitize_field_name(name);
                let raw = fields.get(&key).ok_or_else(|| {
                    AdClickError::InvalidInput(format!("missing field '{}'", key))
                })?;
                columns.push(Column::new(name.as_str().into(), [parse_number(&key, raw)?]));
            }
        }
    }

    Ok(DataFrame::new(columns)?)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: i64,
    pub probability: f64,
    pub message: String,
}

/// Loads the production bundle from the registry on every call
pub struct AdPredictor {
    registry: Arc<dyn ModelRegistry>,
    model_key: String,
}

impl AdPredictor {
    pub fn new(registry: Arc<dyn ModelRegistry>, model_key: impl Into<String>) -> Self {
        Self {
            registry,
            model_key: model_key.into(),
        }
    }

    pub fn predict(&self, form: &AdForm) -> Result<Prediction> {
        self.predict_fields(&form.fields()?)
    }

    pub fn predict_fields(&self, fields: &BTreeMap<String, String>) -> Result<Prediction> {
        let model = self.registry.load_model(&self.model_key)?;
        let frame = form_to_frame(&model, fields)?;
        let probability = model.predict_proba(&frame)?[0];
        let label = if probability >= 0.5 { 1 } else { 0 };
        let message = if label == 1 { CLICK_MESSAGE } else { NO_CLICK_MESSAGE };

        info!(label, probability, "Prediction served");
        Ok(Prediction {
            label,
            probability,
            message: message.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn levels(column: &str, values: &[&str]) -> CategoryLevels {
        CategoryLevels::new(column, values.iter().map(|s| s.to_string()).collect())
    }

    fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_sanitize_field_name() {
        assert_eq!(sanitize_field_name("gender_Non-Binary"), "gender_Non_Binary");
        assert_eq!(sanitize_field_name("browsing_history_Social Media"), "browsing_history_Social_Media");
    }

    #[test]
    fn test_parse_number_rejects_non_finite() {
        assert_eq!(parse_number("age", " 31".trim()).unwrap(), 31.0);
        for raw in ["NaN", "inf", "-infinity", "thirty"] {
            assert!(
                matches!(parse_number("age", raw), Err(AdClickError::InvalidInput(_))),
                "accepted {}",
                raw
            );
        }
    }

    #[test]
    fn test_resolve_selected_level() {
        let gender = levels("gender", &["Female", "Male", "Non-Binary"]);
        let f = fields(&[("gender_Male", "0"), ("gender_Non_Binary", "1")]);
        assert_eq!(resolve_category(&gender, &f).unwrap(), "Non-Binary");
    }

    #[test]
    fn test_all_zero_group_is_baseline() {
        let gender = levels("gender", &["Female", "Male", "Non-Binary"]);
        assert_eq!(resolve_category(&gender, &fields(&[])).unwrap(), "Female");
        let f = fields(&[("gender_Male", "0")]);
        assert_eq!(resolve_category(&gender, &f).unwrap(), "Female");
    }

    #[test]
    fn test_two_levels_selected_is_invalid() {
        let device = levels("device_type", &["Desktop", "Mobile", "Tablet"]);
        let f = fields(&[("device_type_Mobile", "1"), ("device_type_Tablet", "1")]);
        assert!(matches!(
            resolve_category(&device, &f),
            Err(AdClickError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_form_fields_skip_empty() {
        let form = AdForm {
            age: "31".to_string(),
            device_type_Mobile: Some("1".to_string()),
            time_of_day_Night: Some(String::new()),
            ..Default::default()
        };
        let f = form.fields().unwrap();
        assert_eq!(f.get("age").map(String::as_str), Some("31"));
        assert_eq!(f.get("device_type_Mobile").map(String::as_str), Some("1"));
        assert!(!f.contains_key("time_of_day_Night"));
        assert!(!f.contains_key("gender_Male"));
    }
}
