//! Serving-side model code
//!
//! [`AdClickModel`] is the bundle the registry stores; [`AdPredictor`] turns
//! a submitted [`AdForm`] into a click prediction against it.

mod model;
mod predictor;

pub use model::AdClickModel;
pub use predictor::{
    form_to_frame, sanitize_field_name, AdForm, AdPredictor, Prediction, CLICK_MESSAGE,
    NO_CLICK_MESSAGE,
};
