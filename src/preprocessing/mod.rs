//! Feature preprocessing
//!
//! Building blocks of the fitted [`FeaturePipeline`]:
//! - [`ColumnDropper`]: removes identifier-like columns
//! - [`OneHotEncoder`]: one-hot encoding with the first level dropped
//! - [`ColumnScaler`]: standard and min-max scaling on named columns
//!
//! Imputation lives in [`crate::imputation`].

mod encoder;
mod pipeline;
mod scaler;
pub mod transforms;

pub use encoder::{CategoryLevels, OneHotEncoder};
pub use pipeline::FeaturePipeline;
pub use scaler::{ColumnScaler, Scaler, ScalerType};
pub use transforms::ColumnDropper;
