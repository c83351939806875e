//! Model training
//!
//! - [`DecisionTree`]: least-squares regression tree
//! - [`GradientBoostingClassifier`]: log-loss boosting over those trees
//! - [`ModelTrainer`]: the pipeline stage that fits, scores and persists

pub mod decision_tree;
pub mod gradient_boosting;
mod metrics;
mod trainer;

pub use decision_tree::{DecisionTree, TreeNode};
pub use gradient_boosting::{GradientBoostingClassifier, GradientBoostingConfig};
pub use metrics::{accuracy_score, classification_score, ConfusionCounts};
pub use trainer::ModelTrainer;
