//! STS Core - model layer for semantic textual similarity regression
//!
//! Provides the pieces a text-pair regressor is built from:
//!
//! - `features`: Lexical similarity features for a (sentence1, sentence2) pair
//! - `gbdt`: Gradient boosted regression tree ensemble (inference + persistence)
//! - `metrics`: RMSE, MAE, R², Pearson and Spearman scoring with report formatting
//! - `serialization`: Canonical JSON and BLAKE3 hashing for model artifacts
//! - `errors`: Error types shared by the modules above

pub mod errors;
pub mod features;
pub mod gbdt;
pub mod metrics;
pub mod serialization;

pub use errors::{MetricError, ModelError};
pub use features::{extract_features, FeatureConfig, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use gbdt::{Model, Node, Tree};
pub use metrics::{EvaluationReport, Metric};

/// Crate version string recorded in model artifacts
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
