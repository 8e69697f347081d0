//! Error types for the STS core crate

use thiserror::Error;

use crate::serialization::CanonicalError;

/// Errors raised while validating, persisting or loading a model
#[derive(Error, Debug)]
pub enum ModelError {
    /// Model structure is inconsistent
    #[error("Model validation failed: {0}")]
    ValidationFailed(String),

    /// Stored hash does not match the model file contents
    #[error("Model hash mismatch: expected {expected}, computed {actual}")]
    HashMismatch { expected: String, actual: String },

    /// Feature vector width differs from what the model was trained on
    #[error("Feature count mismatch: model expects {expected}, got {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Canonical serialization error: {0}")]
    Canonical(#[from] CanonicalError),
}

/// Errors raised while computing evaluation metrics
#[derive(Error, Debug, PartialEq)]
pub enum MetricError {
    /// Metric name is not recognised
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    /// Prediction and ground-truth vectors differ in length
    #[error("Length mismatch: {truth} ground-truth values, {predicted} predictions")]
    LengthMismatch { truth: usize, predicted: usize },

    /// No values to score
    #[error("Cannot compute metrics on an empty set")]
    Empty,
}
