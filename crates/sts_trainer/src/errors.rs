use sts_core::{MetricError, ModelError};
use thiserror::Error;

/// Errors returned by the STS training pipeline.
#[derive(Debug, Error)]
pub enum TrainerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("column not found: {0}")]
    MissingColumn(String),

    #[error("duplicate column: {0}")]
    DuplicateColumn(String),

    #[error("duplicate row id: {0}")]
    DuplicateId(String),

    #[error("invalid value {value:?} in column {column} (row id {row_id})")]
    InvalidValue {
        row_id: String,
        column: String,
        value: String,
    },

    #[error("cannot sample {requested} rows without replacement from {available} rows")]
    SampleTooLarge { requested: usize, available: usize },

    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("training error: {0}")]
    Training(String),

    #[error("predictor error: {0}")]
    Predictor(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Metric(#[from] MetricError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}
