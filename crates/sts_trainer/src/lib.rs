//! STS Trainer - semantic textual similarity training pipeline
//!
//! Loads train/test CSV files, normalizes their columns, fits a text-pair
//! regressor under a wall-clock budget and reports RMSE, Pearson and
//! Spearman on the test set.

pub mod cart;
pub mod config;
pub mod dataset;
pub mod deterministic;
pub mod errors;
pub mod pipeline;
pub mod predictor;
pub mod table;
pub mod trainer;

pub use config::{PredictorSource, RunConfig};
pub use dataset::{ColumnNormalizer, SentencePairs, SENTENCE1, SENTENCE2};
pub use deterministic::{LcgRng, SplitTieBreaker};
pub use errors::TrainerError;
pub use pipeline::{run, run_with};
pub use predictor::{FitSummary, Predictor, TextPredictor};
pub use table::Table;
pub use trainer::{GbdtTrainer, StopReason, TrainingParams};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
