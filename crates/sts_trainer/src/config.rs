//! Run configuration for the training pipeline
//!
//! Defaults reproduce the stock run: debug sampling on, predictor loaded from
//! `./ag_sts/`, one-hour budget, 2000-row sample, seed 2022. A TOML file may
//! override any subset of fields.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use sts_core::Metric;

use crate::dataset::{DEFAULT_ID_COLUMN, DEFAULT_LABEL};
use crate::errors::TrainerError;
use crate::trainer::TrainingParams;

/// How the pipeline obtains its predictor
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PredictorSource {
    /// Continue from the predictor saved at `predictor_path`
    LoadPretrained,
    /// Start an untrained predictor that saves to `predictor_path`
    CreateFresh,
}

/// Pipeline configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Train on a random sample of `sample_size` rows instead of the full set
    pub debug: bool,
    pub train_path: PathBuf,
    pub test_path: PathBuf,
    pub predictor_path: PathBuf,
    pub predictor_source: PredictorSource,
    /// Wall-clock budget passed to `fit`, same in debug and full mode
    pub time_limit_seconds: u64,
    pub sample_size: usize,
    /// Seed for debug sampling
    pub seed: u64,
    pub label: String,
    pub id_column: String,
    pub metrics: Vec<Metric>,
    /// Rows shown in the dataset previews
    pub preview_rows: usize,
    /// Used when the predictor is created fresh
    pub training: TrainingParams,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            debug: true,
            train_path: PathBuf::from("./data/train.csv"),
            test_path: PathBuf::from("./data/test.csv"),
            predictor_path: PathBuf::from("./ag_sts/"),
            predictor_source: PredictorSource::LoadPretrained,
            time_limit_seconds: 60 * 60,
            sample_size: 2000,
            seed: 2022,
            label: DEFAULT_LABEL.to_string(),
            id_column: DEFAULT_ID_COLUMN.to_string(),
            metrics: Metric::DEFAULT_SET.to_vec(),
            preview_rows: 5,
            training: TrainingParams::default(),
        }
    }
}

impl RunConfig {
    /// Parse a TOML document; missing fields keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, TrainerError> {
        let config: RunConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, TrainerError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TrainerError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.time_limit_seconds)
    }

    pub fn validate(&self) -> Result<(), TrainerError> {
        if self.sample_size == 0 {
            return Err(TrainerError::Config("sample_size must be positive".to_string()));
        }
        if self.label.trim().is_empty() {
            return Err(TrainerError::Config("label must not be empty".to_string()));
        }
        if self.id_column.trim().is_empty() {
            return Err(TrainerError::Config("id_column must not be empty".to_string()));
        }
        if self.metrics.is_empty() {
            return Err(TrainerError::Config("at least one metric is required".to_string()));
        }
        self.training.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_stock_run() {
        let config = RunConfig::default();
        assert!(config.debug);
        assert_eq!(config.train_path, PathBuf::from("./data/train.csv"));
        assert_eq!(config.test_path, PathBuf::from("./data/test.csv"));
        assert_eq!(config.predictor_path, PathBuf::from("./ag_sts/"));
        assert_eq!(config.predictor_source, PredictorSource::LoadPretrained);
        assert_eq!(config.time_limit(), Duration::from_secs(3600));
        assert_eq!(config.sample_size, 2000);
        assert_eq!(config.metrics, vec![Metric::Rmse, Metric::PearsonR, Metric::SpearmanR]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = RunConfig::from_toml_str(
            r#"
            debug = false
            predictor_source = "create_fresh"
            time_limit_seconds = 120
            metrics = ["rmse", "mae", "r2"]

            [training]
            num_trees = 50
            "#,
        )
        .unwrap();

        assert!(!config.debug);
        assert_eq!(config.predictor_source, PredictorSource::CreateFresh);
        assert_eq!(config.time_limit_seconds, 120);
        assert_eq!(config.metrics, vec![Metric::Rmse, Metric::Mae, Metric::R2]);
        assert_eq!(config.training.num_trees, 50);
        assert_eq!(config.training.max_depth, TrainingParams::default().max_depth);
        assert_eq!(config.sample_size, 2000);
    }

    #[test]
    fn test_unknown_metric_rejected() {
        let err = RunConfig::from_toml_str(r#"metrics = ["accuracy"]"#).unwrap_err();
        assert!(matches!(err, TrainerError::Toml(_)));
    }

    #[test]
    fn test_validation() {
        let config = RunConfig {
            sample_size: 0,
            ..RunConfig::default()
        };
        assert!(matches!(config.validate(), Err(TrainerError::Config(_))));

        let config = RunConfig {
            metrics: vec![],
            ..RunConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = RunConfig::from_toml_file("/nonexistent/sts.toml").unwrap_err();
        assert!(matches!(err, TrainerError::Config(_)));
    }
}
