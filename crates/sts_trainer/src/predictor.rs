//! Text-pair regression predictor
//!
//! [`Predictor`] is the seam the pipeline talks to: fit on a normalized table
//! under a time budget, then evaluate on another. [`TextPredictor`] is the
//! bundled implementation: lexical pair features fed to a boosted tree
//! ensemble, persisted in its own directory:
//!
//! ```text
//! <path>/predictor.json   label, feature and training settings
//! <path>/model.json       canonical JSON ensemble
//! <path>/model.hash       hex BLAKE3 of model.json
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use sts_core::gbdt::Model;
use sts_core::metrics::{EvaluationReport, Metric};
use sts_core::{extract_features, FeatureConfig, ModelError, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};

use crate::dataset::SentencePairs;
use crate::errors::TrainerError;
use crate::table::Table;
use crate::trainer::{GbdtTrainer, StopReason, TrainingParams};

pub const MANIFEST_FILE: &str = "predictor.json";
pub const MODEL_FILE: &str = "model.json";
pub const HASH_FILE: &str = "model.hash";

const MANIFEST_VERSION: u32 = 1;

/// Result of one `fit` call
#[derive(Clone, Debug, PartialEq)]
pub struct FitSummary {
    /// Rows the predictor was fitted on
    pub rows: usize,
    pub trees_added: usize,
    pub total_trees: usize,
    pub stop_reason: StopReason,
    pub holdout_rmse: Option<f64>,
    pub elapsed: Duration,
}

/// A trainable regressor over normalized sentence-pair tables
pub trait Predictor {
    /// Name of the label column this predictor regresses
    fn label(&self) -> &str;

    /// Fit on `data` (canonical text columns plus the label), stopping no
    /// later than the first boosting round that starts after `time_limit`.
    fn fit(&mut self, data: &Table, time_limit: Duration) -> Result<FitSummary, TrainerError>;

    /// Predict one score per row of `data`
    fn predict(&self, data: &Table) -> Result<Vec<f64>, TrainerError>;

    /// Score predictions on `data` against its label column
    fn evaluate(&self, data: &Table, metrics: &[Metric]) -> Result<EvaluationReport, TrainerError> {
        let predicted = self.predict(data)?;
        let truth = data.numeric_column(self.label())?;
        Ok(EvaluationReport::compute(metrics, &truth, &predicted)?)
    }
}

/// Persisted predictor settings
#[derive(Clone, Debug, Serialize, Deserialize)]
struct Manifest {
    format_version: u32,
    label: String,
    feature_names: Vec<String>,
    features: FeatureConfig,
    training: TrainingParams,
    trained_at: Option<String>,
    model_hash: Option<String>,
    crate_version: String,
}

/// Boosted-tree regressor over lexical text-pair features
#[derive(Clone, Debug)]
pub struct TextPredictor {
    label: String,
    path: PathBuf,
    features: FeatureConfig,
    params: TrainingParams,
    model: Option<Model>,
    trained_at: Option<String>,
}

impl TextPredictor {
    /// Untrained predictor that will store its artifacts under `path`
    pub fn create_fresh<S: Into<String>, P: Into<PathBuf>>(label: S, path: P) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
            features: FeatureConfig::default(),
            params: TrainingParams::default(),
            model: None,
            trained_at: None,
        }
    }

    /// Load a previously saved predictor, verifying the model hash
    pub fn load_pretrained<P: Into<PathBuf>>(path: P) -> Result<Self, TrainerError> {
        let path = path.into();
        let manifest_path = path.join(MANIFEST_FILE);
        tracing::info!("Loading predictor from: {}", path.display());

        let manifest: Manifest = serde_json::from_str(&fs::read_to_string(&manifest_path)?)?;
        if manifest.format_version != MANIFEST_VERSION {
            return Err(TrainerError::Predictor(format!(
                "unsupported predictor format version {} in {}",
                manifest.format_version,
                manifest_path.display()
            )));
        }
        if manifest.feature_names != FEATURE_NAMES {
            return Err(TrainerError::Predictor(format!(
                "predictor was saved with features {:?}, this build extracts {:?}",
                manifest.feature_names, FEATURE_NAMES
            )));
        }

        let model = Model::load_verified(path.join(MODEL_FILE), path.join(HASH_FILE))?;
        if let Some(expected) = manifest.model_hash {
            let stored = fs::read_to_string(path.join(HASH_FILE))?.trim().to_lowercase();
            if expected != stored {
                return Err(ModelError::HashMismatch {
                    expected,
                    actual: stored,
                }
                .into());
            }
        }
        if model.feature_count != FEATURE_COUNT {
            return Err(TrainerError::Predictor(format!(
                "model expects {} features, this build extracts {}",
                model.feature_count, FEATURE_COUNT
            )));
        }

        tracing::info!(
            "Loaded predictor for label '{}' with {} trees (saved by v{})",
            manifest.label,
            model.num_trees(),
            manifest.crate_version
        );

        Ok(Self {
            label: manifest.label,
            path,
            features: manifest.features,
            params: manifest.training,
            model: Some(model),
            trained_at: manifest.trained_at,
        })
    }

    /// Replace the training parameters used by subsequent `fit` calls
    pub fn with_params(mut self, params: TrainingParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_feature_config(mut self, features: FeatureConfig) -> Self {
        self.features = features;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn params(&self) -> &TrainingParams {
        &self.params
    }

    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    fn featurize(&self, pairs: &SentencePairs) -> Vec<FeatureVector> {
        pairs
            .pairs()
            .map(|(a, b)| extract_features(a, b, &self.features))
            .collect()
    }

    /// Write manifest, model and hash into the predictor directory
    pub fn save(&self) -> Result<(), TrainerError> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| TrainerError::Predictor("cannot save an untrained predictor".to_string()))?;

        fs::create_dir_all(&self.path)?;
        let hash = model.save(self.path.join(MODEL_FILE), self.path.join(HASH_FILE))?;

        let manifest = Manifest {
            format_version: MANIFEST_VERSION,
            label: self.label.clone(),
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            features: self.features.clone(),
            training: self.params.clone(),
            trained_at: self.trained_at.clone(),
            model_hash: Some(hash.clone()),
            crate_version: crate::VERSION.to_string(),
        };
        fs::write(
            self.path.join(MANIFEST_FILE),
            serde_json::to_string_pretty(&manifest)?,
        )?;

        tracing::info!("Saved predictor to {} (model hash {})", self.path.display(), hash);
        Ok(())
    }
}

impl Predictor for TextPredictor {
    fn label(&self) -> &str {
        &self.label
    }

    fn fit(&mut self, data: &Table, time_limit: Duration) -> Result<FitSummary, TrainerError> {
        let started = Instant::now();
        let deadline = started.checked_add(time_limit);

        let pairs = SentencePairs::from_table(data, Some(&self.label))?;
        let targets = pairs
            .scores
            .clone()
            .ok_or_else(|| TrainerError::Schema(format!("missing label column {}", self.label)))?;

        tracing::info!(
            "Fitting on {} rows, time limit {}s",
            pairs.len(),
            time_limit.as_secs()
        );
        let features = self.featurize(&pairs);

        let mut model = self
            .model
            .clone()
            .unwrap_or_else(|| Model::new(FEATURE_COUNT, 0.0));

        let trainer = GbdtTrainer::new(self.params.clone());
        let outcome = trainer.train(&mut model, &features, &targets, deadline)?;

        let summary = FitSummary {
            rows: pairs.len(),
            trees_added: outcome.trees_added,
            total_trees: model.num_trees(),
            stop_reason: outcome.stop_reason,
            holdout_rmse: outcome.holdout_rmse,
            elapsed: started.elapsed(),
        };

        self.model = Some(model);
        self.trained_at = Some(chrono::Utc::now().to_rfc3339());
        self.save()?;

        Ok(summary)
    }

    fn predict(&self, data: &Table) -> Result<Vec<f64>, TrainerError> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| TrainerError::Predictor("predictor has not been fitted".to_string()))?;

        let pairs = SentencePairs::from_table(data, None)?;
        Ok(model.predict(&self.featurize(&pairs))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn labelled_table() -> Table {
        let mut table = Table::new(
            "id",
            vec!["sentence1".to_string(), "sentence2".to_string(), "score".to_string()],
        )
        .unwrap();
        let pairs = [
            ("hot water", "hot water", "1.0"),
            ("hot water", "water heater", "0.5"),
            ("hot water", "bicycle", "0.0"),
            ("wet etching", "wet etching process", "0.75"),
            ("wet etching", "dry cleaning", "0.25"),
            ("wet etching", "pasta", "0.0"),
        ];
        for (i, (a, b, s)) in pairs.iter().enumerate() {
            table
                .push_row(i.to_string(), vec![a.to_string(), b.to_string(), s.to_string()])
                .unwrap();
        }
        table
    }

    fn quick_params() -> TrainingParams {
        TrainingParams {
            num_trees: 10,
            min_samples_leaf: 1,
            holdout_fraction: 0.0,
            ..TrainingParams::default()
        }
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let dir = TempDir::new().unwrap();
        let predictor = TextPredictor::create_fresh("score", dir.path());
        assert!(!predictor.is_trained());
        assert!(matches!(
            predictor.predict(&labelled_table()),
            Err(TrainerError::Predictor(_))
        ));
    }

    #[test]
    fn test_fit_writes_artifacts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ag_sts");
        let mut predictor = TextPredictor::create_fresh("score", &path).with_params(quick_params());

        let summary = predictor
            .fit(&labelled_table(), Duration::from_secs(60))
            .unwrap();
        assert_eq!(summary.rows, 6);
        assert_eq!(summary.trees_added, 10);
        assert_eq!(summary.stop_reason, StopReason::Completed);

        assert!(path.join(MANIFEST_FILE).exists());
        assert!(path.join(MODEL_FILE).exists());
        assert!(path.join(HASH_FILE).exists());
    }

    #[test]
    fn test_fit_requires_label() {
        let dir = TempDir::new().unwrap();
        let mut predictor = TextPredictor::create_fresh("similarity", dir.path());
        let err = predictor
            .fit(&labelled_table(), Duration::from_secs(60))
            .unwrap_err();
        assert!(matches!(err, TrainerError::Schema(_)));
    }

    #[test]
    fn test_evaluate_default_metrics() {
        let dir = TempDir::new().unwrap();
        let mut predictor =
            TextPredictor::create_fresh("score", dir.path()).with_params(quick_params());
        predictor
            .fit(&labelled_table(), Duration::from_secs(60))
            .unwrap();

        let report = predictor
            .evaluate(&labelled_table(), &Metric::DEFAULT_SET)
            .unwrap();
        assert_eq!(report.len(), 3);
        assert!(report.get(Metric::Rmse).unwrap() >= 0.0);
        assert!(report.get(Metric::PearsonR).unwrap() > 0.0);
    }

    #[test]
    fn test_save_untrained_fails() {
        let dir = TempDir::new().unwrap();
        let predictor = TextPredictor::create_fresh("score", dir.path());
        assert!(matches!(predictor.save(), Err(TrainerError::Predictor(_))));
    }
}
