//! Gradient Boosted Decision Tree (GBDT) trainer
//!
//! Squared-error boosting with histogram CART trees. Training stops at the
//! first of: the configured tree count, no holdout improvement for
//! `early_stopping_rounds` trees, or the wall-clock deadline. The deadline is
//! checked between trees; a tree that has started is always finished.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use sts_core::gbdt::Model;

use crate::cart::{BinnedFeatures, CartBuilder, TreeConfig};
use crate::deterministic::LcgRng;
use crate::errors::TrainerError;

/// GBDT training configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingParams {
    /// Maximum number of trees added per `train` call
    pub num_trees: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Shrinkage applied to every new tree
    pub learning_rate: f64,
    /// Upper bound on histogram buckets per feature
    pub max_bins: usize,
    /// L2 regularization on leaf values
    pub lambda: f64,
    /// Fraction of rows held out for early stopping (0 disables)
    pub holdout_fraction: f64,
    /// Stop after this many trees without holdout improvement
    pub early_stopping_rounds: usize,
    /// Seed for the holdout split
    pub seed: u64,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            num_trees: 300,
            max_depth: 4,
            min_samples_leaf: 8,
            learning_rate: 0.1,
            max_bins: 32,
            lambda: 1.0,
            holdout_fraction: 0.1,
            early_stopping_rounds: 25,
            seed: 2022,
        }
    }
}

impl TrainingParams {
    pub fn validate(&self) -> Result<(), TrainerError> {
        if !(self.learning_rate > 0.0 && self.learning_rate.is_finite()) {
            return Err(TrainerError::Config(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(0.0..0.5).contains(&self.holdout_fraction) {
            return Err(TrainerError::Config(format!(
                "holdout_fraction must be in [0, 0.5), got {}",
                self.holdout_fraction
            )));
        }
        if self.max_bins < 2 {
            return Err(TrainerError::Config("max_bins must be at least 2".to_string()));
        }
        if self.lambda < 0.0 || !self.lambda.is_finite() {
            return Err(TrainerError::Config(format!(
                "lambda must be non-negative, got {}",
                self.lambda
            )));
        }
        Ok(())
    }

    fn tree_config(&self) -> TreeConfig {
        TreeConfig {
            max_depth: self.max_depth,
            min_samples_leaf: self.min_samples_leaf,
            lambda: self.lambda,
        }
    }
}

/// Why a `train` call returned
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// All `num_trees` trees were built
    Completed,
    /// Holdout error stopped improving
    EarlyStopped,
    /// The deadline passed before `num_trees` trees were built
    TimeLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StopReason::Completed => "completed",
            StopReason::EarlyStopped => "early stopped",
            StopReason::TimeLimit => "time limit reached",
        })
    }
}

/// Summary of one `train` call
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingOutcome {
    /// Trees kept from this call (after rolling back to the best holdout round)
    pub trees_added: usize,
    pub stop_reason: StopReason,
    /// Holdout RMSE at the kept round, when a holdout split was used
    pub holdout_rmse: Option<f64>,
}

/// GBDT trainer
pub struct GbdtTrainer {
    params: TrainingParams,
}

impl GbdtTrainer {
    pub fn new(params: TrainingParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &TrainingParams {
        &self.params
    }

    /// Boost `model` on (`features`, `targets`).
    ///
    /// An empty model first gets its bias set to the mean training target; a model
    /// that already has trees keeps them and continues from its current
    /// predictions. `deadline = None` means no time limit.
    pub fn train(
        &self,
        model: &mut Model,
        features: &[Vec<f64>],
        targets: &[f64],
        deadline: Option<Instant>,
    ) -> Result<TrainingOutcome, TrainerError> {
        self.params.validate()?;

        if features.len() != targets.len() {
            return Err(TrainerError::Training(format!(
                "{} feature rows but {} targets",
                features.len(),
                targets.len()
            )));
        }
        if features.is_empty() {
            return Err(TrainerError::Training("training set is empty".to_string()));
        }
        if let Some(row) = features.iter().find(|row| row.len() != model.feature_count) {
            return Err(TrainerError::Training(format!(
                "model expects {} features, got a row with {}",
                model.feature_count,
                row.len()
            )));
        }

        let (train_rows, holdout_rows) = self.split_rows(features.len());

        if model.is_empty() {
            model.bias = train_rows.iter().map(|&r| targets[r]).sum::<f64>() / train_rows.len() as f64;
        }
        tracing::info!(
            "Boosting on {} rows ({} held out), existing trees: {}",
            train_rows.len(),
            holdout_rows.len(),
            model.num_trees()
        );

        let binned = BinnedFeatures::new(features, &train_rows, self.params.max_bins);
        let mut predictions: Vec<f64> = features.iter().map(|row| model.score(row)).collect();
        let hessians = vec![1.0; features.len()];
        let mut gradients = vec![0.0; features.len()];

        let mut best = holdout_rmse(&holdout_rows, targets, &predictions).map(|rmse| (rmse, 0usize));
        let mut new_trees = Vec::new();
        let mut stop_reason = StopReason::Completed;

        for tree_idx in 0..self.params.num_trees {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                stop_reason = StopReason::TimeLimit;
                break;
            }

            for &r in &train_rows {
                gradients[r] = predictions[r] - targets[r];
            }

            let builder = CartBuilder::new(&binned, &gradients, &hessians, self.params.tree_config());
            let mut tree = builder.build(&train_rows);
            tree.weight = self.params.learning_rate;

            for (pred, row) in predictions.iter_mut().zip(features) {
                *pred += tree.weight * tree.evaluate(row);
            }
            new_trees.push(tree);

            if let (Some((best_rmse, best_round)), Some(rmse)) =
                (best, holdout_rmse(&holdout_rows, targets, &predictions))
            {
                tracing::debug!("Tree {}/{}: holdout rmse {:.6}", tree_idx + 1, self.params.num_trees, rmse);
                if rmse < best_rmse {
                    best = Some((rmse, new_trees.len()));
                } else if new_trees.len() - best_round >= self.params.early_stopping_rounds.max(1) {
                    stop_reason = StopReason::EarlyStopped;
                    break;
                }
            } else {
                tracing::debug!("Tree {}/{} built", tree_idx + 1, self.params.num_trees);
            }
        }

        if let Some((_, best_round)) = best {
            new_trees.truncate(best_round);
        }

        let trees_added = new_trees.len();
        for tree in new_trees {
            model.push_tree(tree);
        }

        tracing::info!(
            "Training stopped ({}): {} trees added, {} total",
            stop_reason,
            trees_added,
            model.num_trees()
        );

        Ok(TrainingOutcome {
            trees_added,
            stop_reason,
            holdout_rmse: best.map(|(rmse, _)| rmse),
        })
    }

    /// Deterministic (train, holdout) row split
    fn split_rows(&self, n: usize) -> (Vec<usize>, Vec<usize>) {
        let holdout = (n as f64 * self.params.holdout_fraction).floor() as usize;
        let min_train = 2 * self.params.min_samples_leaf.max(1);

        if holdout == 0 || n - holdout < min_train {
            return ((0..n).collect(), Vec::new());
        }

        let mut rng = LcgRng::new(self.params.seed);
        let mut holdout_rows = rng.sample_indices(n, holdout);
        holdout_rows.sort_unstable();

        let mut is_holdout = vec![false; n];
        for &r in &holdout_rows {
            is_holdout[r] = true;
        }
        let train_rows = (0..n).filter(|&r| !is_holdout[r]).collect();

        (train_rows, holdout_rows)
    }
}

fn holdout_rmse(rows: &[usize], targets: &[f64], predictions: &[f64]) -> Option<f64> {
    if rows.is_empty() {
        return None;
    }
    let mse = rows
        .iter()
        .map(|&r| (predictions[r] - targets[r]).powi(2))
        .sum::<f64>()
        / rows.len() as f64;
    Some(mse.sqrt())
}
