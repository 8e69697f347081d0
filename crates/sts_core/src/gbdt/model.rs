//! Gradient boosted regression ensemble
//!
//! A model is `bias + Σ tree.weight * tree.evaluate(x)`. It is persisted as
//! canonical JSON next to a hex BLAKE3 hash of that JSON, and the hash is
//! checked on load.

use super::tree::Tree;
use crate::errors::ModelError;
use crate::serialization::{blake3_hex, to_canonical_json};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Current on-disk model format version
pub const MODEL_FORMAT_VERSION: i32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Model {
    /// Model format version
    pub version: i32,

    /// Width of the feature vectors the trees index into
    pub feature_count: usize,

    /// Base prediction before any tree contributes
    pub bias: f64,

    /// Decision trees in boosting order
    pub trees: Vec<Tree>,
}

impl Model {
    /// Create an empty ensemble that predicts `bias` everywhere
    pub fn new(feature_count: usize, bias: f64) -> Self {
        Self {
            version: MODEL_FORMAT_VERSION,
            feature_count,
            bias,
            trees: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn push_tree(&mut self, tree: Tree) {
        self.trees.push(tree);
    }

    /// Validate model structure
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.version != MODEL_FORMAT_VERSION {
            return Err(ModelError::ValidationFailed(format!(
                "Unsupported model version: {}",
                self.version
            )));
        }

        if self.feature_count == 0 {
            return Err(ModelError::ValidationFailed(
                "Model must have at least one feature".to_string(),
            ));
        }

        if !self.bias.is_finite() {
            return Err(ModelError::ValidationFailed(format!(
                "Bias is not finite: {}",
                self.bias
            )));
        }

        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.feature_count).map_err(|e| {
                ModelError::ValidationFailed(format!("Tree {i} validation failed: {e}"))
            })?;
        }

        Ok(())
    }

    /// Predict a single feature vector
    pub fn score(&self, features: &[f64]) -> f64 {
        self.trees
            .iter()
            .fold(self.bias, |acc, tree| acc + tree.weight * tree.evaluate(features))
    }

    /// Predict a single feature vector, rejecting vectors of the wrong width
    pub fn try_score(&self, features: &[f64]) -> Result<f64, ModelError> {
        if features.len() != self.feature_count {
            return Err(ModelError::FeatureCountMismatch {
                expected: self.feature_count,
                actual: features.len(),
            });
        }
        Ok(self.score(features))
    }

    /// Predict every row of a feature matrix
    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        rows.iter().map(|row| self.try_score(row)).collect()
    }

    /// Serialize model to canonical JSON (sorted keys, no whitespace)
    pub fn to_canonical_json(&self) -> Result<String, ModelError> {
        Ok(to_canonical_json(self)?)
    }

    /// BLAKE3 hash of the canonical JSON, hex encoded
    pub fn hash_hex(&self) -> Result<String, ModelError> {
        Ok(blake3_hex(self.to_canonical_json()?.as_bytes()))
    }

    /// Write the model to `model_path` and its hash to `hash_path`.
    ///
    /// Returns the hex hash that was written.
    pub fn save<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        model_path: P,
        hash_path: Q,
    ) -> Result<String, ModelError> {
        self.validate()?;

        let json = self.to_canonical_json()?;
        let hash = blake3_hex(json.as_bytes());

        fs::write(model_path.as_ref(), &json)?;
        fs::write(hash_path, &hash)?;

        tracing::debug!(
            "Wrote model ({} trees) to {}",
            self.trees.len(),
            model_path.as_ref().display()
        );
        Ok(hash)
    }

    /// Load a model and verify it against the stored hash
    pub fn load_verified<P: AsRef<Path>, Q: AsRef<Path>>(
        model_path: P,
        hash_path: Q,
    ) -> Result<Self, ModelError> {
        let json = fs::read_to_string(model_path)?;
        let expected = fs::read_to_string(hash_path)?.trim().to_lowercase();
        let actual = blake3_hex(json.as_bytes());

        if expected != actual {
            tracing::warn!("Model hash mismatch: expected {}, got {}", expected, actual);
            return Err(ModelError::HashMismatch { expected, actual });
        }

        let model: Model = serde_json::from_str(&json)?;
        model.validate()?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gbdt::tree::Node;

    fn two_tree_model() -> Model {
        let mut model = Model::new(2, 2.5);
        model.push_tree(Tree::new(
            vec![
                Node::internal(0, 0, 0.5, 1, 2),
                Node::leaf(1, -1.0),
                Node::leaf(2, 1.0),
            ],
            0.5,
        ));
        model.push_tree(Tree::new(
            vec![
                Node::internal(0, 1, 10.0, 1, 2),
                Node::leaf(1, 0.4),
                Node::leaf(2, -0.4),
            ],
            0.5,
        ));
        model
    }

    #[test]
    fn test_empty_model_predicts_bias() {
        let model = Model::new(3, 1.75);
        assert!(model.is_empty());
        assert_eq!(model.score(&[0.0, 0.0, 0.0]), 1.75);
    }

    #[test]
    fn test_two_tree_inference() {
        let model = two_tree_model();
        // 2.5 + 0.5 * -1.0 + 0.5 * 0.4
        assert!((model.score(&[0.1, 3.0]) - 2.2).abs() < 1e-12);
        // 2.5 + 0.5 * 1.0 + 0.5 * -0.4
        assert!((model.score(&[0.9, 30.0]) - 2.8).abs() < 1e-12);
    }

    #[test]
    fn test_try_score_rejects_wrong_width() {
        let model = two_tree_model();
        let err = model.try_score(&[0.1]).unwrap_err();
        assert!(matches!(
            err,
            ModelError::FeatureCountMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_hash_stability() {
        let a = two_tree_model();
        let b = two_tree_model();
        assert_eq!(a.hash_hex().unwrap(), b.hash_hex().unwrap());

        let mut c = two_tree_model();
        c.bias = 2.6;
        assert_ne!(a.hash_hex().unwrap(), c.hash_hex().unwrap());
    }

    #[test]
    fn test_validation_rejects_bad_version() {
        let mut model = two_tree_model();
        model.version = 9;
        assert!(model.validate().is_err());
    }
}
