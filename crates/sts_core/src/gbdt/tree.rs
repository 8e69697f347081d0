//! Regression tree structures for GBDT inference
//!
//! Trees are stored as flat node arrays with node 0 as the root. Traversal
//! goes left when `feature <= threshold`.

use serde::{Deserialize, Serialize};

/// A decision tree node (internal or leaf)
///
/// For internal nodes:
/// - `feature_idx >= 0`: index into the feature vector
/// - `left` and `right` point to child node indices
/// - `leaf` is `None`
///
/// For leaf nodes:
/// - `feature_idx == -1`
/// - `leaf` contains the (unshrunk) prediction value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    /// Position of this node in the tree's node array
    pub id: i32,

    /// Left child index (-1 for leaf nodes)
    pub left: i32,

    /// Right child index (-1 for leaf nodes)
    pub right: i32,

    /// Feature index to split on (-1 for leaf nodes)
    pub feature_idx: i32,

    /// Split threshold
    pub threshold: f64,

    /// Leaf value (Some for leaf nodes, None for internal nodes)
    pub leaf: Option<f64>,
}

impl Node {
    /// Create a new internal (split) node
    pub fn internal(id: i32, feature_idx: i32, threshold: f64, left: i32, right: i32) -> Self {
        Self {
            id,
            left,
            right,
            feature_idx,
            threshold,
            leaf: None,
        }
    }

    /// Create a new leaf node
    pub fn leaf(id: i32, value: f64) -> Self {
        Self {
            id,
            left: -1,
            right: -1,
            feature_idx: -1,
            threshold: 0.0,
            leaf: Some(value),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.feature_idx == -1 || self.leaf.is_some()
    }
}

/// A single regression tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tree {
    /// Tree nodes (node 0 is the root)
    pub nodes: Vec<Node>,

    /// Shrinkage applied to this tree's output in the ensemble
    pub weight: f64,
}

impl Tree {
    pub fn new(nodes: Vec<Node>, weight: f64) -> Self {
        Self { nodes, weight }
    }

    /// Raw leaf value reached by `features`, before applying `weight`.
    ///
    /// Malformed trees (dangling child, out-of-range feature) evaluate to 0.
    pub fn evaluate(&self, features: &[f64]) -> f64 {
        let mut idx = 0usize;

        loop {
            let Some(node) = self.nodes.get(idx) else {
                return 0.0;
            };

            if node.is_leaf() {
                return node.leaf.unwrap_or(0.0);
            }

            let Some(&value) = features.get(node.feature_idx as usize) else {
                return 0.0;
            };

            let next = if value <= node.threshold {
                node.left
            } else {
                node.right
            };

            if next < 0 {
                return 0.0;
            }
            idx = next as usize;
        }
    }

    /// Number of leaves in the tree
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Validate tree structure
    pub fn validate(&self, feature_count: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("Tree has no nodes".to_string());
        }

        if !self.weight.is_finite() {
            return Err(format!("Tree weight is not finite: {}", self.weight));
        }

        for (i, node) in self.nodes.iter().enumerate() {
            if node.is_leaf() {
                match node.leaf {
                    Some(value) if value.is_finite() => {}
                    Some(value) => return Err(format!("Leaf node {i} has non-finite value {value}")),
                    None => return Err(format!("Leaf node {i} has no leaf value")),
                }
                continue;
            }

            // Children always come after their parent, which rules out cycles.
            for child in [node.left, node.right] {
                if child <= i as i32 || child as usize >= self.nodes.len() {
                    return Err(format!("Node {i} has invalid child index {child}"));
                }
            }

            if node.feature_idx < 0 || node.feature_idx as usize >= feature_count {
                return Err(format!(
                    "Internal node {i} has invalid feature index {}",
                    node.feature_idx
                ));
            }

            if !node.threshold.is_finite() {
                return Err(format!("Internal node {i} has non-finite threshold"));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> Tree {
        Tree::new(
            vec![
                Node::internal(0, 0, 0.5, 1, 2),
                Node::leaf(1, -1.0),
                Node::leaf(2, 1.0),
            ],
            0.1,
        )
    }

    #[test]
    fn test_node_creation() {
        let internal = Node::internal(0, 3, 0.25, 1, 2);
        assert_eq!(internal.feature_idx, 3);
        assert!(!internal.is_leaf());

        let leaf = Node::leaf(1, -2.5);
        assert_eq!(leaf.feature_idx, -1);
        assert!(leaf.is_leaf());
        assert_eq!(leaf.leaf, Some(-2.5));
    }

    #[test]
    fn test_tree_evaluation() {
        let tree = stump();
        assert_eq!(tree.evaluate(&[0.2]), -1.0);
        assert_eq!(tree.evaluate(&[0.5]), -1.0); // equal goes left
        assert_eq!(tree.evaluate(&[0.9]), 1.0);
        assert_eq!(tree.leaf_count(), 2);
    }

    #[test]
    fn test_missing_feature_evaluates_to_zero() {
        assert_eq!(stump().evaluate(&[]), 0.0);
    }

    #[test]
    fn test_tree_validation() {
        assert!(stump().validate(1).is_ok());
        assert!(stump().validate(0).is_err());

        let dangling = Tree::new(
            vec![
                Node::internal(0, 0, 0.5, 5, 2),
                Node::leaf(1, 1.0),
                Node::leaf(2, 2.0),
            ],
            1.0,
        );
        assert!(dangling.validate(1).is_err());

        let cyclic = Tree::new(
            vec![Node::internal(0, 0, 0.5, 0, 0)],
            1.0,
        );
        assert!(cyclic.validate(1).is_err());
    }
}
