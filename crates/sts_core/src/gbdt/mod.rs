//! Gradient Boosted Decision Tree regression ensemble
//!
//! - Flat-array regression trees, left branch on `feature <= threshold`
//! - Additive ensemble with per-tree shrinkage weight and a bias term
//! - Canonical JSON persistence with a BLAKE3 hash sidecar
//!
//! # Usage
//!
//! ```rust
//! use sts_core::gbdt::{Model, Node, Tree};
//!
//! let mut model = Model::new(1, 2.0);
//! model.push_tree(Tree::new(
//!     vec![
//!         Node::internal(0, 0, 0.5, 1, 2),
//!         Node::leaf(1, -1.0),
//!         Node::leaf(2, 1.0),
//!     ],
//!     0.1,
//! ));
//!
//! assert!((model.score(&[0.9]) - 2.1).abs() < 1e-12);
//! ```

pub mod model;
pub mod tree;

pub use model::{Model, MODEL_FORMAT_VERSION};
pub use tree::{Node, Tree};
