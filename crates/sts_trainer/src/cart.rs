//! CART (Classification and Regression Tree) builder
//!
//! Histogram-based greedy regression tree construction. Feature values are
//! pre-bucketed against a fixed set of candidate thresholds, so each node
//! costs one pass over its rows per feature.

use sts_core::gbdt::{Node, Tree};

use crate::deterministic::SplitTieBreaker;

/// Training parameters for a single tree
#[derive(Clone, Debug)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// L2 regularization on leaf values
    pub lambda: f64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 4,
            min_samples_leaf: 8,
            lambda: 1.0,
        }
    }
}

/// Feature matrix bucketed against per-feature candidate thresholds.
///
/// `bins[row][f] == b` means `thresholds[f][b-1] < value <= thresholds[f][b]`;
/// `b == thresholds[f].len()` means the value is above every threshold.
#[derive(Clone, Debug)]
pub struct BinnedFeatures {
    thresholds: Vec<Vec<f64>>,
    bins: Vec<Vec<u16>>,
}

impl BinnedFeatures {
    /// Pick up to `max_bins - 1` thresholds per feature from the values of
    /// `rows`, then bucket every row of `features`.
    pub fn new(features: &[Vec<f64>], rows: &[usize], max_bins: usize) -> Self {
        let feature_count = features.first().map_or(0, Vec::len);
        let thresholds: Vec<Vec<f64>> = (0..feature_count)
            .map(|f| candidate_thresholds(features, rows, f, max_bins))
            .collect();

        let bins = features
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&thresholds)
                    .map(|(&v, t)| t.partition_point(|&th| th < v) as u16)
                    .collect()
            })
            .collect();

        Self { thresholds, bins }
    }

    pub fn feature_count(&self) -> usize {
        self.thresholds.len()
    }

    pub fn thresholds(&self, feature: usize) -> &[f64] {
        &self.thresholds[feature]
    }
}

/// Midpoints between quantiles of the distinct values of one feature
fn candidate_thresholds(features: &[Vec<f64>], rows: &[usize], feature: usize, max_bins: usize) -> Vec<f64> {
    let mut values: Vec<f64> = rows.iter().map(|&r| features[r][feature]).collect();
    values.sort_by(f64::total_cmp);
    values.dedup();

    if values.len() < 2 {
        return Vec::new();
    }

    let max_bins = max_bins.clamp(2, u16::MAX as usize);
    let cut_points: Vec<usize> = if values.len() <= max_bins {
        (0..values.len() - 1).collect()
    } else {
        (1..max_bins)
            .map(|k| k * (values.len() - 1) / max_bins)
            .collect()
    };

    let mut thresholds: Vec<f64> = cut_points
        .into_iter()
        .map(|i| values[i] + (values[i + 1] - values[i]) / 2.0)
        .collect();
    thresholds.dedup();
    thresholds
}

/// Split candidate with gain and tie-breaker
#[derive(Debug, Clone)]
struct SplitCandidate {
    feature_idx: usize,
    bin: usize,
    gain: f64,
    tie_breaker: SplitTieBreaker,
}

#[derive(Clone, Copy, Debug, Default)]
struct GradStats {
    grad: f64,
    hess: f64,
    count: usize,
}

impl GradStats {
    fn add(&mut self, grad: f64, hess: f64) {
        self.grad += grad;
        self.hess += hess;
        self.count += 1;
    }

    fn minus(&self, other: &Self) -> Self {
        Self {
            grad: self.grad - other.grad,
            hess: self.hess - other.hess,
            count: self.count - other.count,
        }
    }

    fn score(&self, lambda: f64) -> f64 {
        self.grad * self.grad / (self.hess + lambda)
    }

    fn leaf_value(&self, lambda: f64) -> f64 {
        -self.grad / (self.hess + lambda)
    }
}

/// Build a regression tree from gradient statistics
pub struct CartBuilder<'a> {
    config: TreeConfig,
    binned: &'a BinnedFeatures,
    gradients: &'a [f64],
    hessians: &'a [f64],
}

impl<'a> CartBuilder<'a> {
    /// `gradients` and `hessians` are indexed by row, like `binned`
    pub fn new(
        binned: &'a BinnedFeatures,
        gradients: &'a [f64],
        hessians: &'a [f64],
        config: TreeConfig,
    ) -> Self {
        Self {
            config,
            binned,
            gradients,
            hessians,
        }
    }

    /// Build a tree over the given rows; the returned tree has weight 1.0
    pub fn build(&self, rows: &[usize]) -> Tree {
        let mut nodes = Vec::new();
        self.build_node(rows, 0, &mut nodes, 0);
        Tree::new(nodes, 1.0)
    }

    fn stats(&self, rows: &[usize]) -> GradStats {
        let mut stats = GradStats::default();
        for &r in rows {
            stats.add(self.gradients[r], self.hessians[r]);
        }
        stats
    }

    /// Recursively build tree nodes, returning the index of the created node
    fn build_node(&self, rows: &[usize], depth: usize, nodes: &mut Vec<Node>, node_id: usize) -> i32 {
        let current = nodes.len() as i32;
        let parent = self.stats(rows);

        let split = if depth >= self.config.max_depth
            || rows.len() < 2 * self.config.min_samples_leaf.max(1)
        {
            None
        } else {
            self.find_best_split(rows, &parent, node_id)
        };

        let Some(split) = split else {
            nodes.push(Node::leaf(current, parent.leaf_value(self.config.lambda)));
            return current;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .partition(|&&r| self.binned.bins[r][split.feature_idx] as usize <= split.bin);

        let threshold = self.binned.thresholds[split.feature_idx][split.bin];
        nodes.push(Node::internal(current, split.feature_idx as i32, threshold, -1, -1));

        let left = self.build_node(&left_rows, depth + 1, nodes, node_id * 2 + 1);
        let right = self.build_node(&right_rows, depth + 1, nodes, node_id * 2 + 2);

        nodes[current as usize].left = left;
        nodes[current as usize].right = right;

        current
    }

    /// Best split by histogram scan; ties go to the smallest tie-breaker
    fn find_best_split(&self, rows: &[usize], parent: &GradStats, node_id: usize) -> Option<SplitCandidate> {
        let lambda = self.config.lambda;
        let min_leaf = self.config.min_samples_leaf.max(1);
        let parent_score = parent.score(lambda);
        let mut best: Option<SplitCandidate> = None;

        for feature_idx in 0..self.binned.feature_count() {
            let n_thresholds = self.binned.thresholds[feature_idx].len();
            if n_thresholds == 0 {
                continue;
            }

            let mut histogram = vec![GradStats::default(); n_thresholds + 1];
            for &r in rows {
                let b = self.binned.bins[r][feature_idx] as usize;
                histogram[b].add(self.gradients[r], self.hessians[r]);
            }

            let mut left = GradStats::default();
            for (bin, bucket) in histogram.iter().take(n_thresholds).enumerate() {
                left.grad += bucket.grad;
                left.hess += bucket.hess;
                left.count += bucket.count;

                let right = parent.minus(&left);
                if left.count < min_leaf || right.count < min_leaf {
                    continue;
                }

                let gain = left.score(lambda) + right.score(lambda) - parent_score;
                if gain.is_nan() || gain <= 0.0 {
                    continue;
                }

                let candidate = SplitCandidate {
                    feature_idx,
                    bin,
                    gain,
                    tie_breaker: SplitTieBreaker::new(feature_idx, bin, node_id),
                };

                best = match best {
                    None => Some(candidate),
                    Some(current) => {
                        if gain > current.gain
                            || (gain == current.gain && candidate.tie_breaker < current.tie_breaker)
                        {
                            Some(candidate)
                        } else {
                            Some(current)
                        }
                    }
                };
            }
        }

        best
    }
}
