//! Regression tree used as the forest's base learner

use crate::data::Dataset;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Decision tree configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Maximum depth of tree (None = grow until leaves are pure)
    pub max_depth: Option<usize>,
    /// Minimum samples required to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf node
    pub min_samples_leaf: usize,
    /// Maximum features to consider for split (None = all)
    pub max_features: Option<usize>,
    /// Random seed for reproducibility
    pub seed: u64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }
}

/// Tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    /// Feature index for split
    pub feature_idx: Option<usize>,
    /// Threshold for split (left branch takes `x <= threshold`)
    pub threshold: Option<f64>,
    /// Mean target of the samples reaching this node
    pub value: f64,
    /// Number of samples in this node
    pub n_samples: usize,
    /// Left child
    pub left: Option<Box<TreeNode>>,
    /// Right child
    pub right: Option<Box<TreeNode>>,
    /// Mean squared error at this node
    pub impurity: f64,
}

impl TreeNode {
    fn leaf(value: f64, n_samples: usize, impurity: f64) -> Self {
        Self {
            feature_idx: None,
            threshold: None,
            value,
            n_samples,
            left: None,
            right: None,
            impurity,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    pub fn depth(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            1 + self
                .left
                .as_ref()
                .map(|n| n.depth())
                .unwrap_or(0)
                .max(self.right.as_ref().map(|n| n.depth()).unwrap_or(0))
        }
    }

    pub fn n_leaves(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.left.as_ref().map(|n| n.n_leaves()).unwrap_or(0)
                + self.right.as_ref().map(|n| n.n_leaves()).unwrap_or(0)
        }
    }
}

/// Best split found at a node
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    /// Reduction of the summed squared error
    gain: f64,
}

/// Running sums of a set of labels
#[derive(Clone, Copy, Default)]
struct LabelStats {
    n: usize,
    sum: f64,
    sum_sq: f64,
}

impl LabelStats {
    fn push(&mut self, y: f64) {
        self.n += 1;
        self.sum += y;
        self.sum_sq += y * y;
    }

    fn minus(&self, other: &LabelStats) -> LabelStats {
        LabelStats {
            n: self.n - other.n,
            sum: self.sum - other.sum,
            sum_sq: self.sum_sq - other.sum_sq,
        }
    }

    /// Sum of squared deviations from the mean
    fn sse(&self) -> f64 {
        if self.n == 0 {
            return 0.0;
        }
        (self.sum_sq - self.sum * self.sum / self.n as f64).max(0.0)
    }
}

/// Regression tree grown with squared-error splits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    config: TreeConfig,
    root: Option<TreeNode>,
    feature_importances: Vec<f64>,
}

impl DecisionTree {
    /// Create a new decision tree with config
    pub fn new(config: TreeConfig) -> Self {
        Self {
            config,
            root: None,
            feature_importances: Vec::new(),
        }
    }

    /// Train on every row of the dataset
    pub fn fit(&mut self, dataset: &Dataset) {
        let indices: Vec<usize> = (0..dataset.n_samples()).collect();
        self.fit_indices(dataset, &indices);
    }

    /// Train on the given rows (repeats allowed, as in a bootstrap sample)
    pub fn fit_indices(&mut self, dataset: &Dataset, indices: &[usize]) {
        self.feature_importances = vec![0.0; dataset.n_features()];
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);

        self.root = if indices.is_empty() {
            None
        } else {
            Some(self.build_tree(dataset, indices, 0, &mut rng))
        };

        // Normalize feature importances
        let sum: f64 = self.feature_importances.iter().sum();
        if sum > 0.0 {
            for imp in &mut self.feature_importances {
                *imp /= sum;
            }
        }
    }

    /// Build tree recursively
    fn build_tree(
        &mut self,
        dataset: &Dataset,
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n = indices.len();
        let mut stats = LabelStats::default();
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &i in indices {
            let y = dataset.labels[i];
            stats.push(y);
            lo = lo.min(y);
            hi = hi.max(y);
        }
        let value = stats.sum / n as f64;
        let impurity = stats.sse() / n as f64;

        let depth_reached = self.config.max_depth.is_some_and(|max| depth >= max);
        if depth_reached
            || n < self.config.min_samples_split
            || n < 2 * self.config.min_samples_leaf.max(1)
            || lo == hi
        {
            return TreeNode::leaf(value, n, impurity);
        }

        let split = match self.find_best_split(dataset, indices, &stats, rng) {
            Some(split) => split,
            None => return TreeNode::leaf(value, n, impurity),
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| dataset.features[i][split.feature_idx] <= split.threshold);

        self.feature_importances[split.feature_idx] += split.gain;

        let left = self.build_tree(dataset, &left_idx, depth + 1, rng);
        let right = self.build_tree(dataset, &right_idx, depth + 1, rng);

        TreeNode {
            feature_idx: Some(split.feature_idx),
            threshold: Some(split.threshold),
            value,
            n_samples: n,
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
            impurity,
        }
    }

    /// Scan sorted feature values once per candidate feature, keeping running
    /// label sums so each threshold is scored in constant time.
    fn find_best_split(
        &self,
        dataset: &Dataset,
        indices: &[usize],
        parent: &LabelStats,
        rng: &mut ChaCha8Rng,
    ) -> Option<SplitCandidate> {
        let n_features = dataset.n_features();
        let max_features = self
            .config
            .max_features
            .unwrap_or(n_features)
            .clamp(1, n_features.max(1));

        // Select features to consider
        let mut feature_indices: Vec<usize> = (0..n_features).collect();
        feature_indices.shuffle(rng);
        feature_indices.truncate(max_features);

        let min_leaf = self.config.min_samples_leaf.max(1);
        let parent_sse = parent.sse();
        let mut best: Option<SplitCandidate> = None;
        let mut best_gain = 0.0;

        let mut order: Vec<usize> = indices.to_vec();

        for &feature_idx in &feature_indices {
            let x = |i: usize| dataset.features[i][feature_idx];
            order.sort_by(|&a, &b| x(a).total_cmp(&x(b)));

            let mut left = LabelStats::default();
            for k in 0..order.len() - 1 {
                left.push(dataset.labels[order[k]]);

                let current = x(order[k]);
                let next = x(order[k + 1]);
                if next <= current {
                    continue;
                }
                if left.n < min_leaf || order.len() - left.n < min_leaf {
                    continue;
                }

                let right = parent.minus(&left);
                let gain = parent_sse - (left.sse() + right.sse());

                if gain > best_gain {
                    best_gain = gain;
                    let mut threshold = current + (next - current) / 2.0;
                    if threshold >= next {
                        threshold = current;
                    }
                    best = Some(SplitCandidate {
                        feature_idx,
                        threshold,
                        gain,
                    });
                }
            }
        }

        best
    }

    /// Predict for a single sample
    pub fn predict_one(&self, features: &[f64]) -> f64 {
        match &self.root {
            Some(node) => Self::traverse(node, features),
            None => 0.0,
        }
    }

    fn traverse(node: &TreeNode, features: &[f64]) -> f64 {
        match (&node.left, &node.right, node.feature_idx, node.threshold) {
            (Some(left), Some(right), Some(feature_idx), Some(threshold)) => {
                if features[feature_idx] <= threshold {
                    Self::traverse(left, features)
                } else {
                    Self::traverse(right, features)
                }
            }
            _ => node.value,
        }
    }

    /// Predict for multiple samples
    pub fn predict(&self, dataset: &Dataset) -> Vec<f64> {
        dataset
            .features
            .iter()
            .map(|f| self.predict_one(f))
            .collect()
    }

    /// Impurity-decrease importances, normalized to sum to 1
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.root.as_ref()
    }
}
