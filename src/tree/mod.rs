//! Decision tree algorithms and ensemble methods.
//!
//! This module implements:
//! - CART (Classification and Regression Trees) using Gini impurity
//! - Random Forest ensemble classifier
//!
//! Trees are grown over row indices into the caller's matrix, so neither a
//! split nor a bootstrap sample copies feature data.
//!
//! # Example
//!
//! ```
//! use medpredict::prelude::*;
//! use medpredict::tree::DecisionTreeClassifier;
//!
//! // Two symptoms; the first one decides the class
//! let x = Matrix::from_vec(4, 2, vec![
//!     0.0, 0.0,  // class 0
//!     0.0, 1.0,  // class 0
//!     1.0, 0.0,  // class 1
//!     1.0, 1.0,  // class 1
//! ]).expect("Matrix creation should succeed in tests");
//! let y = vec![0, 0, 1, 1];
//!
//! let mut tree = DecisionTreeClassifier::new().with_max_depth(3);
//! tree.fit(&x, &y).expect("fit should succeed");
//!
//! let predictions = tree.predict(&x).expect("fitted");
//! assert_eq!(predictions, y);
//! ```

use crate::error::Result;
use crate::primitives::Matrix;
use crate::traits::{check_fit_input, check_predict_input, Classifier};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Internal node in a decision tree.
///
/// Contains a split condition (feature and threshold) and pointers to
/// left and right subtrees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Index of the feature to split on
    pub feature_idx: usize,
    /// Threshold value for the split
    pub threshold: f32,
    /// Left subtree (samples where feature <= threshold)
    pub left: Box<TreeNode>,
    /// Right subtree (samples where feature > threshold)
    pub right: Box<TreeNode>,
}

/// Leaf node in a decision tree.
///
/// Contains the predicted class label and number of training samples
/// that reached this leaf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leaf {
    /// Predicted class label for this leaf
    pub class_label: usize,
    /// Number of training samples in this leaf
    pub n_samples: usize,
}

/// A node in a decision tree (either internal node or leaf).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Internal decision node with split condition
    Node(Node),
    /// Leaf node with class prediction
    Leaf(Leaf),
}

impl TreeNode {
    /// Returns the depth of the tree rooted at this node.
    ///
    /// Leaf nodes have depth 0, internal nodes have depth 1 + max(left, right).
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf(_) => 0,
            TreeNode::Node(node) => 1 + node.left.depth().max(node.right.depth()),
        }
    }

    /// Number of leaves under this node.
    pub fn n_leaves(&self) -> usize {
        match self {
            TreeNode::Leaf(_) => 1,
            TreeNode::Node(node) => node.left.n_leaves() + node.right.n_leaves(),
        }
    }

    fn predict_one(&self, sample: &[f32]) -> usize {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf(leaf) => return leaf.class_label,
                TreeNode::Node(internal) => {
                    if sample[internal.feature_idx] <= internal.threshold {
                        node = &internal.left;
                    } else {
                        node = &internal.right;
                    }
                }
            }
        }
    }
}

/// Decision tree classifier using the CART algorithm.
///
/// Uses Gini impurity for splitting criterion and builds trees recursively.
/// With `max_features` set, each split considers a random subset of columns
/// (the random forest setting).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeClassifier {
    tree: Option<TreeNode>,
    max_depth: Option<usize>,
    max_features: Option<usize>,
    random_state: Option<u64>,
    /// Number of features the model was trained on (for validation)
    n_features: Option<usize>,
    classes: Vec<usize>,
}

impl DecisionTreeClassifier {
    /// Creates a new decision tree classifier with unlimited depth.
    pub fn new() -> Self {
        Self {
            tree: None,
            max_depth: None,
            max_features: None,
            random_state: None,
            n_features: None,
            classes: Vec::new(),
        }
    }

    /// Sets the maximum depth of the tree.
    ///
    /// # Arguments
    ///
    /// * `depth` - Maximum depth (root has depth 0)
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Limits every split to a random subset of `n` features.
    pub fn with_max_features(mut self, n: usize) -> Self {
        self.max_features = Some(n.max(1));
        self
    }

    /// Sets the random state used for feature subsampling.
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self
    }

    /// Depth of the fitted tree, `None` before fitting.
    pub fn depth(&self) -> Option<usize> {
        self.tree.as_ref().map(TreeNode::depth)
    }

    /// Number of leaves of the fitted tree, `None` before fitting.
    pub fn n_leaves(&self) -> Option<usize> {
        self.tree.as_ref().map(TreeNode::n_leaves)
    }

    /// Grows the tree on the rows of `x` listed in `indices`.
    ///
    /// Indices may repeat. Single-class input yields a single leaf.
    fn fit_indices(&mut self, x: &Matrix<f32>, y: &[usize], indices: Vec<usize>) {
        let n_labels = y.iter().copied().max().map_or(0, |m| m + 1);
        let rng = if self.max_features.is_some() {
            Some(match self.random_state {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            })
        } else {
            None
        };

        let mut classes: Vec<usize> = indices.iter().map(|&i| y[i]).collect();
        classes.sort_unstable();
        classes.dedup();

        let mut builder = TreeBuilder {
            x,
            y,
            n_labels,
            max_depth: self.max_depth,
            max_features: self.max_features,
            rng,
        };
        self.tree = Some(builder.build(indices, 0));
        self.n_features = Some(x.n_cols());
        self.classes = classes;
    }

    /// Predicts without validation; caller guarantees a fitted tree of the right width.
    fn predict_rows(&self, x: &Matrix<f32>) -> Vec<usize> {
        match &self.tree {
            Some(tree) => x.rows().map(|row| tree.predict_one(row)).collect(),
            None => Vec::new(),
        }
    }
}

impl Default for DecisionTreeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for DecisionTreeClassifier {
    fn name(&self) -> &'static str {
        "DecisionTree"
    }

    fn fit(&mut self, x: &Matrix<f32>, y: &[usize]) -> Result<()> {
        check_fit_input(x, y)?;
        self.fit_indices(x, y, (0..x.n_rows()).collect());
        Ok(())
    }

    fn predict(&self, x: &Matrix<f32>) -> Result<Vec<usize>> {
        check_predict_input(x, self.n_features)?;
        if self.tree.is_none() {
            return Err("Model not fitted yet".into());
        }
        Ok(self.predict_rows(x))
    }

    fn n_features(&self) -> Option<usize> {
        self.n_features
    }

    fn classes(&self) -> Vec<usize> {
        self.classes.clone()
    }
}

/// Recursive CART state for one fit call.
struct TreeBuilder<'a> {
    x: &'a Matrix<f32>,
    y: &'a [usize],
    n_labels: usize,
    max_depth: Option<usize>,
    max_features: Option<usize>,
    rng: Option<StdRng>,
}

/// Best split found at a node.
struct Split {
    feature_idx: usize,
    threshold: f32,
    gain: f32,
}

impl TreeBuilder<'_> {
    fn build(&mut self, indices: Vec<usize>, depth: usize) -> TreeNode {
        let counts = self.class_counts(&indices);
        let n_samples = indices.len();
        let leaf = |counts: &[usize]| {
            TreeNode::Leaf(Leaf {
                class_label: majority_class(counts),
                n_samples,
            })
        };

        let is_pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let at_max_depth = self.max_depth.is_some_and(|max_d| depth >= max_d);
        if is_pure || at_max_depth || n_samples < 2 {
            return leaf(&counts);
        }

        let Some(split) = self.find_best_split(&indices, &counts) else {
            return leaf(&counts);
        };

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| self.x.get(i, split.feature_idx) <= split.threshold);

        let left_child = self.build(left, depth + 1);
        let right_child = self.build(right, depth + 1);

        TreeNode::Node(Node {
            feature_idx: split.feature_idx,
            threshold: split.threshold,
            left: Box::new(left_child),
            right: Box::new(right_child),
        })
    }

    fn class_counts(&self, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_labels];
        for &i in indices {
            counts[self.y[i]] += 1;
        }
        counts
    }

    /// Candidate feature order for this node.
    ///
    /// Returns all features in order plus how many must be examined before
    /// the search may stop at the first positive-gain split.
    fn candidate_features(&mut self) -> (Vec<usize>, usize) {
        let n_features = self.x.n_cols();
        let mut features: Vec<usize> = (0..n_features).collect();
        match (self.max_features, self.rng.as_mut()) {
            (Some(m), Some(rng)) if m < n_features => {
                features.shuffle(rng);
                (features, m)
            }
            _ => (features, n_features),
        }
    }

    fn find_best_split(&mut self, indices: &[usize], parent_counts: &[usize]) -> Option<Split> {
        let parent_impurity = gini_from_counts(parent_counts, indices.len());
        let (features, min_examined) = self.candidate_features();

        let mut best: Option<Split> = None;
        for (examined, &feature_idx) in features.iter().enumerate() {
            // Like CART with max_features: keep drawing past the subset only
            // while no valid split has been found
            if examined >= min_examined && best.is_some() {
                break;
            }
            if let Some((threshold, gain)) =
                self.best_split_for_feature(indices, feature_idx, parent_counts, parent_impurity)
            {
                if best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(Split {
                        feature_idx,
                        threshold,
                        gain,
                    });
                }
            }
        }
        best
    }

    /// Sorted sweep over one feature, returning `(threshold, gain)` of the
    /// lowest weighted Gini impurity among positive-gain splits.
    fn best_split_for_feature(
        &self,
        indices: &[usize],
        feature_idx: usize,
        parent_counts: &[usize],
        parent_impurity: f32,
    ) -> Option<(f32, f32)> {
        let mut samples: Vec<(f32, usize)> = indices
            .iter()
            .map(|&i| (self.x.get(i, feature_idx), self.y[i]))
            .collect();
        samples.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n_total = samples.len();
        let mut left_counts = vec![0usize; parent_counts.len()];
        let mut right_counts = parent_counts.to_vec();
        let mut best: Option<(f32, f32)> = None;

        for pos in 0..n_total - 1 {
            let (value, label) = samples[pos];
            left_counts[label] += 1;
            right_counts[label] -= 1;

            let next_value = samples[pos + 1].0;
            if next_value <= value {
                continue;
            }

            let n_left = pos + 1;
            let n_right = n_total - n_left;
            let weighted = (n_left as f32 * gini_from_counts(&left_counts, n_left)
                + n_right as f32 * gini_from_counts(&right_counts, n_right))
                / n_total as f32;
            let gain = parent_impurity - weighted;

            if gain > 1e-7 && best.map_or(true, |(_, g)| gain > g) {
                best = Some(((value + next_value) / 2.0, gain));
            }
        }

        best
    }
}

/// Gini impurity `1 - Σ p_i²` from class counts.
fn gini_from_counts(counts: &[usize], n: usize) -> f32 {
    if n == 0 {
        return 0.0;
    }
    let n = n as f32;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f32 / n;
            p * p
        })
        .sum::<f32>()
}

/// Most frequent class; ties go to the smallest label.
fn majority_class(counts: &[usize]) -> usize {
    let mut best = 0;
    for (label, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = label;
        }
    }
    best
}

/// Random Forest classifier - an ensemble of decision trees.
///
/// Combines multiple decision trees trained on bootstrap samples
/// with random feature selection (`sqrt(n_features)` per split by default)
/// to reduce overfitting. Votes are tallied per row; ties go to the smallest
/// label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    trees: Vec<DecisionTreeClassifier>,
    n_estimators: usize,
    max_depth: Option<usize>,
    max_features: Option<usize>,
    random_state: Option<u64>,
    n_features: Option<usize>,
    classes: Vec<usize>,
}

impl RandomForestClassifier {
    /// Creates a new Random Forest classifier.
    ///
    /// # Arguments
    ///
    /// * `n_estimators` - Number of trees in the forest (at least 1)
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators: n_estimators.max(1),
            max_depth: None,
            max_features: None,
            random_state: None,
            n_features: None,
            classes: Vec::new(),
        }
    }

    /// Sets the maximum depth for each tree.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Overrides the per-split feature subset size.
    pub fn with_max_features(mut self, n: usize) -> Self {
        self.max_features = Some(n.max(1));
        self
    }

    /// Sets the random state for reproducibility.
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self
    }

    /// Number of fitted trees.
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Default for RandomForestClassifier {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Classifier for RandomForestClassifier {
    fn name(&self) -> &'static str {
        "RandomForest"
    }

    fn fit(&mut self, x: &Matrix<f32>, y: &[usize]) -> Result<()> {
        check_fit_input(x, y)?;
        let (n_samples, n_features) = x.shape();
        let max_features = self
            .max_features
            .unwrap_or_else(|| ((n_features as f32).sqrt() as usize).max(1));

        self.trees = Vec::with_capacity(self.n_estimators);
        for i in 0..self.n_estimators {
            let seed = self.random_state.map(|s| s.wrapping_add(i as u64));
            let bootstrap_indices = bootstrap_sample(n_samples, seed);

            let mut tree = DecisionTreeClassifier::new().with_max_features(max_features);
            if let Some(max_depth) = self.max_depth {
                tree = tree.with_max_depth(max_depth);
            }
            if let Some(seed) = seed {
                tree = tree.with_random_state(seed);
            }

            tree.fit_indices(x, y, bootstrap_indices);
            self.trees.push(tree);
        }

        let mut classes = y.to_vec();
        classes.sort_unstable();
        classes.dedup();
        self.classes = classes;
        self.n_features = Some(n_features);
        Ok(())
    }

    fn predict(&self, x: &Matrix<f32>) -> Result<Vec<usize>> {
        check_predict_input(x, self.n_features)?;
        if self.trees.is_empty() {
            return Err("Model not fitted yet".into());
        }

        let mut votes: Vec<BTreeMap<usize, usize>> = vec![BTreeMap::new(); x.n_rows()];
        for tree in &self.trees {
            for (row_votes, label) in votes.iter_mut().zip(tree.predict_rows(x)) {
                *row_votes.entry(label).or_insert(0) += 1;
            }
        }

        Ok(votes
            .into_iter()
            .map(|row_votes| {
                let mut predicted = 0;
                let mut max_votes = 0;
                for (label, count) in row_votes {
                    if count > max_votes {
                        max_votes = count;
                        predicted = label;
                    }
                }
                predicted
            })
            .collect())
    }

    fn n_features(&self) -> Option<usize> {
        self.n_features
    }

    fn classes(&self) -> Vec<usize> {
        self.classes.clone()
    }
}

/// Creates a bootstrap sample (random sample with replacement).
///
/// Returns indices of samples to include in the bootstrap sample.
fn bootstrap_sample(n_samples: usize, random_state: Option<u64>) -> Vec<usize> {
    use rand::distributions::{Distribution, Uniform};

    let dist = Uniform::from(0..n_samples);

    let mut rng = match random_state {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    (0..n_samples).map(|_| dist.sample(&mut rng)).collect()
}
