//! Model selection utilities for cross-validation and train/test splitting.
//!
//! This module provides tools for:
//! - Stratified train/test splitting
//! - Stratified K-Fold cross-validation of any [`Classifier`]
//!
//! Both splitters group rows by label, so a class with at least two rows is
//! never held out entirely.

use crate::error::{MedPredictError, Result};
use crate::metrics::{accuracy, mean_and_std};
use crate::primitives::Matrix;
use crate::traits::{check_fit_input, Classifier};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;
use tracing::debug;

/// Results from cross-validation.
#[derive(Debug, Clone)]
pub struct CrossValidationResult {
    /// Score for each fold
    pub scores: Vec<f32>,
}

impl CrossValidationResult {
    /// Calculate mean score across folds
    pub fn mean(&self) -> f32 {
        mean_and_std(&self.scores).0
    }

    /// Calculate standard deviation of scores
    pub fn std(&self) -> f32 {
        mean_and_std(&self.scores).1
    }
}

/// Run cross-validation on a classifier.
///
/// Trains a fresh clone of `classifier` on each fold's training part and
/// scores it on the held-out part. A fold whose training part holds a single
/// class is scored as a constant prediction of that class; any other fold
/// failure fails the whole run.
///
/// # Errors
///
/// Returns `TrainingFailed` when there are fewer than two rows, the fit
/// input error when `y` holds a single class, and the first fold error
/// otherwise.
///
/// # Example
///
/// ```rust
/// use medpredict::prelude::*;
/// use medpredict::model_selection::{cross_validate, KFold};
///
/// let x = Matrix::from_vec(10, 2, (0..10)
///     .flat_map(|i| if i % 2 == 0 { [1.0, 0.0] } else { [0.0, 1.0] })
///     .collect()).expect("10x2 data");
/// let y: Vec<usize> = (0..10).map(|i| i % 2).collect();
///
/// let model = BernoulliNB::new();
/// let kfold = KFold::new(5).with_random_state(42);
///
/// let results = cross_validate(&model, &x, &y, &kfold).expect("both classes in every training fold");
/// assert!((results.mean() - 1.0).abs() < 1e-6);
/// ```
pub fn cross_validate<C>(
    classifier: &C,
    x: &Matrix<f32>,
    y: &[usize],
    cv: &KFold,
) -> Result<CrossValidationResult>
where
    C: Classifier + Clone,
{
    let n_samples = x.n_rows();
    if n_samples != y.len() {
        return Err(MedPredictError::dimension_mismatch(
            "labels",
            n_samples,
            y.len(),
        ));
    }
    if n_samples < 2 {
        return Err(MedPredictError::training_failed(format!(
            "cross-validation needs at least 2 rows, got {n_samples}"
        )));
    }
    check_fit_input(x, y)?;

    let splits = cv.split(y);
    let mut scores = Vec::with_capacity(splits.len());

    for (fold, (train_idx, test_idx)) in splits.into_iter().enumerate() {
        let (x_train, y_train) = extract_samples(x, y, &train_idx);
        let (x_test, y_test) = extract_samples(x, y, &test_idx);

        let score = match single_class(&y_train) {
            Some(class) => {
                debug!(
                    model = classifier.name(),
                    fold, class, "single-class fold scored as constant prediction"
                );
                accuracy(&vec![class; y_test.len()], &y_test)?
            }
            None => {
                let mut fold_model = classifier.clone();
                fold_model.fit(&x_train, &y_train)?;
                fold_model.score(&x_test, &y_test)?
            }
        };
        debug!(model = classifier.name(), fold, score, "cross-validation fold");
        scores.push(score);
    }

    Ok(CrossValidationResult { scores })
}

fn single_class(y: &[usize]) -> Option<usize> {
    let first = *y.first()?;
    y.iter().all(|&label| label == first).then_some(first)
}

/// Helper function to extract samples by indices
pub(crate) fn extract_samples(
    x: &Matrix<f32>,
    y: &[usize],
    indices: &[usize],
) -> (Matrix<f32>, Vec<usize>) {
    let x_subset = x.select_rows(indices);
    let y_subset = indices.iter().map(|&idx| y[idx]).collect();
    (x_subset, y_subset)
}

/// Stratified K-Fold cross-validator.
///
/// Rows are grouped by label (ascending), optionally shuffled within each
/// group, and dealt round-robin into K folds. Each fold is used once as test
/// set while the remaining K-1 folds form the training set. Fold sizes differ
/// by at most one, and a class with `c >= 2` rows keeps at least one row in
/// every training part. K is clamped to the number of samples so every test
/// fold is non-empty.
///
/// # Example
///
/// ```rust
/// use medpredict::model_selection::KFold;
///
/// let labels = [0, 0, 0, 0, 0, 0, 0, 0, 1, 1];
/// let kfold = KFold::new(5);
/// let splits = kfold.split(&labels);
/// assert_eq!(splits.len(), 5);
/// assert!(splits.iter().all(|(train, test)| train.len() == 8 && test.len() == 2));
/// assert!(splits
///     .iter()
///     .all(|(train, _)| train.iter().any(|&i| labels[i] == 1)));
///
/// // Fewer rows than folds
/// assert_eq!(kfold.split(&[0, 1, 1]).len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct KFold {
    n_splits: usize,
    shuffle: bool,
    random_state: Option<u64>,
}

impl KFold {
    /// Create a new K-Fold cross-validator.
    ///
    /// # Arguments
    ///
    /// * `n_splits` - Number of folds. Values below 2 are raised to 2.
    pub fn new(n_splits: usize) -> Self {
        Self {
            n_splits: n_splits.max(2),
            shuffle: false,
            random_state: None,
        }
    }

    /// Enable shuffling within each class before dealing rows into folds.
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Set random state for reproducible shuffling.
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self.shuffle = true; // Shuffle is implied when random_state is set
        self
    }

    /// Generate train/test indices for each fold of `labels`.
    ///
    /// Returns a vector of (train_indices, test_indices) tuples.
    pub fn split(&self, labels: &[usize]) -> Vec<(Vec<usize>, Vec<usize>)> {
        let n_samples = labels.len();
        let n_splits = self.n_splits.min(n_samples);
        if n_splits == 0 {
            return Vec::new();
        }

        let mut groups = class_groups(labels);
        if self.shuffle {
            let mut rng = seeded_rng(self.random_state);
            for group in &mut groups {
                group.shuffle(&mut rng);
            }
        }

        // Deal rows round-robin; the position keeps counting across classes
        let mut fold_of = vec![0usize; n_samples];
        for (position, idx) in groups.into_iter().flatten().enumerate() {
            fold_of[idx] = position % n_splits;
        }

        (0..n_splits)
            .map(|fold| {
                let (test, train): (Vec<usize>, Vec<usize>) =
                    (0..n_samples).partition(|&idx| fold_of[idx] == fold);
                (train, test)
            })
            .collect()
    }
}

/// Row indices of a stratified train/test split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    /// Rows assigned to training
    pub train: Vec<usize>,
    /// Rows held out for evaluation
    pub test: Vec<usize>,
}

/// Stratified shuffled train/test split over `labels`.
///
/// Each class with `c >= 2` rows holds out `ceil(c * test_size)` rows,
/// clamped to `1..=c-1`, so it appears on both sides. A class with a single
/// row goes to training.
///
/// # Errors
///
/// Returns `InvalidHyperparameter` if `test_size` is not in `(0, 1)`, and
/// `TrainingFailed` if either side of the split would be empty.
///
/// # Example
///
/// ```rust
/// use medpredict::model_selection::split_indices;
///
/// let labels = [0, 0, 0, 0, 0, 1, 1, 2];
/// let split = split_indices(&labels, 0.2, Some(42)).expect("two classes can be split");
/// assert_eq!(split.test.len(), 2);
/// assert!(split.train.contains(&7));
/// ```
pub fn split_indices(
    labels: &[usize],
    test_size: f32,
    random_state: Option<u64>,
) -> Result<SplitIndices> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(MedPredictError::invalid_hyperparameter(
            "test_size",
            test_size,
            "0.0 < test_size < 1.0",
        ));
    }

    let mut rng = seeded_rng(random_state);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();

    for mut group in class_groups(labels) {
        group.shuffle(&mut rng);
        let n = group.len();
        let n_test = if n < 2 {
            0
        } else {
            ((n as f32 * test_size).ceil() as usize).clamp(1, n - 1)
        };
        test.extend_from_slice(&group[..n_test]);
        train.extend_from_slice(&group[n_test..]);
    }

    if train.is_empty() || test.is_empty() {
        return Err(MedPredictError::training_failed(format!(
            "Split would result in empty train or test set (n_train={}, n_test={}); \
             at least one disease needs two rows",
            train.len(),
            test.len()
        )));
    }

    train.shuffle(&mut rng);
    test.shuffle(&mut rng);
    Ok(SplitIndices { train, test })
}

/// Row indices grouped by label, in ascending label order.
fn class_groups(labels: &[usize]) -> Vec<Vec<usize>> {
    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (idx, &label) in labels.iter().enumerate() {
        groups.entry(label).or_default().push(idx);
    }
    groups.into_values().collect()
}

fn seeded_rng(random_state: Option<u64>) -> StdRng {
    match random_state {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::BernoulliNB;

    fn two_class_data(n: usize) -> (Matrix<f32>, Vec<usize>) {
        let mut data = Vec::with_capacity(n * 2);
        let mut y = Vec::with_capacity(n);
        for i in 0..n {
            if i % 2 == 0 {
                data.extend_from_slice(&[1.0, 0.0]);
            } else {
                data.extend_from_slice(&[0.0, 1.0]);
            }
            y.push(i % 2);
        }
        (
            Matrix::from_vec(n, 2, data).expect("Matrix creation should succeed with valid test data"),
            y,
        )
    }

    /// `majority` rows of class 0 (`[1, 0]`) followed by `minority` rows of
    /// class 1 (`[0, 1]`).
    fn imbalanced_data(majority: usize, minority: usize) -> (Matrix<f32>, Vec<usize>) {
        let n = majority + minority;
        let mut data = Vec::with_capacity(n * 2);
        let mut y = Vec::with_capacity(n);
        for i in 0..n {
            if i < majority {
                data.extend_from_slice(&[1.0, 0.0]);
                y.push(0);
            } else {
                data.extend_from_slice(&[0.0, 1.0]);
                y.push(1);
            }
        }
        (Matrix::from_vec(n, 2, data).expect("n x 2 data"), y)
    }

    fn classes_of(indices: &[usize], labels: &[usize]) -> Vec<usize> {
        let mut classes: Vec<usize> = indices.iter().map(|&i| labels[i]).collect();
        classes.sort_unstable();
        classes.dedup();
        classes
    }

    #[test]
    fn test_split_rounds_test_size_up() {
        let split = split_indices(&[0; 11], 0.2, Some(42)).expect("valid split");
        assert_eq!(split.test.len(), 3);
        assert_eq!(split.train.len(), 8);
    }

    #[test]
    fn test_split_partitions_all_rows() {
        let labels: Vec<usize> = (0..25).map(|i| i % 4).collect();
        let split = split_indices(&labels, 0.2, Some(7)).expect("valid split");
        let mut all: Vec<usize> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..25).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_keeps_every_class_on_both_sides() {
        // Classes of 10, 3 and 2 rows
        let mut labels = vec![0; 10];
        labels.extend([1; 3]);
        labels.extend([2; 2]);

        for seed in 0..20 {
            let split = split_indices(&labels, 0.2, Some(seed)).expect("valid split");
            assert_eq!(classes_of(&split.train, &labels), vec![0, 1, 2]);
            assert_eq!(classes_of(&split.test, &labels), vec![0, 1, 2]);
            assert_eq!(split.test.len(), 2 + 1 + 1);
        }
    }

    #[test]
    fn test_split_singleton_class_goes_to_training() {
        let labels = [0, 0, 0, 0, 0, 1, 2, 2];
        for seed in 0..20 {
            let split = split_indices(&labels, 0.5, Some(seed)).expect("valid split");
            assert!(split.train.contains(&5));
            assert!(!split.test.contains(&5));
        }
    }

    #[test]
    fn test_split_reproducibility() {
        let (_, y) = two_class_data(20);
        let a = split_indices(&y, 0.2, Some(42)).expect("First split should succeed");
        let b = split_indices(&y, 0.2, Some(42)).expect("Second split should succeed");
        assert_eq!(a, b);
    }

    #[test]
    fn test_split_invalid_test_size() {
        let (_, y) = two_class_data(10);
        for bad in [0.0, 1.0, -0.5, 1.5] {
            assert!(matches!(
                split_indices(&y, bad, Some(42)),
                Err(MedPredictError::InvalidHyperparameter { .. })
            ));
        }
    }

    #[test]
    fn test_split_too_few_rows() {
        assert!(split_indices(&[0], 0.2, Some(42)).is_err());
        // Only singleton classes: nothing can be held out
        assert!(matches!(
            split_indices(&[0, 1, 2], 0.5, Some(42)),
            Err(MedPredictError::TrainingFailed { .. })
        ));
    }

    #[test]
    fn test_kfold_covers_every_row_once() {
        let labels: Vec<usize> = (0..23).map(|i| i % 3).collect();
        let kfold = KFold::new(5).with_random_state(42);
        let splits = kfold.split(&labels);
        assert_eq!(splits.len(), 5);

        let mut tested: Vec<usize> = splits.iter().flat_map(|(_, t)| t.clone()).collect();
        tested.sort_unstable();
        assert_eq!(tested, (0..23).collect::<Vec<_>>());

        for (train, test) in &splits {
            assert_eq!(train.len() + test.len(), 23);
            assert!(test.iter().all(|idx| !train.contains(idx)));
            assert!((4..=5).contains(&test.len()));
        }
    }

    #[test]
    fn test_kfold_clamps_to_sample_count() {
        let splits = KFold::new(5).split(&[0, 1, 0]);
        assert_eq!(splits.len(), 3);
        assert!(splits.iter().all(|(_, test)| test.len() == 1));
        assert!(KFold::new(5).split(&[]).is_empty());
    }

    #[test]
    fn test_kfold_unshuffled_deals_by_class() {
        let splits = KFold::new(2).split(&[0, 0, 1, 1]);
        assert_eq!(splits[0].1, vec![0, 2]);
        assert_eq!(splits[1].1, vec![1, 3]);
    }

    #[test]
    fn test_kfold_keeps_minority_in_every_training_fold() {
        let (_, y) = imbalanced_data(18, 2);
        for seed in 0..10 {
            for (train, _) in KFold::new(5).with_random_state(seed).split(&y) {
                assert_eq!(classes_of(&train, &y), vec![0, 1]);
            }
        }
    }

    #[test]
    fn test_cross_validate_scores_per_fold() {
        let (x, y) = two_class_data(20);
        let result = cross_validate(&BernoulliNB::new(), &x, &y, &KFold::new(5).with_random_state(42))
            .expect("separable data");
        assert_eq!(result.scores.len(), 5);
        assert!((result.mean() - 1.0).abs() < 1e-6);
        assert!(result.std().abs() < 1e-6);
    }

    #[test]
    fn test_cross_validate_rare_minority_class() {
        for minority in [2, 3] {
            let (x, y) = imbalanced_data(18, minority);
            let result =
                cross_validate(&BernoulliNB::new(), &x, &y, &KFold::new(5).with_random_state(42))
                    .expect("minority present in every training fold");
            assert_eq!(result.scores.len(), 5);
            assert!((result.mean() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_cross_validate_single_class_fold_scored_as_constant() {
        // Unshuffled: the lone class-1 row is dealt into fold 4, whose
        // training part is all class 0
        let (x, y) = imbalanced_data(4, 1);
        let result = cross_validate(&BernoulliNB::new(), &x, &y, &KFold::new(5))
            .expect("single-class fold does not fail the run");
        assert_eq!(result.scores, vec![1.0, 1.0, 1.0, 1.0, 0.0]);
        assert!((result.mean() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_cross_validate_needs_two_rows() {
        let (x, y) = two_class_data(1);
        let err = cross_validate(&BernoulliNB::new(), &x, &y, &KFold::new(5))
            .expect_err("single row");
        assert!(matches!(err, MedPredictError::TrainingFailed { .. }));
    }

    #[test]
    fn test_cross_validate_rejects_single_class_data() {
        let x = Matrix::zeros(6, 2);
        let y = vec![3; 6];
        let err = cross_validate(&BernoulliNB::new(), &x, &y, &KFold::new(3))
            .expect_err("one class");
        assert!(err.to_string().contains("at least 2 classes"));
    }
}
