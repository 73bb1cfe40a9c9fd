//! Core trait for the classifiers the trainer can select between.
//!
//! The trainer and the prediction service only ever see a [`Classifier`];
//! concrete algorithms live in [`crate::tree`] and [`crate::classification`].

use crate::error::Result;
use crate::metrics::accuracy;
use crate::primitives::Matrix;

/// Supervised classifier over binary symptom features.
///
/// Labels are dense class indices (`0..n_classes`) as produced by the
/// disease map. Implementations must be pure after `fit`, so a fitted model
/// can be shared across threads.
///
/// # Examples
///
/// ```
/// use medpredict::prelude::*;
///
/// let x = Matrix::from_vec(4, 2, vec![
///     1.0, 0.0,
///     1.0, 0.0,
///     0.0, 1.0,
///     0.0, 1.0,
/// ]).expect("4x2 data");
/// let y = vec![0, 0, 1, 1];
///
/// let mut model = DecisionTreeClassifier::new();
/// model.fit(&x, &y).expect("two classes present");
/// assert_eq!(model.predict(&x).expect("fitted"), y);
/// assert!((model.score(&x, &y).expect("fitted") - 1.0).abs() < 1e-6);
/// ```
pub trait Classifier: Send + Sync {
    /// Short stable name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Fits the model to training data.
    ///
    /// # Errors
    ///
    /// Returns an error if the sample counts disagree, the data is empty, or
    /// fewer than two classes are present.
    fn fit(&mut self, x: &Matrix<f32>, y: &[usize]) -> Result<()>;

    /// Predicts a class index for every row of `x`.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is unfitted or `x` has the wrong width.
    fn predict(&self, x: &Matrix<f32>) -> Result<Vec<usize>>;

    /// Input width seen during `fit`, `None` before fitting.
    fn n_features(&self) -> Option<usize>;

    /// Class indices this model can emit, ascending.
    fn classes(&self) -> Vec<usize>;

    /// Fraction of rows in `x` predicted as their label in `y`.
    ///
    /// # Errors
    ///
    /// Propagates prediction errors and rejects mismatched lengths.
    fn score(&self, x: &Matrix<f32>, y: &[usize]) -> Result<f32> {
        let predictions = self.predict(x)?;
        accuracy(&predictions, y)
    }
}

/// Validates the shape of a training call, shared by every classifier.
pub(crate) fn check_fit_input(x: &Matrix<f32>, y: &[usize]) -> Result<()> {
    let (n_rows, _) = x.shape();
    if n_rows != y.len() {
        return Err("Number of samples in X and y must match".into());
    }
    if n_rows == 0 {
        return Err("Cannot fit with zero samples".into());
    }
    let first = y[0];
    if y.iter().all(|&label| label == first) {
        return Err("Need at least 2 classes".into());
    }
    Ok(())
}

/// Rejects prediction input whose width differs from the fitted width.
pub(crate) fn check_predict_input(x: &Matrix<f32>, n_features: Option<usize>) -> Result<()> {
    let expected = n_features.ok_or("Model not fitted yet")?;
    if x.n_cols() != expected {
        return Err(crate::error::MedPredictError::dimension_mismatch(
            "n_features",
            expected,
            x.n_cols(),
        ));
    }
    Ok(())
}
