//! Classification metrics for evaluating classifier performance.

use crate::error::{MedPredictError, Result};

/// Compute classification accuracy.
///
/// accuracy = `correct_predictions` / `total_predictions`
///
/// # Errors
///
/// Returns an error if the slices have different lengths or are empty.
///
/// # Examples
///
/// ```
/// use medpredict::metrics::accuracy;
///
/// let y_true = vec![0, 1, 2, 0, 1, 2];
/// let y_pred = vec![0, 2, 1, 0, 0, 1];
/// let acc = accuracy(&y_pred, &y_true).expect("same non-zero length");
/// assert!((acc - 0.333333).abs() < 0.001);
/// ```
pub fn accuracy(y_pred: &[usize], y_true: &[usize]) -> Result<f32> {
    if y_pred.len() != y_true.len() {
        return Err(MedPredictError::dimension_mismatch(
            "predictions",
            y_true.len(),
            y_pred.len(),
        ));
    }
    if y_true.is_empty() {
        return Err("Cannot compute accuracy of zero samples".into());
    }

    let correct = y_pred
        .iter()
        .zip(y_true.iter())
        .filter(|(p, t)| p == t)
        .count();

    Ok(correct as f32 / y_true.len() as f32)
}

/// Mean and population standard deviation of a set of fold scores.
///
/// Returns `(0.0, 0.0)` for an empty slice.
#[must_use]
pub fn mean_and_std(scores: &[f32]) -> (f32, f32) {
    if scores.is_empty() {
        return (0.0, 0.0);
    }
    let n = scores.len() as f32;
    let mean = scores.iter().sum::<f32>() / n;
    let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f32>() / n;
    (mean, variance.sqrt())
}
