//! Probabilistic classification.
//!
//! Bernoulli Naive Bayes models every symptom column as an independent
//! present/absent event per class, which matches the binary feature vectors
//! the encoder produces.
//!
//! # Example
//!
//! ```
//! use medpredict::classification::BernoulliNB;
//! use medpredict::prelude::*;
//!
//! let x = Matrix::from_vec(4, 3, vec![
//!     1.0, 1.0, 0.0,
//!     1.0, 0.0, 0.0,
//!     0.0, 0.0, 1.0,
//!     0.0, 1.0, 1.0,
//! ]).expect("Matrix dimensions match data length");
//! let y = vec![0, 0, 1, 1];
//!
//! let mut model = BernoulliNB::new();
//! model.fit(&x, &y).expect("Training data is valid with 4 samples");
//! assert_eq!(model.predict(&x).expect("fitted"), y);
//! ```

use crate::error::{MedPredictError, Result};
use crate::primitives::Matrix;
use crate::traits::{check_fit_input, check_predict_input, Classifier};
use serde::{Deserialize, Serialize};

/// Values above this are treated as "present".
const BINARIZE_THRESHOLD: f32 = 0.5;

/// Bernoulli Naive Bayes classifier.
///
/// Feature likelihoods use Laplace smoothing:
/// `P(x_j = 1 | c) = (count_cj + alpha) / (n_c + 2 * alpha)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BernoulliNB {
    /// log P(y=c), one per class
    class_log_priors: Option<Vec<f32>>,
    /// log P(x_j=1 | c): [class][feature]
    feature_log_prob: Option<Vec<Vec<f32>>>,
    /// log P(x_j=0 | c): [class][feature]
    feature_log_neg_prob: Option<Vec<Vec<f32>>>,
    /// Class labels, ascending
    classes: Option<Vec<usize>>,
    /// Laplace smoothing parameter
    alpha: f32,
    n_features: Option<usize>,
}

impl BernoulliNB {
    /// Creates a new Bernoulli Naive Bayes classifier with `alpha = 1.0`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            class_log_priors: None,
            feature_log_prob: None,
            feature_log_neg_prob: None,
            classes: None,
            alpha: 1.0,
            n_features: None,
        }
    }

    /// Sets the Laplace smoothing parameter.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHyperparameter` unless `alpha` is finite and positive.
    pub fn with_alpha(mut self, alpha: f32) -> Result<Self> {
        if !(alpha.is_finite() && alpha > 0.0) {
            return Err(MedPredictError::invalid_hyperparameter(
                "alpha", alpha, "alpha > 0",
            ));
        }
        self.alpha = alpha;
        Ok(self)
    }

    /// Smoothing parameter in use.
    #[must_use]
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Joint log-likelihood of every class for one row.
    fn joint_log_likelihood(&self, row: &[f32]) -> Result<Vec<f32>> {
        let (Some(priors), Some(log_p), Some(log_neg_p)) = (
            self.class_log_priors.as_ref(),
            self.feature_log_prob.as_ref(),
            self.feature_log_neg_prob.as_ref(),
        ) else {
            return Err("Model not fitted yet".into());
        };

        Ok(priors
            .iter()
            .enumerate()
            .map(|(class_idx, &prior)| {
                row.iter()
                    .enumerate()
                    .fold(prior, |acc, (feature_idx, &value)| {
                        if value > BINARIZE_THRESHOLD {
                            acc + log_p[class_idx][feature_idx]
                        } else {
                            acc + log_neg_p[class_idx][feature_idx]
                        }
                    })
            })
            .collect())
    }
}

impl Default for BernoulliNB {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for BernoulliNB {
    fn name(&self) -> &'static str {
        "NaiveBayes"
    }

    fn fit(&mut self, x: &Matrix<f32>, y: &[usize]) -> Result<()> {
        check_fit_input(x, y)?;
        let (n_samples, n_features) = x.shape();

        let mut classes: Vec<usize> = y.to_vec();
        classes.sort_unstable();
        classes.dedup();
        let n_classes = classes.len();

        let mut class_counts = vec![0usize; n_classes];
        let mut feature_counts = vec![vec![0usize; n_features]; n_classes];

        for (row, &label) in x.rows().zip(y) {
            // classes is sorted and contains every label
            let class_idx = classes.partition_point(|&c| c < label);
            class_counts[class_idx] += 1;
            for (count, &value) in feature_counts[class_idx].iter_mut().zip(row) {
                if value > BINARIZE_THRESHOLD {
                    *count += 1;
                }
            }
        }

        let alpha = self.alpha;
        let mut log_p = vec![vec![0.0; n_features]; n_classes];
        let mut log_neg_p = vec![vec![0.0; n_features]; n_classes];
        for class_idx in 0..n_classes {
            let denom = class_counts[class_idx] as f32 + 2.0 * alpha;
            for feature_idx in 0..n_features {
                let p = (feature_counts[class_idx][feature_idx] as f32 + alpha) / denom;
                log_p[class_idx][feature_idx] = p.ln();
                log_neg_p[class_idx][feature_idx] = (1.0 - p).ln();
            }
        }

        self.class_log_priors = Some(
            class_counts
                .iter()
                .map(|&count| (count as f32 / n_samples as f32).ln())
                .collect(),
        );
        self.feature_log_prob = Some(log_p);
        self.feature_log_neg_prob = Some(log_neg_p);
        self.classes = Some(classes);
        self.n_features = Some(n_features);
        Ok(())
    }

    fn predict(&self, x: &Matrix<f32>) -> Result<Vec<usize>> {
        check_predict_input(x, self.n_features)?;
        let classes = self.classes.as_ref().ok_or("Model not fitted yet")?;

        x.rows()
            .map(|row| {
                let scores = self.joint_log_likelihood(row)?;
                // Strict comparison keeps the lowest class on ties
                let mut best = 0;
                for (idx, &score) in scores.iter().enumerate().skip(1) {
                    if score > scores[best] {
                        best = idx;
                    }
                }
                Ok(classes[best])
            })
            .collect()
    }

    fn n_features(&self) -> Option<usize> {
        self.n_features
    }

    fn classes(&self) -> Vec<usize> {
        self.classes.clone().unwrap_or_default()
    }
}
