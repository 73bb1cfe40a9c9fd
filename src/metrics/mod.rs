//! Evaluation metrics for the candidate classifiers.
//!
//! Only classification accuracy is needed: both the held-out score and the
//! cross-validated score of every candidate are plain accuracies.

pub mod classification;

pub use classification::{accuracy, mean_and_std};
