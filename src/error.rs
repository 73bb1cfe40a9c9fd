//! Error types for medpredict operations.
//!
//! One enum covers both halves of the system. Training-time failures
//! (`EmptyVocabulary`, `TrainingFailed`) are fatal to a run; serving-time
//! failures (`InvalidInput`, `ModelUnavailable`, `PredictionFailed`) map onto
//! an [`ErrorCategory`] at the service boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for medpredict operations.
///
/// # Examples
///
/// ```
/// use medpredict::error::{ErrorCategory, MedPredictError};
///
/// let err = MedPredictError::invalid_input("symptoms must not be empty");
/// assert_eq!(err.category(), ErrorCategory::InvalidInput);
/// assert!(err.to_string().contains("invalid input"));
/// ```
#[derive(Debug, Error)]
pub enum MedPredictError {
    /// No symptom tokens were found while building a vocabulary.
    #[error("empty vocabulary: no symptom tokens found in {context}")]
    EmptyVocabulary {
        /// Where the tokens were expected (dataset path, token list, ...)
        context: String,
    },

    /// Every candidate classifier failed, or the data cannot be trained on.
    #[error("training failed: {reason}")]
    TrainingFailed {
        /// Why the run could not produce a model
        reason: String,
    },

    /// Caller supplied a malformed prediction request.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// What was wrong with the request
        message: String,
    },

    /// No model artifact is loaded.
    #[error("model unavailable: {reason}")]
    ModelUnavailable {
        /// Why the artifact could not be loaded
        reason: String,
    },

    /// The classifier call failed unexpectedly.
    #[error("prediction failed: {message}")]
    PredictionFailed {
        /// Underlying failure
        message: String,
    },

    /// Matrix/feature dimensions don't match.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimensions description
        expected: String,
        /// Actual dimensions found
        actual: String,
    },

    /// Invalid hyperparameter value provided.
    #[error("invalid hyperparameter: {param} = {value}, expected {constraint}")]
    InvalidHyperparameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Dataset could not be read or has an unusable layout.
    #[error("dataset error: {message}")]
    Dataset {
        /// Error description
        message: String,
    },

    /// Configuration file could not be parsed or failed validation.
    #[error("configuration error: {message}")]
    Config {
        /// Error description
        message: String,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error (file not found, permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with string message.
    #[error("{0}")]
    Other(String),
}

/// Failure category reported at the prediction boundary.
///
/// Distinguishes caller errors from service outages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Caller error; correct the request and retry.
    InvalidInput,
    /// No model is loaded; needs operator intervention.
    ModelUnavailable,
    /// Unexpected failure while predicting.
    PredictionFailed,
}

impl ErrorCategory {
    /// HTTP-style status class for this category.
    #[must_use]
    pub fn status_code(self) -> u16 {
        match self {
            Self::InvalidInput => 400,
            Self::ModelUnavailable | Self::PredictionFailed => 500,
        }
    }

    /// Stable name used in logs and JSON bodies.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidInput => "InvalidInput",
            Self::ModelUnavailable => "ModelUnavailable",
            Self::PredictionFailed => "PredictionFailed",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl MedPredictError {
    /// Boundary category for this error.
    ///
    /// Anything that is neither a caller error nor a missing model is
    /// reported as a prediction failure.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput { .. } => ErrorCategory::InvalidInput,
            Self::ModelUnavailable { .. } => ErrorCategory::ModelUnavailable,
            _ => ErrorCategory::PredictionFailed,
        }
    }

    /// Create an invalid input error
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a model unavailable error
    #[must_use]
    pub fn model_unavailable(reason: impl Into<String>) -> Self {
        Self::ModelUnavailable {
            reason: reason.into(),
        }
    }

    /// Create a training failure
    #[must_use]
    pub fn training_failed(reason: impl Into<String>) -> Self {
        Self::TrainingFailed {
            reason: reason.into(),
        }
    }

    /// Create a dataset error
    #[must_use]
    pub fn dataset(message: impl Into<String>) -> Self {
        Self::Dataset {
            message: message.into(),
        }
    }

    /// Create a dimension mismatch error with descriptive context
    #[must_use]
    pub fn dimension_mismatch(context: &str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            expected: format!("{context}={expected}"),
            actual: format!("{actual}"),
        }
    }

    /// Create an invalid hyperparameter error
    #[must_use]
    pub fn invalid_hyperparameter(param: &str, value: impl ToString, constraint: &str) -> Self {
        Self::InvalidHyperparameter {
            param: param.to_string(),
            value: value.to_string(),
            constraint: constraint.to_string(),
        }
    }
}

impl From<&str> for MedPredictError {
    fn from(msg: &str) -> Self {
        MedPredictError::Other(msg.to_string())
    }
}

impl From<String> for MedPredictError {
    fn from(msg: String) -> Self {
        MedPredictError::Other(msg)
    }
}

impl From<bincode::Error> for MedPredictError {
    fn from(err: bincode::Error) -> Self {
        MedPredictError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for MedPredictError {
    fn from(err: csv::Error) -> Self {
        MedPredictError::dataset(err.to_string())
    }
}

/// Convenience type alias for Results.
pub type Result<T> = std::result::Result<T, MedPredictError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_vocabulary_display() {
        let err = MedPredictError::EmptyVocabulary {
            context: "dataset.csv".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("empty vocabulary"));
        assert!(msg.contains("dataset.csv"));
    }

    #[test]
    fn test_training_failed_display() {
        let err = MedPredictError::training_failed("all candidates failed");
        assert!(err.to_string().contains("training failed"));
        assert!(err.to_string().contains("all candidates failed"));
    }

    #[test]
    fn test_invalid_hyperparameter_display() {
        let err = MedPredictError::invalid_hyperparameter("noise_probability", 1.5, "0.0..=1.0");
        let msg = err.to_string();
        assert!(msg.contains("noise_probability"));
        assert!(msg.contains("1.5"));
        assert!(msg.contains("0.0..=1.0"));
    }

    #[test]
    fn test_dimension_mismatch_helper() {
        let err = MedPredictError::dimension_mismatch("n_features", 132, 5);
        let msg = err.to_string();
        assert!(msg.contains("n_features=132"));
        assert!(msg.contains('5'));
    }

    #[test]
    fn test_category_mapping() {
        assert_eq!(
            MedPredictError::invalid_input("x").category(),
            ErrorCategory::InvalidInput
        );
        assert_eq!(
            MedPredictError::model_unavailable("x").category(),
            ErrorCategory::ModelUnavailable
        );
        assert_eq!(
            MedPredictError::PredictionFailed {
                message: "x".to_string()
            }
            .category(),
            ErrorCategory::PredictionFailed
        );
        // Internal failures surface as prediction failures
        assert_eq!(
            MedPredictError::Other("boom".to_string()).category(),
            ErrorCategory::PredictionFailed
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ErrorCategory::InvalidInput.status_code(), 400);
        assert_eq!(ErrorCategory::ModelUnavailable.status_code(), 500);
        assert_eq!(ErrorCategory::PredictionFailed.status_code(), 500);
    }

    #[test]
    fn test_from_str_and_string() {
        let err: MedPredictError = "test error".into();
        assert!(matches!(err, MedPredictError::Other(_)));
        assert_eq!(err.to_string(), "test error");

        let err: MedPredictError = "owned".to_string().into();
        assert_eq!(err.to_string(), "owned");
    }

    #[test]
    fn test_from_io_error_keeps_source() {
        use std::error::Error;
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: MedPredictError = io_err.into();
        assert!(matches!(err, MedPredictError::Io(_)));
        assert!(err.source().is_some());
    }
}
