//! Error types for medpredict-cli

use medpredict::service::PredictionResponse;
use medpredict::{ErrorCategory, MedPredictError};
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

/// Result type alias for CLI operations
pub(crate) type Result<T> = std::result::Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug)]
pub(crate) enum CliError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Bad configuration file or flag combination
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Rejected user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Dataset could not be turned into a model
    #[error("Training failed: {0}")]
    TrainingFailed(String),

    /// Model artifact missing or unusable
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Classifier failure at prediction time
    #[error("Prediction failed: {0}")]
    PredictionFailed(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP server error
    #[error("Server error: {0}")]
    Server(String),

    /// Any other library error
    #[error("{0}")]
    MedPredict(String),
}

impl CliError {
    /// Get exit code for this error
    pub(crate) fn exit_code(&self) -> ExitCode {
        match self {
            Self::MedPredict(_) => ExitCode::from(1),
            Self::Config(_) => ExitCode::from(2),
            Self::FileNotFound(_) => ExitCode::from(3),
            Self::InvalidInput(_) => ExitCode::from(4),
            Self::TrainingFailed(_) => ExitCode::from(5),
            Self::ModelUnavailable(_) => ExitCode::from(6),
            Self::Io(_) => ExitCode::from(7),
            Self::PredictionFailed(_) => ExitCode::from(8),
            Self::Server(_) => ExitCode::from(10),
        }
    }

    /// Error carried by a failed boundary response.
    pub(crate) fn from_response(response: &PredictionResponse) -> Option<Self> {
        let message = response.error.clone().unwrap_or_default();
        match response.category? {
            ErrorCategory::InvalidInput => Some(Self::InvalidInput(message)),
            ErrorCategory::ModelUnavailable => Some(Self::ModelUnavailable(message)),
            ErrorCategory::PredictionFailed => Some(Self::PredictionFailed(message)),
        }
    }
}

impl From<MedPredictError> for CliError {
    fn from(e: MedPredictError) -> Self {
        match e {
            MedPredictError::Io(io) => Self::Io(io),
            MedPredictError::Config { message } => Self::Config(message),
            MedPredictError::InvalidInput { message } => Self::InvalidInput(message),
            MedPredictError::ModelUnavailable { reason } => Self::ModelUnavailable(reason),
            MedPredictError::PredictionFailed { message } => Self::PredictionFailed(message),
            e @ (MedPredictError::TrainingFailed { .. }
            | MedPredictError::EmptyVocabulary { .. }
            | MedPredictError::Dataset { .. }) => Self::TrainingFailed(e.to_string()),
            other => Self::MedPredict(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::Io(e.into())
    }
}
