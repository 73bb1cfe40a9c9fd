//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use medpredict::prelude::*;
//! ```

pub use crate::artifact::ModelArtifact;
pub use crate::candidate::{ClassifierKind, ClassifierModel};
pub use crate::classification::BernoulliNB;
pub use crate::config::{MedPredictConfig, ServiceConfig, TrainingConfig};
pub use crate::dataset::{Dataset, Record};
pub use crate::encoder::{encode, encode_raw, FeatureVector};
pub use crate::error::{MedPredictError, Result};
pub use crate::primitives::Matrix;
pub use crate::service::{respond, PredictionResponse, PredictionService};
pub use crate::trainer::{train, TrainingOutcome, TrainingReport};
pub use crate::traits::Classifier;
pub use crate::tree::{DecisionTreeClassifier, RandomForestClassifier};
pub use crate::vocabulary::{DiseaseMap, Vocabulary};
