//! Medpredict: symptom-based disease prediction in pure Rust.
//!
//! The crate has two halves that share one encoding contract:
//!
//! - an offline pipeline that builds a canonical symptom vocabulary from a
//!   labeled dataset, encodes every row into a binary feature matrix, injects
//!   synthetic overlap and noise, and selects the best of several classifiers
//!   by cross-validated accuracy;
//! - an online [`service::PredictionService`] that loads the resulting
//!   [`artifact::ModelArtifact`] once and turns free-form symptom lists into
//!   disease names.
//!
//! Both halves normalize symptoms with [`normalize::normalize_symptom`] and
//! index features by the same [`vocabulary::Vocabulary`]; neither re-derives
//! the ordering on its own.
//!
//! # Quick Start
//!
//! ```
//! use medpredict::prelude::*;
//!
//! let vocab = Vocabulary::from_ordered(vec![
//!     "fever".to_string(),
//!     "cough".to_string(),
//!     "headache".to_string(),
//! ])
//! .expect("unique, non-empty tokens");
//! let features = encode_raw(&["Fever", "Cough "], &vocab);
//! assert_eq!(features.as_slice(), &[1, 1, 0]);
//! ```
//!
//! # Modules
//!
//! - [`primitives`]: row-major `Matrix` storage for feature data
//! - [`normalize`]: the shared, versioned symptom normalization function
//! - [`dataset`]: CSV ingestion (free-text cells or one-hot columns)
//! - [`vocabulary`]: canonical sorted symptom vocabulary and the disease map
//! - [`encoder`]: symptom sets to fixed-order binary feature vectors
//! - [`perturb`]: overlap and noise injection for training data
//! - [`tree`]: CART decision tree and random forest classifiers
//! - [`classification`]: Bernoulli naive Bayes classifier
//! - [`model_selection`]: K-fold, train/test split, cross-validation
//! - [`metrics`]: classification accuracy
//! - [`candidate`]: the closed set of candidate classifier families
//! - [`trainer`]: candidate fitting and cross-validated selection
//! - [`artifact`]: persisted model bundle with atomic save
//! - [`service`]: `Unloaded`/`Ready` prediction service
//! - [`config`]: TOML-backed training and serving configuration

pub mod artifact;
pub mod candidate;
pub mod classification;
pub mod config;
pub mod dataset;
pub mod encoder;
pub mod error;
pub mod metrics;
pub mod model_selection;
pub mod normalize;
pub mod perturb;
pub mod prelude;
pub mod primitives;
pub mod service;
pub mod trainer;
pub mod traits;
pub mod tree;
pub mod vocabulary;

pub use error::{ErrorCategory, MedPredictError, Result};
pub use primitives::Matrix;
pub use traits::Classifier;
