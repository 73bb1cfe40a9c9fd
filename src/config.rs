//! TOML configuration for training runs and the prediction service.
//!
//! Both sections are optional; missing keys take their defaults.
//!
//! ```toml
//! [training]
//! dataset = "data/dataset.csv"
//! disease_column = "Disease"
//! artifact = "model.bin"
//! test_size = 0.2
//! cv_folds = 5
//! overlap_features = 3
//! noise_probability = 0.05
//! random_state = 42
//! n_estimators = 100
//! candidates = ["DecisionTree", "RandomForest", "NaiveBayes"]
//!
//! [service]
//! artifact = "model.bin"
//! host = "127.0.0.1"
//! port = 5001
//! cors = true
//! ```

use crate::candidate::ClassifierKind;
use crate::dataset::DEFAULT_DISEASE_COLUMN;
use crate::error::{MedPredictError, Result};
use crate::perturb::PerturbationConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default artifact location shared by both sections.
pub const DEFAULT_ARTIFACT_PATH: &str = "model.bin";

/// Whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MedPredictConfig {
    /// Offline pipeline settings
    pub training: TrainingConfig,
    /// Prediction service settings
    pub service: ServiceConfig,
}

impl MedPredictConfig {
    /// Parses a configuration from TOML text and validates it.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the TOML is malformed or a value is out of range.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| MedPredictError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the file cannot be read, parsed or validated.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| MedPredictError::Config {
            message: format!("failed to read config file {}: {e}", path.display()),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Serializes back to TOML.
    ///
    /// # Errors
    ///
    /// Returns `Config` if serialization fails.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| MedPredictError::Config {
            message: e.to_string(),
        })
    }

    /// Validates both sections.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range value as a `Config` error.
    pub fn validate(&self) -> Result<()> {
        self.training.validate()?;
        self.service.validate()
    }
}

/// Settings of one training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Labeled CSV dataset
    pub dataset: PathBuf,
    /// Header of the label column (case-insensitive)
    pub disease_column: String,
    /// Where the model artifact is written
    pub artifact: PathBuf,
    /// Held-out fraction, in (0, 1)
    pub test_size: f32,
    /// Cross-validation folds (clamped to the training row count)
    pub cv_folds: usize,
    /// Columns shared per class by overlap injection
    pub overlap_features: usize,
    /// Per-cell flip probability, in [0, 1]
    pub noise_probability: f64,
    /// Seed for split, folds, perturbation and forest; `None` is nondeterministic
    pub random_state: Option<u64>,
    /// Trees in the random forest
    pub n_estimators: usize,
    /// Candidate classifiers in evaluation order
    pub candidates: Vec<ClassifierKind>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from("dataset.csv"),
            disease_column: DEFAULT_DISEASE_COLUMN.to_string(),
            artifact: PathBuf::from(DEFAULT_ARTIFACT_PATH),
            test_size: 0.2,
            cv_folds: 5,
            overlap_features: 3,
            noise_probability: 0.05,
            random_state: Some(42),
            n_estimators: 100,
            candidates: ClassifierKind::ALL.to_vec(),
        }
    }
}

impl TrainingConfig {
    /// Sets the dataset path.
    #[must_use]
    pub fn with_dataset(mut self, path: impl Into<PathBuf>) -> Self {
        self.dataset = path.into();
        self
    }

    /// Sets the label column header.
    #[must_use]
    pub fn with_disease_column(mut self, column: impl Into<String>) -> Self {
        self.disease_column = column.into();
        self
    }

    /// Sets the artifact output path.
    #[must_use]
    pub fn with_artifact(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifact = path.into();
        self
    }

    /// Sets the held-out fraction.
    #[must_use]
    pub fn with_test_size(mut self, test_size: f32) -> Self {
        self.test_size = test_size;
        self
    }

    /// Sets the number of cross-validation folds.
    #[must_use]
    pub fn with_cv_folds(mut self, folds: usize) -> Self {
        self.cv_folds = folds;
        self
    }

    /// Sets the overlap column count.
    #[must_use]
    pub fn with_overlap_features(mut self, k: usize) -> Self {
        self.overlap_features = k;
        self
    }

    /// Sets the noise flip probability.
    #[must_use]
    pub fn with_noise_probability(mut self, p: f64) -> Self {
        self.noise_probability = p;
        self
    }

    /// Sets (or clears) the random seed.
    #[must_use]
    pub fn with_random_state(mut self, seed: Option<u64>) -> Self {
        self.random_state = seed;
        self
    }

    /// Sets the forest size.
    #[must_use]
    pub fn with_n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }

    /// Replaces the candidate list.
    #[must_use]
    pub fn with_candidates(mut self, candidates: Vec<ClassifierKind>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Perturbation parameters derived from this run.
    pub fn perturbation(&self) -> PerturbationConfig {
        PerturbationConfig {
            overlap_features: self.overlap_features,
            noise_probability: self.noise_probability,
            random_state: self.random_state,
        }
    }

    /// Checks every numeric range.
    ///
    /// # Errors
    ///
    /// Returns `Config` naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(config_error(format!(
                "training.test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        if self.cv_folds < 2 {
            return Err(config_error(format!(
                "training.cv_folds must be at least 2, got {}",
                self.cv_folds
            )));
        }
        if !(0.0..=1.0).contains(&self.noise_probability) {
            return Err(config_error(format!(
                "training.noise_probability must be in [0, 1], got {}",
                self.noise_probability
            )));
        }
        if self.n_estimators == 0 {
            return Err(config_error("training.n_estimators must be at least 1"));
        }
        if self.candidates.is_empty() {
            return Err(config_error("training.candidates must not be empty"));
        }
        if self.disease_column.trim().is_empty() {
            return Err(config_error("training.disease_column must not be blank"));
        }
        Ok(())
    }
}

/// Settings of the prediction service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Artifact loaded at startup
    pub artifact: PathBuf,
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Allow any origin
    pub cors: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            artifact: PathBuf::from(DEFAULT_ARTIFACT_PATH),
            host: "127.0.0.1".to_string(),
            port: 5001,
            cors: true,
        }
    }
}

impl ServiceConfig {
    /// Sets the artifact path.
    #[must_use]
    pub fn with_artifact(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifact = path.into();
        self
    }

    /// Sets the bind host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the bind port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enables or disables permissive CORS.
    #[must_use]
    pub fn with_cors(mut self, cors: bool) -> Self {
        self.cors = cors;
        self
    }

    /// `host:port` for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Checks that a host is given.
    ///
    /// # Errors
    ///
    /// Returns `Config` for a blank host.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(config_error("service.host must not be blank"));
        }
        Ok(())
    }
}

fn config_error(message: impl Into<String>) -> MedPredictError {
    MedPredictError::Config {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_toml(text: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().expect("create temp file");
        f.write_all(text.as_bytes()).expect("write toml");
        f
    }

    #[test]
    fn test_defaults() {
        let config = MedPredictConfig::default();
        assert_eq!(config.training.disease_column, "Disease");
        assert_eq!(config.training.cv_folds, 5);
        assert_eq!(config.training.random_state, Some(42));
        assert_eq!(config.training.candidates, ClassifierKind::ALL.to_vec());
        assert_eq!(config.service.port, 5001);
        assert!(config.service.cors);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_file_is_default() {
        let config = MedPredictConfig::from_toml_str("").expect("empty toml");
        assert_eq!(config, MedPredictConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let text = r#"
[training]
dataset = "data/symptoms.csv"
noise_probability = 0.1
candidates = ["NaiveBayes", "DecisionTree"]

[service]
port = 8080
"#;
        let f = write_toml(text);
        let config = MedPredictConfig::load(f.path()).expect("valid config");
        assert_eq!(config.training.dataset, PathBuf::from("data/symptoms.csv"));
        assert!((config.training.noise_probability - 0.1).abs() < 1e-12);
        assert_eq!(
            config.training.candidates,
            vec![ClassifierKind::NaiveBayes, ClassifierKind::DecisionTree]
        );
        assert_eq!(config.training.test_size, 0.2);
        assert_eq!(config.service.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_invalid_values_rejected() {
        for text in [
            "[training]\ntest_size = 1.0",
            "[training]\ncv_folds = 1",
            "[training]\nnoise_probability = 2.0",
            "[training]\nn_estimators = 0",
            "[training]\ncandidates = []",
            "[service]\nhost = \" \"",
        ] {
            let err = MedPredictConfig::from_toml_str(text).expect_err(text);
            assert!(matches!(err, MedPredictError::Config { .. }), "{text}");
        }
    }

    #[test]
    fn test_unknown_candidate_rejected() {
        let err = MedPredictConfig::from_toml_str("[training]\ncandidates = [\"Svm\"]")
            .expect_err("unknown variant");
        assert!(matches!(err, MedPredictError::Config { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = MedPredictConfig::load(Path::new("/nonexistent/medpredict.toml"))
            .expect_err("missing file");
        assert!(err.to_string().contains("failed to read config file"));
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = MedPredictConfig {
            training: TrainingConfig::default()
                .with_random_state(None)
                .with_n_estimators(10),
            service: ServiceConfig::default().with_port(9000).with_cors(false),
        };
        let text = config.to_toml().expect("serializable");
        assert_eq!(MedPredictConfig::from_toml_str(&text).expect("valid"), config);
    }

    #[test]
    fn test_perturbation_view() {
        let training = TrainingConfig::default()
            .with_overlap_features(5)
            .with_noise_probability(0.0)
            .with_random_state(Some(7));
        let p = training.perturbation();
        assert_eq!(p.overlap_features, 5);
        assert_eq!(p.noise_probability, 0.0);
        assert_eq!(p.random_state, Some(7));
    }
}
