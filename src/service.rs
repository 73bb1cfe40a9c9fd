//! Online prediction service.
//!
//! The service loads its artifact once. A failed load leaves it
//! [`PredictionService::Unloaded`] for the rest of the process and every
//! request then fails with `ModelUnavailable`; there is no retry. A
//! [`PredictionService::Ready`] service holds the artifact behind an `Arc`
//! and needs no locking, so clones can serve concurrent requests.

use crate::artifact::ModelArtifact;
use crate::encoder::encode_raw;
use crate::error::{ErrorCategory, MedPredictError, Result};
use crate::traits::Classifier;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Prediction service state.
#[derive(Debug, Clone)]
pub enum PredictionService {
    /// The artifact could not be loaded.
    Unloaded {
        /// Why loading failed
        reason: String,
    },
    /// Serving from a validated artifact.
    Ready(Arc<ModelArtifact>),
}

impl PredictionService {
    /// Loads the artifact at `path`.
    ///
    /// Never fails: a load error is logged and yields `Unloaded`.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match ModelArtifact::load(path) {
            Ok(artifact) => {
                info!(
                    path = %path.display(),
                    model = artifact.selected(),
                    symptoms = artifact.vocabulary().len(),
                    diseases = artifact.disease_map().len(),
                    "prediction service ready"
                );
                Self::Ready(Arc::new(artifact))
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to load model artifact");
                Self::Unloaded {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Serves an in-memory artifact.
    pub fn from_artifact(artifact: ModelArtifact) -> Self {
        Self::Ready(Arc::new(artifact))
    }

    /// True once an artifact is loaded.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// The loaded artifact.
    ///
    /// # Errors
    ///
    /// Returns `ModelUnavailable` when unloaded.
    pub fn artifact(&self) -> Result<&ModelArtifact> {
        match self {
            Self::Ready(artifact) => Ok(artifact.as_ref()),
            Self::Unloaded { reason } => Err(MedPredictError::model_unavailable(format!(
                "Model not loaded ({reason})"
            ))),
        }
    }

    /// Predicts a disease name from raw symptom strings.
    ///
    /// Entries are normalized and may hold several symptoms joined by
    /// `,`, `;` or `|`. Unknown symptoms are ignored.
    ///
    /// # Errors
    ///
    /// - `ModelUnavailable` when unloaded
    /// - `InvalidInput` for an empty list
    /// - `PredictionFailed` if the classifier fails or emits an unmapped label
    pub fn predict<S: AsRef<str>>(&self, symptoms: &[S]) -> Result<String> {
        let artifact = self.artifact()?;
        if symptoms.is_empty() {
            return Err(MedPredictError::invalid_input(
                "'symptoms' must be a non-empty list",
            ));
        }

        let features = encode_raw(symptoms, artifact.vocabulary());
        debug!(
            given = symptoms.len(),
            matched = features.n_present(),
            "encoded prediction request"
        );

        let labels = artifact
            .classifier()
            .predict(&features.to_matrix())
            .map_err(|e| MedPredictError::PredictionFailed {
                message: e.to_string(),
            })?;
        let label = labels
            .first()
            .copied()
            .ok_or_else(|| MedPredictError::PredictionFailed {
                message: "classifier returned no prediction".to_string(),
            })?;

        artifact
            .disease_map()
            .name_of(label)
            .map(str::to_string)
            .ok_or_else(|| MedPredictError::PredictionFailed {
                message: format!("label {label} is not in the disease map"),
            })
    }

    /// Predicts from an untyped request body `{"symptoms": [...]}`.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `symptoms` is missing, not an array, empty, or has
    /// non-string items; otherwise as [`PredictionService::predict`].
    pub fn predict_value(&self, body: &serde_json::Value) -> Result<String> {
        // Availability is reported before input problems
        self.artifact()?;
        let items = body
            .get("symptoms")
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| MedPredictError::invalid_input("'symptoms' must be a list"))?;
        let symptoms = items
            .iter()
            .map(|item| {
                item.as_str().ok_or_else(|| {
                    MedPredictError::invalid_input("'symptoms' must contain only strings")
                })
            })
            .collect::<Result<Vec<&str>>>()?;
        self.predict(&symptoms)
    }

    /// The vocabulary in readable form (`skin_rash` as `Skin Rash`).
    ///
    /// # Errors
    ///
    /// Returns `ModelUnavailable` when unloaded.
    pub fn symptoms(&self) -> Result<Vec<String>> {
        Ok(self.artifact()?.vocabulary().readable())
    }
}

/// Boundary response shared by the CLI and the HTTP surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Whether a prediction was made
    pub success: bool,
    /// Predicted disease name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction: Option<String>,
    /// Error message on failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Error category on failure
    #[serde(skip)]
    pub category: Option<ErrorCategory>,
}

impl PredictionResponse {
    /// HTTP status for this response.
    pub fn status_code(&self) -> u16 {
        self.category.map_or(200, ErrorCategory::status_code)
    }
}

/// Converts a prediction result into the boundary response.
pub fn respond(result: Result<String>) -> PredictionResponse {
    match result {
        Ok(prediction) => PredictionResponse {
            success: true,
            prediction: Some(prediction),
            error: None,
            category: None,
        },
        Err(e) => PredictionResponse {
            success: false,
            prediction: None,
            error: Some(e.to_string()),
            category: Some(e.category()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::ClassifierKind;
    use crate::primitives::Matrix;
    use crate::trainer::TrainingReport;
    use crate::vocabulary::{DiseaseMap, Vocabulary};
    use serde_json::json;

    /// Vocabulary cough, fever, headache, sneezing. Cold is sneezing and
    /// cough, Flu is fever and headache.
    fn ready() -> PredictionService {
        let vocabulary =
            Vocabulary::from_tokens(["fever", "cough", "headache", "sneezing"]).expect("tokens");
        let diseases = DiseaseMap::from_names(["Cold", "Flu"]).expect("names");
        let x = Matrix::from_vec(
            4,
            4,
            vec![
                1.0, 0.0, 0.0, 1.0, //
                1.0, 0.0, 0.0, 1.0, //
                0.0, 1.0, 1.0, 0.0, //
                0.0, 1.0, 1.0, 0.0,
            ],
        )
        .expect("4x4");
        let mut model = ClassifierKind::DecisionTree.build(1, Some(42));
        model.fit(&x, &[0, 0, 1, 1]).expect("two classes");
        let report = TrainingReport {
            selected: "DecisionTree".to_string(),
            candidates: Vec::new(),
            training_rows: 4,
            evaluation_rows: 0,
            n_features: 4,
            n_classes: 2,
            random_state: Some(42),
        };
        let artifact =
            ModelArtifact::new(model, vocabulary, diseases, report).expect("consistent bundle");
        PredictionService::from_artifact(artifact)
    }

    fn unloaded() -> PredictionService {
        PredictionService::Unloaded {
            reason: "missing file".to_string(),
        }
    }

    #[test]
    fn test_predict_ready() {
        let service = ready();
        assert!(service.is_ready());
        assert_eq!(service.predict(&["Fever", "HEADACHE "]).expect("ready"), "Flu");
        assert_eq!(service.predict(&["sneezing, cough"]).expect("ready"), "Cold");
    }

    #[test]
    fn test_predict_unknown_symptoms_still_predicts() {
        let prediction = ready().predict(&["unknown_symptom"]).expect("ready");
        assert!(prediction == "Cold" || prediction == "Flu");
    }

    #[test]
    fn test_empty_input_is_invalid() {
        let err = ready().predict::<&str>(&[]).expect_err("empty");
        assert!(matches!(err, MedPredictError::InvalidInput { .. }));
    }

    #[test]
    fn test_unloaded_rejects_everything() {
        let service = unloaded();
        assert!(!service.is_ready());
        for err in [
            service.predict(&["fever"]).expect_err("unloaded"),
            service.predict::<&str>(&[]).expect_err("unloaded"),
            service.symptoms().expect_err("unloaded"),
            service.predict_value(&json!({})).expect_err("unloaded"),
        ] {
            assert!(matches!(err, MedPredictError::ModelUnavailable { .. }));
        }
    }

    #[test]
    fn test_load_missing_file_is_unloaded() {
        let service = PredictionService::load("/nonexistent/model.bin");
        assert!(!service.is_ready());
        assert!(matches!(
            service.predict(&["fever"]),
            Err(MedPredictError::ModelUnavailable { .. })
        ));
    }

    #[test]
    fn test_predict_value_validation() {
        let service = ready();
        for body in [
            json!({}),
            json!({"symptoms": "fever"}),
            json!({"symptoms": []}),
            json!({"symptoms": ["fever", 3]}),
        ] {
            let err = service.predict_value(&body).expect_err("invalid body");
            assert!(matches!(err, MedPredictError::InvalidInput { .. }), "{body}");
        }
        assert_eq!(
            service
                .predict_value(&json!({"symptoms": ["fever", "headache"]}))
                .expect("valid body"),
            "Flu"
        );
    }

    #[test]
    fn test_symptoms_are_readable() {
        assert_eq!(
            ready().symptoms().expect("ready"),
            vec!["Cough", "Fever", "Headache", "Sneezing"]
        );
    }

    #[test]
    fn test_respond_statuses() {
        let ok = respond(Ok("Flu".to_string()));
        assert!(ok.success);
        assert_eq!(ok.status_code(), 200);
        assert_eq!(
            serde_json::to_value(&ok).expect("json"),
            json!({"success": true, "prediction": "Flu"})
        );

        let bad = respond(ready().predict::<&str>(&[]));
        assert_eq!(bad.status_code(), 400);
        assert!(!bad.success);

        let down = respond(unloaded().predict(&["fever"]));
        assert_eq!(down.status_code(), 500);
        let body = serde_json::to_value(&down).expect("json");
        assert_eq!(body["success"], json!(false));
        assert!(body["error"].as_str().expect("message").contains("Model not loaded"));
    }
}
