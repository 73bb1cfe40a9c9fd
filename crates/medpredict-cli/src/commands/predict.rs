//! Predict command implementation

use crate::error::{CliError, Result};
use crate::output;
use colored::Colorize;
use medpredict::service::{respond, PredictionService};
use std::path::Path;

/// Run the predict command
pub(crate) fn run(model: &Path, symptoms: &[String], json: bool) -> Result<()> {
    let service = PredictionService::load(model);
    run_with(&service, symptoms, json)
}

fn run_with(service: &PredictionService, symptoms: &[String], json: bool) -> Result<()> {
    let response = respond(service.predict(symptoms));
    if json {
        output::json(&response)?;
    } else if let Some(prediction) = &response.prediction {
        println!("{}", prediction.green().bold());
    }
    match CliError::from_response(&response) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::trained_artifact;

    #[test]
    fn test_predicts_with_ready_service() {
        let service = PredictionService::from_artifact(trained_artifact());
        let symptoms = vec!["Fever".to_string(), "headache".to_string()];
        assert!(run_with(&service, &symptoms, false).is_ok());
    }

    #[test]
    fn test_empty_symptoms_rejected() {
        let service = PredictionService::from_artifact(trained_artifact());
        assert!(matches!(
            run_with(&service, &[], true),
            Err(CliError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_missing_model() {
        let symptoms = vec!["fever".to_string()];
        let err = run(Path::new("/nonexistent/model.bin"), &symptoms, false)
            .expect_err("no model");
        assert!(matches!(err, CliError::ModelUnavailable(_)));
    }
}
