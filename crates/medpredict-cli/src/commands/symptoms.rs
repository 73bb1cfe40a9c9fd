//! Symptoms command implementation
//!
//! Lists the vocabulary a model was trained on, in readable form.

use crate::error::Result;
use crate::output;
use medpredict::service::PredictionService;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct SymptomsResponse<'a> {
    success: bool,
    symptoms: &'a [String],
}

/// Run the symptoms command
pub(crate) fn run(model: &Path, json: bool) -> Result<()> {
    let service = PredictionService::load(model);
    let symptoms = service.symptoms()?;

    if json {
        return output::json(&SymptomsResponse {
            success: true,
            symptoms: &symptoms,
        });
    }

    output::section("Symptoms");
    output::kv("Model", model.display());
    output::kv("Count", symptoms.len());
    println!();
    for symptom in &symptoms {
        println!("  {symptom}");
    }
    Ok(())
}
