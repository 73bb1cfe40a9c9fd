//! Prediction service scenarios at the public API boundary.

use medpredict::prelude::*;
use medpredict::ErrorCategory;
use serde_json::json;

fn clinic_dataset() -> Dataset {
    let mut records = Vec::new();
    for _ in 0..10 {
        records.push(Record::new(["fever", "cough", "body_ache"], "Flu"));
        records.push(Record::new(["headache", "nausea", "light_sensitivity"], "Migraine"));
        records.push(Record::new(["itching", "skin_rash"], "Fungal infection"));
    }
    Dataset::from_records(records, "clinic")
}

fn ready_service() -> PredictionService {
    let config = TrainingConfig::default()
        .with_overlap_features(0)
        .with_noise_probability(0.0)
        .with_n_estimators(5);
    let outcome = train(&clinic_dataset(), &config).expect("separable data");
    PredictionService::from_artifact(outcome.artifact)
}

#[test]
fn test_encoding_scenarios() {
    let vocab = Vocabulary::from_ordered(vec![
        "fever".to_string(),
        "cough".to_string(),
        "headache".to_string(),
    ])
    .expect("valid tokens");
    assert_eq!(encode_raw(&["Fever", "Cough "], &vocab).as_slice(), &[1, 1, 0]);
    assert_eq!(encode_raw(&["unknown_symptom"], &vocab).as_slice(), &[0, 0, 0]);
}

#[test]
fn test_predicts_each_disease() {
    let service = ready_service();
    assert_eq!(
        service
            .predict(&["Fever", "Cough ", "body ache"])
            .expect("ready"),
        "Flu"
    );
    assert_eq!(
        service
            .predict(&["light sensitivity", "HEADACHE", "Nausea"])
            .expect("ready"),
        "Migraine"
    );
    assert_eq!(
        service.predict(&["itching, skin rash"]).expect("ready"),
        "Fungal infection"
    );
}

#[test]
fn test_empty_input_is_invalid() {
    let err = ready_service().predict::<String>(&[]).expect_err("empty");
    assert!(matches!(err, MedPredictError::InvalidInput { .. }));
    assert_eq!(err.category(), ErrorCategory::InvalidInput);
    assert_eq!(err.category().status_code(), 400);
}

#[test]
fn test_only_unknown_symptoms_still_answers() {
    let prediction = ready_service()
        .predict(&["unknown_symptom"])
        .expect("unknown tokens are ignored");
    assert!(["Flu", "Migraine", "Fungal infection"].contains(&prediction.as_str()));
}

#[test]
fn test_failed_load_makes_every_predict_unavailable() {
    let dir = tempfile::tempdir().expect("temp dir");
    let corrupt = dir.path().join("model.bin");
    std::fs::write(&corrupt, b"MDPR\x01\x00garbage").expect("write");

    for service in [
        PredictionService::load(dir.path().join("missing.bin")),
        PredictionService::load(&corrupt),
    ] {
        assert!(!service.is_ready());
        for input in [vec!["fever"], vec![], vec!["cough", "headache"]] {
            let err = service.predict(&input).expect_err("unloaded");
            assert!(matches!(err, MedPredictError::ModelUnavailable { .. }));
            assert_eq!(err.category().status_code(), 500);
        }
        assert!(matches!(
            service.symptoms(),
            Err(MedPredictError::ModelUnavailable { .. })
        ));
    }
}

#[test]
fn test_boundary_responses() {
    let service = ready_service();

    let ok = respond(service.predict_value(&json!({"symptoms": ["fever", "cough", "body_ache"]})));
    assert_eq!(ok.status_code(), 200);
    assert_eq!(
        serde_json::to_value(&ok).expect("json"),
        json!({"success": true, "prediction": "Flu"})
    );

    let bad = respond(service.predict_value(&json!({"symptoms": "fever"})));
    assert_eq!(bad.status_code(), 400);
    assert_eq!(
        serde_json::to_value(&bad).expect("json"),
        json!({"success": false, "error": "invalid input: 'symptoms' must be a list"})
    );
}

#[test]
fn test_concurrent_predictions_share_one_artifact() {
    let service = ready_service();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let service = service.clone();
            std::thread::spawn(move || service.predict(&["itching", "skin rash"]).expect("ready"))
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().expect("thread"), "Fungal infection");
    }
}
