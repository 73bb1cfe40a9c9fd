//! Offline pipeline: candidate fitting and cross-validated selection.
//!
//! [`train`] runs the whole pipeline on a dataset: vocabulary and disease
//! map, encoding, a stratified train/evaluation split, perturbation, then
//! [`fit_candidates`] over the configured classifier families. The winner
//! is the candidate with the highest mean cross-validated accuracy; on a tie
//! the earlier candidate stays. Candidates that fail to fit or fail any fold
//! are logged and left out of the race.

use crate::artifact::ModelArtifact;
use crate::config::TrainingConfig;
use crate::dataset::Dataset;
use crate::encoder::encode_rows;
use crate::error::{MedPredictError, Result};
use crate::model_selection::{cross_validate, extract_samples, split_indices, KFold};
use crate::perturb::{perturb_evaluation, perturb_training};
use crate::primitives::Matrix;
use crate::traits::Classifier;
use crate::vocabulary::{DiseaseMap, Vocabulary};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Scores of a candidate that trained successfully.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScores {
    /// Accuracy of the fully trained model on the evaluation set
    pub test_accuracy: f32,
    /// Mean accuracy over the cross-validation folds
    pub cv_mean: f32,
    /// Population standard deviation of the fold accuracies
    pub cv_std: f32,
    /// Per-fold accuracies
    pub cv_scores: Vec<f32>,
}

/// What happened to one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CandidateOutcome {
    /// Trained and scored
    Scored(CandidateScores),
    /// Excluded from selection
    Failed {
        /// Error that excluded it
        reason: String,
    },
}

/// One row of the training report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateReport {
    /// Classifier name
    pub name: String,
    /// Scores or failure reason
    pub outcome: CandidateOutcome,
}

impl CandidateReport {
    /// Scores, if the candidate trained.
    pub fn scores(&self) -> Option<&CandidateScores> {
        match &self.outcome {
            CandidateOutcome::Scored(scores) => Some(scores),
            CandidateOutcome::Failed { .. } => None,
        }
    }
}

/// Index of the best scored candidate.
///
/// Highest `cv_mean` wins; a later candidate must be strictly better to
/// replace an earlier one. `None` when every candidate failed.
///
/// # Examples
///
/// ```
/// use medpredict::trainer::{select_best, CandidateOutcome, CandidateReport, CandidateScores};
///
/// let report = |name: &str, cv_mean: f32| CandidateReport {
///     name: name.to_string(),
///     outcome: CandidateOutcome::Scored(CandidateScores {
///         test_accuracy: cv_mean,
///         cv_mean,
///         cv_std: 0.0,
///         cv_scores: vec![cv_mean],
///     }),
/// };
/// let reports = [report("A", 0.81), report("B", 0.79), report("C", 0.81)];
/// assert_eq!(select_best(&reports), Some(0));
/// ```
pub fn select_best(reports: &[CandidateReport]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, report) in reports.iter().enumerate() {
        let Some(scores) = report.scores() else {
            continue;
        };
        match best {
            Some((_, best_mean)) if scores.cv_mean <= best_mean => {}
            _ => best = Some((idx, scores.cv_mean)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Result of fitting a candidate list.
#[derive(Debug, Clone)]
pub struct Selection<C> {
    /// The winning model, fitted on the whole training set
    pub model: C,
    /// Position of the winner in the candidate list
    pub index: usize,
    /// One report per candidate, in candidate order
    pub reports: Vec<CandidateReport>,
}

/// Fits and scores every candidate, then keeps the best.
///
/// # Errors
///
/// Returns `TrainingFailed` if every candidate failed.
pub fn fit_candidates<C>(
    candidates: Vec<C>,
    x_train: &Matrix<f32>,
    y_train: &[usize],
    x_test: &Matrix<f32>,
    y_test: &[usize],
    cv: &KFold,
) -> Result<Selection<C>>
where
    C: Classifier + Clone,
{
    let mut fitted: Vec<Option<C>> = Vec::with_capacity(candidates.len());
    let mut reports = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let name = candidate.name();
        match evaluate_candidate(candidate, x_train, y_train, x_test, y_test, cv) {
            Ok((model, scores)) => {
                info!(
                    model = name,
                    test_accuracy = scores.test_accuracy,
                    cv_mean = scores.cv_mean,
                    cv_std = scores.cv_std,
                    "candidate scored"
                );
                fitted.push(Some(model));
                reports.push(CandidateReport {
                    name: name.to_string(),
                    outcome: CandidateOutcome::Scored(scores),
                });
            }
            Err(e) => {
                warn!(model = name, error = %e, "candidate excluded");
                fitted.push(None);
                reports.push(CandidateReport {
                    name: name.to_string(),
                    outcome: CandidateOutcome::Failed {
                        reason: e.to_string(),
                    },
                });
            }
        }
    }

    let index = select_best(&reports).ok_or_else(|| {
        let reasons: Vec<String> = reports
            .iter()
            .filter_map(|r| match &r.outcome {
                CandidateOutcome::Failed { reason } => Some(format!("{}: {reason}", r.name)),
                CandidateOutcome::Scored(_) => None,
            })
            .collect();
        if reasons.is_empty() {
            MedPredictError::training_failed("no candidate classifiers configured")
        } else {
            MedPredictError::training_failed(format!(
                "every candidate failed ({})",
                reasons.join("; ")
            ))
        }
    })?;

    let model = fitted
        .swap_remove(index)
        .ok_or_else(|| MedPredictError::training_failed("selected candidate has no model"))?;

    Ok(Selection {
        model,
        index,
        reports,
    })
}

fn evaluate_candidate<C>(
    mut candidate: C,
    x_train: &Matrix<f32>,
    y_train: &[usize],
    x_test: &Matrix<f32>,
    y_test: &[usize],
    cv: &KFold,
) -> Result<(C, CandidateScores)>
where
    C: Classifier + Clone,
{
    let cv_result = cross_validate(&candidate, x_train, y_train, cv)?;
    candidate.fit(x_train, y_train)?;
    let test_accuracy = candidate.score(x_test, y_test)?;
    Ok((
        candidate,
        CandidateScores {
            test_accuracy,
            cv_mean: cv_result.mean(),
            cv_std: cv_result.std(),
            cv_scores: cv_result.scores,
        },
    ))
}

/// Summary of a training run, stored in the artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    /// Name of the selected classifier
    pub selected: String,
    /// Every candidate, in evaluation order
    pub candidates: Vec<CandidateReport>,
    /// Rows used for fitting and cross-validation
    pub training_rows: usize,
    /// Rows held out for the test accuracy
    pub evaluation_rows: usize,
    /// Vocabulary length
    pub n_features: usize,
    /// Number of diseases
    pub n_classes: usize,
    /// Seed the run used
    pub random_state: Option<u64>,
}

impl TrainingReport {
    /// Scores of the selected candidate.
    pub fn selected_scores(&self) -> Option<&CandidateScores> {
        self.candidates
            .iter()
            .find(|c| c.name == self.selected)
            .and_then(CandidateReport::scores)
    }
}

/// Everything a training run produces.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// Validated artifact, ready to save
    pub artifact: ModelArtifact,
    /// Copy of the report stored in the artifact
    pub report: TrainingReport,
}

/// Runs the whole offline pipeline on `dataset`.
///
/// # Errors
///
/// - `Config` for out-of-range settings
/// - `EmptyVocabulary` when the dataset has no symptoms
/// - `TrainingFailed` when the split is degenerate or every candidate fails
pub fn train(dataset: &Dataset, config: &TrainingConfig) -> Result<TrainingOutcome> {
    config.validate()?;

    let vocabulary = Vocabulary::from_dataset(dataset)?;
    let disease_map = DiseaseMap::from_dataset(dataset)?;
    let labels = disease_map.labels(dataset)?;
    let features = encode_rows(dataset.records(), &vocabulary);
    info!(
        source = dataset.source(),
        rows = dataset.len(),
        symptoms = vocabulary.len(),
        diseases = disease_map.len(),
        "encoded dataset"
    );

    let split = split_indices(&labels, config.test_size, config.random_state)?;
    let (mut x_train, y_train) = extract_samples(&features, &labels, &split.train);
    let (mut x_test, y_test) = extract_samples(&features, &labels, &split.test);

    let perturbation = config.perturbation();
    let mut rng = perturbation.rng();
    perturb_training(&mut x_train, &y_train, &perturbation, &mut rng)?;
    perturb_evaluation(&mut x_test, &perturbation, &mut rng)?;
    info!(
        training_rows = y_train.len(),
        evaluation_rows = y_test.len(),
        overlap_features = perturbation.overlap_features,
        noise_probability = perturbation.noise_probability,
        "perturbed training data"
    );

    let kfold = match config.random_state {
        Some(seed) => KFold::new(config.cv_folds).with_random_state(seed),
        None => KFold::new(config.cv_folds).with_shuffle(true),
    };
    let candidates = config
        .candidates
        .iter()
        .map(|kind| kind.build(config.n_estimators, config.random_state))
        .collect();

    let selection = fit_candidates(candidates, &x_train, &y_train, &x_test, &y_test, &kfold)?;
    let report = TrainingReport {
        selected: selection.model.name().to_string(),
        candidates: selection.reports,
        training_rows: y_train.len(),
        evaluation_rows: y_test.len(),
        n_features: vocabulary.len(),
        n_classes: disease_map.len(),
        random_state: config.random_state,
    };
    info!(selected = %report.selected, "selected classifier");

    let artifact = ModelArtifact::new(selection.model, vocabulary, disease_map, report.clone())?;
    Ok(TrainingOutcome { artifact, report })
}
