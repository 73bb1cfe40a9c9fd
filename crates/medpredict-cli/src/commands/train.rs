//! Train command implementation
//!
//! Reads a labeled CSV, runs the perturbed training pipeline, selects the
//! best candidate by cross-validated accuracy and writes the artifact.

use crate::error::{CliError, Result};
use crate::output;
use clap::Args;
use colored::Colorize;
use medpredict::candidate::ClassifierKind;
use medpredict::config::TrainingConfig;
use medpredict::dataset::Dataset;
use medpredict::trainer::{train, CandidateOutcome, TrainingReport};
use std::path::PathBuf;

/// Flags of `medpredict train`; each one overrides the config file.
#[derive(Args, Debug, Default)]
pub(crate) struct TrainArgs {
    /// Labeled CSV dataset
    #[arg(short, long, value_name = "CSV")]
    pub dataset: Option<PathBuf>,

    /// Name of the disease column
    #[arg(long)]
    pub disease_column: Option<String>,

    /// Where to write the model artifact
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Held-out fraction for the test accuracy
    #[arg(long)]
    pub test_size: Option<f32>,

    /// Cross-validation folds
    #[arg(long)]
    pub cv_folds: Option<usize>,

    /// Symptom columns shared per class by overlap injection
    #[arg(long)]
    pub overlap: Option<usize>,

    /// Per-cell noise flip probability
    #[arg(long)]
    pub noise: Option<f64>,

    /// Random seed
    #[arg(long, conflicts_with = "no_seed")]
    pub seed: Option<u64>,

    /// Use OS entropy instead of a fixed seed
    #[arg(long)]
    pub no_seed: bool,

    /// Trees in the random forest
    #[arg(long)]
    pub estimators: Option<usize>,

    /// Candidate classifiers in evaluation order (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub candidates: Option<Vec<String>>,
}

impl TrainArgs {
    /// Layers the flags over `base`.
    pub(crate) fn apply(self, mut base: TrainingConfig) -> Result<TrainingConfig> {
        if let Some(path) = self.dataset {
            base = base.with_dataset(path);
        }
        if let Some(column) = self.disease_column {
            base = base.with_disease_column(column);
        }
        if let Some(path) = self.output {
            base = base.with_artifact(path);
        }
        if let Some(test_size) = self.test_size {
            base = base.with_test_size(test_size);
        }
        if let Some(folds) = self.cv_folds {
            base = base.with_cv_folds(folds);
        }
        if let Some(k) = self.overlap {
            base = base.with_overlap_features(k);
        }
        if let Some(p) = self.noise {
            base = base.with_noise_probability(p);
        }
        if let Some(seed) = self.seed {
            base = base.with_random_state(Some(seed));
        }
        if self.no_seed {
            base = base.with_random_state(None);
        }
        if let Some(n) = self.estimators {
            base = base.with_n_estimators(n);
        }
        if let Some(names) = self.candidates {
            let kinds = names
                .iter()
                .map(|name| name.parse::<ClassifierKind>())
                .collect::<medpredict::Result<Vec<_>>>()?;
            base = base.with_candidates(kinds);
        }
        base.validate()?;
        Ok(base)
    }
}

/// Run the train command
pub(crate) fn run(config: &TrainingConfig, json: bool) -> Result<()> {
    if !config.dataset.is_file() {
        return Err(CliError::FileNotFound(config.dataset.clone()));
    }

    let dataset = Dataset::from_csv_path(&config.dataset, &config.disease_column)?;
    let outcome = train(&dataset, config)?;
    outcome.artifact.save(&config.artifact)?;

    if json {
        return output::json(&outcome.report);
    }

    output::section("Dataset");
    output::kv("Source", config.dataset.display());
    output::kv("Layout", dataset.layout());
    output::kv("Records", dataset.len());
    output::kv("Symptoms", outcome.report.n_features);
    output::kv("Diseases", outcome.report.n_classes);

    print_candidates(&outcome.report);

    output::section("Artifact");
    output::kv("Path", config.artifact.display());
    output::success(&format!("Selected {}", outcome.report.selected));
    Ok(())
}

fn print_candidates(report: &TrainingReport) {
    output::section("Candidates");
    output::kv(
        "Rows",
        format!(
            "{} training / {} evaluation",
            report.training_rows, report.evaluation_rows
        ),
    );
    for candidate in &report.candidates {
        let marker = if candidate.name == report.selected {
            "*".green().bold()
        } else {
            " ".normal()
        };
        match &candidate.outcome {
            CandidateOutcome::Scored(scores) => println!(
                "  {marker} {:<14} cv {:.4} ± {:.4}  test {:.4}",
                candidate.name, scores.cv_mean, scores.cv_std, scores.test_accuracy
            ),
            CandidateOutcome::Failed { reason } => {
                output::fail(&format!("{} excluded: {reason}", candidate.name));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use medpredict::artifact::ModelArtifact;
    use std::io::Write;

    #[test]
    fn test_apply_overrides() {
        let args = TrainArgs {
            dataset: Some(PathBuf::from("data.csv")),
            noise: Some(0.0),
            seed: Some(7),
            candidates: Some(vec!["nb".to_string(), "tree".to_string()]),
            ..TrainArgs::default()
        };
        let config = args.apply(TrainingConfig::default()).expect("valid flags");
        assert_eq!(config.dataset, PathBuf::from("data.csv"));
        assert_eq!(config.noise_probability, 0.0);
        assert_eq!(config.random_state, Some(7));
        assert_eq!(
            config.candidates,
            vec![ClassifierKind::NaiveBayes, ClassifierKind::DecisionTree]
        );
        // Untouched keys keep the base value
        assert_eq!(config.cv_folds, 5);
    }

    #[test]
    fn test_apply_no_seed() {
        let args = TrainArgs {
            no_seed: true,
            ..TrainArgs::default()
        };
        let config = args.apply(TrainingConfig::default()).expect("valid flags");
        assert_eq!(config.random_state, None);
    }

    #[test]
    fn test_apply_rejects_bad_values() {
        let args = TrainArgs {
            noise: Some(1.5),
            ..TrainArgs::default()
        };
        assert!(matches!(
            args.apply(TrainingConfig::default()),
            Err(CliError::Config(_))
        ));

        let args = TrainArgs {
            candidates: Some(vec!["svm".to_string()]),
            ..TrainArgs::default()
        };
        assert!(matches!(
            args.apply(TrainingConfig::default()),
            Err(CliError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_run_missing_dataset() {
        let config = TrainingConfig::default().with_dataset("/nonexistent/data.csv");
        assert!(matches!(
            run(&config, true),
            Err(CliError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_run_writes_artifact() {
        let dir = tempfile::tempdir().expect("temp dir");
        let csv_path = dir.path().join("dataset.csv");
        let mut csv = std::fs::File::create(&csv_path).expect("create csv");
        writeln!(csv, "Disease,Symptom_1,Symptom_2").expect("header");
        for _ in 0..8 {
            writeln!(csv, "Flu,fever,headache").expect("row");
            writeln!(csv, "Cold,sneezing,cough").expect("row");
        }
        drop(csv);

        let artifact_path = dir.path().join("model.bin");
        let config = TrainingConfig::default()
            .with_dataset(&csv_path)
            .with_artifact(&artifact_path)
            .with_n_estimators(3);
        run(&config, true).expect("trains");

        let artifact = ModelArtifact::load(&artifact_path).expect("artifact written");
        assert_eq!(artifact.vocabulary().len(), 4);
        assert_eq!(artifact.disease_map().names(), &["Cold", "Flu"]);
    }
}
