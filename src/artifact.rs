//! Persisted model bundle.
//!
//! Layout on disk:
//!
//! ```text
//! ┌──────────┬────────────────┬──────────────────────────┐
//! │ "MDPR"   │ version (u16le)│ bincode(ModelArtifact)   │
//! └──────────┴────────────────┴──────────────────────────┘
//! ```
//!
//! Saving writes to a temporary file in the destination directory and
//! renames it over the target, so readers never see a partial artifact.

use crate::candidate::ClassifierModel;
use crate::error::{MedPredictError, Result};
use crate::normalize::NORMALIZATION_VERSION;
use crate::trainer::TrainingReport;
use crate::traits::Classifier;
use crate::vocabulary::{DiseaseMap, Vocabulary};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::NamedTempFile;
use tracing::info;

/// Magic number: "MDPR" in ASCII
pub const MAGIC: [u8; 4] = *b"MDPR";

/// Current artifact format version
pub const FORMAT_VERSION: u16 = 1;

/// A trained classifier with everything needed to serve it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    format_version: u16,
    normalization_version: u32,
    classifier: ClassifierModel,
    vocabulary: Vocabulary,
    disease_map: DiseaseMap,
    report: TrainingReport,
    created_at: u64,
}

impl ModelArtifact {
    /// Bundles a fitted classifier with its vocabulary and disease map.
    ///
    /// # Errors
    ///
    /// Fails if the bundle is inconsistent, see [`ModelArtifact::validate`].
    pub fn new(
        classifier: ClassifierModel,
        vocabulary: Vocabulary,
        disease_map: DiseaseMap,
        report: TrainingReport,
    ) -> Result<Self> {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let artifact = Self {
            format_version: FORMAT_VERSION,
            normalization_version: NORMALIZATION_VERSION,
            classifier,
            vocabulary,
            disease_map,
            report,
            created_at,
        };
        artifact.validate()?;
        Ok(artifact)
    }

    /// Checks that the classifier reads exactly one column per vocabulary
    /// token and that the labels it can emit are exactly the disease map's
    /// labels `0..disease_map.len()`.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` for a width mismatch and `Other` for an
    /// unfitted classifier, an unmapped class or an unreachable disease.
    pub fn validate(&self) -> Result<()> {
        let width = self
            .classifier
            .n_features()
            .ok_or("artifact classifier is not fitted")?;
        if width != self.vocabulary.len() {
            return Err(MedPredictError::dimension_mismatch(
                "vocabulary",
                self.vocabulary.len(),
                width,
            ));
        }
        let classes = self.classifier.classes();
        if !classes.iter().copied().eq(0..self.disease_map.len()) {
            return Err(format!(
                "classifier emits labels {classes:?} but the disease map names labels 0..{}",
                self.disease_map.len()
            )
            .into());
        }
        Ok(())
    }

    /// Writes the artifact atomically to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Serialization` on failure; `path` is untouched then.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.validate()?;
        let path = path.as_ref();
        let parent_dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent_dir)?;

        let mut temp_file = NamedTempFile::new_in(parent_dir)?;
        {
            let mut writer = BufWriter::new(temp_file.as_file_mut());
            self.write_to(&mut writer)?;
            writer.flush()?;
        }
        temp_file.as_file().sync_all()?;
        temp_file.persist(path).map_err(|e| e.error)?;

        info!(
            path = %path.display(),
            selected = %self.report.selected,
            symptoms = self.vocabulary.len(),
            diseases = self.disease_map.len(),
            "saved model artifact"
        );
        Ok(())
    }

    /// Reads and validates an artifact.
    ///
    /// # Errors
    ///
    /// Every failure (missing file, bad magic, version skew, corrupt body,
    /// inconsistent bundle) is reported as `ModelUnavailable`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let unavailable =
            |e: MedPredictError| MedPredictError::model_unavailable(format!("{}: {e}", path.display()));

        let file = File::open(path).map_err(|e| unavailable(e.into()))?;
        let artifact = Self::read_from(BufReader::new(file)).map_err(unavailable)?;
        info!(
            path = %path.display(),
            selected = %artifact.report.selected,
            created_at = artifact.created_at,
            "loaded model artifact"
        );
        Ok(artifact)
    }

    /// Serializes header and body into `writer`.
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Serialization` on failure.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&MAGIC)?;
        writer.write_all(&self.format_version.to_le_bytes())?;
        bincode::serialize_into(&mut writer, self)?;
        Ok(())
    }

    /// Parses header and body from `reader`, then validates.
    ///
    /// # Errors
    ///
    /// Returns `ModelUnavailable` on bad magic or version skew, and
    /// `Serialization` for a corrupt body.
    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(MedPredictError::model_unavailable("not a model artifact"));
        }
        let mut version = [0u8; 2];
        reader.read_exact(&mut version)?;
        let version = u16::from_le_bytes(version);
        if version != FORMAT_VERSION {
            return Err(MedPredictError::model_unavailable(format!(
                "artifact format version {version}, expected {FORMAT_VERSION}"
            )));
        }

        let artifact: Self = bincode::deserialize_from(reader)?;
        if artifact.normalization_version != NORMALIZATION_VERSION {
            return Err(MedPredictError::model_unavailable(format!(
                "artifact normalization version {}, expected {NORMALIZATION_VERSION}",
                artifact.normalization_version
            )));
        }
        artifact.validate()?;
        Ok(artifact)
    }

    /// The fitted classifier.
    pub fn classifier(&self) -> &ClassifierModel {
        &self.classifier
    }

    /// Vocabulary the classifier was trained against.
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Label to disease name mapping.
    pub fn disease_map(&self) -> &DiseaseMap {
        &self.disease_map
    }

    /// Report of the training run.
    pub fn report(&self) -> &TrainingReport {
        &self.report
    }

    /// Name of the selected classifier.
    pub fn selected(&self) -> &str {
        &self.report.selected
    }

    /// Rows the classifier was fitted on.
    pub fn training_rows(&self) -> usize {
        self.report.training_rows
    }

    /// Seconds since the UNIX epoch at creation.
    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    /// Format version the artifact was written with.
    pub fn format_version(&self) -> u16 {
        self.format_version
    }

    /// Normalization version the vocabulary was built with.
    pub fn normalization_version(&self) -> u32 {
        self.normalization_version
    }
}
