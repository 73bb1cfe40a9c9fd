//! Labeled symptom datasets.
//!
//! A dataset is a CSV file with a header row. One column (by default
//! `Disease`, matched case-insensitively) holds the label; every other
//! column contributes symptoms. Two layouts are recognized per file:
//!
//! - **free text**: cells hold symptom names, possibly several per cell
//!   joined by `,`, `;` or `|`;
//! - **one-hot**: every symptom cell is a numeric 0/1 flag (`1`, `1.0`) or
//!   blank, the column header names the symptom and 1 marks it present.
//!
//! Rows without a disease are skipped with a warning.

use crate::error::{MedPredictError, Result};
use crate::normalize::split_compound;
use std::collections::BTreeSet;
use std::fmt;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Default name of the label column.
pub const DEFAULT_DISEASE_COLUMN: &str = "Disease";

/// How symptom columns were interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Cells hold symptom names.
    FreeText,
    /// Headers hold symptom names, cells hold 0/1 flags.
    OneHot,
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::FreeText => f.write_str("free-text"),
            Layout::OneHot => f.write_str("one-hot"),
        }
    }
}

/// One labeled row: a set of normalized symptom tokens and a disease name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Normalized symptom tokens present in the row
    pub symptoms: BTreeSet<String>,
    /// Trimmed disease name
    pub disease: String,
}

impl Record {
    /// Builds a record from raw symptom strings, normalizing each one.
    pub fn new<I, S>(symptoms: I, disease: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            symptoms: symptoms
                .into_iter()
                .flat_map(|s| split_compound(s.as_ref()))
                .collect(),
            disease: disease.trim().to_string(),
        }
    }
}

/// An in-memory labeled dataset.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<Record>,
    layout: Layout,
    source: String,
}

impl Dataset {
    /// Builds a dataset from already parsed records.
    ///
    /// Records with a blank disease are dropped.
    pub fn from_records(records: Vec<Record>, source: impl Into<String>) -> Self {
        let records = records
            .into_iter()
            .filter(|r| !r.disease.is_empty())
            .collect();
        Self {
            records,
            layout: Layout::FreeText,
            source: source.into(),
        }
    }

    /// Reads a CSV dataset from disk.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be opened and `Dataset` if it cannot
    /// be parsed or has no disease column.
    pub fn from_csv_path(path: impl AsRef<Path>, disease_column: &str) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file, disease_column, &path.display().to_string())
    }

    /// Reads a CSV dataset from any reader.
    ///
    /// `source` names the input in logs and errors.
    ///
    /// # Errors
    ///
    /// Returns `Dataset` if the CSV is malformed or has no disease column.
    pub fn from_csv_reader<R: Read>(reader: R, disease_column: &str, source: &str) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::None)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let wanted = disease_column.trim();
        let disease_idx = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                MedPredictError::dataset(format!(
                    "column '{wanted}' not found in {source} (headers: {})",
                    headers.join(", ")
                ))
            })?;

        let rows = csv_reader
            .records()
            .collect::<std::result::Result<Vec<_>, csv::Error>>()?;

        let layout = detect_layout(&rows, disease_idx);
        // One-hot headers split like any compound cell, so a column named
        // "fever, cough" marks both symptoms
        let header_tokens: Vec<Vec<String>> = headers.iter().map(|h| split_compound(h)).collect();
        debug!(source, %layout, rows = rows.len(), "parsed dataset");

        let mut records = Vec::with_capacity(rows.len());
        let mut skipped = 0usize;
        for (row_idx, row) in rows.iter().enumerate() {
            let disease = row.get(disease_idx).map(str::trim).unwrap_or_default();
            if disease.is_empty() {
                // +2: header line plus 1-based numbering
                warn!(source, line = row_idx + 2, "skipping row with blank disease");
                skipped += 1;
                continue;
            }

            let symptoms = row
                .iter()
                .enumerate()
                .filter(|(col, _)| *col != disease_idx)
                .flat_map(|(col, cell)| match layout {
                    Layout::FreeText => split_compound(cell),
                    Layout::OneHot if parse_flag(cell) == Some(true) => {
                        header_tokens.get(col).cloned().unwrap_or_default()
                    }
                    Layout::OneHot => Vec::new(),
                })
                .collect();

            records.push(Record {
                symptoms,
                disease: disease.to_string(),
            });
        }

        info!(
            source,
            %layout,
            records = records.len(),
            skipped,
            "loaded dataset"
        );

        Ok(Self {
            records,
            layout,
            source: source.to_string(),
        })
    }

    /// All labeled records, in file order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Number of labeled records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no labeled record survived parsing.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Detected column layout.
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Where the data came from.
    pub fn source(&self) -> &str {
        &self.source
    }
}

/// Reads a one-hot cell: any numeric spelling of 0 or 1 (`1`, `1.0`, `0.00`).
fn parse_flag(cell: &str) -> Option<bool> {
    match cell.trim().parse::<f32>() {
        Ok(v) if v == 0.0 => Some(false),
        Ok(v) if v == 1.0 => Some(true),
        _ => None,
    }
}

/// One-hot when every symptom cell is a 0/1 flag or blank and at least one
/// is non-blank.
fn detect_layout(rows: &[csv::StringRecord], disease_idx: usize) -> Layout {
    let mut saw_flag = false;
    for row in rows {
        for (col, cell) in row.iter().enumerate() {
            if col == disease_idx || cell.trim().is_empty() {
                continue;
            }
            if parse_flag(cell).is_none() {
                return Layout::FreeText;
            }
            saw_flag = true;
        }
    }
    if saw_flag {
        Layout::OneHot
    } else {
        Layout::FreeText
    }
}
