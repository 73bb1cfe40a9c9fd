//! Symptom sets to fixed-order binary feature vectors.
//!
//! Encoding never fails: unknown tokens are dropped and the output always
//! has exactly one entry per vocabulary token.

use crate::dataset::Record;
use crate::normalize::{normalize_symptom, split_compound};
use crate::primitives::Matrix;
use crate::vocabulary::Vocabulary;

/// Binary presence vector aligned to a [`Vocabulary`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureVector(Vec<u8>);

impl FeatureVector {
    /// The 0/1 entries in vocabulary order.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Number of entries (the vocabulary length).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True only for a zero-width vector.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of symptoms marked present.
    pub fn n_present(&self) -> usize {
        self.0.iter().filter(|&&bit| bit == 1).count()
    }

    /// Single-row batch for a classifier.
    pub fn to_matrix(&self) -> Matrix<f32> {
        Matrix::from_row(self.0.iter().map(|&bit| f32::from(bit)).collect())
    }
}

/// Encodes a set of symptom tokens against `vocab`.
///
/// Every input is normalized first, so raw and already-normalized tokens
/// encode identically. Unknown tokens are ignored.
///
/// # Examples
///
/// ```
/// use medpredict::encoder::encode;
/// use medpredict::vocabulary::Vocabulary;
///
/// let vocab = Vocabulary::from_ordered(vec![
///     "fever".to_string(),
///     "cough".to_string(),
///     "headache".to_string(),
/// ]).expect("valid tokens");
///
/// assert_eq!(encode(["unknown_symptom"], &vocab).as_slice(), &[0, 0, 0]);
/// assert_eq!(encode(["headache", "Fever"], &vocab).as_slice(), &[1, 0, 1]);
/// ```
pub fn encode<I, S>(symptoms: I, vocab: &Vocabulary) -> FeatureVector
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut bits = vec![0u8; vocab.len()];
    for symptom in symptoms {
        if let Some(idx) = normalize_symptom(symptom.as_ref()).and_then(|t| vocab.index_of(&t)) {
            bits[idx] = 1;
        }
    }
    FeatureVector(bits)
}

/// Encodes user-typed entries, each of which may hold several symptoms
/// joined by `,`, `;` or `|`, exactly like a dataset cell.
pub fn encode_raw<S: AsRef<str>>(entries: &[S], vocab: &Vocabulary) -> FeatureVector {
    encode(
        entries.iter().flat_map(|e| split_compound(e.as_ref())),
        vocab,
    )
}

/// Encodes every record into one row of a feature matrix.
pub fn encode_rows(records: &[Record], vocab: &Vocabulary) -> Matrix<f32> {
    let mut matrix = Matrix::zeros(records.len(), vocab.len());
    for (row, record) in records.iter().enumerate() {
        for token in &record.symptoms {
            if let Some(col) = vocab.index_of(token) {
                matrix.set(row, col, 1.0);
            }
        }
    }
    matrix
}
