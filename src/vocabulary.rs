//! Canonical symptom vocabulary and disease label map.
//!
//! The vocabulary fixes the column order of every feature vector; the disease
//! map fixes what each class index means. Both are built once from the
//! training dataset, stored in the model artifact, and never re-derived at
//! serving time.

use crate::dataset::Dataset;
use crate::error::{MedPredictError, Result};
use crate::normalize::{normalize_symptom, readable};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Ordered, duplicate-free list of normalized symptom tokens.
///
/// Serialized as the plain token list; the lookup index is rebuilt (and the
/// list re-validated) on deserialization.
///
/// # Examples
///
/// ```
/// use medpredict::vocabulary::Vocabulary;
///
/// let vocab = Vocabulary::from_tokens(["Skin Rash", "itching", "skin_rash"])
///     .expect("at least one token");
/// assert_eq!(vocab.tokens(), &["itching", "skin_rash"]);
/// assert_eq!(vocab.index_of("skin_rash"), Some(1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    tokens: Vec<String>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Builds the vocabulary from every symptom occurring in `dataset`.
    ///
    /// Tokens are sorted by byte order, so any row permutation of the same
    /// data yields the same vocabulary.
    ///
    /// # Errors
    ///
    /// Returns `EmptyVocabulary` if the dataset holds no symptom at all.
    pub fn from_dataset(dataset: &Dataset) -> Result<Self> {
        let tokens: BTreeSet<&str> = dataset
            .records()
            .iter()
            .flat_map(|r| r.symptoms.iter().map(String::as_str))
            .collect();
        if tokens.is_empty() {
            return Err(MedPredictError::EmptyVocabulary {
                context: dataset.source().to_string(),
            });
        }
        Ok(Self::from_sorted_unique(
            tokens.into_iter().map(str::to_string).collect(),
        ))
    }

    /// Normalizes, deduplicates and sorts an explicit token list.
    ///
    /// # Errors
    ///
    /// Returns `EmptyVocabulary` if nothing survives normalization.
    pub fn from_tokens<I, S>(tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tokens: BTreeSet<String> = tokens
            .into_iter()
            .filter_map(|t| normalize_symptom(t.as_ref()))
            .collect();
        if tokens.is_empty() {
            return Err(MedPredictError::EmptyVocabulary {
                context: "token list".to_string(),
            });
        }
        Ok(Self::from_sorted_unique(tokens.into_iter().collect()))
    }

    /// Uses `tokens` as-is, in the given order.
    ///
    /// This is how a stored vocabulary is restored; it is also handy for
    /// fixing a small vocabulary by hand.
    ///
    /// # Errors
    ///
    /// Returns `EmptyVocabulary` for an empty list and `InvalidInput` if a
    /// token is not in normalized form or occurs twice.
    pub fn from_ordered(tokens: Vec<String>) -> Result<Self> {
        if tokens.is_empty() {
            return Err(MedPredictError::EmptyVocabulary {
                context: "ordered token list".to_string(),
            });
        }
        let mut index = HashMap::with_capacity(tokens.len());
        for (i, token) in tokens.iter().enumerate() {
            if normalize_symptom(token).as_deref() != Some(token.as_str()) {
                return Err(MedPredictError::invalid_input(format!(
                    "vocabulary token '{token}' is not normalized"
                )));
            }
            if index.insert(token.clone(), i).is_some() {
                return Err(MedPredictError::invalid_input(format!(
                    "duplicate vocabulary token '{token}'"
                )));
            }
        }
        Ok(Self { tokens, index })
    }

    fn from_sorted_unique(tokens: Vec<String>) -> Self {
        let index = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        Self { tokens, index }
    }

    /// Column index of a normalized token.
    pub fn index_of(&self, token: &str) -> Option<usize> {
        self.index.get(token).copied()
    }

    /// True if the normalized token is known.
    pub fn contains(&self, token: &str) -> bool {
        self.index.contains_key(token)
    }

    /// Number of tokens, i.e. the feature vector width.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Always false for a constructed vocabulary.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens in column order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Iterates tokens in column order.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.tokens.iter().map(String::as_str)
    }

    /// Human-readable symptom names in column order.
    pub fn readable(&self) -> Vec<String> {
        self.tokens.iter().map(|t| readable(t)).collect()
    }
}

impl TryFrom<Vec<String>> for Vocabulary {
    type Error = MedPredictError;

    fn try_from(tokens: Vec<String>) -> Result<Self> {
        Self::from_ordered(tokens)
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocab: Vocabulary) -> Self {
        vocab.tokens
    }
}

/// Class index to disease name mapping.
///
/// Label `i` is the `i`-th distinct disease name in byte order.
///
/// # Examples
///
/// ```
/// use medpredict::vocabulary::DiseaseMap;
///
/// let map = DiseaseMap::from_names(["Malaria", " Allergy", "Malaria"]).expect("non-empty");
/// assert_eq!(map.name_of(0), Some("Allergy"));
/// assert_eq!(map.label_of("Malaria"), Some(1));
/// assert_eq!(map.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct DiseaseMap {
    names: Vec<String>,
}

impl DiseaseMap {
    /// Collects the distinct disease names of `dataset`.
    ///
    /// # Errors
    ///
    /// Returns `Dataset` if the dataset has no labeled rows.
    pub fn from_dataset(dataset: &Dataset) -> Result<Self> {
        Self::from_names(dataset.records().iter().map(|r| r.disease.as_str())).map_err(|_| {
            MedPredictError::dataset(format!("no labeled rows in {}", dataset.source()))
        })
    }

    /// Trims, deduplicates and sorts disease names.
    ///
    /// # Errors
    ///
    /// Returns `Dataset` if no non-blank name is given.
    pub fn from_names<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names: BTreeSet<String> = names
            .into_iter()
            .map(|n| n.as_ref().trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        if names.is_empty() {
            return Err(MedPredictError::dataset("no disease names"));
        }
        Ok(Self {
            names: names.into_iter().collect(),
        })
    }

    /// Label for a disease name, compared after trimming.
    pub fn label_of(&self, name: &str) -> Option<usize> {
        self.names.binary_search_by(|n| n.as_str().cmp(name.trim())).ok()
    }

    /// Disease name for a label.
    pub fn name_of(&self, label: usize) -> Option<&str> {
        self.names.get(label).map(String::as_str)
    }

    /// Labels for every record of `dataset`, in record order.
    ///
    /// # Errors
    ///
    /// Returns `Dataset` if a record's disease is not in this map.
    pub fn labels(&self, dataset: &Dataset) -> Result<Vec<usize>> {
        dataset
            .records()
            .iter()
            .map(|r| {
                self.label_of(&r.disease).ok_or_else(|| {
                    MedPredictError::dataset(format!("unknown disease '{}'", r.disease))
                })
            })
            .collect()
    }

    /// Number of diseases.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false for a constructed map.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in label order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl TryFrom<Vec<String>> for DiseaseMap {
    type Error = MedPredictError;

    fn try_from(names: Vec<String>) -> Result<Self> {
        let sorted_unique = names.windows(2).all(|w| w[0] < w[1]);
        if names.is_empty() || !sorted_unique {
            return Err(MedPredictError::Serialization(
                "disease map must be a non-empty sorted list of distinct names".to_string(),
            ));
        }
        Ok(Self { names })
    }
}

impl From<DiseaseMap> for Vec<String> {
    fn from(map: DiseaseMap) -> Self {
        map.names
    }
}
