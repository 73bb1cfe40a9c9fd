//! Candidate classifier families and the closed set of fitted models.

use crate::classification::BernoulliNB;
use crate::error::{MedPredictError, Result};
use crate::primitives::Matrix;
use crate::traits::Classifier;
use crate::tree::{DecisionTreeClassifier, RandomForestClassifier};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Classifier family identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum ClassifierKind {
    /// CART decision tree
    DecisionTree = 0x0003,
    /// Bagged ensemble of decision trees
    RandomForest = 0x0004,
    /// Bernoulli naive Bayes
    NaiveBayes = 0x0008,
}

impl ClassifierKind {
    /// Every family, in default evaluation order.
    pub const ALL: [ClassifierKind; 3] = [
        ClassifierKind::DecisionTree,
        ClassifierKind::RandomForest,
        ClassifierKind::NaiveBayes,
    ];

    /// Convert from u16 value
    #[must_use]
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            0x0003 => Some(Self::DecisionTree),
            0x0004 => Some(Self::RandomForest),
            0x0008 => Some(Self::NaiveBayes),
            _ => None,
        }
    }

    /// Stable name, identical to [`Classifier::name`] of the built model.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DecisionTree => "DecisionTree",
            Self::RandomForest => "RandomForest",
            Self::NaiveBayes => "NaiveBayes",
        }
    }

    /// Unfitted model of this family.
    ///
    /// `n_estimators` only affects the forest. A seed makes tree growth and
    /// bootstrapping reproducible.
    pub fn build(self, n_estimators: usize, random_state: Option<u64>) -> ClassifierModel {
        match self {
            Self::DecisionTree => {
                let mut tree = DecisionTreeClassifier::new();
                if let Some(seed) = random_state {
                    tree = tree.with_random_state(seed);
                }
                ClassifierModel::DecisionTree(tree)
            }
            Self::RandomForest => {
                let mut forest = RandomForestClassifier::new(n_estimators);
                if let Some(seed) = random_state {
                    forest = forest.with_random_state(seed);
                }
                ClassifierModel::RandomForest(forest)
            }
            Self::NaiveBayes => ClassifierModel::NaiveBayes(BernoulliNB::new()),
        }
    }
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClassifierKind {
    type Err = MedPredictError;

    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "decisiontree" | "tree" => Ok(Self::DecisionTree),
            "randomforest" | "forest" => Ok(Self::RandomForest),
            "naivebayes" | "bayes" | "nb" => Ok(Self::NaiveBayes),
            _ => Err(MedPredictError::invalid_input(format!(
                "unknown classifier '{s}' (expected DecisionTree, RandomForest or NaiveBayes)"
            ))),
        }
    }
}

/// A model of one of the supported families.
///
/// Persisted inside the artifact, so the variant set is closed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClassifierModel {
    /// CART decision tree
    DecisionTree(DecisionTreeClassifier),
    /// Random forest
    RandomForest(RandomForestClassifier),
    /// Bernoulli naive Bayes
    NaiveBayes(BernoulliNB),
}

impl ClassifierModel {
    /// Family of the wrapped model.
    pub fn kind(&self) -> ClassifierKind {
        match self {
            Self::DecisionTree(_) => ClassifierKind::DecisionTree,
            Self::RandomForest(_) => ClassifierKind::RandomForest,
            Self::NaiveBayes(_) => ClassifierKind::NaiveBayes,
        }
    }

    fn inner(&self) -> &dyn Classifier {
        match self {
            Self::DecisionTree(m) => m,
            Self::RandomForest(m) => m,
            Self::NaiveBayes(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Classifier {
        match self {
            Self::DecisionTree(m) => m,
            Self::RandomForest(m) => m,
            Self::NaiveBayes(m) => m,
        }
    }
}

impl Classifier for ClassifierModel {
    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    fn fit(&mut self, x: &Matrix<f32>, y: &[usize]) -> Result<()> {
        self.inner_mut().fit(x, y)
    }

    fn predict(&self, x: &Matrix<f32>) -> Result<Vec<usize>> {
        self.inner().predict(x)
    }

    fn n_features(&self) -> Option<usize> {
        self.inner().n_features()
    }

    fn classes(&self) -> Vec<usize> {
        self.inner().classes()
    }
}
