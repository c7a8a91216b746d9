//! Pre-trained classifier artifacts.
//!
//! The forest is exported offline into flat node arrays, one set per tree.
//! Node `0` is the root; a row descends left when its feature value is at or
//! below the node threshold. Every node carries the fraction of approved
//! training rows that reached it, so leaf values are class-1 probabilities
//! and interior values feed the path attribution in `explain`.

use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

use super::encoding::EncodingTable;
use super::features::{FeatureVector, FEATURE_COUNT};
use crate::decisioning::Decision;

pub const APPROVAL_THRESHOLD: f64 = 0.5;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed model artifact: {0}")]
    Json(#[from] serde_json::Error),
    #[error("model artifact contains no trees")]
    EmptyForest,
    #[error("expected {expected} feature importances, found {found}")]
    ImportanceArity { expected: usize, found: usize },
    #[error("tree {tree} is invalid: {reason}")]
    InvalidTree { tree: usize, reason: String },
}

/// Prediction capability consumed by the scoring adapter.
pub trait Classifier: Send + Sync {
    /// Probability that the application belongs to the approved class.
    fn probability(&self, features: &FeatureVector) -> f64;

    fn predict(&self, features: &FeatureVector) -> Decision {
        if self.probability(features) > APPROVAL_THRESHOLD {
            Decision::Approved
        } else {
            Decision::Denied
        }
    }

    /// Global weights aligned with [`super::ModelFeature::ordered`].
    fn feature_importances(&self) -> &[f64];

    /// Category encoding the model was trained with.
    fn encoding(&self) -> &EncodingTable;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Split feature per node; negative marks a leaf.
    pub features: Vec<i64>,
    pub thresholds: Vec<f64>,
    pub left: Vec<i64>,
    pub right: Vec<i64>,
    /// Approved-class probability at each node.
    pub values: Vec<f64>,
}

impl DecisionTree {
    pub fn leaf(value: f64) -> Self {
        Self {
            features: vec![-1],
            thresholds: vec![0.0],
            left: vec![-1],
            right: vec![-1],
            values: vec![value],
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.features.len()
    }

    pub(crate) fn is_leaf(&self, node: usize) -> bool {
        self.features[node] < 0
    }

    /// Node indices visited from the root down to the leaf for `features`.
    pub(crate) fn decision_path(&self, features: &FeatureVector) -> Vec<usize> {
        let values = features.as_slice();
        let mut node = 0;
        let mut path = vec![node];
        while !self.is_leaf(node) {
            let split = self.features[node] as usize;
            node = if values[split] <= self.thresholds[node] {
                self.left[node] as usize
            } else {
                self.right[node] as usize
            };
            path.push(node);
        }
        path
    }

    pub fn probability(&self, features: &FeatureVector) -> f64 {
        let path = self.decision_path(features);
        let leaf = path.last().copied().unwrap_or(0);
        self.values[leaf]
    }

    pub(crate) fn node_value(&self, node: usize) -> f64 {
        self.values[node]
    }

    pub(crate) fn split_feature(&self, node: usize) -> Option<usize> {
        usize::try_from(self.features[node]).ok()
    }

    /// Children must come after their parent, which rules out cycles and
    /// guarantees every walk terminates.
    fn validate(&self) -> Result<(), String> {
        let n = self.features.len();
        if n == 0 {
            return Err("tree has no nodes".to_string());
        }
        if [
            self.thresholds.len(),
            self.left.len(),
            self.right.len(),
            self.values.len(),
        ]
        .iter()
        .any(|len| *len != n)
        {
            return Err("node arrays have different lengths".to_string());
        }

        for node in 0..n {
            let value = self.values[node];
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("node {node} value {value} is not a probability"));
            }
            if self.is_leaf(node) {
                continue;
            }

            let feature = self.features[node] as usize;
            if feature >= FEATURE_COUNT {
                return Err(format!("node {node} splits on unknown feature {feature}"));
            }
            if !self.thresholds[node].is_finite() {
                return Err(format!("node {node} has a non-finite threshold"));
            }
            for child in [self.left[node], self.right[node]] {
                let in_range = usize::try_from(child)
                    .map(|child| child > node && child < n)
                    .unwrap_or(false);
                if !in_range {
                    return Err(format!("node {node} has invalid child {child}"));
                }
            }
        }

        Ok(())
    }
}

/// Random-forest style ensemble averaging the approved-class probability of
/// its trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestClassifier {
    encoding: EncodingTable,
    feature_importances: Vec<f64>,
    trees: Vec<DecisionTree>,
}

impl ForestClassifier {
    pub fn new(
        trees: Vec<DecisionTree>,
        feature_importances: Vec<f64>,
        encoding: EncodingTable,
    ) -> Result<Self, ModelError> {
        let forest = Self {
            encoding,
            feature_importances,
            trees,
        };
        forest.validate()?;
        Ok(forest)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ModelError> {
        let forest: Self = serde_json::from_reader(reader)?;
        forest.validate()?;
        Ok(forest)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ModelError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_vec(self)?)?;
        Ok(())
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.trees.is_empty() {
            return Err(ModelError::EmptyForest);
        }
        if self.feature_importances.len() != FEATURE_COUNT {
            return Err(ModelError::ImportanceArity {
                expected: FEATURE_COUNT,
                found: self.feature_importances.len(),
            });
        }
        for (index, tree) in self.trees.iter().enumerate() {
            tree.validate()
                .map_err(|reason| ModelError::InvalidTree { tree: index, reason })?;
        }
        Ok(())
    }
}

impl Classifier for ForestClassifier {
    fn probability(&self, features: &FeatureVector) -> f64 {
        let total: f64 = self
            .trees
            .iter()
            .map(|tree| tree.probability(features))
            .sum();
        total / self.trees.len() as f64
    }

    fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    fn encoding(&self) -> &EncodingTable {
        &self.encoding
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::scoring::ModelFeature;

    /// Two stumps and one depth-two tree over credit score, debt-to-income
    /// and tenure.
    pub(crate) fn forest() -> ForestClassifier {
        let credit = ModelFeature::CreditScore.index() as i64;
        let dti = ModelFeature::DebtToIncome.index() as i64;
        let tenure = ModelFeature::TenureMonths.index() as i64;

        let credit_stump = DecisionTree {
            features: vec![credit, -1, -1],
            thresholds: vec![599.5, 0.0, 0.0],
            left: vec![1, -1, -1],
            right: vec![2, -1, -1],
            values: vec![0.6, 0.1, 0.8],
        };
        let dti_stump = DecisionTree {
            features: vec![dti, -1, -1],
            thresholds: vec![0.35, 0.0, 0.0],
            left: vec![1, -1, -1],
            right: vec![2, -1, -1],
            values: vec![0.5, 0.7, 0.2],
        };
        let tenure_tree = DecisionTree {
            features: vec![tenure, -1, credit, -1, -1],
            thresholds: vec![11.5, 0.0, 650.0, 0.0, 0.0],
            left: vec![1, -1, 3, -1, -1],
            right: vec![2, -1, 4, -1, -1],
            values: vec![0.55, 0.2, 0.7, 0.5, 0.9],
        };

        ForestClassifier::new(
            vec![credit_stump, dti_stump, tenure_tree],
            vec![0.35, 0.05, 0.05, 0.05, 0.25, 0.2, 0.05],
            EncodingTable::fit(1, ["Employed", "Self-Employed", "Unemployed"]),
        )
        .expect("fixture forest is valid")
    }
}
