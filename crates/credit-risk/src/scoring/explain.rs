use serde::Serialize;

use super::features::{FeatureVector, ModelFeature, FEATURE_COUNT};
use super::model::ForestClassifier;

/// Local attribution capability consumed by the scoring adapter.
pub trait Explainer {
    fn explain(&self, features: &FeatureVector) -> Explanation;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    IncreasesApproval,
    DecreasesApproval,
}

impl Direction {
    pub const fn label(self) -> &'static str {
        match self {
            Self::IncreasesApproval => "Increases approval",
            Self::DecreasesApproval => "Decreases approval",
        }
    }
}

/// Signed contribution of one feature to the approved-class probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Attribution {
    pub feature: ModelFeature,
    pub value: f64,
    pub contribution: f64,
}

impl Attribution {
    pub fn direction(&self) -> Direction {
        if self.contribution > 0.0 {
            Direction::IncreasesApproval
        } else {
            Direction::DecreasesApproval
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    /// Expected approved-class probability before any feature is observed.
    pub base_value: f64,
    /// One entry per model feature, in training column order.
    pub attributions: Vec<Attribution>,
}

impl Explanation {
    /// The `k` strongest attributions by magnitude; ties keep column order.
    pub fn top(&self, k: usize) -> Vec<Attribution> {
        let mut ranked = self.attributions.clone();
        ranked.sort_by(|a, b| b.contribution.abs().total_cmp(&a.contribution.abs()));
        ranked.truncate(k);
        ranked
    }

    pub fn attribution(&self, feature: ModelFeature) -> Option<&Attribution> {
        self.attributions
            .iter()
            .find(|attribution| attribution.feature == feature)
    }

    pub fn reconstructed_probability(&self) -> f64 {
        self.base_value
            + self
                .attributions
                .iter()
                .map(|attribution| attribution.contribution)
                .sum::<f64>()
    }
}

/// Decision-path attribution: every change in node value along the path a
/// row takes through a tree is credited to the feature split on, and the
/// credits are averaged across trees. The root value is the bias.
impl Explainer for ForestClassifier {
    fn explain(&self, features: &FeatureVector) -> Explanation {
        let mut contributions = [0.0_f64; FEATURE_COUNT];
        let mut base_value = 0.0;

        for tree in self.trees() {
            let path = tree.decision_path(features);
            base_value += tree.node_value(path[0]);
            for step in path.windows(2) {
                let (parent, child) = (step[0], step[1]);
                if let Some(feature) = tree.split_feature(parent) {
                    contributions[feature] += tree.node_value(child) - tree.node_value(parent);
                }
            }
        }

        let tree_count = self.trees().len() as f64;
        let attributions = ModelFeature::ordered()
            .into_iter()
            .map(|feature| Attribution {
                feature,
                value: features.get(feature),
                contribution: contributions[feature.index()] / tree_count,
            })
            .collect();

        Explanation {
            base_value: base_value / tree_count,
            attributions,
        }
    }
}
