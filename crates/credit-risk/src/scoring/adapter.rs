use serde::Serialize;
use tracing::debug;

use super::encoding::{EncodingError, EncodingTable};
use super::explain::{Attribution, Explainer, Explanation};
use super::features::{FeatureVector, ModelFeature};
use super::model::Classifier;
use crate::decisioning::{Applicant, ApplicantId, Decision};

/// Model output for one applicant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelScore {
    pub applicant_id: ApplicantId,
    pub prediction: Decision,
    pub probability: f64,
    pub explanation: Explanation,
}

impl ModelScore {
    pub fn class_code(&self) -> u8 {
        self.prediction.class_code()
    }

    pub fn label(&self) -> &'static str {
        self.prediction.label()
    }

    pub fn top_attributions(&self, k: usize) -> Vec<Attribution> {
        self.explanation.top(k)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub feature: ModelFeature,
    pub importance: f64,
}

/// Feeds applicants through a trained classifier and its explainer using the
/// encoding table the model was trained with.
pub struct ModelScoringAdapter<M> {
    model: M,
}

impl<M> ModelScoringAdapter<M>
where
    M: Classifier + Explainer,
{
    pub fn new(model: M) -> Self {
        Self { model }
    }

    /// Refuses to serve when the externally supplied table differs from the
    /// one embedded in the model artifact.
    pub fn with_serving_encoding(model: M, serving: &EncodingTable) -> Result<Self, EncodingError> {
        model.encoding().ensure_compatible(serving)?;
        Ok(Self { model })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn encoding(&self) -> &EncodingTable {
        self.model.encoding()
    }

    pub fn score(&self, applicant: &Applicant) -> Result<ModelScore, EncodingError> {
        let features = FeatureVector::from_applicant(applicant, self.model.encoding())?;
        let probability = self.model.probability(&features);
        let prediction = self.model.predict(&features);
        let explanation = self.model.explain(&features);

        debug!(
            applicant = %applicant.id(),
            probability,
            prediction = prediction.label(),
            "applicant scored"
        );

        Ok(ModelScore {
            applicant_id: applicant.id(),
            prediction,
            probability,
            explanation,
        })
    }

    /// Global importances, least important first.
    pub fn feature_importance(&self) -> Vec<FeatureImportance> {
        let mut ranked: Vec<_> = ModelFeature::ordered()
            .into_iter()
            .zip(self.model.feature_importances().iter().copied())
            .map(|(feature, importance)| FeatureImportance {
                feature,
                importance,
            })
            .collect();
        ranked.sort_by(|a, b| a.importance.total_cmp(&b.importance));
        ranked
    }
}
