use serde::Serialize;
use tracing::{info, warn};

use super::domain::{Applicant, ApplicantId, Decision};
use super::evaluation::{RuleEngine, RuleOutcome};
use crate::scoring::{Classifier, Explainer, ForestClassifier, ModelScore, ModelScoringAdapter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFlag {
    HighRisk,
    Clear,
}

impl RiskFlag {
    pub const fn label(self) -> &'static str {
        match self {
            Self::HighRisk => "HIGH RISK",
            Self::Clear => "CLEAR",
        }
    }
}

/// Decision attributes for one applicant. The applicant itself is never
/// modified; both verdicts sit alongside it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicantDecision {
    pub applicant: Applicant,
    pub rule_outcome: RuleOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_score: Option<ModelScore>,
}

impl ApplicantDecision {
    pub fn id(&self) -> ApplicantId {
        self.applicant.id()
    }

    pub fn system_decision(&self) -> Decision {
        self.rule_outcome.decision
    }

    pub fn ml_prediction(&self) -> Option<Decision> {
        self.model_score.as_ref().map(|score| score.prediction)
    }

    /// High risk means the model predicts a denial.
    pub fn risk_flag(&self) -> Option<RiskFlag> {
        self.ml_prediction().map(|prediction| match prediction {
            Decision::Denied => RiskFlag::HighRisk,
            Decision::Approved => RiskFlag::Clear,
        })
    }

    pub fn is_high_risk(&self) -> bool {
        self.risk_flag() == Some(RiskFlag::HighRisk)
    }

    pub fn rules_match_outcome(&self) -> bool {
        self.system_decision() == self.applicant.loan_outcome()
    }

    pub fn model_matches_outcome(&self) -> Option<bool> {
        self.ml_prediction()
            .map(|prediction| prediction == self.applicant.loan_outcome())
    }
}

/// Runs the rule engine, and the model when one is configured, over each
/// applicant independently.
pub struct DecisionPipeline<M = ForestClassifier> {
    engine: RuleEngine,
    adapter: Option<ModelScoringAdapter<M>>,
}

impl<M> DecisionPipeline<M>
where
    M: Classifier + Explainer,
{
    pub fn rules_only(engine: RuleEngine) -> Self {
        Self {
            engine,
            adapter: None,
        }
    }

    pub fn with_model(engine: RuleEngine, adapter: ModelScoringAdapter<M>) -> Self {
        Self {
            engine,
            adapter: Some(adapter),
        }
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    pub fn adapter(&self) -> Option<&ModelScoringAdapter<M>> {
        self.adapter.as_ref()
    }

    /// A scoring failure leaves the model fields empty for this applicant
    /// only.
    pub fn decide(&self, applicant: Applicant) -> ApplicantDecision {
        let rule_outcome = self.engine.evaluate(&applicant);
        let model_score = self.adapter.as_ref().and_then(|adapter| {
            adapter
                .score(&applicant)
                .map_err(|err| {
                    warn!(applicant = %applicant.id(), error = %err, "model scoring skipped");
                })
                .ok()
        });

        ApplicantDecision {
            applicant,
            rule_outcome,
            model_score,
        }
    }

    pub fn run<I>(&self, applicants: I) -> Vec<ApplicantDecision>
    where
        I: IntoIterator<Item = Applicant>,
    {
        let decisions: Vec<_> = applicants
            .into_iter()
            .map(|applicant| self.decide(applicant))
            .collect();

        info!(
            applicants = decisions.len(),
            scored = decisions
                .iter()
                .filter(|decision| decision.model_score.is_some())
                .count(),
            "decision batch complete"
        );
        decisions
    }
}
