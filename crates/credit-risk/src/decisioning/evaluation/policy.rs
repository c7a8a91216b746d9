use super::super::domain::{Applicant, Decision};
use super::config::PolicyThresholds;
use super::rules::PolicyRule;
use serde::{Deserialize, Serialize};

/// Rule engine verdict together with the rule that produced it, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleOutcome {
    pub decision: Decision,
    pub fired: Option<PolicyRule>,
    pub rationale: String,
}

impl RuleOutcome {
    pub fn summary(&self) -> String {
        match self.fired {
            Some(rule) => format!("denied: {} ({})", rule.label(), self.rationale),
            None => "approved: all policy rules passed".to_string(),
        }
    }
}

pub(crate) fn decide_outcome(applicant: &Applicant, thresholds: &PolicyThresholds) -> RuleOutcome {
    PolicyRule::ordered()
        .into_iter()
        .find(|rule| rule.is_violated_by(applicant, thresholds))
        .map(|rule| RuleOutcome {
            decision: Decision::Denied,
            fired: Some(rule),
            rationale: rule.detail(applicant, thresholds),
        })
        .unwrap_or_else(|| RuleOutcome {
            decision: Decision::Approved,
            fired: None,
            rationale: String::new(),
        })
}
