mod config;
mod policy;
mod rules;

pub use config::PolicyThresholds;
pub use policy::RuleOutcome;
pub use rules::PolicyRule;

use super::domain::{Applicant, Decision};
use policy::decide_outcome;

/// Stateless evaluator applying the ordered approval policy; the first
/// violated rule denies the application.
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    thresholds: PolicyThresholds,
}

impl RuleEngine {
    pub fn new(thresholds: PolicyThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &PolicyThresholds {
        &self.thresholds
    }

    pub fn decide(&self, applicant: &Applicant) -> Decision {
        self.evaluate(applicant).decision
    }

    pub fn evaluate(&self, applicant: &Applicant) -> RuleOutcome {
        decide_outcome(applicant, &self.thresholds)
    }
}
