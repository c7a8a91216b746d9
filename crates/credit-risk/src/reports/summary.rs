use serde::Serialize;

use crate::decisioning::{ApplicantDecision, ApplicantId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonVerdict {
    ModelMoreAccurate,
    RulesHold,
}

impl ComparisonVerdict {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ModelMoreAccurate => "ML model is more accurate than the rule engine",
            Self::RulesHold => "Rule engine still outperforms the ML model",
        }
    }
}

/// Agreement of the rule engine and the model with historical outcomes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSummary {
    pub total: usize,
    pub rule_matches: usize,
    pub scored: usize,
    pub model_matches: usize,
    pub rule_accuracy: Option<f64>,
    pub model_accuracy: Option<f64>,
    pub high_risk: Vec<ApplicantId>,
}

impl ComparisonSummary {
    pub fn from_decisions(decisions: &[ApplicantDecision]) -> Self {
        let total = decisions.len();
        let rule_matches = decisions
            .iter()
            .filter(|decision| decision.rules_match_outcome())
            .count();
        let scored = decisions
            .iter()
            .filter(|decision| decision.model_score.is_some())
            .count();
        let model_matches = decisions
            .iter()
            .filter(|decision| decision.model_matches_outcome() == Some(true))
            .count();
        let high_risk = decisions
            .iter()
            .filter(|decision| decision.is_high_risk())
            .map(ApplicantDecision::id)
            .collect();

        Self {
            total,
            rule_matches,
            scored,
            model_matches,
            rule_accuracy: ratio(rule_matches, total),
            model_accuracy: ratio(model_matches, scored),
            high_risk,
        }
    }

    /// `None` until both accuracies are known.
    pub fn verdict(&self) -> Option<ComparisonVerdict> {
        let rules = self.rule_accuracy?;
        let model = self.model_accuracy?;
        Some(if model > rules {
            ComparisonVerdict::ModelMoreAccurate
        } else {
            ComparisonVerdict::RulesHold
        })
    }
}

fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decisioning::{
        Applicant, ApplicantRecord, Decision, DecisionPipeline, EmploymentStatus, RuleEngine,
    };
    use crate::scoring::model::fixtures::forest;
    use crate::scoring::ModelScoringAdapter;
    use chrono::NaiveDate;

    fn applicant(index: usize, credit_score: u16, outcome: Decision) -> Applicant {
        Applicant::new(
            ApplicantId(index),
            ApplicantRecord {
                credit_score,
                annual_income: 50_000.0,
                loan_amount: 20_000.0,
                outstanding_debt: 10_000.0,
                employment_status: EmploymentStatus::Employed,
                application_date: NaiveDate::from_ymd_opt(2023, 1, 31).expect("valid date"),
                employment_start_date: NaiveDate::from_ymd_opt(2021, 1, 1).expect("valid date"),
                loan_outcome: outcome,
            },
        )
        .expect("valid applicant")
    }

    #[test]
    fn empty_batch_has_no_accuracy() {
        let summary = ComparisonSummary::from_decisions(&[]);
        assert_eq!(summary.total, 0);
        assert!(summary.rule_accuracy.is_none());
        assert!(summary.model_accuracy.is_none());
        assert!(summary.verdict().is_none());
    }

    #[test]
    fn accuracies_compare_against_historical_outcomes() {
        let pipeline =
            DecisionPipeline::with_model(RuleEngine::default(), ModelScoringAdapter::new(forest()));
        let decisions = pipeline.run(vec![
            applicant(0, 720, Decision::Approved),
            applicant(1, 590, Decision::Denied),
            applicant(2, 630, Decision::Denied),
            applicant(3, 605, Decision::Approved),
        ]);

        let summary = ComparisonSummary::from_decisions(&decisions);

        assert_eq!(summary.total, 4);
        assert_eq!(summary.rule_matches, 3);
        assert_eq!(summary.scored, 4);
        assert_eq!(summary.model_matches, 3);
        assert_eq!(summary.rule_accuracy, Some(0.75));
        assert_eq!(summary.model_accuracy, Some(0.75));
        assert_eq!(summary.verdict(), Some(ComparisonVerdict::RulesHold));
        assert_eq!(summary.high_risk, vec![ApplicantId(1)]);
    }

    #[test]
    fn ties_favour_the_rule_engine() {
        let summary = ComparisonSummary {
            total: 2,
            rule_matches: 1,
            scored: 2,
            model_matches: 1,
            rule_accuracy: Some(0.5),
            model_accuracy: Some(0.5),
            high_risk: Vec::new(),
        };
        assert_eq!(summary.verdict(), Some(ComparisonVerdict::RulesHold));
    }
}
