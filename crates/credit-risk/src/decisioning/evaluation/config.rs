use serde::{Deserialize, Serialize};

/// Policy constants. The order in which they are checked is fixed; only the
/// cut-offs are data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyThresholds {
    pub minimum_credit_score: u16,
    pub maximum_debt_to_income: f64,
    pub unemployed_loan_ceiling: f64,
    pub minimum_tenure_months: u32,
}

impl Default for PolicyThresholds {
    fn default() -> Self {
        Self {
            minimum_credit_score: 600,
            maximum_debt_to_income: 0.35,
            unemployed_loan_ceiling: 1_000_000.0,
            minimum_tenure_months: 12,
        }
    }
}
