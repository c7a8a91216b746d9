use super::super::domain::{Applicant, EmploymentStatus};
use super::config::PolicyThresholds;
use serde::{Deserialize, Serialize};

/// Denial rules in evaluation priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyRule {
    CreditScoreBelowMinimum,
    DebtToIncomeAboveMaximum,
    UnemployedLoanAboveCeiling,
    TenureBelowMinimum,
}

impl PolicyRule {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::CreditScoreBelowMinimum,
            Self::DebtToIncomeAboveMaximum,
            Self::UnemployedLoanAboveCeiling,
            Self::TenureBelowMinimum,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::CreditScoreBelowMinimum => "Credit score below minimum",
            Self::DebtToIncomeAboveMaximum => "Debt-to-income above maximum",
            Self::UnemployedLoanAboveCeiling => "Unemployed applicant above loan ceiling",
            Self::TenureBelowMinimum => "Employment tenure below minimum",
        }
    }

    /// Boundary values never trip a rule: every comparison is strict.
    pub(crate) fn is_violated_by(self, applicant: &Applicant, thresholds: &PolicyThresholds) -> bool {
        match self {
            Self::CreditScoreBelowMinimum => {
                applicant.credit_score() < thresholds.minimum_credit_score
            }
            Self::DebtToIncomeAboveMaximum => {
                applicant.debt_to_income() > thresholds.maximum_debt_to_income
            }
            Self::UnemployedLoanAboveCeiling => {
                *applicant.employment_status() == EmploymentStatus::Unemployed
                    && applicant.loan_amount() > thresholds.unemployed_loan_ceiling
            }
            Self::TenureBelowMinimum => {
                applicant.tenure_months() < thresholds.minimum_tenure_months
            }
        }
    }

    pub(crate) fn detail(self, applicant: &Applicant, thresholds: &PolicyThresholds) -> String {
        match self {
            Self::CreditScoreBelowMinimum => format!(
                "credit score {} below minimum {}",
                applicant.credit_score(),
                thresholds.minimum_credit_score
            ),
            Self::DebtToIncomeAboveMaximum => format!(
                "debt-to-income {:.4} exceeds maximum {:.2}",
                applicant.debt_to_income(),
                thresholds.maximum_debt_to_income
            ),
            Self::UnemployedLoanAboveCeiling => format!(
                "unemployed applicant requested {:.0}, ceiling {:.0}",
                applicant.loan_amount(),
                thresholds.unemployed_loan_ceiling
            ),
            Self::TenureBelowMinimum => format!(
                "tenure {} month(s) below minimum {}",
                applicant.tenure_months(),
                thresholds.minimum_tenure_months
            ),
        }
    }
}
