use serde::{Deserialize, Serialize};

use super::encoding::{EncodingError, EncodingTable};
use crate::decisioning::Applicant;

pub const FEATURE_COUNT: usize = 7;

/// Model inputs in the column order the classifier was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelFeature {
    CreditScore,
    AnnualIncome,
    LoanAmount,
    OutstandingDebt,
    DebtToIncome,
    TenureMonths,
    EmploymentStatus,
}

impl ModelFeature {
    pub const fn ordered() -> [Self; FEATURE_COUNT] {
        [
            Self::CreditScore,
            Self::AnnualIncome,
            Self::LoanAmount,
            Self::OutstandingDebt,
            Self::DebtToIncome,
            Self::TenureMonths,
            Self::EmploymentStatus,
        ]
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ordered().get(index).copied()
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::CreditScore => "CreditScore",
            Self::AnnualIncome => "AnnualIncome",
            Self::LoanAmount => "LoanAmount",
            Self::OutstandingDebt => "OutstandingDebt",
            Self::DebtToIncome => "DebtToIncome",
            Self::TenureMonths => "TenureMonths",
            Self::EmploymentStatus => "EmploymentStatus",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn from_applicant(
        applicant: &Applicant,
        encoding: &EncodingTable,
    ) -> Result<Self, EncodingError> {
        let status = encoding.encode(applicant.employment_status().label())?;
        Ok(Self([
            f64::from(applicant.credit_score()),
            applicant.annual_income(),
            applicant.loan_amount(),
            applicant.outstanding_debt(),
            applicant.debt_to_income(),
            f64::from(applicant.tenure_months()),
            f64::from(status),
        ]))
    }

    pub fn get(&self, feature: ModelFeature) -> f64 {
        self.0[feature.index()]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decisioning::{ApplicantId, ApplicantRecord, Decision, EmploymentStatus};
    use chrono::NaiveDate;

    #[test]
    fn vector_follows_training_column_order() {
        let applicant = Applicant::new(
            ApplicantId(4),
            ApplicantRecord {
                credit_score: 680,
                annual_income: 40_000.0,
                loan_amount: 12_000.0,
                outstanding_debt: 8_000.0,
                employment_status: EmploymentStatus::Unemployed,
                application_date: NaiveDate::from_ymd_opt(2023, 1, 31).expect("valid date"),
                employment_start_date: NaiveDate::from_ymd_opt(2022, 1, 1).expect("valid date"),
                loan_outcome: Decision::Denied,
            },
        )
        .expect("valid applicant");
        let encoding = EncodingTable::fit(1, ["Employed", "Self-Employed", "Unemployed"]);

        let vector = FeatureVector::from_applicant(&applicant, &encoding).expect("encodes");

        assert_eq!(
            vector.as_slice(),
            &[680.0, 40_000.0, 12_000.0, 8_000.0, 0.2, 13.0, 2.0]
        );
        assert_eq!(vector.get(ModelFeature::TenureMonths), 13.0);
        assert_eq!(ModelFeature::from_index(4), Some(ModelFeature::DebtToIncome));
        assert_eq!(ModelFeature::from_index(7), None);
    }
}
