//! Feature derivation for applicant records.
//!
//! Tenure is counted in whole 30-day months and debt-to-income is the plain
//! ratio of outstanding debt to annual income. Inputs that would make either
//! value undefined are rejected with a [`RecordError`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{ApplicantRecord, RecordError};

pub const DAYS_PER_MONTH: i64 = 30;

/// Attributes computed once from the raw record and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedFeatures {
    pub tenure_months: u32,
    pub debt_to_income: f64,
}

pub fn tenure_months(
    application_date: NaiveDate,
    employment_start: NaiveDate,
) -> Result<u32, RecordError> {
    let days = application_date
        .signed_duration_since(employment_start)
        .num_days();
    if days < 0 {
        return Err(RecordError::EmploymentAfterApplication {
            application_date,
            employment_start,
        });
    }

    Ok(u32::try_from(days / DAYS_PER_MONTH).unwrap_or(u32::MAX))
}

pub fn debt_to_income(outstanding_debt: f64, annual_income: f64) -> Result<f64, RecordError> {
    ensure_finite("OutstandingDebt", outstanding_debt)?;
    ensure_finite("AnnualIncome", annual_income)?;

    if annual_income == 0.0 {
        return Err(RecordError::ZeroIncome);
    }
    if annual_income < 0.0 {
        return Err(RecordError::NegativeIncome(annual_income));
    }
    if outstanding_debt < 0.0 {
        return Err(RecordError::NegativeDebt(outstanding_debt));
    }

    Ok(outstanding_debt / annual_income)
}

pub(crate) fn derive(record: &ApplicantRecord) -> Result<DerivedFeatures, RecordError> {
    ensure_finite("LoanAmount", record.loan_amount)?;
    if record.loan_amount <= 0.0 {
        return Err(RecordError::NonPositiveLoanAmount(record.loan_amount));
    }

    let tenure_months = tenure_months(record.application_date, record.employment_start_date)?;
    let debt_to_income = debt_to_income(record.outstanding_debt, record.annual_income)?;

    Ok(DerivedFeatures {
        tenure_months,
        debt_to_income,
    })
}

fn ensure_finite(field: &'static str, value: f64) -> Result<(), RecordError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(RecordError::NonFinite { field })
    }
}
