use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::features::{self, DerivedFeatures};

/// Positional identity of an applicant within one ingested batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicantId(pub usize);

impl fmt::Display for ApplicantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Binary loan decision shared by the rule engine, the model, and the
/// historical outcome column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    Approved,
    Denied,
}

impl Decision {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Approved => "Approved",
            Self::Denied => "Denied",
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "approved" => Some(Self::Approved),
            "denied" => Some(Self::Denied),
            _ => None,
        }
    }

    /// Class code used by the classifier: 1 = Approved, 0 = Denied.
    pub const fn class_code(self) -> u8 {
        match self {
            Self::Approved => 1,
            Self::Denied => 0,
        }
    }

    pub const fn from_class_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Approved),
            0 => Some(Self::Denied),
            _ => None,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Employment category as recorded on the application. Unrecognised values
/// are preserved verbatim so the encoding table can reject them explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EmploymentStatus {
    Employed,
    Unemployed,
    SelfEmployed,
    Other(String),
}

impl EmploymentStatus {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "employed" => Self::Employed,
            "unemployed" => Self::Unemployed,
            "self-employed" | "self employed" | "selfemployed" => Self::SelfEmployed,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Employed => "Employed",
            Self::Unemployed => "Unemployed",
            Self::SelfEmployed => "Self-Employed",
            Self::Other(value) => value,
        }
    }
}

impl From<String> for EmploymentStatus {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<EmploymentStatus> for String {
    fn from(value: EmploymentStatus) -> Self {
        value.label().to_string()
    }
}

impl fmt::Display for EmploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Raw attributes of one loan application as captured at intake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantRecord {
    pub credit_score: u16,
    pub annual_income: f64,
    pub loan_amount: f64,
    pub outstanding_debt: f64,
    pub employment_status: EmploymentStatus,
    pub application_date: NaiveDate,
    pub employment_start_date: NaiveDate,
    pub loan_outcome: Decision,
}

/// Record rejected at construction because its derived features would be
/// undefined or nonsensical.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("annual income is zero; debt-to-income is undefined")]
    ZeroIncome,
    #[error("annual income {0} is negative")]
    NegativeIncome(f64),
    #[error("outstanding debt {0} is negative")]
    NegativeDebt(f64),
    #[error("loan amount {0} must be positive")]
    NonPositiveLoanAmount(f64),
    #[error("{field} is not a finite number")]
    NonFinite { field: &'static str },
    #[error(
        "employment start date {employment_start} is after application date {application_date}"
    )]
    EmploymentAfterApplication {
        application_date: NaiveDate,
        employment_start: NaiveDate,
    },
}

/// Validated applicant with derived features computed exactly once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Applicant {
    id: ApplicantId,
    #[serde(flatten)]
    record: ApplicantRecord,
    #[serde(flatten)]
    derived: DerivedFeatures,
}

impl Applicant {
    pub fn new(id: ApplicantId, record: ApplicantRecord) -> Result<Self, RecordError> {
        let derived = features::derive(&record)?;
        Ok(Self {
            id,
            record,
            derived,
        })
    }

    pub fn id(&self) -> ApplicantId {
        self.id
    }

    pub fn record(&self) -> &ApplicantRecord {
        &self.record
    }

    pub fn derived(&self) -> &DerivedFeatures {
        &self.derived
    }

    pub fn credit_score(&self) -> u16 {
        self.record.credit_score
    }

    pub fn annual_income(&self) -> f64 {
        self.record.annual_income
    }

    pub fn loan_amount(&self) -> f64 {
        self.record.loan_amount
    }

    pub fn outstanding_debt(&self) -> f64 {
        self.record.outstanding_debt
    }

    pub fn employment_status(&self) -> &EmploymentStatus {
        &self.record.employment_status
    }

    pub fn loan_outcome(&self) -> Decision {
        self.record.loan_outcome
    }

    pub fn tenure_months(&self) -> u32 {
        self.derived.tenure_months
    }

    pub fn debt_to_income(&self) -> f64 {
        self.derived.debt_to_income
    }
}
