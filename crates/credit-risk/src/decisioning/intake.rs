use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

use super::domain::{Applicant, ApplicantId, ApplicantRecord, Decision, EmploymentStatus};

pub const REQUIRED_COLUMNS: [&str; 8] = [
    "CreditScore",
    "AnnualIncome",
    "LoanAmount",
    "OutstandingDebt",
    "EmploymentStatus",
    "ApplicationDate",
    "EmploymentStartDate",
    "LoanOutcome",
];

#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("failed to read applicant data: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid applicant CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("applicant CSV is missing required column '{0}'")]
    MissingColumn(&'static str),
}

/// Row that could not become an [`Applicant`]; the batch continues without it.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    pub index: ApplicantId,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub applicants: Vec<Applicant>,
    pub rejected: Vec<RejectedRow>,
}

impl ImportReport {
    pub fn applicant(&self, id: ApplicantId) -> Option<&Applicant> {
        self.applicants.iter().find(|applicant| applicant.id() == id)
    }
}

#[derive(Debug, Deserialize)]
struct ApplicantRow {
    #[serde(rename = "CreditScore")]
    credit_score: u16,
    #[serde(rename = "AnnualIncome")]
    annual_income: f64,
    #[serde(rename = "LoanAmount")]
    loan_amount: f64,
    #[serde(rename = "OutstandingDebt")]
    outstanding_debt: f64,
    #[serde(rename = "EmploymentStatus")]
    employment_status: String,
    #[serde(rename = "ApplicationDate")]
    application_date: String,
    #[serde(rename = "EmploymentStartDate")]
    employment_start_date: String,
    #[serde(rename = "LoanOutcome")]
    loan_outcome: String,
}

impl ApplicantRow {
    fn into_record(self) -> Result<ApplicantRecord, String> {
        let application_date = parse_date(&self.application_date)
            .ok_or_else(|| format!("unparseable ApplicationDate '{}'", self.application_date))?;
        let employment_start_date = parse_date(&self.employment_start_date).ok_or_else(|| {
            format!(
                "unparseable EmploymentStartDate '{}'",
                self.employment_start_date
            )
        })?;
        let loan_outcome = Decision::from_label(&self.loan_outcome)
            .ok_or_else(|| format!("unknown LoanOutcome '{}'", self.loan_outcome))?;

        Ok(ApplicantRecord {
            credit_score: self.credit_score,
            annual_income: self.annual_income,
            loan_amount: self.loan_amount,
            outstanding_debt: self.outstanding_debt,
            employment_status: EmploymentStatus::parse(&self.employment_status),
            application_date,
            employment_start_date,
            loan_outcome,
        })
    }
}

pub struct ApplicantImporter;

impl ApplicantImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<ImportReport, IntakeError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Parses a CSV batch. Each row keeps its ingestion position as identity,
    /// whether or not it is accepted.
    pub fn from_reader<R: Read>(reader: R) -> Result<ImportReport, IntakeError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = csv_reader.headers()?.clone();

        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|header| header.trim_start_matches('\u{feff}') == column) {
                return Err(IntakeError::MissingColumn(column));
            }
        }
        let headers = csv::StringRecord::from(
            headers
                .iter()
                .map(|header| header.trim_start_matches('\u{feff}'))
                .collect::<Vec<_>>(),
        );

        let mut report = ImportReport::default();
        for (position, result) in csv_reader.records().enumerate() {
            let index = ApplicantId(position);
            match build_applicant(index, result, &headers) {
                Ok(applicant) => report.applicants.push(applicant),
                Err(reason) => {
                    warn!(applicant = %index, %reason, "skipping applicant row");
                    report.rejected.push(RejectedRow { index, reason });
                }
            }
        }

        debug!(
            accepted = report.applicants.len(),
            rejected = report.rejected.len(),
            "applicant batch ingested"
        );
        Ok(report)
    }

    pub fn employment_statuses_from_path<P: AsRef<Path>>(
        path: P,
    ) -> Result<Vec<String>, IntakeError> {
        let file = std::fs::File::open(path)?;
        Self::employment_statuses_from_reader(file)
    }

    /// Raw `EmploymentStatus` values of every data row, accepted or not, in
    /// file order. Values are not normalised; rows too short to carry the
    /// column are skipped.
    pub fn employment_statuses_from_reader<R: Read>(
        reader: R,
    ) -> Result<Vec<String>, IntakeError> {
        const COLUMN: &str = "EmploymentStatus";

        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let position = csv_reader
            .headers()?
            .iter()
            .position(|header| header.trim_start_matches('\u{feff}') == COLUMN)
            .ok_or(IntakeError::MissingColumn(COLUMN))?;

        let mut statuses = Vec::new();
        for record in csv_reader.records() {
            if let Some(value) = record?.get(position) {
                statuses.push(value.to_string());
            }
        }
        Ok(statuses)
    }
}

fn build_applicant(
    index: ApplicantId,
    row: Result<csv::StringRecord, csv::Error>,
    headers: &csv::StringRecord,
) -> Result<Applicant, String> {
    let row = row.map_err(|err| err.to_string())?;
    let parsed: ApplicantRow = row
        .deserialize(Some(headers))
        .map_err(|err| err.to_string())?;
    let record = parsed.into_record()?;
    Applicant::new(index, record).map_err(|err| err.to_string())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }

    const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt.date());
        }
    }

    NaiveDate::parse_from_str(trimmed, "%m/%d/%Y").ok()
}
