use chrono::NaiveDateTime;

use crate::decisioning::{ApplicantDecision, ApplicantId};

pub const REPORT_TITLE: &str = "Smart Credit Risk Engine - Loan Decision Report";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const SEPARATOR_WIDTH: usize = 50;

pub fn report_file_name(id: ApplicantId) -> String {
    format!("applicant_{id}.txt")
}

/// Field name/value pairs in record order: raw attributes, derived
/// features, then the decision attributes that are present.
pub fn report_fields(decision: &ApplicantDecision) -> Vec<(&'static str, String)> {
    let applicant = &decision.applicant;
    let record = applicant.record();

    let mut fields = vec![
        ("CreditScore", record.credit_score.to_string()),
        ("AnnualIncome", record.annual_income.to_string()),
        ("LoanAmount", record.loan_amount.to_string()),
        ("OutstandingDebt", record.outstanding_debt.to_string()),
        ("EmploymentStatus", record.employment_status.to_string()),
        ("ApplicationDate", record.application_date.to_string()),
        ("EmploymentStartDate", record.employment_start_date.to_string()),
        ("LoanOutcome", record.loan_outcome.to_string()),
        ("TenureMonths", applicant.tenure_months().to_string()),
        ("DebtToIncome", applicant.debt_to_income().to_string()),
        ("SystemDecision", decision.system_decision().to_string()),
    ];

    if let Some(score) = &decision.model_score {
        fields.push(("MLPrediction", score.class_code().to_string()));
        fields.push(("MLPredictionLabel", score.label().to_string()));
    }
    if let Some(flag) = decision.risk_flag() {
        fields.push(("RiskFlag", flag.label().to_string()));
    }

    fields
}

pub fn render_report(decision: &ApplicantDecision, generated_at: NaiveDateTime) -> String {
    let mut lines = vec![
        REPORT_TITLE.to_string(),
        format!("Generated on: {}", generated_at.format(TIMESTAMP_FORMAT)),
        "-".repeat(SEPARATOR_WIDTH),
    ];
    lines.extend(
        report_fields(decision)
            .into_iter()
            .map(|(name, value)| format!("{name}: {value}")),
    );

    let mut rendered = lines.join("\n");
    rendered.push('\n');
    rendered
}
