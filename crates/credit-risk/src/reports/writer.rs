use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::formatter::{render_report, report_file_name};
use crate::decisioning::{ApplicantDecision, ApplicantId};

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to create report directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write report {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Default)]
pub struct BatchReportOutcome {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(ApplicantId, String)>,
}

/// Writes one report per applicant under a fixed directory. Existing
/// reports for the same applicant are replaced.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new<P: Into<PathBuf>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn path_for(&self, id: ApplicantId) -> PathBuf {
        self.output_dir.join(report_file_name(id))
    }

    pub fn write(
        &self,
        decision: &ApplicantDecision,
        generated_at: NaiveDateTime,
    ) -> Result<PathBuf, ReportError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| ReportError::CreateDir {
            path: self.output_dir.clone(),
            source,
        })?;

        let path = self.path_for(decision.id());
        fs::write(&path, render_report(decision, generated_at)).map_err(|source| {
            ReportError::Write {
                path: path.clone(),
                source,
            }
        })?;

        Ok(path)
    }

    pub fn write_all<'a, I>(&self, decisions: I, generated_at: NaiveDateTime) -> BatchReportOutcome
    where
        I: IntoIterator<Item = &'a ApplicantDecision>,
    {
        let mut outcome = BatchReportOutcome::default();
        for decision in decisions {
            match self.write(decision, generated_at) {
                Ok(path) => outcome.written.push(path),
                Err(err) => {
                    warn!(applicant = %decision.id(), error = %err, "report not written");
                    outcome.failed.push((decision.id(), err.to_string()));
                }
            }
        }

        info!(
            written = outcome.written.len(),
            failed = outcome.failed.len(),
            dir = %self.output_dir.display(),
            "applicant reports generated"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decisioning::{
        Applicant, ApplicantRecord, Decision, DecisionPipeline, EmploymentStatus, RuleEngine,
    };
    use chrono::NaiveDate;

    fn decision(index: usize) -> ApplicantDecision {
        let applicant = Applicant::new(
            ApplicantId(index),
            ApplicantRecord {
                credit_score: 700,
                annual_income: 60_000.0,
                loan_amount: 15_000.0,
                outstanding_debt: 6_000.0,
                employment_status: EmploymentStatus::Employed,
                application_date: NaiveDate::from_ymd_opt(2023, 5, 1).expect("valid date"),
                employment_start_date: NaiveDate::from_ymd_opt(2019, 5, 1).expect("valid date"),
                loan_outcome: Decision::Approved,
            },
        )
        .expect("valid applicant");
        let pipeline: DecisionPipeline = DecisionPipeline::rules_only(RuleEngine::default());
        pipeline.decide(applicant)
    }

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .expect("valid date")
            .and_hms_opt(hour, 0, 0)
            .expect("valid time")
    }

    #[test]
    fn creates_directory_on_demand() {
        let dir = tempfile::tempdir().expect("temp dir");
        let writer = ReportWriter::new(dir.path().join("outputs").join("reports"));

        let path = writer.write(&decision(3), at(9)).expect("report written");

        assert_eq!(path, writer.output_dir().join("applicant_3.txt"));
        let contents = fs::read_to_string(&path).expect("report readable");
        assert!(contents.starts_with("Smart Credit Risk Engine"));
        assert!(contents.contains("SystemDecision: Approved"));
    }

    #[test]
    fn rewriting_replaces_the_previous_report() {
        let dir = tempfile::tempdir().expect("temp dir");
        let writer = ReportWriter::new(dir.path());

        writer.write(&decision(1), at(9)).expect("first write");
        let path = writer.write(&decision(1), at(17)).expect("second write");

        let entries = fs::read_dir(dir.path()).expect("dir listing").count();
        assert_eq!(entries, 1);
        let contents = fs::read_to_string(path).expect("report readable");
        assert!(contents.contains("Generated on: 2024-01-02 17:00:00"));
        assert!(!contents.contains("09:00:00"));
    }

    #[test]
    fn batch_failures_are_collected_not_raised() {
        let dir = tempfile::tempdir().expect("temp dir");
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "occupied").expect("blocker written");
        let writer = ReportWriter::new(&blocker);

        let decisions = [decision(0), decision(1)];
        let outcome = writer.write_all(decisions.iter(), at(9));

        assert!(outcome.written.is_empty());
        assert_eq!(outcome.failed.len(), 2);
        assert_eq!(outcome.failed[0].0, ApplicantId(0));
    }
}
