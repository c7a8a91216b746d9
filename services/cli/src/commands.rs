use crate::infra::{load_batch, load_pipeline, DashboardSnapshot, SourceArgs};
use chrono::Local;
use clap::Args;
use credit_risk::config::AppConfig;
use credit_risk::decisioning::{ApplicantDecision, ApplicantId, ApplicantImporter};
use credit_risk::error::AppError;
use credit_risk::reports::{BatchReportOutcome, ReportWriter};
use credit_risk::scoring::{EncodingTable, ForestClassifier, ModelScoringAdapter};
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug, Default)]
pub(crate) struct EvaluateArgs {
    #[command(flatten)]
    pub(crate) source: SourceArgs,
}

#[derive(Args, Debug)]
pub(crate) struct ExplainArgs {
    #[command(flatten)]
    pub(crate) source: SourceArgs,
    /// Applicant index (row position in the CSV, starting at 0)
    #[arg(long, conflicts_with = "rules_only")]
    pub(crate) index: usize,
    /// Number of features to list (defaults to APP_EXPLAIN_TOP_K)
    #[arg(long)]
    pub(crate) top_k: Option<usize>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ImportanceArgs {
    /// Trained model artifact (JSON)
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ReportsArgs {
    #[command(flatten)]
    pub(crate) source: SourceArgs,
    /// Directory receiving the reports (defaults to APP_REPORT_DIR)
    #[arg(long)]
    pub(crate) output_dir: Option<PathBuf>,
    /// Only write reports for applicants the model predicts as denied
    #[arg(long, conflicts_with = "rules_only")]
    pub(crate) denied_only: bool,
}

#[derive(Args, Debug)]
pub(crate) struct EncodingFitArgs {
    /// Training CSV whose EmploymentStatus column defines the categories
    #[arg(long)]
    pub(crate) data: PathBuf,
    /// Destination for the encoding table
    #[arg(long)]
    pub(crate) out: PathBuf,
    /// Version stamped into the table
    #[arg(long, default_value_t = 1)]
    pub(crate) version: u32,
}

pub(crate) fn run_evaluate(args: EvaluateArgs, config: &AppConfig) -> Result<(), AppError> {
    let pipeline = load_pipeline(&args.source, &config.data)?;
    let batch = load_batch(&args.source, &config.data)?;
    let snapshot = DashboardSnapshot::build(&pipeline, batch, config.data.explain_top_k);

    render_evaluation(&snapshot);
    Ok(())
}

pub(crate) fn run_explain(args: ExplainArgs, config: &AppConfig) -> Result<(), AppError> {
    let ExplainArgs {
        source,
        index,
        top_k,
    } = args;

    let pipeline = load_pipeline(&source, &config.data)?;
    let batch = load_batch(&source, &config.data)?;
    let id = ApplicantId(index);
    let applicant = batch
        .applicant(id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("applicant {id}")))?;

    let decision = pipeline.decide(applicant);
    let score = decision
        .model_score
        .as_ref()
        .ok_or_else(|| AppError::NotFound(format!("model score for applicant {id}")))?;
    let top_k = top_k.unwrap_or(config.data.explain_top_k);

    println!("Prediction for applicant #{id}");
    println!(
        "ML prediction: {} (approval probability {:.3})",
        score.label(),
        score.probability
    );
    println!("Actual outcome: {}", decision.applicant.loan_outcome());
    println!("Rule engine: {}", decision.rule_outcome.summary());
    println!("\nFeature impact (positive/negative)");
    for attribution in score.top_attributions(top_k) {
        println!(
            "- {} ({:.3}): {}",
            attribution.feature.name(),
            attribution.contribution,
            attribution.direction().label()
        );
    }

    Ok(())
}

pub(crate) fn run_importance(args: ImportanceArgs, config: &AppConfig) -> Result<(), AppError> {
    let model_path = args.model.unwrap_or_else(|| config.data.model_path.clone());
    let adapter = ModelScoringAdapter::new(ForestClassifier::load(&model_path)?);

    println!("Feature importance in loan decision model");
    for entry in adapter.feature_importance() {
        println!("- {}: {:.4}", entry.feature.name(), entry.importance);
    }
    Ok(())
}

pub(crate) fn run_reports(args: ReportsArgs, config: &AppConfig) -> Result<(), AppError> {
    let ReportsArgs {
        source,
        output_dir,
        denied_only,
    } = args;

    let pipeline = load_pipeline(&source, &config.data)?;
    let batch = load_batch(&source, &config.data)?;
    let decisions = pipeline.run(batch.applicants);

    let writer = ReportWriter::new(output_dir.unwrap_or_else(|| config.data.report_dir.clone()));
    let outcome = write_reports(&writer, &decisions, denied_only);

    let scope = if denied_only {
        "high-risk applicants"
    } else {
        "applicants"
    };
    println!(
        "{} report(s) saved for {} in {}",
        outcome.written.len(),
        scope,
        writer.output_dir().display()
    );
    for (id, reason) in &outcome.failed {
        println!("- applicant #{id} failed: {reason}");
    }

    Ok(())
}

/// With `denied_only`, only applicants the model flags as high risk get a
/// report.
fn write_reports(
    writer: &ReportWriter,
    decisions: &[ApplicantDecision],
    denied_only: bool,
) -> BatchReportOutcome {
    let generated_at = Local::now().naive_local();
    let selected = decisions
        .iter()
        .filter(|decision| !denied_only || decision.is_high_risk());
    writer.write_all(selected, generated_at)
}

/// Fits over the raw column of every row, rejected rows included, so the
/// codes line up with a label encoder trained on the same file.
pub(crate) fn run_encoding_fit(args: EncodingFitArgs) -> Result<(), AppError> {
    let statuses = ApplicantImporter::employment_statuses_from_path(&args.data)?;
    let table = EncodingTable::fit(args.version, statuses);
    table.save(&args.out)?;

    info!(out = %args.out.display(), table = %table.fingerprint(), "encoding table written");
    println!("Encoding table {} written to {}", table.fingerprint(), args.out.display());
    Ok(())
}

fn render_evaluation(snapshot: &DashboardSnapshot) {
    println!("Application decisions");
    for decision in &snapshot.decisions {
        let applicant = &decision.applicant;
        let model_note = match decision.ml_prediction() {
            Some(prediction) => format!(" | model {prediction}"),
            None => String::new(),
        };
        println!(
            "- #{} | score {} | income {} | loan {} | {} | debt {} | tenure {} | DTI {:.3} | rules {}{} | actual {}",
            applicant.id(),
            applicant.credit_score(),
            applicant.annual_income(),
            applicant.loan_amount(),
            applicant.employment_status(),
            applicant.outstanding_debt(),
            applicant.tenure_months(),
            applicant.debt_to_income(),
            decision.system_decision(),
            model_note,
            applicant.loan_outcome()
        );
    }

    if snapshot.rejected.is_empty() {
        println!("\nRejected rows: none");
    } else {
        println!("\nRejected rows");
        for row in &snapshot.rejected {
            println!("- #{}: {}", row.index, row.reason);
        }
    }

    let summary = &snapshot.summary;
    println!();
    match summary.rule_accuracy {
        Some(accuracy) => println!(
            "Rule engine accuracy vs actual outcome: {:.2}%",
            accuracy * 100.0
        ),
        None => println!("Rule engine accuracy vs actual outcome: n/a (no applicants)"),
    }
    if let Some(accuracy) = summary.model_accuracy {
        println!(
            "ML model accuracy vs actual outcome: {:.2}%",
            accuracy * 100.0
        );
    }
    if let Some(verdict) = summary.verdict() {
        println!("{}", verdict.label());
    }
    if !summary.high_risk.is_empty() {
        let ids: Vec<_> = summary.high_risk.iter().map(ToString::to_string).collect();
        println!("High-risk applicants (model denied): {}", ids.join(", "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::fixtures::{app_config, workspace_file};
    use std::fs;

    fn report_names(dir: &std::path::Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .expect("report dir")
            .map(|entry| {
                entry
                    .expect("dir entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        names
    }

    #[test]
    fn encoding_fit_matches_shipped_table() {
        let dir = tempfile::tempdir().expect("temp dir");
        let out = dir.path().join("encoding.json");

        run_encoding_fit(EncodingFitArgs {
            data: workspace_file("data/loan_applications.csv"),
            out: out.clone(),
            version: 1,
        })
        .expect("encoding fitted");

        let table = EncodingTable::load(&out).expect("table loads");
        let shipped =
            EncodingTable::load(workspace_file("models/employment_encoding.json")).expect("loads");
        assert_eq!(table, shipped);
    }

    #[test]
    fn encoding_fit_keeps_categories_seen_only_on_rejected_rows() {
        let dir = tempfile::tempdir().expect("temp dir");
        let data = dir.path().join("train.csv");
        fs::write(
            &data,
            "CreditScore,AnnualIncome,LoanAmount,OutstandingDebt,EmploymentStatus,ApplicationDate,EmploymentStartDate,LoanOutcome\n\
650,0,20000,10000,Contract,2023-01-31,2022-01-01,Denied\n\
720,50000,20000,10000,Employed,2023-01-31,2022-01-01,Approved\n\
700,60000,15000,5000,employed,2023-03-01,2020-01-01,Approved\n",
        )
        .expect("training data written");
        let out = dir.path().join("encoding.json");

        run_encoding_fit(EncodingFitArgs {
            data,
            out: out.clone(),
            version: 2,
        })
        .expect("encoding fitted");

        let table = EncodingTable::load(&out).expect("table loads");
        assert_eq!(table.version(), 2);
        assert_eq!(table.categories(), ["Contract", "Employed", "employed"]);
        assert_eq!(table.encode("Contract").expect("known"), 0);
    }

    #[test]
    fn denied_only_reports_cover_high_risk_applicants() {
        let dir = tempfile::tempdir().expect("temp dir");

        run_reports(
            ReportsArgs {
                source: SourceArgs::default(),
                output_dir: Some(dir.path().to_path_buf()),
                denied_only: true,
            },
            &app_config(),
        )
        .expect("reports written");

        assert_eq!(
            report_names(dir.path()),
            vec!["applicant_1.txt", "applicant_4.txt"]
        );
        let contents =
            fs::read_to_string(dir.path().join("applicant_4.txt")).expect("report readable");
        assert!(contents.contains("RiskFlag: HIGH RISK"));
    }

    #[test]
    fn reports_default_to_every_accepted_applicant() {
        let dir = tempfile::tempdir().expect("temp dir");

        run_reports(
            ReportsArgs {
                source: SourceArgs::default(),
                output_dir: Some(dir.path().to_path_buf()),
                denied_only: false,
            },
            &app_config(),
        )
        .expect("reports written");

        let names = report_names(dir.path());
        assert_eq!(names.len(), 9);
        assert!(!names.contains(&"applicant_9.txt".to_string()));
    }

    #[test]
    fn importance_fails_without_a_model_artifact() {
        let result = run_importance(
            ImportanceArgs {
                model: Some(workspace_file("models/absent.json")),
            },
            &app_config(),
        );
        assert!(matches!(result, Err(AppError::Model(_))));

        let shipped = run_importance(ImportanceArgs::default(), &app_config());
        assert!(shipped.is_ok());
    }
}
