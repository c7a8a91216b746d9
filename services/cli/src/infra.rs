use clap::Args;
use credit_risk::config::DataConfig;
use credit_risk::decisioning::{
    ApplicantDecision, ApplicantId, ApplicantImporter, DecisionPipeline, ImportReport,
    RejectedRow, RuleEngine,
};
use credit_risk::error::AppError;
use credit_risk::reports::ComparisonSummary;
use credit_risk::scoring::{
    EncodingTable, FeatureImportance, ForestClassifier, ModelScoringAdapter,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Where the applicant batch and the model come from. Unset paths fall back
/// to the configured locations.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct SourceArgs {
    /// Applicant CSV to evaluate
    #[arg(long)]
    pub(crate) data: Option<PathBuf>,
    /// Trained model artifact (JSON)
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
    /// Serving-side encoding table to check against the model's own
    #[arg(long)]
    pub(crate) encoding: Option<PathBuf>,
    /// Skip the model and apply the rule engine only
    #[arg(long)]
    pub(crate) rules_only: bool,
}

pub(crate) fn load_batch(source: &SourceArgs, config: &DataConfig) -> Result<ImportReport, AppError> {
    let path = source
        .data
        .clone()
        .unwrap_or_else(|| config.data_path.clone());
    let report = ApplicantImporter::from_path(&path)?;
    info!(
        data = %path.display(),
        accepted = report.applicants.len(),
        rejected = report.rejected.len(),
        "applicant batch loaded"
    );
    Ok(report)
}

pub(crate) fn load_pipeline(
    source: &SourceArgs,
    config: &DataConfig,
) -> Result<DecisionPipeline, AppError> {
    let engine = RuleEngine::default();
    if source.rules_only {
        return Ok(DecisionPipeline::rules_only(engine));
    }

    let model_path = source
        .model
        .clone()
        .unwrap_or_else(|| config.model_path.clone());
    let model = ForestClassifier::load(&model_path)?;
    let adapter = match &source.encoding {
        Some(path) => {
            let serving = EncodingTable::load(path)?;
            ModelScoringAdapter::with_serving_encoding(model, &serving)?
        }
        None => ModelScoringAdapter::new(model),
    };

    info!(
        model = %model_path.display(),
        encoding = %adapter.encoding().fingerprint(),
        "model artifact loaded"
    );
    Ok(DecisionPipeline::with_model(engine, adapter))
}

/// Decisions for one batch, computed once and shared read-only by the
/// dashboard handlers.
pub(crate) struct DashboardSnapshot {
    pub(crate) decisions: Vec<ApplicantDecision>,
    pub(crate) rejected: Vec<RejectedRow>,
    pub(crate) summary: ComparisonSummary,
    pub(crate) importance: Option<Vec<FeatureImportance>>,
    pub(crate) explain_top_k: usize,
}

impl DashboardSnapshot {
    pub(crate) fn build(
        pipeline: &DecisionPipeline,
        batch: ImportReport,
        explain_top_k: usize,
    ) -> Self {
        let ImportReport {
            applicants,
            rejected,
        } = batch;
        let decisions = pipeline.run(applicants);
        let summary = ComparisonSummary::from_decisions(&decisions);
        let importance = pipeline.adapter().map(ModelScoringAdapter::feature_importance);

        Self {
            decisions,
            rejected,
            summary,
            importance,
            explain_top_k,
        }
    }

    pub(crate) fn decision(&self, id: ApplicantId) -> Option<&ApplicantDecision> {
        self.decisions.iter().find(|decision| decision.id() == id)
    }
}
