use crate::infra::{AppState, DashboardSnapshot};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::NaiveDate;
use credit_risk::decisioning::{ApplicantDecision, ApplicantId, RejectedRow};
use credit_risk::error::AppError;
use credit_risk::reports::ComparisonSummary;
use credit_risk::scoring::{Attribution, FeatureImportance};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub(crate) struct DecisionRow {
    pub(crate) applicant_id: ApplicantId,
    pub(crate) credit_score: u16,
    pub(crate) annual_income: f64,
    pub(crate) loan_amount: f64,
    pub(crate) employment_status: String,
    pub(crate) outstanding_debt: f64,
    pub(crate) application_date: NaiveDate,
    pub(crate) tenure_months: u32,
    pub(crate) debt_to_income: f64,
    pub(crate) system_decision: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) fired_rule: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) ml_prediction: Option<&'static str>,
    pub(crate) loan_outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) risk_flag: Option<&'static str>,
}

impl From<&ApplicantDecision> for DecisionRow {
    fn from(decision: &ApplicantDecision) -> Self {
        let applicant = &decision.applicant;
        Self {
            applicant_id: applicant.id(),
            credit_score: applicant.credit_score(),
            annual_income: applicant.annual_income(),
            loan_amount: applicant.loan_amount(),
            employment_status: applicant.employment_status().to_string(),
            outstanding_debt: applicant.outstanding_debt(),
            application_date: applicant.record().application_date,
            tenure_months: applicant.tenure_months(),
            debt_to_income: applicant.debt_to_income(),
            system_decision: decision.system_decision().label(),
            fired_rule: decision.rule_outcome.fired.map(|rule| rule.label()),
            ml_prediction: decision.ml_prediction().map(|prediction| prediction.label()),
            loan_outcome: applicant.loan_outcome().label(),
            risk_flag: decision.risk_flag().map(|flag| flag.label()),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct DecisionsResponse {
    pub(crate) decisions: Vec<DecisionRow>,
    pub(crate) rejected: Vec<RejectedRowView>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RejectedRowView {
    pub(crate) applicant_id: ApplicantId,
    pub(crate) reason: String,
}

impl From<&RejectedRow> for RejectedRowView {
    fn from(row: &RejectedRow) -> Self {
        Self {
            applicant_id: row.index,
            reason: row.reason.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SummaryResponse {
    #[serde(flatten)]
    pub(crate) summary: ComparisonSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) verdict: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ImportanceEntry {
    pub(crate) feature: &'static str,
    pub(crate) importance: f64,
}

impl From<&FeatureImportance> for ImportanceEntry {
    fn from(entry: &FeatureImportance) -> Self {
        Self {
            feature: entry.feature.name(),
            importance: entry.importance,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ExplanationQuery {
    #[serde(default)]
    pub(crate) top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttributionView {
    pub(crate) feature: &'static str,
    pub(crate) value: f64,
    pub(crate) contribution: f64,
    pub(crate) direction: &'static str,
}

impl From<&Attribution> for AttributionView {
    fn from(attribution: &Attribution) -> Self {
        Self {
            feature: attribution.feature.name(),
            value: attribution.value,
            contribution: attribution.contribution,
            direction: attribution.direction().label(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ExplanationResponse {
    pub(crate) applicant_id: ApplicantId,
    pub(crate) ml_prediction: &'static str,
    pub(crate) approval_probability: f64,
    pub(crate) actual_outcome: &'static str,
    pub(crate) system_decision: &'static str,
    pub(crate) base_value: f64,
    pub(crate) top_features: Vec<AttributionView>,
}

pub(crate) fn dashboard_router(snapshot: Arc<DashboardSnapshot>) -> Router {
    Router::new()
        .route("/api/v1/decisions", get(decisions_endpoint))
        .route("/api/v1/summary", get(summary_endpoint))
        .route("/api/v1/importance", get(importance_endpoint))
        .route(
            "/api/v1/applicants/:index/explanation",
            get(explanation_endpoint),
        )
        .with_state(snapshot)
}

pub(crate) fn with_dashboard_routes(snapshot: Arc<DashboardSnapshot>) -> Router {
    dashboard_router(snapshot)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn decisions_endpoint(
    State(snapshot): State<Arc<DashboardSnapshot>>,
) -> Json<DecisionsResponse> {
    Json(DecisionsResponse {
        decisions: snapshot.decisions.iter().map(DecisionRow::from).collect(),
        rejected: snapshot.rejected.iter().map(RejectedRowView::from).collect(),
    })
}

pub(crate) async fn summary_endpoint(
    State(snapshot): State<Arc<DashboardSnapshot>>,
) -> Json<SummaryResponse> {
    Json(SummaryResponse {
        summary: snapshot.summary.clone(),
        verdict: snapshot.summary.verdict().map(|verdict| verdict.label()),
    })
}

pub(crate) async fn importance_endpoint(
    State(snapshot): State<Arc<DashboardSnapshot>>,
) -> Result<Json<Vec<ImportanceEntry>>, AppError> {
    let importance = snapshot
        .importance
        .as_ref()
        .ok_or_else(|| AppError::NotFound("no model loaded".to_string()))?;
    Ok(Json(importance.iter().map(ImportanceEntry::from).collect()))
}

pub(crate) async fn explanation_endpoint(
    State(snapshot): State<Arc<DashboardSnapshot>>,
    Path(index): Path<usize>,
    Query(query): Query<ExplanationQuery>,
) -> Result<Json<ExplanationResponse>, AppError> {
    let id = ApplicantId(index);
    let decision = snapshot
        .decision(id)
        .ok_or_else(|| AppError::NotFound(format!("applicant {id}")))?;
    let score = decision
        .model_score
        .as_ref()
        .ok_or_else(|| AppError::NotFound(format!("model score for applicant {id}")))?;

    let top_k = query.top_k.unwrap_or(snapshot.explain_top_k);
    Ok(Json(ExplanationResponse {
        applicant_id: id,
        ml_prediction: score.label(),
        approval_probability: score.probability,
        actual_outcome: decision.applicant.loan_outcome().label(),
        system_decision: decision.system_decision().label(),
        base_value: score.explanation.base_value,
        top_features: score
            .top_attributions(top_k)
            .iter()
            .map(AttributionView::from)
            .collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::fixtures::snapshot;
    use crate::infra::SourceArgs;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    fn router(source: SourceArgs) -> Router {
        dashboard_router(Arc::new(snapshot(&source)))
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router responds");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        let body = serde_json::from_slice(&bytes).expect("json body");
        (status, body)
    }

    #[tokio::test]
    async fn decisions_list_accepted_and_rejected_rows() {
        let (status, body) = get_json(router(SourceArgs::default()), "/api/v1/decisions").await;

        assert_eq!(status, StatusCode::OK);
        let decisions = body["decisions"].as_array().expect("decisions array");
        assert_eq!(decisions.len(), 9);
        assert_eq!(decisions[1]["system_decision"], "Denied");
        assert_eq!(decisions[1]["fired_rule"], "Credit score below minimum");
        assert_eq!(decisions[1]["risk_flag"], "HIGH RISK");
        assert_eq!(body["rejected"][0]["applicant_id"], 9);
    }

    #[tokio::test]
    async fn summary_reports_verdict() {
        let (status, body) = get_json(router(SourceArgs::default()), "/api/v1/summary").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rule_accuracy"], 1.0);
        assert_eq!(body["verdict"], "Rule engine still outperforms the ML model");
    }

    #[tokio::test]
    async fn explanation_honours_top_k() {
        let (status, body) = get_json(
            router(SourceArgs::default()),
            "/api/v1/applicants/1/explanation?top_k=2",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ml_prediction"], "Denied");
        let top = body["top_features"].as_array().expect("top features");
        assert_eq!(top.len(), 2);
        assert_eq!(top[0]["feature"], "CreditScore");
        assert_eq!(top[0]["direction"], "Decreases approval");
    }

    #[tokio::test]
    async fn unknown_applicant_is_not_found() {
        let (status, body) = get_json(
            router(SourceArgs::default()),
            "/api/v1/applicants/9/explanation",
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"]
            .as_str()
            .expect("error message")
            .contains("applicant 9"));
    }

    #[tokio::test]
    async fn importance_requires_a_model() {
        let (status, _) = get_json(
            router(SourceArgs {
                rules_only: true,
                ..SourceArgs::default()
            }),
            "/api/v1/importance",
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = get_json(router(SourceArgs::default()), "/api/v1/importance").await;
        assert_eq!(status, StatusCode::OK);
        let entries = body.as_array().expect("importance array");
        assert_eq!(entries.len(), 7);
        assert_eq!(entries[6]["feature"], "CreditScore");
    }
}
