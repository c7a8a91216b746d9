use crate::cli::ServeArgs;
use crate::infra::{load_batch, load_pipeline, AppState, DashboardSnapshot};
use crate::routes::with_dashboard_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use credit_risk::config::AppConfig;
use credit_risk::error::AppError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs, mut config: AppConfig) -> Result<(), AppError> {
    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let pipeline = load_pipeline(&args.source, &config.data)?;
    let batch = load_batch(&args.source, &config.data)?;
    let snapshot = Arc::new(DashboardSnapshot::build(
        &pipeline,
        batch,
        config.data.explain_top_k,
    ));

    let app = with_dashboard_routes(snapshot.clone())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        applicants = snapshot.decisions.len(),
        "credit risk dashboard ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
