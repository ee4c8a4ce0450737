use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_submission_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use form_relay::config::AppConfig;
use form_relay::error::AppError;
use form_relay::telemetry;
use form_relay::workflows::submission::{
    CsvStatusLedger, DispatchPublisher, HttpDispatchPublisher, StatusLedger, SubmissionService,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let ledger = Arc::new(CsvStatusLedger::new(config.ledger.path.clone()));
    let dispatcher = Arc::new(HttpDispatchPublisher::spawn_from_config(&config.dispatch).await?);

    // Submissions are refused per request until these resolve; the server still starts.
    if let Err(err) = ledger.verify() {
        warn!(error = %err, "status ledger unavailable");
    }
    if let Err(err) = dispatcher.verify() {
        warn!(error = %err, "dispatch endpoint unavailable");
    }

    let submission_service = Arc::new(SubmissionService::new(
        ledger,
        dispatcher,
        &config.intake,
        &config.dispatch,
    ));

    let app = with_submission_routes(submission_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "form relay ready");

    axum::serve(listener, app).await?;
    Ok(())
}
