use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_rate_check_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use loan_rate::config::AppConfig;
use loan_rate::error::AppError;
use loan_rate::rate_check::{HttpScoringClient, RateCheckService};
use loan_rate::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

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

    let scoring = Arc::new(HttpScoringClient::new(&config.scoring));
    let rate_check_service = Arc::new(RateCheckService::new(scoring));

    let app = with_rate_check_routes(rate_check_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        scoring_endpoint = %config.scoring.endpoint,
        "loan rate check service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
