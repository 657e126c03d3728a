use crate::cli::ServeArgs;
use crate::infra::{build_components, AppState, InMemoryPredictionLog, InMemoryRecommendationLog};
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use diabcare::config::AppConfig;
use diabcare::error::AppError;
use diabcare::recommendation::RecommendationService;
use diabcare::telemetry;
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

    let components = build_components(&config)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        classifier: components.classifier.clone(),
        predictions: Arc::new(InMemoryPredictionLog::default()),
        thresholds: config.recommendation.thresholds,
    };

    let history = Arc::new(InMemoryRecommendationLog::default());
    let service = Arc::new(RecommendationService::new(
        Arc::new(components.engine),
        history,
    ));

    let app = with_service_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        risk_source = ?config.recommendation.risk_source,
        "diabcare recommendation service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
