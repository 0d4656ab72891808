use crate::cli::ServeArgs;
use crate::infra::{import_matches_from_path, in_memory_service, AppState};
use crate::routes::with_hiring_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use fairhire::config::AppConfig;
use fairhire::error::AppError;
use fairhire::telemetry;
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

    let (service, store) = in_memory_service(config.lifecycle.clone());
    if let Some(path) = args.matches_csv.take() {
        import_matches_from_path(&store, &path)?;
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        store,
    };

    let app = with_hiring_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        interview_date_policy = ?config.lifecycle.interview_date_policy,
        delta_window_days = config.lifecycle.delta_window_days,
        "fairhire lifecycle service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
