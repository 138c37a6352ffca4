use crate::cli::ServeArgs;
use crate::infra::{seeded_backend, AppState};
use crate::routes::with_platform_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use campus_feedback::config::{AppConfig, BackendMode};
use campus_feedback::error::AppError;
use campus_feedback::surveys::SurveyCatalog;
use campus_feedback::telemetry;
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

    let catalog = Arc::new(SurveyCatalog::default());
    let backend = Arc::new(seeded_backend(
        args.seed_csv.as_deref(),
        &catalog.directory,
    )?);

    // This process is the backend; it never proxies to APP_API_BASE_URL.
    if config.backend.mode == BackendMode::Live {
        warn!(
            base_url = %config.backend.base_url,
            "live backend mode configured; serving the in-memory dataset regardless"
        );
    }

    let app = with_platform_routes(catalog, backend)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "campus feedback service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
