use campus_feedback::config::AppConfig;
use campus_feedback::directory::{ServiceDirectory, ServiceId};
use campus_feedback::error::AppError;
use campus_feedback::state::FileStateStorage;
use campus_feedback::testimonials::{DataSource, MockTestimonialApi, TestimonialCsvImporter};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// In-memory testimonial backend seeded with the sample set plus an optional CSV export.
pub(crate) fn seeded_backend(
    seed_csv: Option<&Path>,
    directory: &ServiceDirectory,
) -> Result<MockTestimonialApi, AppError> {
    let backend = MockTestimonialApi::seeded();
    if let Some(path) = seed_csv {
        let imported = TestimonialCsvImporter::from_path(path, directory)?;
        info!(path = %path.display(), count = imported.len(), "imported testimonial seed data");
        backend.extend(imported);
    }
    Ok(backend)
}

pub(crate) fn state_storage(config: &AppConfig) -> Arc<FileStateStorage> {
    Arc::new(FileStateStorage::new(&config.storage.state_dir))
}

pub(crate) fn parse_service_id(raw: &str) -> Result<ServiceId, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("service id must not be empty".to_string());
    }
    Ok(ServiceId::new(trimmed))
}

pub(crate) fn blocking_task_failed(err: tokio::task::JoinError) -> AppError {
    AppError::Io(std::io::Error::new(std::io::ErrorKind::Other, err))
}

pub(crate) fn stars(rating: u8) -> String {
    let filled = usize::from(rating.min(5));
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

pub(crate) fn describe_source(source: &DataSource) -> String {
    match source {
        DataSource::Live => "live backend".to_string(),
        DataSource::Mock => "mock dataset".to_string(),
        DataSource::Degraded { reason } => format!(
            "mock dataset (live {} failed: {})",
            reason.operation, reason.error
        ),
    }
}
