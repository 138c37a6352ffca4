use crate::infra::AppState;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use campus_feedback::error::AppError;
use campus_feedback::surveys::{survey_router, SurveyCatalog};
use campus_feedback::testimonials::{testimonial_router, MockTestimonialApi, TestimonialCsvImporter};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize)]
pub(crate) struct TestimonialImportRequest {
    pub(crate) csv: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct TestimonialImportResponse {
    pub(crate) imported: usize,
    pub(crate) total: usize,
}

#[derive(Clone)]
pub(crate) struct ImportState {
    backend: Arc<MockTestimonialApi>,
    catalog: Arc<SurveyCatalog>,
}

pub(crate) fn with_platform_routes(
    catalog: Arc<SurveyCatalog>,
    backend: Arc<MockTestimonialApi>,
) -> Router {
    let import_routes = Router::new()
        .route("/api/v1/testimonials/import", post(testimonial_import_endpoint))
        .with_state(ImportState {
            backend: backend.clone(),
            catalog: catalog.clone(),
        });

    survey_router(catalog)
        .merge(testimonial_router(backend))
        .merge(import_routes)
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

/// Appends testimonials from a CSV export to the in-memory backend.
pub(crate) async fn testimonial_import_endpoint(
    State(state): State<ImportState>,
    Json(payload): Json<TestimonialImportRequest>,
) -> Result<(StatusCode, Json<TestimonialImportResponse>), AppError> {
    let reader = Cursor::new(payload.csv.into_bytes());
    let imported = TestimonialCsvImporter::from_reader(reader, &state.catalog.directory)?;
    let count = imported.len();
    state.backend.extend(imported);
    let total = state.backend.snapshot().len();

    info!(imported = count, total, "testimonial CSV imported");

    Ok((
        StatusCode::CREATED,
        Json(TestimonialImportResponse {
            imported: count,
            total,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    const EXPORT: &str = "id,name,role,content,rating,sentiment,date,service_id\nx-1,Sari,Alumni,Rapi dan cepat,5,,2024-10-01,3\nx-2,Tono,Staff,Antrian panjang,2,,2024-10-02,5\n";

    fn app(ready: bool) -> Router {
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        with_platform_routes(
            Arc::new(SurveyCatalog::default()),
            Arc::new(MockTestimonialApi::seeded()),
        )
        .layer(Extension(state))
    }

    fn import_state() -> ImportState {
        ImportState {
            backend: Arc::new(MockTestimonialApi::seeded()),
            catalog: Arc::new(SurveyCatalog::default()),
        }
    }

    #[tokio::test]
    async fn readiness_reflects_startup_flag() {
        let initializing = app(false)
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(initializing.status(), StatusCode::SERVICE_UNAVAILABLE);

        let ready = app(true)
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(ready.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn platform_routes_serve_surveys_and_testimonials() {
        let router = app(true);

        let health = router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(health.status(), StatusCode::OK);

        let services = router
            .clone()
            .oneshot(
                Request::get("/api/v1/services")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(services.status(), StatusCode::OK);

        let testimonials = router
            .oneshot(
                Request::get("/api/v1/testimonials?limit=5")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(testimonials.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn import_endpoint_extends_backend() {
        let state = import_state();
        let backend = state.backend.clone();

        let (status, Json(body)) = testimonial_import_endpoint(
            State(state),
            Json(TestimonialImportRequest {
                csv: EXPORT.to_string(),
            }),
        )
        .await
        .expect("import succeeds");

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body.imported, 2);
        assert_eq!(body.total, 14);
        assert_eq!(backend.snapshot().len(), 14);
    }

    #[tokio::test]
    async fn import_endpoint_rejects_invalid_rows() {
        let result = testimonial_import_endpoint(
            State(import_state()),
            Json(TestimonialImportRequest {
                csv: "id,name,role,content,rating,sentiment,date,service_id\nx-1,Sari,Alumni,Oke,9,,2024-10-01,3\n"
                    .to_string(),
            }),
        )
        .await;

        match result {
            Err(err) => assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST),
            Ok(_) => panic!("expected import to fail"),
        }
    }
}
