use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::api::{ApiError, TestimonialApi};
use super::domain::{NewReply, NewTestimonial, TestimonialId, TestimonialPatch};
use super::insights::{StatsPeriod, StatsQuery, TrendInterval, TrendsQuery};
use super::query::TestimonialQueryParams;
use crate::directory::ServiceId;

/// REST surface for testimonials, backed by any in-process [`TestimonialApi`].
///
/// Handlers call the backend inline, so it must not perform network I/O.
pub fn testimonial_router<A>(api: Arc<A>) -> Router
where
    A: TestimonialApi + 'static,
{
    Router::new()
        .route(
            "/api/v1/testimonials",
            get(list_handler::<A>).post(create_handler::<A>),
        )
        .route("/api/v1/testimonials/stats", get(stats_handler::<A>))
        .route("/api/v1/testimonials/trends", get(trends_handler::<A>))
        .route(
            "/api/v1/testimonials/:id",
            get(detail_handler::<A>)
                .put(update_handler::<A>)
                .delete(delete_handler::<A>),
        )
        .route("/api/v1/testimonials/:id/replies", post(reply_handler::<A>))
        .route("/api/v1/testimonials/:id/helpful", post(helpful_handler::<A>))
        .route("/api/v1/testimonials/:id/flag", post(flag_handler::<A>))
        .with_state(api)
}

fn error_response(error: ApiError) -> Response {
    let status = match &error {
        ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ApiError::Transport(_) | ApiError::Status { .. } | ApiError::Parse(_) => {
            StatusCode::BAD_GATEWAY
        }
    };
    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}

fn respond<T: serde::Serialize>(status: StatusCode, result: Result<T, ApiError>) -> Response {
    match result {
        Ok(value) => (status, Json(value)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<A: TestimonialApi + 'static>(
    State(api): State<Arc<A>>,
    Query(params): Query<TestimonialQueryParams>,
) -> Response {
    let result = params
        .into_filters()
        .and_then(|filters| api.get_testimonials(&filters));
    respond(StatusCode::OK, result)
}

pub(crate) async fn create_handler<A: TestimonialApi + 'static>(
    State(api): State<Arc<A>>,
    Json(input): Json<NewTestimonial>,
) -> Response {
    let result = api.create_testimonial(input);
    if let Ok(created) = &result {
        info!(testimonial_id = %created.id, service_id = %created.service_id, "testimonial created");
    }
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn detail_handler<A: TestimonialApi + 'static>(
    State(api): State<Arc<A>>,
    Path(id): Path<String>,
) -> Response {
    respond(StatusCode::OK, api.get_testimonial_by_id(&TestimonialId(id)))
}

pub(crate) async fn update_handler<A: TestimonialApi + 'static>(
    State(api): State<Arc<A>>,
    Path(id): Path<String>,
    Json(patch): Json<TestimonialPatch>,
) -> Response {
    respond(StatusCode::OK, api.update_testimonial(&TestimonialId(id), patch))
}

pub(crate) async fn delete_handler<A: TestimonialApi + 'static>(
    State(api): State<Arc<A>>,
    Path(id): Path<String>,
) -> Response {
    match api.delete_testimonial(&TestimonialId(id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reply_handler<A: TestimonialApi + 'static>(
    State(api): State<Arc<A>>,
    Path(id): Path<String>,
    Json(reply): Json<NewReply>,
) -> Response {
    respond(StatusCode::CREATED, api.add_reply(&TestimonialId(id), reply))
}

pub(crate) async fn helpful_handler<A: TestimonialApi + 'static>(
    State(api): State<Arc<A>>,
    Path(id): Path<String>,
) -> Response {
    respond(StatusCode::OK, api.mark_as_helpful(&TestimonialId(id)))
}

#[derive(Debug, Deserialize)]
pub(crate) struct FlagRequest {
    #[serde(default)]
    reason: String,
}

pub(crate) async fn flag_handler<A: TestimonialApi + 'static>(
    State(api): State<Arc<A>>,
    Path(id): Path<String>,
    Json(request): Json<FlagRequest>,
) -> Response {
    respond(
        StatusCode::OK,
        api.flag_testimonial(&TestimonialId(id), &request.reason),
    )
}

/// Query string shared by the stats and trends endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InsightParams {
    service_id: Option<String>,
    period: Option<String>,
    interval: Option<String>,
}

impl InsightParams {
    fn service_id(&self) -> Option<ServiceId> {
        self.service_id
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty() && !raw.eq_ignore_ascii_case("all"))
            .map(ServiceId::new)
    }

    fn period(&self) -> Result<StatsPeriod, ApiError> {
        match self.period.as_deref() {
            None => Ok(StatsPeriod::default()),
            Some(raw) => StatsPeriod::parse(raw)
                .ok_or_else(|| ApiError::Validation(format!("unknown period '{raw}'"))),
        }
    }

    fn interval(&self) -> Result<TrendInterval, ApiError> {
        match self.interval.as_deref() {
            None => Ok(TrendInterval::default()),
            Some(raw) => TrendInterval::parse(raw)
                .ok_or_else(|| ApiError::Validation(format!("unknown interval '{raw}'"))),
        }
    }
}

pub(crate) async fn stats_handler<A: TestimonialApi + 'static>(
    State(api): State<Arc<A>>,
    Query(params): Query<InsightParams>,
) -> Response {
    let result = params.period().and_then(|period| {
        api.get_testimonial_stats(&StatsQuery {
            service_id: params.service_id(),
            period,
        })
    });
    respond(StatusCode::OK, result)
}

pub(crate) async fn trends_handler<A: TestimonialApi + 'static>(
    State(api): State<Arc<A>>,
    Query(params): Query<InsightParams>,
) -> Response {
    let query = params.period().and_then(|period| {
        Ok(TrendsQuery {
            service_id: params.service_id(),
            period,
            interval: params.interval()?,
        })
    });
    respond(
        StatusCode::OK,
        query.and_then(|query| api.get_testimonial_trends(&query)),
    )
}
