use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{ResponseId, SurveyResponse, SurveySubmission};
use super::questionnaire::Questionnaire;
use super::scoring::{average_rating, detailed_scores, AverageRating, DetailedScores};
use crate::directory::{ServiceDirectory, ServiceId, ServiceUnit};
use crate::util::scores::{format_percentage, ScoreBand};

/// Static data the survey endpoints score against.
#[derive(Debug, Clone, Default)]
pub struct SurveyCatalog {
    pub questionnaire: Questionnaire,
    pub directory: ServiceDirectory,
}

/// Router exposing the service directory and stateless scoring endpoints.
pub fn survey_router(catalog: Arc<SurveyCatalog>) -> Router {
    Router::new()
        .route("/api/v1/services", get(list_services_handler))
        .route("/api/v1/services/:service_id", get(service_handler))
        .route("/api/v1/questionnaire", get(questionnaire_handler))
        .route("/api/v1/surveys/score", post(score_handler))
        .route("/api/v1/surveys/average", post(average_handler))
        .with_state(catalog)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ServiceListParams {
    #[serde(default)]
    search: Option<String>,
}

pub(crate) async fn list_services_handler(
    State(catalog): State<Arc<SurveyCatalog>>,
    Query(params): Query<ServiceListParams>,
) -> Json<Vec<ServiceUnit>> {
    let units = match params.search.as_deref() {
        Some(text) => catalog.directory.search(text).into_iter().cloned().collect(),
        None => catalog.directory.all().to_vec(),
    };
    Json(units)
}

pub(crate) async fn service_handler(
    State(catalog): State<Arc<SurveyCatalog>>,
    Path(service_id): Path<String>,
) -> Response {
    let id = ServiceId::new(service_id);
    match catalog.directory.find(&id) {
        Some(unit) => (StatusCode::OK, Json(unit.clone())).into_response(),
        None => {
            let payload = json!({ "error": format!("service {id} not found") });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn questionnaire_handler(
    State(catalog): State<Arc<SurveyCatalog>>,
) -> Json<Questionnaire> {
    Json(catalog.questionnaire.clone())
}

#[derive(Debug, Serialize)]
pub struct ScoreReport {
    pub service_id: ServiceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<&'static str>,
    pub scores: DetailedScores,
    pub overall_display: String,
    pub band: ScoreBand,
    pub band_label: &'static str,
    pub band_color: &'static str,
    pub interpretation: &'static str,
}

impl ScoreReport {
    pub fn build(catalog: &SurveyCatalog, response: &SurveyResponse) -> Self {
        let scores = detailed_scores(response, &catalog.questionnaire);
        let band = ScoreBand::from_percentage(scores.overall);
        Self {
            service_id: response.service_id.clone(),
            service_name: catalog
                .directory
                .find(&response.service_id)
                .map(|unit| unit.name),
            overall_display: format_percentage(scores.overall),
            scores,
            band,
            band_label: band.label(),
            band_color: band.color(),
            interpretation: band.interpretation(),
        }
    }
}

fn into_response(submission: SurveySubmission, index: usize) -> SurveyResponse {
    SurveyResponse {
        id: ResponseId(format!("adhoc-{index}")),
        service_id: submission.service_id,
        answers: submission.answers,
        completed_at: submission.completed_at.unwrap_or_else(Utc::now),
        feedback: None,
    }
}

pub(crate) async fn score_handler(
    State(catalog): State<Arc<SurveyCatalog>>,
    Json(submission): Json<SurveySubmission>,
) -> Json<ScoreReport> {
    let response = into_response(submission, 0);
    Json(ScoreReport::build(&catalog, &response))
}

#[derive(Debug, Serialize)]
pub struct AverageReport {
    pub responses: usize,
    pub rating: AverageRating,
    pub display: String,
}

pub(crate) async fn average_handler(
    State(catalog): State<Arc<SurveyCatalog>>,
    Json(submissions): Json<Vec<SurveySubmission>>,
) -> Json<AverageReport> {
    let responses: Vec<SurveyResponse> = submissions
        .into_iter()
        .enumerate()
        .map(|(index, submission)| into_response(submission, index))
        .collect();
    let rating = average_rating(&responses, &catalog.questionnaire);
    Json(AverageReport {
        responses: responses.len(),
        rating,
        display: rating.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn read_json(response: Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    fn router() -> Router {
        survey_router(Arc::new(SurveyCatalog::default()))
    }

    #[tokio::test]
    async fn score_route_reports_perfect_overall() {
        let payload = json!({
            "serviceId": 2,
            "answers": [
                { "questionId": "cp_no_extra_fees", "answer": "6" },
                { "questionId": "sq_empathy_courtesy", "answer": 6 }
            ]
        });
        let response = router()
            .oneshot(
                Request::post("/api/v1/surveys/score")
                    .header(axum::http::header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request builds"),
            )
            .await
            .expect("route responds");

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["scores"]["overall"], 100.0);
        assert_eq!(body["overall_display"], "100%");
        assert_eq!(body["service_name"], "Perpustakaan Pusat");
        assert_eq!(body["band"], "excellent");
    }

    #[tokio::test]
    async fn average_route_returns_null_rating_when_nothing_scores() {
        let payload = json!([{ "serviceId": "1", "answers": [] }]);
        let response = router()
            .oneshot(
                Request::post("/api/v1/surveys/average")
                    .header(axum::http::header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .expect("request builds"),
            )
            .await
            .expect("route responds");

        let body = read_json(response).await;
        assert_eq!(body["rating"], Value::Null);
        assert_eq!(body["display"], "N/A");
    }

    #[tokio::test]
    async fn unknown_service_is_not_found() {
        let response = router()
            .oneshot(
                Request::get("/api/v1/services/404")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route responds");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
