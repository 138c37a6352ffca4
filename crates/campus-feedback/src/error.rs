use crate::config::ConfigError;
use crate::state::StateError;
use crate::surveys::SurveyStoreError;
use crate::telemetry::TelemetryError;
use crate::testimonials::{ApiError, TestimonialImportError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Api(ApiError),
    SurveyStore(SurveyStoreError),
    State(StateError),
    Import(TestimonialImportError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Api(err) => write!(f, "testimonial api error: {}", err),
            AppError::SurveyStore(err) => write!(f, "survey store error: {}", err),
            AppError::State(err) => write!(f, "state error: {}", err),
            AppError::Import(err) => write!(f, "import error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Api(err) => Some(err),
            AppError::SurveyStore(err) => Some(err),
            AppError::State(err) => Some(err),
            AppError::Import(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Api(ApiError::NotFound(_))
            | AppError::SurveyStore(SurveyStoreError::ResponseNotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            AppError::Api(ApiError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::SurveyStore(SurveyStoreError::FeedbackAlreadyAttached(_)) => {
                StatusCode::CONFLICT
            }
            AppError::Import(_) => StatusCode::BAD_REQUEST,
            AppError::Api(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::SurveyStore(_)
            | AppError::State(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<ApiError> for AppError {
    fn from(value: ApiError) -> Self {
        Self::Api(value)
    }
}

impl From<SurveyStoreError> for AppError {
    fn from(value: SurveyStoreError) -> Self {
        Self::SurveyStore(value)
    }
}

impl From<StateError> for AppError {
    fn from(value: StateError) -> Self {
        Self::State(value)
    }
}

impl From<TestimonialImportError> for AppError {
    fn from(value: TestimonialImportError) -> Self {
        Self::Import(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surveys::ResponseId;

    #[test]
    fn domain_errors_map_to_client_statuses() {
        let not_found = AppError::from(ApiError::NotFound("t-1".to_string())).into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let invalid = AppError::from(ApiError::Validation("rating".to_string())).into_response();
        assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let duplicate = AppError::from(SurveyStoreError::FeedbackAlreadyAttached(ResponseId(
            "r-1".to_string(),
        )))
        .into_response();
        assert_eq!(duplicate.status(), StatusCode::CONFLICT);

        let upstream = AppError::from(ApiError::Transport("refused".to_string())).into_response();
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);
    }
}
