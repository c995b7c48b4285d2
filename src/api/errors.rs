use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::catalog::CatalogError;
use crate::services::exam_session::{FinishError, SettingsError};
use crate::services::routing::ExamRoute;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    route: Option<ExamRoute>,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    Forbidden(&'static str),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    /// The candidate's result is not in the state this view serves.
    WrongRoute(ExamRoute),
    /// A malformed (400) or stale (409) answer submission.
    SubmissionRejected { status: StatusCode, detail: String },
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }
}

fn render(status: StatusCode, detail: String, route: Option<ExamRoute>) -> Response {
    (status, Json(ErrorResponse { status: status.as_u16(), detail, route })).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(message) => {
                let mut response = render(StatusCode::UNAUTHORIZED, message.to_string(), None);
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                response
            }
            ApiError::Forbidden(message) => {
                render(StatusCode::FORBIDDEN, message.to_string(), None)
            }
            ApiError::BadRequest(message) => render(StatusCode::BAD_REQUEST, message, None),
            ApiError::NotFound(message) => render(StatusCode::NOT_FOUND, message, None),
            ApiError::Conflict(message) => render(StatusCode::CONFLICT, message, None),
            ApiError::WrongRoute(route) => render(
                StatusCode::CONFLICT,
                format!("Exam is not in this state; continue at '{}'", route.as_str()),
                Some(route),
            ),
            ApiError::SubmissionRejected { status, detail } => {
                render(status, detail, Some(ExamRoute::Error))
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                render(StatusCode::INTERNAL_SERVER_ERROR, message, None)
            }
        }
    }
}

impl From<FinishError> for ApiError {
    fn from(err: FinishError) -> Self {
        match err {
            FinishError::Stale => ApiError::SubmissionRejected {
                status: StatusCode::CONFLICT,
                detail: err.to_string(),
            },
            FinishError::Malformed(_) => ApiError::SubmissionRejected {
                status: StatusCode::BAD_REQUEST,
                detail: err.to_string(),
            },
            FinishError::Database(err) => ApiError::internal(err, "Failed to record submission"),
        }
    }
}

impl From<SettingsError> for ApiError {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::UnknownExam(_) => ApiError::NotFound(err.to_string()),
            SettingsError::InvalidMinutes(_) => ApiError::BadRequest(err.to_string()),
            SettingsError::Database(err) => {
                ApiError::internal(err, "Failed to update exam settings")
            }
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Invalid(message) => ApiError::BadRequest(message),
            CatalogError::Database(err) => ApiError::internal(err, "Failed to create exam"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::submission::SubmissionError;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }

    #[tokio::test]
    async fn malformed_submission_is_bad_request_with_error_route() {
        let response =
            ApiError::from(FinishError::Malformed(SubmissionError::UnknownAnswer(9)))
                .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["status"], 400);
        assert_eq!(body["route"], "error");
    }

    #[tokio::test]
    async fn stale_submission_is_conflict() {
        let response = ApiError::from(FinishError::Stale).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(response).await["route"], "error");
    }

    #[tokio::test]
    async fn wrong_route_names_destination() {
        let response = ApiError::WrongRoute(ExamRoute::Results).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(response).await["route"], "results");
    }

    #[tokio::test]
    async fn plain_errors_omit_route() {
        let response = ApiError::NotFound("Exam not found".into()).into_response();
        let body = body_json(response).await;
        assert_eq!(body["detail"], "Exam not found");
        assert!(body.get("route").is_none());
    }
}
