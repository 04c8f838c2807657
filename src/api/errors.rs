use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::exam_flow::ExamFlowError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    Forbidden(&'static str),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    BadGateway(String),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }

    /// Flatten `validator` derive output into one request-level message.
    pub(crate) fn from_validation(errors: validator::ValidationErrors) -> Self {
        let detail = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| match &error.message {
                    Some(message) => message.to_string(),
                    None => format!("invalid value for {field}"),
                })
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::BadRequest(if detail.is_empty() { "invalid request".to_string() } else { detail })
    }
}

impl From<ExamFlowError> for ApiError {
    fn from(err: ExamFlowError) -> Self {
        match err {
            ExamFlowError::QuizNotFound => ApiError::NotFound("Quiz not found".to_string()),
            ExamFlowError::AttemptNotFound => {
                ApiError::NotFound("Attempt not found".to_string())
            }
            ExamFlowError::QuestionNotFound => {
                ApiError::NotFound("Question not found".to_string())
            }
            ExamFlowError::AttemptAlreadyFinished => {
                ApiError::Conflict("Attempt is already finished".to_string())
            }
            ExamFlowError::QuizLocked { seconds_left } => ApiError::BadRequest(format!(
                "Quiz has not started yet; starts in {seconds_left} seconds"
            )),
            ExamFlowError::Validation(message) => ApiError::BadRequest(message),
            ExamFlowError::Storage(err) => ApiError::internal(err, "Storage failure"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(message) => {
                let status = StatusCode::UNAUTHORIZED;
                let mut response = (
                    status,
                    Json(ErrorResponse { status: status.as_u16(), detail: message.to_string() }),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                response
            }
            ApiError::Forbidden(message) => {
                let status = StatusCode::FORBIDDEN;
                (
                    status,
                    Json(ErrorResponse { status: status.as_u16(), detail: message.to_string() }),
                )
                    .into_response()
            }
            ApiError::BadRequest(message) => {
                let status = StatusCode::BAD_REQUEST;
                (status, Json(ErrorResponse { status: status.as_u16(), detail: message }))
                    .into_response()
            }
            ApiError::NotFound(message) => {
                let status = StatusCode::NOT_FOUND;
                (status, Json(ErrorResponse { status: status.as_u16(), detail: message }))
                    .into_response()
            }
            ApiError::Conflict(message) => {
                let status = StatusCode::CONFLICT;
                (status, Json(ErrorResponse { status: status.as_u16(), detail: message }))
                    .into_response()
            }
            ApiError::BadGateway(message) => {
                tracing::error!(error = %message, "Upstream service failure");
                let status = StatusCode::BAD_GATEWAY;
                (status, Json(ErrorResponse { status: status.as_u16(), detail: message }))
                    .into_response()
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                (status, Json(ErrorResponse { status: status.as_u16(), detail: message }))
                    .into_response()
            }
        }
    }
}
