use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::app::error::{JobError, UploadFailure};
use crate::domain::event::EventError;

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    retryable: bool,
    failures: Vec<UploadFailure>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    retryable: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failures: Vec<UploadFailure>,
}

impl AppError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            retryable: false,
            failures: Vec::new(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    pub fn gateway_timeout(message: impl Into<String>) -> Self {
        Self {
            retryable: true,
            ..Self::new(StatusCode::GATEWAY_TIMEOUT, message)
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<EventError> for AppError {
    fn from(err: EventError) -> Self {
        AppError::bad_request(err.to_string())
    }
}

impl From<JobError> for AppError {
    fn from(err: JobError) -> Self {
        let retryable = err.is_retryable();
        let message = err.to_string();
        let mut app_error = match err {
            JobError::Fetch(_) if retryable => AppError::gateway_timeout(message),
            JobError::Fetch(_) => AppError::bad_gateway(message),
            JobError::Decode(_) => AppError::unprocessable(message),
            JobError::Uploads { failures, .. } => AppError {
                failures,
                ..AppError::bad_gateway(message)
            },
            JobError::Transform { .. } | JobError::Task(_) => {
                AppError::internal(message)
            }
        };
        app_error.retryable = retryable;
        app_error
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.message,
            retryable: self.retryable,
            failures: self.failures,
        });
        (self.status, body).into_response()
    }
}
