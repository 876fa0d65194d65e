//! Mapping of service failures onto HTTP responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::booking::services::BookingServiceError;

/// JSON body returned for every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable error kind.
    pub error: String,
    /// Human-readable explanation.
    pub message: String,
}

/// Errors produced by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No usable identity accompanied the request.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// The request could not be decoded.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The booking service rejected the request.
    #[error(transparent)]
    Service(#[from] BookingServiceError),
}

impl ApiError {
    fn status_and_body(&self) -> (StatusCode, ErrorBody) {
        match self {
            Self::Unauthenticated(message) => (
                StatusCode::UNAUTHORIZED,
                body("unauthenticated", message.clone()),
            ),
            Self::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                body("validation_error", message.clone()),
            ),
            Self::Service(err) => {
                let status = match err {
                    BookingServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
                    BookingServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
                    BookingServiceError::Validation(_)
                    | BookingServiceError::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
                    BookingServiceError::Locked { .. } | BookingServiceError::Conflict(_) => {
                        StatusCode::CONFLICT
                    }
                    BookingServiceError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                    BookingServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let message = match err {
                    BookingServiceError::Internal(_) => "an unexpected error occurred".to_owned(),
                    other => other.to_string(),
                };
                (status, body(err.kind(), message))
            }
        }
    }
}

fn body(kind: &str, message: String) -> ErrorBody {
    ErrorBody {
        error: kind.to_owned(),
        message,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Service(BookingServiceError::Internal(cause)) = &self {
            error!(error = %cause, "booking request failed");
        }
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}
