//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;

const INTERNAL_MESSAGE: &str = "An unexpected error occurred";

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
}

impl ApiError {
    /// Treats a missing referenced entity as a bad request rather than a
    /// missing resource.
    pub fn reference_as_bad_request(err: DomainError) -> Self {
        match err {
            DomainError::ReferenceNotFound { .. } => ApiError::BadRequest(err.to_string()),
            other => ApiError::Domain(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(err) => domain_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_to_response(err: DomainError) -> (StatusCode, String) {
    match &err {
        DomainError::ReferenceNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        DomainError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        DomainError::ConcurrencyConflict { .. } => (StatusCode::CONFLICT, err.to_string()),
        DomainError::Store(store_err) => {
            tracing::error!(error = %store_err, "store failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_MESSAGE.to_string(),
            )
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}
