//! API error to HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::ledger::LedgerError;
use crate::store::StoreError;

/// Transport-level failure, carrying the human-readable message that
/// goes into the response body.
#[derive(Debug)]
pub enum ApiError {
    /// 400 — missing or malformed caller input.
    Validation(String),
    /// 404 — unknown donor or resource.
    NotFound(String),
    /// 503 — ledger unconfigured or unreachable.
    ServiceUnavailable(String),
    /// 500 — programming defect or unexpected condition.
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(msg) => ApiError::Validation(msg),
            StoreError::NotFound(msg) => ApiError::NotFound(msg),
            StoreError::InvariantViolation(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        // Ledger faults surfaced from verify/transfer are reported
        // verbatim; the recording path never routes them here.
        ApiError::ServiceUnavailable(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Internal(msg) => {
                tracing::error!(message = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };
        (status, Json(serde_json::json!({ "message": message }))).into_response()
    }
}
