//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::services::content_fetcher::FetchError;
use crate::services::extractor::ExtractionError;
use crate::store::StoreError;

/// Application-wide error type.
///
/// Each variant is a terminal outcome for the current request; nothing is
/// retried inside the service. `StoreUnavailable` and `UpstreamTimeout` are
/// the only transient ones, so a caller may reasonably retry those.
///
/// # Error Categories
///
/// - **Credential Errors**: missing or unknown API key, store outage
/// - **Fetch Errors**: malformed repository URL, README not retrievable
/// - **Extraction Errors**: empty README, model output off-schema, provider failure
/// - **Management Errors**: unknown key id, bad admin token, invalid request body
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No API key was presented. Returns HTTP 400.
    #[error("API key is missing from the request")]
    MissingCredential,

    /// The presented key matches no record.
    ///
    /// Returns HTTP 200 with `valid: false`: the request itself was well formed.
    #[error("Invalid API key")]
    InvalidCredential,

    /// Credential store could not be queried. Returns HTTP 503.
    ///
    /// The underlying error is logged, never sent to the client.
    #[error("Credential store unavailable")]
    StoreUnavailable(#[source] StoreError),

    /// Repository URL is not `github.com/owner/repo`. Returns HTTP 404.
    #[error("Invalid repository URL: {0}")]
    InvalidLocator(String),

    /// GitHub did not return a README. Returns HTTP 404.
    #[error("README not available: {0}")]
    ContentUnavailable(String),

    /// README exists but has no content. Returns HTTP 404.
    #[error("README content is empty")]
    EmptySource,

    /// Model output did not match the summary schema. Returns HTTP 500.
    #[error("Summarization output did not match the schema: {0}")]
    SchemaViolation(String),

    /// Model provider call failed. Returns HTTP 502.
    #[error("Summarization failed: {0}")]
    GenerationFailed(String),

    /// An external call exceeded its timeout. Returns HTTP 504.
    #[error("Upstream timed out during {0}")]
    UpstreamTimeout(&'static str),

    /// Management request for a key id that does not exist. Returns HTTP 404.
    #[error("API key not found")]
    KeyNotFound,

    /// Admin token missing or wrong. Returns HTTP 401.
    #[error("Unauthorized")]
    Unauthorized,

    /// Request body or parameters are invalid. Returns HTTP 400.
    #[error("{0}")]
    InvalidRequest(String),
}

impl AppError {
    /// Stable machine-readable code, sent as the `error` field.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::MissingCredential => "MissingCredential",
            AppError::InvalidCredential => "InvalidCredential",
            AppError::StoreUnavailable(_) => "StoreUnavailable",
            AppError::InvalidLocator(_) => "InvalidLocator",
            AppError::ContentUnavailable(_) => "ContentUnavailable",
            AppError::EmptySource => "EmptySource",
            AppError::SchemaViolation(_) => "SchemaViolation",
            AppError::GenerationFailed(_) => "GenerationFailed",
            AppError::UpstreamTimeout(_) => "UpstreamTimeout",
            AppError::KeyNotFound => "KeyNotFound",
            AppError::Unauthorized => "Unauthorized",
            AppError::InvalidRequest(_) => "InvalidRequest",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingCredential | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredential => StatusCode::OK,
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::InvalidLocator(_)
            | AppError::ContentUnavailable(_)
            | AppError::EmptySource
            | AppError::KeyNotFound => StatusCode::NOT_FOUND,
            AppError::SchemaViolation(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::GenerationFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// Credential outcomes carry a `valid` flag, the way dashboard clients expect:
/// ```json
/// { "success": false, "valid": false, "message": "API key is missing from the request" }
/// ```
///
/// Everything else uses an error code plus a human-readable message:
/// ```json
/// { "success": false, "error": "InvalidLocator", "message": "Invalid repository URL: ..." }
/// ```
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            AppError::MissingCredential => json!({
                "success": false,
                "valid": false,
                "message": self.to_string(),
            }),
            // The request succeeded; the key just isn't one of ours
            AppError::InvalidCredential => json!({
                "success": true,
                "valid": false,
                "message": self.to_string(),
            }),
            AppError::StoreUnavailable(ref source) => {
                tracing::error!("Credential store error: {}", source);
                json!({
                    "success": false,
                    "error": self.code(),
                    "message": "Credential store is temporarily unavailable",
                })
            }
            _ => json!({
                "success": false,
                "error": self.code(),
                "message": self.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::StoreUnavailable(err)
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::InvalidLocator(detail) => AppError::InvalidLocator(detail),
            FetchError::Timeout => AppError::UpstreamTimeout("README fetch"),
            other @ (FetchError::Status { .. }
            | FetchError::Transport(_)
            | FetchError::TooLarge { .. }
            | FetchError::NotUtf8) => AppError::ContentUnavailable(other.to_string()),
        }
    }
}

impl From<ExtractionError> for AppError {
    fn from(err: ExtractionError) -> Self {
        match err {
            ExtractionError::EmptySource => AppError::EmptySource,
            ExtractionError::SchemaViolation(violation) => {
                AppError::SchemaViolation(violation.reason)
            }
            ExtractionError::Timeout => AppError::UpstreamTimeout("summarization"),
            ExtractionError::Generation(err) => AppError::GenerationFailed(err.to_string()),
        }
    }
}
