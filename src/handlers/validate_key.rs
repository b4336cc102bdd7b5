//! Standalone API key validation, used by the dashboard playground.

use crate::{
    app::AppState,
    error::AppError,
    models::api_key::ApiKeyResponse,
    services::validation_gate::AuthResult,
};
use axum::{Json, body::Bytes, extract::State};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct ValidateKeyRequest {
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ValidateKeyResponse {
    pub success: bool,
    pub valid: bool,
    pub data: ApiKeyResponse,
}

/// Check an API key without summarizing anything.
///
/// # Endpoint
///
/// `POST /api/validate-key` with body `{ "key": "pk_..." }`
///
/// Counts as a use of the key: `lastUsed` is updated exactly as on the
/// summarizer endpoint.
///
/// # Response
///
/// - **200**: `{ "success": true, "valid": true, "data": { ...key } }`
/// - **200 with `valid: false`**: unknown key
/// - **400**: no key in the body
pub async fn validate_key(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ValidateKeyResponse>, AppError> {
    let request: ValidateKeyRequest = serde_json::from_slice(&body).unwrap_or_default();

    match state.pipeline.gate().authenticate(request.key.as_deref()).await? {
        AuthResult::Valid(record) => Ok(Json(ValidateKeyResponse {
            success: true,
            valid: true,
            data: record.into(),
        })),
        AuthResult::Invalid => Err(AppError::InvalidCredential),
    }
}
