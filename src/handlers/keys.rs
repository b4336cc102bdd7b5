//! HTTP handlers for API key management.
//!
//! Mounted under `/api/keys` behind the admin token:
//! - GET /api/keys - List keys, newest first
//! - POST /api/keys - Issue a key
//! - PUT /api/keys/{id} - Rename a key or change its quota
//! - DELETE /api/keys/{id} - Revoke a key

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::AppError;
use crate::models::api_key::{CreateApiKeyRequest, UpdateApiKeyRequest};

/// Parse a JSON body, reporting failures as `InvalidRequest` instead of
/// axum's plain-text rejection.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body)
        .map_err(|e| AppError::InvalidRequest(format!("Invalid request body: {e}")))
}

fn parse_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|_| AppError::InvalidRequest(format!("Invalid key id: {id}")))
}

/// List all keys.
///
/// ```json
/// { "success": true, "data": [ { "id": "...", "name": "Production", ... } ] }
/// ```
pub async fn list_keys(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let keys = state.keys.list().await?;
    Ok(Json(json!({ "success": true, "data": keys })))
}

/// Issue a new key.
///
/// # Request Body
///
/// ```json
/// { "name": "Production", "monthlyLimit": 1000 }
/// ```
///
/// # Response
///
/// Returns 201 Created. The `key` field holds the secret and is only
/// returned here, once.
pub async fn create_key(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let request: CreateApiKeyRequest = parse_body(&body)?;
    let key = state.keys.create(request).await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "data": key }))))
}

pub async fn update_key(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let request: UpdateApiKeyRequest = parse_body(&body)?;
    let key = state.keys.update(id, request).await?;
    Ok(Json(json!({ "success": true, "data": key })))
}

/// Revoke a key. The secret stops authenticating immediately.
pub async fn delete_key(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id)?;
    let key = state.keys.delete(id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "API key deleted successfully",
        "data": key,
    })))
}
