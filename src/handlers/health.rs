//! Health check endpoint for service monitoring.

use crate::{app::AppState, error::AppError};
use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Health check response.
///
/// Returns service status and credential store connectivity.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall service status
    pub status: String,

    /// Credential store status
    pub store: String,

    /// Current server timestamp
    pub timestamp: DateTime<Utc>,
}

/// Health check handler.
///
/// # Checks
///
/// - Credential store connectivity (`SELECT 1` on Postgres, always up in memory)
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "status": "healthy",
///   "store": "connected",
///   "timestamp": "2025-12-21T19:00:00Z"
/// }
/// ```
///
/// # Response (503 Service Unavailable)
///
/// If the store is unreachable, returns the standard error response.
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    state.store.ping().await?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        store: "connected".to_string(),
        timestamp: Utc::now(),
    }))
}
