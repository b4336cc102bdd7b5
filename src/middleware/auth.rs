//! Request authentication helpers.
//!
//! Two credentials reach the service:
//! - `x-api-key`: a caller's API key, checked by the validation gate
//! - `Authorization: Bearer <token>`: the admin token guarding key management

use crate::{app::AppState, error::AppError};
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};

/// Header carrying the caller's API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Read the API key header. Non-UTF-8 values count as missing.
pub fn api_key_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers.get(API_KEY_HEADER).and_then(|h| h.to_str().ok())
}

/// Admin token middleware for the key management routes.
///
/// # Flow
///
/// 1. Extract `Authorization: Bearer <token>` from the request
/// 2. Compare its keyed hash with the configured token's, in constant time
/// 3. On a match, call the next handler; otherwise return 401
///
/// Only mounted when an admin token is configured. If the state carries no
/// token every request is rejected.
pub async fn admin_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let expected_hash = state.admin_token_hash.as_deref().ok_or(AppError::Unauthorized)?;

    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;

    if !state.hasher.matches(token, expected_hash) {
        tracing::warn!("Rejected key management request with a wrong admin token");
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_the_api_key_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(api_key_from_headers(&headers), None);

        headers.insert(API_KEY_HEADER, HeaderValue::from_static("pk_abc123"));
        assert_eq!(api_key_from_headers(&headers), Some("pk_abc123"));
    }

    #[test]
    fn non_utf8_key_counts_as_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            API_KEY_HEADER,
            HeaderValue::from_bytes(&[0x70, 0x6b, 0xff]).unwrap(),
        );
        assert_eq!(api_key_from_headers(&headers), None);
    }
}
