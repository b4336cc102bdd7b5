//! Repository summarization endpoint.

use crate::{
    app::AppState, error::AppError, middleware::auth::api_key_from_headers,
    models::summary::{SummarizeRequest, SummarizeResponse},
};
use axum::{Json, body::Bytes, extract::State, http::HeaderMap};

/// Summarize a GitHub repository from its README.
///
/// # Endpoint
///
/// `POST /api/github-summarizer`
///
/// # Authentication
///
/// Requires a valid API key in the `x-api-key` header. The key is checked
/// before the body is looked at, so a missing key is always a 400 even when
/// the body is malformed too.
///
/// # Request Body
///
/// ```json
/// { "repoUrl": "https://github.com/foo/bar" }
/// ```
///
/// `githubUrl` is accepted as an alias.
///
/// # Response
///
/// - **Success (200 OK)**: summary and facts
/// - **Error (400)**: missing API key
/// - **200 with `valid: false`**: unknown API key
/// - **Error (404)**: bad URL, no README, or an empty README
/// - **Error (500)**: model output did not match the schema
/// - **Error (502/504)**: model provider failed or an upstream call timed out
/// - **Error (503)**: credential store unavailable
///
/// ```json
/// {
///   "success": true,
///   "summary": "A tool.",
///   "coolFacts": ["fast", "small", "free"]
/// }
/// ```
pub async fn summarize_repository(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SummarizeResponse>, AppError> {
    let request = SummarizeRequest::from_body(&body);

    let result = state
        .pipeline
        .run(api_key_from_headers(&headers), request.repo_url.as_deref())
        .await?;

    Ok(Json(result.into()))
}
