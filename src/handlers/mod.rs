//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (headers, JSON body, URL params)
//! 2. Delegates to the pipeline or key service
//! 3. Returns a JSON response, or an `AppError` that renders itself

/// Health check endpoint
pub mod health;
/// API key management endpoints
pub mod keys;
/// Repository summarization endpoint
pub mod summarize;
/// Standalone key validation endpoint
pub mod validate_key;
