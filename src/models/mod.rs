//! Data models for API keys and summaries.

/// API key authentication model
pub mod api_key;
/// README summary request/result types
pub mod summary;
