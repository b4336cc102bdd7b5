//! HTTP middleware components.
//!
//! Middleware run before route handlers. Here they guard the key
//! management routes with the admin token.

/// Admin token authentication and API key header helpers
pub mod auth;
