//! GitHub README summarizer.
//!
//! An HTTP service that takes a GitHub repository URL and an API key, fetches
//! the repository's README and asks a language model for a short summary plus
//! a list of notable facts, returned as a strictly validated JSON object.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Credential Store**: PostgreSQL with sqlx, or in memory
//! - **Authentication**: `x-api-key` header, HMAC-SHA256 hashed keys
//! - **Content**: GitHub REST API via reqwest
//! - **Extraction**: OpenAI-compatible chat completions with schema-checked output

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;
