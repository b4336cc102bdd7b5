//! Business logic services.
//!
//! Services hold the pipeline stages and key management, separated from the
//! HTTP handlers. External systems (credential store, GitHub, the model
//! provider) are reached through traits so each stage can be tested alone.

pub mod content_fetcher;
pub mod extractor;
pub mod generator;
pub mod key_service;
pub mod pipeline;
pub mod schema;
pub mod validation_gate;
