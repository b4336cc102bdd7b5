//! Credential store abstraction.
//!
//! The pipeline only needs two operations from the store: lookup by key hash
//! and the `last_used_at` update. The remaining methods back the key
//! management API.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::api_key::{ApiKeyRecord, NewApiKey};

pub use memory::InMemoryCredentialStore;
pub use postgres::PgCredentialStore;

/// Errors raised by a credential store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached or the query failed.
    #[error("credential store unavailable: {0}")]
    Unavailable(String),

    /// A key with the same hash already exists.
    #[error("duplicate API key")]
    Duplicate,
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return StoreError::Duplicate;
            }
        }
        StoreError::Unavailable(err.to_string())
    }
}

/// Persistent record set of issued API keys.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up the single record whose `key_hash` matches.
    async fn find_by_key_hash(&self, key_hash: &str) -> Result<Option<ApiKeyRecord>, StoreError>;

    /// Record a successful authentication. `last_used_at` never moves backwards
    /// and no other field is touched. Returns false if the record is gone.
    async fn touch_last_used(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError>;

    /// All records, newest first.
    async fn list(&self) -> Result<Vec<ApiKeyRecord>, StoreError>;

    async fn insert(&self, key: NewApiKey) -> Result<ApiKeyRecord, StoreError>;

    /// Rename a key and set its quota. `None` if no such key.
    async fn update(
        &self,
        id: Uuid,
        name: &str,
        monthly_limit: i32,
    ) -> Result<Option<ApiKeyRecord>, StoreError>;

    /// Remove a key, returning the deleted record.
    async fn delete(&self, id: Uuid) -> Result<Option<ApiKeyRecord>, StoreError>;

    /// Connectivity check for the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}
