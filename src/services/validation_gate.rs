//! Validation gate: maps a presented API key to a credential record.
//!
//! # Flow
//!
//! 1. Reject a missing/blank key before touching the store
//! 2. Hash the key with the server pepper
//! 3. Look up the hash in the credential store
//! 4. On a match, record `last_used_at` (best effort) and return the record

use std::sync::Arc;

use chrono::Utc;

use crate::error::AppError;
use crate::models::api_key::ApiKeyRecord;
use crate::services::key_service::KeyHasher;
use crate::store::CredentialStore;

/// Outcome of a well-formed authentication attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthResult {
    /// Key matched; the record reflects the usage just recorded.
    Valid(ApiKeyRecord),
    Invalid,
}

impl AuthResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, AuthResult::Valid(_))
    }
}

#[derive(Clone)]
pub struct ValidationGate {
    store: Arc<dyn CredentialStore>,
    hasher: KeyHasher,
}

impl ValidationGate {
    pub fn new(store: Arc<dyn CredentialStore>, hasher: KeyHasher) -> Self {
        Self { store, hasher }
    }

    /// Authenticate a presented key.
    ///
    /// # Errors
    ///
    /// - `MissingCredential`: no key, or only whitespace; the store is not queried
    /// - `StoreUnavailable`: the lookup itself failed
    ///
    /// A failure to persist `last_used_at` is logged and otherwise ignored.
    pub async fn authenticate(&self, presented: Option<&str>) -> Result<AuthResult, AppError> {
        // Blank means missing; otherwise the key is matched exactly as presented
        let presented = presented
            .filter(|key| !key.trim().is_empty())
            .ok_or(AppError::MissingCredential)?;

        let key_hash = self.hasher.hash(presented);

        let Some(mut record) = self.store.find_by_key_hash(&key_hash).await? else {
            tracing::info!("Rejected unknown API key");
            return Ok(AuthResult::Invalid);
        };

        let now = Utc::now();
        match self.store.touch_last_used(record.id, now).await {
            Ok(true) => {}
            Ok(false) => tracing::warn!(
                "API key {} was removed before its usage could be recorded",
                record.id
            ),
            Err(e) => tracing::warn!("Failed to record usage for API key {}: {}", record.id, e),
        }
        record.last_used_at = Some(record.last_used_at.map_or(now, |prev| prev.max(now)));

        tracing::info!("Authenticated API key {}", record.id);
        Ok(AuthResult::Valid(record))
    }
}
