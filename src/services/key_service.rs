//! API key issuance and management.
//!
//! This module handles:
//! - Generating new secrets
//! - Hashing secrets with a server-side pepper (HMAC-SHA256)
//! - Create / list / update / delete on top of the credential store
//!
//! # Security
//!
//! - The raw secret is returned once, at creation, and never persisted
//! - Lookups compare keyed hashes, so a leaked table cannot be replayed
//!   without the pepper

use std::sync::Arc;

use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::api_key::{
    ApiKeyResponse, CreateApiKeyRequest, DEFAULT_MONTHLY_LIMIT, NewApiKey, UpdateApiKeyRequest,
};
use crate::store::{CredentialStore, StoreError};

type HmacSha256 = Hmac<Sha256>;

/// Prefix every issued key carries, so keys are recognizable in configs and logs.
pub const KEY_PREFIX: &str = "pk_";

/// Characters of the secret kept in `key_prefix` for display.
const DISPLAY_PREFIX_LEN: usize = 10;

const MAX_NAME_LEN: usize = 100;

/// Keyed hash used for API keys and the admin token.
#[derive(Clone)]
pub struct KeyHasher {
    pepper: Arc<[u8]>,
}

impl KeyHasher {
    pub fn new(pepper: &str) -> Self {
        Self {
            pepper: Arc::from(pepper.as_bytes()),
        }
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.pepper).expect("HMAC key length is valid")
    }

    /// HMAC-SHA256(pepper, secret), hex encoded.
    pub fn hash(&self, secret: &str) -> String {
        let mut mac = self.mac();
        mac.update(secret.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Constant-time check of `presented` against a hash produced by [`KeyHasher::hash`].
    pub fn matches(&self, presented: &str, expected_hash: &str) -> bool {
        let Ok(expected) = hex::decode(expected_hash) else {
            return false;
        };
        let mut mac = self.mac();
        mac.update(presented.as_bytes());
        mac.verify_slice(&expected).is_ok()
    }
}

impl std::fmt::Debug for KeyHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyHasher").finish_non_exhaustive()
    }
}

/// Generate a new API key.
///
/// # Output
///
/// `pk_` followed by 48 hex characters (24 random bytes)
pub fn generate_secret() -> String {
    let bytes: [u8; 24] = rand::random();
    format!("{KEY_PREFIX}{}", hex::encode(bytes))
}

/// Key management on top of a [`CredentialStore`].
#[derive(Clone)]
pub struct KeyService {
    store: Arc<dyn CredentialStore>,
    hasher: KeyHasher,
}

impl KeyService {
    pub fn new(store: Arc<dyn CredentialStore>, hasher: KeyHasher) -> Self {
        Self { store, hasher }
    }

    /// Issue a new key.
    ///
    /// # Process
    ///
    /// 1. Validate name and quota
    /// 2. Generate a random secret
    /// 3. Store its keyed hash and display prefix
    /// 4. Return the record with the secret attached (only time it's shown)
    pub async fn create(&self, request: CreateApiKeyRequest) -> Result<ApiKeyResponse, AppError> {
        let name = validate_name(&request.name)?;
        let monthly_limit = validate_limit(request.monthly_limit)?;

        let secret = generate_secret();
        let new_key = NewApiKey {
            id: Uuid::new_v4(),
            name,
            key_hash: self.hasher.hash(&secret),
            key_prefix: secret[..DISPLAY_PREFIX_LEN].to_string(),
            monthly_limit,
            permissions: vec!["read".to_string(), "write".to_string()],
            created_at: Utc::now(),
        };

        let record = match self.store.insert(new_key).await {
            Ok(record) => record,
            // 192 random bits; a collision means something is badly wrong upstream
            Err(StoreError::Duplicate) => {
                return Err(AppError::InvalidRequest(
                    "Key generation collided, please retry".to_string(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!("Issued API key {} ({})", record.id, record.key_prefix);
        Ok(ApiKeyResponse::from(record).with_secret(secret))
    }

    pub async fn list(&self) -> Result<Vec<ApiKeyResponse>, AppError> {
        let records = self.store.list().await?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    pub async fn update(
        &self,
        id: Uuid,
        request: UpdateApiKeyRequest,
    ) -> Result<ApiKeyResponse, AppError> {
        let name = validate_name(&request.name)?;
        let monthly_limit = validate_limit(request.monthly_limit)?;

        let record = self
            .store
            .update(id, &name, monthly_limit)
            .await?
            .ok_or(AppError::KeyNotFound)?;

        Ok(record.into())
    }

    pub async fn delete(&self, id: Uuid) -> Result<ApiKeyResponse, AppError> {
        let record = self.store.delete(id).await?.ok_or(AppError::KeyNotFound)?;
        tracing::info!("Deleted API key {}", record.id);
        Ok(record.into())
    }
}

fn validate_name(name: &str) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidRequest("Name is required".to_string()));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::InvalidRequest(format!(
            "Name exceeds {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

fn validate_limit(limit: Option<i32>) -> Result<i32, AppError> {
    match limit {
        None => Ok(DEFAULT_MONTHLY_LIMIT),
        Some(limit) if limit > 0 => Ok(limit),
        Some(_) => Err(AppError::InvalidRequest(
            "monthlyLimit must be positive".to_string(),
        )),
    }
}
