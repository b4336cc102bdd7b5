//! API Key model for authentication.
//!
//! API keys authenticate callers of the summarizer endpoint. They are stored
//! as keyed SHA-256 hashes (HMAC with a server-side pepper), never in plaintext.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Monthly request quota assigned when a create request omits one.
pub const DEFAULT_MONTHLY_LIMIT: i32 = 1000;

/// Represents an API key record from the credential store.
///
/// # Database Table
///
/// Maps to the `api_keys` table with columns:
/// - `id`: Unique identifier (UUID)
/// - `name`: Display label, editable from the dashboard
/// - `key_hash`: HMAC-SHA256 of the actual API key (64 hex characters)
/// - `key_prefix`: First characters of the key, for display only
/// - `monthly_limit`: Advertised quota (recorded, not enforced)
/// - `permissions`: Capability tags such as `read` and `write`
/// - `created_at`: When the key was created
/// - `last_used_at`: Last successful authentication, if any
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ApiKeyRecord {
    pub id: Uuid,

    pub name: String,

    /// When a request comes in with `x-api-key: pk_...`, we:
    /// 1. Compute HMAC-SHA256(pepper, key)
    /// 2. Look up this hash in the store
    /// 3. If found, authenticate the request
    pub key_hash: String,

    pub key_prefix: String,

    pub monthly_limit: i32,

    pub permissions: Vec<String>,

    pub created_at: DateTime<Utc>,

    /// Only ever moves forward once set.
    pub last_used_at: Option<DateTime<Utc>>,
}

/// Fields needed to insert a new key. The store assigns nothing itself.
#[derive(Debug, Clone)]
pub struct NewApiKey {
    pub id: Uuid,
    pub name: String,
    pub key_hash: String,
    pub key_prefix: String,
    pub monthly_limit: i32,
    pub permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl NewApiKey {
    pub fn into_record(self) -> ApiKeyRecord {
        ApiKeyRecord {
            id: self.id,
            name: self.name,
            key_hash: self.key_hash,
            key_prefix: self.key_prefix,
            monthly_limit: self.monthly_limit,
            permissions: self.permissions,
            created_at: self.created_at,
            last_used_at: None,
        }
    }
}

/// Request body for creating a key.
///
/// ```json
/// { "name": "Production", "monthlyLimit": 1000 }
/// ```
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateApiKeyRequest {
    /// Missing is treated like blank and rejected by validation.
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub monthly_limit: Option<i32>,
}

/// Request body for renaming a key or changing its quota.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApiKeyRequest {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub monthly_limit: Option<i32>,
}

/// Key as returned to dashboard clients.
///
/// # Security Note
///
/// The `key` field is ONLY present in the response to a create request. The
/// hash is never serialized.
///
/// ```json
/// {
///   "id": "550e8400-e29b-41d4-a716-446655440000",
///   "name": "Production",
///   "keyPrefix": "pk_3f9a1c",
///   "monthlyLimit": 1000,
///   "permissions": ["read", "write"],
///   "createdAt": "2025-01-15T10:30:00Z",
///   "lastUsed": null
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyResponse {
    pub id: Uuid,
    pub name: String,
    pub key_prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub monthly_limit: i32,
    pub permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_used: Option<DateTime<Utc>>,
}

impl From<ApiKeyRecord> for ApiKeyResponse {
    fn from(record: ApiKeyRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            key_prefix: record.key_prefix,
            key: None, // Never include the secret by default
            monthly_limit: record.monthly_limit,
            permissions: record.permissions,
            created_at: record.created_at,
            last_used: record.last_used_at,
        }
    }
}

impl ApiKeyResponse {
    /// Attach the raw secret (only for the create response).
    pub fn with_secret(mut self, secret: String) -> Self {
        self.key = Some(secret);
        self
    }
}
