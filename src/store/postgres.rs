//! PostgreSQL-backed credential store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{CredentialStore, StoreError};
use crate::db::DbPool;
use crate::models::api_key::{ApiKeyRecord, NewApiKey};

const COLUMNS: &str =
    "id, name, key_hash, key_prefix, monthly_limit, permissions, created_at, last_used_at";

#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: DbPool,
}

impl PgCredentialStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_key_hash(&self, key_hash: &str) -> Result<Option<ApiKeyRecord>, StoreError> {
        // key_hash is UNIQUE, so this is an index lookup returning at most one row
        let record = sqlx::query_as::<_, ApiKeyRecord>(&format!(
            "SELECT {COLUMNS} FROM api_keys WHERE key_hash = $1"
        ))
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn touch_last_used(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError> {
        // GREATEST ignores NULL, so a first use sets the column and later
        // concurrent updates can never move it backwards
        let updated = sqlx::query(
            "UPDATE api_keys SET last_used_at = GREATEST(last_used_at, $2) WHERE id = $1",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(updated > 0)
    }

    async fn list(&self) -> Result<Vec<ApiKeyRecord>, StoreError> {
        let records = sqlx::query_as::<_, ApiKeyRecord>(&format!(
            "SELECT {COLUMNS} FROM api_keys ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn insert(&self, key: NewApiKey) -> Result<ApiKeyRecord, StoreError> {
        let record = sqlx::query_as::<_, ApiKeyRecord>(&format!(
            r#"
            INSERT INTO api_keys (id, name, key_hash, key_prefix, monthly_limit, permissions, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(key.id)
        .bind(&key.name)
        .bind(&key.key_hash)
        .bind(&key.key_prefix)
        .bind(key.monthly_limit)
        .bind(&key.permissions)
        .bind(key.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn update(
        &self,
        id: Uuid,
        name: &str,
        monthly_limit: i32,
    ) -> Result<Option<ApiKeyRecord>, StoreError> {
        let record = sqlx::query_as::<_, ApiKeyRecord>(&format!(
            "UPDATE api_keys SET name = $2, monthly_limit = $3 WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .bind(monthly_limit)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<ApiKeyRecord>, StoreError> {
        let record = sqlx::query_as::<_, ApiKeyRecord>(&format!(
            "DELETE FROM api_keys WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
