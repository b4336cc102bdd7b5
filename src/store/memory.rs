//! In-process credential store.
//!
//! Used when no `DATABASE_URL` is configured and as the backing store in tests.
//! Records are lost on restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CredentialStore, StoreError};
use crate::models::api_key::{ApiKeyRecord, NewApiKey};

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<Uuid, ApiKeyRecord>,
    // key_hash -> id, mirrors the UNIQUE index in Postgres
    by_hash: HashMap<String, Uuid>,
}

#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    inner: RwLock<Inner>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_key_hash(&self, key_hash: &str) -> Result<Option<ApiKeyRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_hash
            .get(key_hash)
            .and_then(|id| inner.records.get(id))
            .cloned())
    }

    async fn touch_last_used(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(record) = inner.records.get_mut(&id) else {
            return Ok(false);
        };
        record.last_used_at = Some(record.last_used_at.map_or(at, |prev| prev.max(at)));
        Ok(true)
    }

    async fn list(&self) -> Result<Vec<ApiKeyRecord>, StoreError> {
        let inner = self.inner.read().await;
        let mut records: Vec<ApiKeyRecord> = inner.records.values().cloned().collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn insert(&self, key: NewApiKey) -> Result<ApiKeyRecord, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.by_hash.contains_key(&key.key_hash) || inner.records.contains_key(&key.id) {
            return Err(StoreError::Duplicate);
        }
        let record = key.into_record();
        inner.by_hash.insert(record.key_hash.clone(), record.id);
        inner.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        id: Uuid,
        name: &str,
        monthly_limit: i32,
    ) -> Result<Option<ApiKeyRecord>, StoreError> {
        let mut inner = self.inner.write().await;
        Ok(inner.records.get_mut(&id).map(|record| {
            record.name = name.to_string();
            record.monthly_limit = monthly_limit;
            record.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<ApiKeyRecord>, StoreError> {
        let mut inner = self.inner.write().await;
        let removed = inner.records.remove(&id);
        if let Some(ref record) = removed {
            inner.by_hash.remove(&record.key_hash);
        }
        Ok(removed)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_key(hash: &str, created_at: DateTime<Utc>) -> NewApiKey {
        NewApiKey {
            id: Uuid::new_v4(),
            name: "test".to_string(),
            key_hash: hash.to_string(),
            key_prefix: "pk_test".to_string(),
            monthly_limit: 1000,
            permissions: vec!["read".to_string()],
            created_at,
        }
    }

    #[tokio::test]
    async fn insert_then_find_by_hash() {
        let store = InMemoryCredentialStore::new();
        let inserted = store.insert(new_key("h1", Utc::now())).await.unwrap();

        let found = store.find_by_key_hash("h1").await.unwrap();
        assert_eq!(found, Some(inserted));
        assert!(store.find_by_key_hash("h2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_hash_is_rejected() {
        let store = InMemoryCredentialStore::new();
        store.insert(new_key("h1", Utc::now())).await.unwrap();

        let err = store.insert(new_key("h1", Utc::now())).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate));
    }

    #[tokio::test]
    async fn touch_never_moves_backwards() {
        let store = InMemoryCredentialStore::new();
        let record = store.insert(new_key("h1", Utc::now())).await.unwrap();
        let later = Utc::now();
        let earlier = later - Duration::seconds(30);

        assert!(store.touch_last_used(record.id, later).await.unwrap());
        assert!(store.touch_last_used(record.id, earlier).await.unwrap());

        let found = store.find_by_key_hash("h1").await.unwrap().unwrap();
        assert_eq!(found.last_used_at, Some(later));
        assert_eq!(found.name, record.name);
        assert_eq!(found.monthly_limit, record.monthly_limit);
    }

    #[tokio::test]
    async fn touch_unknown_id_reports_missing() {
        let store = InMemoryCredentialStore::new();
        assert!(!store.touch_last_used(Uuid::new_v4(), Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = InMemoryCredentialStore::new();
        let now = Utc::now();
        store.insert(new_key("old", now - Duration::days(1))).await.unwrap();
        store.insert(new_key("new", now)).await.unwrap();

        let hashes: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.key_hash)
            .collect();
        assert_eq!(hashes, vec!["new", "old"]);
    }

    #[tokio::test]
    async fn update_and_delete() {
        let store = InMemoryCredentialStore::new();
        let record = store.insert(new_key("h1", Utc::now())).await.unwrap();

        let updated = store.update(record.id, "renamed", 50).await.unwrap().unwrap();
        assert_eq!(updated.name, "renamed");
        assert_eq!(updated.monthly_limit, 50);
        assert_eq!(updated.key_hash, "h1");

        let deleted = store.delete(record.id).await.unwrap().unwrap();
        assert_eq!(deleted.id, record.id);
        assert!(store.find_by_key_hash("h1").await.unwrap().is_none());
        assert!(store.delete(record.id).await.unwrap().is_none());
        assert!(store.update(record.id, "x", 1).await.unwrap().is_none());
    }
}
