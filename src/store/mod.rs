//! Key-value persistence behind the community and collaboration services.
//!
//! Values are whole JSON documents stored under string keys. Writes replace
//! the document, so the last writer wins.

pub mod collaborations;
pub mod community;

use std::{collections::HashMap, ops::RangeInclusive, sync::Mutex, time::Duration};

use async_trait::async_trait;
use rand::Rng;
use serde::{Serialize, de::DeserializeOwned};
use sqlx::SqlitePool;
use thiserror::Error;

pub use collaborations::CollaborationService;
pub use community::CommunityService;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage failed: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("corrupt value under {key}: {source}")]
    Corrupt {
        key: String,
        source: serde_json::Error,
    },

    #[error("could not encode value for {key}: {source}")]
    Encode {
        key: String,
        source: serde_json::Error,
    },

    #[error("store lock poisoned")]
    Poisoned,
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: String) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct MemoryKv {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_owned(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// Key-value entries kept in the `kv_entries` table.
#[derive(Clone)]
pub struct SqliteKv {
    db_pool: SqlitePool,
}

impl SqliteKv {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl KeyValueStore for SqliteKv {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_entries WHERE key=?")
            .bind(key)
            .fetch_optional(&self.db_pool)
            .await?;
        Ok(value.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO kv_entries (key,value) VALUES (?,?) \
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.db_pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM kv_entries WHERE key=?")
            .bind(key)
            .execute(&self.db_pool)
            .await?;
        Ok(())
    }
}

/// Artificial delay so the mock services keep the timing shape of a remote call.
#[derive(Debug, Clone)]
pub struct Latency {
    range_ms: RangeInclusive<u64>,
}

impl Latency {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            range_ms: min_ms.min(max_ms)..=max_ms.max(min_ms),
        }
    }

    pub fn none() -> Self {
        Self::new(0, 0)
    }

    pub async fn simulate(&self) {
        if *self.range_ms.end() == 0 {
            return;
        }
        let millis = rand::rng().random_range(self.range_ms.clone());
        tokio::time::sleep(Duration::from_millis(millis)).await;
    }
}

impl Default for Latency {
    fn default() -> Self {
        Self::new(300, 500)
    }
}

pub(crate) async fn read_json<T>(kv: &dyn KeyValueStore, key: &str) -> Result<Option<T>, StoreError>
where
    T: DeserializeOwned,
{
    let Some(raw) = kv.get(key).await? else {
        return Ok(None);
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StoreError::Corrupt {
            key: key.to_owned(),
            source,
        })
}

pub(crate) async fn write_json<T>(kv: &dyn KeyValueStore, key: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value).map_err(|source| StoreError::Encode {
        key: key.to_owned(),
        source,
    })?;
    kv.set(key, raw).await
}

/// Flips `id` in the list stored under `key` and returns whether it is now present.
/// A list that ends up empty is removed rather than stored.
pub(crate) async fn toggle_in_list(kv: &dyn KeyValueStore, key: &str, id: &str) -> Result<bool, StoreError> {
    let mut ids: Vec<String> = read_json(kv, key).await?.unwrap_or_default();
    let present = if let Some(pos) = ids.iter().position(|saved| saved == id) {
        ids.remove(pos);
        false
    } else {
        ids.push(id.to_owned());
        true
    };
    if ids.is_empty() {
        kv.remove(key).await?;
    } else {
        write_json(kv, key, &ids).await?;
    }
    Ok(present)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_kv_round_trip() {
        let kv = MemoryKv::new();
        assert_eq!(kv.get("missing").await.unwrap(), None);

        kv.set("k", "v".to_owned()).await.unwrap();
        assert_eq!(kv.get("k").await.unwrap().as_deref(), Some("v"));

        kv.remove("k").await.unwrap();
        assert_eq!(kv.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_json_is_reported_with_key() {
        let kv = MemoryKv::new();
        kv.set("broken", "{not json".to_owned()).await.unwrap();

        let err = read_json::<Vec<String>>(&kv, "broken").await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { ref key, .. } if key == "broken"));
    }

    #[tokio::test]
    async fn toggle_in_list_adds_then_removes() {
        let kv = MemoryKv::new();
        assert!(toggle_in_list(&kv, "ids", "a").await.unwrap());
        assert!(toggle_in_list(&kv, "ids", "b").await.unwrap());
        assert!(!toggle_in_list(&kv, "ids", "a").await.unwrap());

        let ids: Vec<String> = read_json(&kv, "ids").await.unwrap().unwrap();
        assert_eq!(ids, vec!["b".to_owned()]);
    }

    #[tokio::test]
    async fn emptied_list_is_removed() {
        let kv = MemoryKv::new();
        assert!(toggle_in_list(&kv, "ids", "a").await.unwrap());
        assert!(!toggle_in_list(&kv, "ids", "a").await.unwrap());

        assert_eq!(kv.get("ids").await.unwrap(), None);
    }

    #[tokio::test]
    async fn sqlite_kv_upserts() {
        let db_pool = crate::db::memory_pool().await.unwrap();
        let kv = SqliteKv::new(db_pool);

        kv.set("k", "1".to_owned()).await.unwrap();
        kv.set("k", "2".to_owned()).await.unwrap();
        assert_eq!(kv.get("k").await.unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn latency_range_is_ordered() {
        let latency = Latency::new(500, 300);
        assert_eq!(latency.range_ms, 300..=500);
    }
}
