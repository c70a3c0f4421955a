//! In-memory TTL cache for tests and single-process deployments.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use vita_core::error::CacheError;

use super::traits::{Cache, CacheStats};

struct Entry {
    value: JsonValue,
    expires_at: Instant,
}

/// In-memory cache with per-key TTL.
///
/// Expired entries are dropped lazily on read; `purge_expired` exists for
/// long-running processes that want to bound memory.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every expired entry, returning how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let mut entries = match self.entries.write() {
            Ok(entries) => entries,
            Err(_) => return 0,
        };
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, e| e.expires_at > now);
        before - entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        let entry_count = self.entries.read().map(|e| e.len() as u64).unwrap_or(0);
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count,
        }
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn set(&self, key: &str, value: JsonValue, ttl: Duration) -> Result<(), CacheError> {
        let mut entries = self.entries.write().map_err(|_| CacheError::Backend {
            reason: "cache lock poisoned".to_string(),
        })?;
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<JsonValue>, CacheError> {
        {
            let entries = self.entries.read().map_err(|_| CacheError::Backend {
                reason: "cache lock poisoned".to_string(),
            })?;
            if let Some(entry) = entries.get(key) {
                if entry.expires_at > Instant::now() {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(Some(entry.value.clone()));
                }
            } else {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return Ok(None);
            }
        }
        // Entry exists but is expired; drop it under the write lock.
        let mut entries = self.entries.write().map_err(|_| CacheError::Backend {
            reason: "cache lock poisoned".to_string(),
        })?;
        entries.remove(key);
        self.misses.fetch_add(1, Ordering::Relaxed);
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_round_trip() {
        let cache = MemoryCache::new();
        cache
            .set("k", json!({"value": 50.0}), Duration::from_secs(60))
            .await
            .unwrap();
        let got = cache.get("k").await.unwrap().unwrap();
        assert_eq!(got["value"], 50.0);
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let cache = MemoryCache::new();
        assert!(cache.get("absent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_entries_expire_after_ttl() {
        let cache = MemoryCache::new();
        cache
            .set("k", json!(1), Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(25)).await;
        assert!(cache.get("k").await.unwrap().is_none());
        // The expired entry was dropped on read.
        assert_eq!(cache.stats().entry_count, 0);
    }

    #[tokio::test]
    async fn test_set_overwrites_and_resets_ttl() {
        let cache = MemoryCache::new();
        cache
            .set("k", json!(1), Duration::from_millis(10))
            .await
            .unwrap();
        cache
            .set("k", json!(2), Duration::from_secs(60))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(25)).await;
        assert_eq!(cache.get("k").await.unwrap(), Some(json!(2)));
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let cache = MemoryCache::new();
        cache
            .set("old", json!(1), Duration::from_millis(5))
            .await
            .unwrap();
        cache
            .set("fresh", json!(2), Duration::from_secs(60))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.stats().entry_count, 1);
    }
}
