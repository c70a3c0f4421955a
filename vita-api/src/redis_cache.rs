//! Redis-backed cache implementation.
//!
//! Production backend for the `Cache` capability: JSON payloads stored as
//! strings with `SETEX` semantics. Connection management uses the redis
//! crate's `ConnectionManager`, which reconnects transparently and is cheap
//! to clone per operation.

use std::time::Duration;

use async_trait::async_trait;
use redis::{
    aio::{ConnectionManager, ConnectionManagerConfig},
    AsyncCommands, Client,
};
use serde_json::Value as JsonValue;

use vita_core::error::CacheError;
use vita_storage::Cache;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Redis cache configuration.
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    /// Redis connection URL.
    pub url: String,
    /// Per-attempt connection timeout.
    pub connection_timeout: Duration,
    /// Reconnect attempts before an operation fails.
    pub retries: usize,
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379/0".to_string(),
            connection_timeout: Duration::from_millis(500),
            retries: 1,
        }
    }
}

impl RedisCacheConfig {
    /// Create RedisCacheConfig from environment variables.
    ///
    /// Environment variables:
    /// - `VITA_REDIS_URL`: Connection URL (default: redis://localhost:6379/0)
    /// - `VITA_REDIS_TIMEOUT_MS`: Connection timeout (default: 500)
    pub fn from_env() -> Self {
        let url = std::env::var("VITA_REDIS_URL")
            .unwrap_or_else(|_| "redis://localhost:6379/0".to_string());
        let connection_timeout = Duration::from_millis(
            std::env::var("VITA_REDIS_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(500),
        );
        Self {
            url,
            connection_timeout,
            retries: 1,
        }
    }
}

// ============================================================================
// CLIENT
// ============================================================================

/// Redis-backed TTL key-value cache.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    /// Connect to Redis with the given configuration.
    pub async fn connect(config: &RedisCacheConfig) -> Result<Self, CacheError> {
        let manager_config = ConnectionManagerConfig::new()
            .set_number_of_retries(config.retries)
            .set_connection_timeout(config.connection_timeout);

        let client = Client::open(config.url.as_str()).map_err(backend_err)?;
        let conn = client
            .get_connection_manager_with_config(manager_config)
            .await
            .map_err(backend_err)?;

        Ok(Self { conn })
    }
}

fn backend_err(err: redis::RedisError) -> CacheError {
    CacheError::Backend {
        reason: err.to_string(),
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn set(&self, key: &str, value: JsonValue, ttl: Duration) -> Result<(), CacheError> {
        let payload = serde_json::to_string(&value).map_err(|err| CacheError::Serialization {
            reason: err.to_string(),
        })?;
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(key, payload, ttl.as_secs())
            .await
            .map_err(backend_err)?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<JsonValue>, CacheError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(key).await.map_err(backend_err)?;
        match raw {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|err| CacheError::Serialization {
                    reason: err.to_string(),
                }),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = RedisCacheConfig::default();
        assert_eq!(config.url, "redis://localhost:6379/0");
        assert_eq!(config.retries, 1);
    }
}
