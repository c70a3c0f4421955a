//! Cache backend trait.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use vita_core::error::CacheError;

/// Cache backend trait for pluggable TTL key-value implementations.
///
/// Values are structured JSON documents serialized losslessly (numbers,
/// booleans, nested maps). Implementations must be thread-safe; both calls
/// are potentially-blocking I/O and callers must not hold locks across them.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Store `value` under `key`, overwriting any prior entry and resetting
    /// its TTL.
    async fn set(&self, key: &str, value: JsonValue, ttl: Duration) -> Result<(), CacheError>;

    /// Fetch the value under `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<JsonValue>, CacheError>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses (absent or expired).
    pub misses: u64,
    /// Number of entries currently held, expired ones included.
    pub entry_count: u64,
}

impl CacheStats {
    /// Hit rate in [0.0, 1.0].
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            entry_count: 5,
        };
        assert!((stats.hit_rate() - 0.8).abs() < 1e-9);
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }
}
