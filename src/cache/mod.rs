//! Cache layer
//!
//! In-process caching for read-mostly data, used by the pet dictionary
//! catalog. Values are stored JSON-serialized so any serde type fits through
//! the same cache.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;

/// Cache layer trait
///
/// Generic methods keep this trait out of trait-object territory; the service
/// layer holds the concrete `MemoryCache` behind an `Arc`.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Get a value from cache
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Set a value in cache with TTL
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration)
        -> Result<()>;

    /// Delete a value from cache
    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete all values matching a glob-style pattern
    async fn delete_pattern(&self, pattern: &str) -> Result<()>;

    /// Clear all cache entries
    async fn clear(&self) -> Result<()>;
}

pub use memory::MemoryCache;

/// Create the cache instance from configuration
pub fn create_cache(config: &CacheConfig) -> Arc<MemoryCache> {
    let ttl = Duration::from_secs(config.ttl_seconds);
    Arc::new(MemoryCache::with_capacity_and_ttl(config.max_entries, ttl))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_cache_from_config() {
        let config = CacheConfig::default();
        let cache = create_cache(&config);

        cache
            .set("dictionary:stats", &vec![1, 2, 3], Duration::from_secs(60))
            .await
            .unwrap();
        let result: Option<Vec<i32>> = cache.get("dictionary:stats").await.unwrap();
        assert_eq!(result, Some(vec![1, 2, 3]));
    }
}
