//! In-memory cache implementation using moka

use super::CacheLayer;
use anyhow::{Context, Result};
use async_trait::async_trait;
use moka::future::Cache;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Default maximum cache capacity (number of entries)
const DEFAULT_MAX_CAPACITY: u64 = 1_000;

/// Default TTL for cache entries (10 minutes)
const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// Cache entry wrapper that stores serialized JSON data.
/// This allows any serializable type to share one cache instance.
#[derive(Clone)]
struct CacheEntry {
    data: Arc<String>,
}

impl CacheEntry {
    fn new<T: Serialize>(value: &T) -> Result<Self> {
        let json = serde_json::to_string(value).context("Failed to serialize cache value")?;
        Ok(Self {
            data: Arc::new(json),
        })
    }

    fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.data).context("Failed to deserialize cache value")
    }
}

/// In-memory cache backed by moka's async cache.
///
/// Values are stored as JSON strings. Expiration is cache-wide: every entry
/// lives for the TTL given at construction.
pub struct MemoryCache {
    cache: Cache<String, CacheEntry>,
    ttl: Duration,
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entry_count", &self.cache.entry_count())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl MemoryCache {
    /// Create a cache with default capacity and a 10 minute TTL
    pub fn new() -> Self {
        Self::with_capacity_and_ttl(DEFAULT_MAX_CAPACITY, DEFAULT_TTL)
    }

    /// Create a cache with custom capacity and TTL
    pub fn with_capacity_and_ttl(max_capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();

        Self { cache, ttl }
    }

    /// The TTL applied to every entry
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current number of entries
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheLayer for MemoryCache {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        match self.cache.get(key).await {
            Some(entry) => {
                let value = entry.deserialize()?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> Result<()> {
        let entry = CacheEntry::new(value)?;
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        Ok(())
    }
}
