//! Cache layer
//!
//! In-process caching for data that is expensive to rebuild, currently the
//! WordPress category snapshot used by the content gateway. Entries are
//! JSON-encoded so any serializable type can be stored.
//!
//! The TTL is fixed when the cache is constructed; every entry expires on
//! that schedule. An expired or missing entry reads back as `None` and the
//! caller rebuilds it.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

/// Cache layer trait
///
/// Note: the generic methods make this trait non-object-safe, so it cannot
/// be used as `dyn CacheLayer`. Callers hold the concrete implementation.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Get a value from cache, `None` on miss or expiry
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Store a value; it expires after the cache's configured TTL
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> Result<()>;

    /// Delete a value from cache
    async fn delete(&self, key: &str) -> Result<()>;

    /// Clear all cache entries
    async fn clear(&self) -> Result<()>;
}

pub use memory::MemoryCache;
