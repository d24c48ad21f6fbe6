//! # Cache Drivers
//!
//! Storage backends behind [`super::Cache`]. Every driver stores opaque
//! string values keyed by a validated [`CacheKey`].
use async_trait::async_trait;

use super::CacheResult;
use crate::schema::value_objects::CacheKey;

pub mod file;
#[cfg(feature = "cache_inmem")]
pub mod inmem;
pub mod null;

/// Trait representing a cache driver.
#[async_trait]
pub trait CacheDriver: Sync + Send {
    /// Checks if a key exists in the cache.
    async fn exists(&self, key: &CacheKey) -> CacheResult<bool>;

    /// Retrieves a value, failing with `NotFound` when absent.
    async fn get(&self, key: &CacheKey) -> CacheResult<String>;

    /// Stores a value, last write wins.
    async fn set(&self, key: &CacheKey, value: &str) -> CacheResult<()>;

    /// Removes a key. Absent keys are not an error.
    async fn unset(&self, key: &CacheKey) -> CacheResult<()>;

    /// Removes every entry owned by the driver.
    async fn purge(&self) -> CacheResult<()>;
}
