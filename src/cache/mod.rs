//! # Cache Module
//!
//! Durable key-value storage for resolved schema data. The [`Cache`] front
//! delegates to a [`CacheDriver`]; callers only see opaque string payloads and
//! never the storage medium behind them.

pub mod drivers;

use std::path::PathBuf;

use tracing::debug;

use self::drivers::CacheDriver;
use crate::{
    config::{CacheDriverKind, CacheSettings},
    schema::value_objects::CacheKey,
    Result,
};

/// Errors related to cache operations
#[derive(thiserror::Error, Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum CacheError {
    /// The requested key has no entry.
    #[error("cache entry `{key}` not found")]
    NotFound { key: CacheKey },

    /// The backing storage failed.
    #[error("cache storage failure at `{path}`: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Represents a cache instance
pub struct Cache {
    /// The cache driver used for underlying operations.
    pub driver: Box<dyn CacheDriver>,
}

impl Cache {
    /// Creates a new cache instance with the specified cache driver.
    #[must_use]
    pub fn new(driver: Box<dyn CacheDriver>) -> Self {
        Self { driver }
    }

    /// Checks if a key exists in the cache.
    ///
    /// # Errors
    ///
    /// Fails when the backing storage cannot be inspected.
    pub async fn exists(&self, key: &CacheKey) -> CacheResult<bool> {
        self.driver.exists(key).await
    }

    /// Retrieves the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::NotFound`] when the key is absent, or a storage
    /// error when the entry cannot be read.
    pub async fn get(&self, key: &CacheKey) -> CacheResult<String> {
        self.driver.get(key).await
    }

    /// Retrieves the value stored under `key`, or `None` when absent.
    ///
    /// # Errors
    ///
    /// Fails when the backing storage cannot be read.
    pub async fn find(&self, key: &CacheKey) -> CacheResult<Option<String>> {
        match self.driver.get(key).await {
            Ok(value) => {
                debug!(key = %key, "cache hit");
                Ok(Some(value))
            }
            Err(CacheError::NotFound { .. }) => {
                debug!(key = %key, "cache miss");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Stores `value` under `key`, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Fails when the backing storage cannot be written.
    pub async fn set(&self, key: &CacheKey, value: &str) -> CacheResult<()> {
        self.driver.set(key, value).await
    }

    /// Removes the entry stored under `key`. Absent keys are ignored.
    ///
    /// # Errors
    ///
    /// Fails when the backing storage cannot be written.
    pub async fn unset(&self, key: &CacheKey) -> CacheResult<()> {
        self.driver.unset(key).await
    }

    /// Removes every entry.
    ///
    /// # Errors
    ///
    /// Fails when the backing storage cannot be written.
    pub async fn purge(&self) -> CacheResult<()> {
        self.driver.purge().await
    }
}

/// Builds the cache described by `settings`.
///
/// # Errors
///
/// Fails when the memory driver is requested but the `cache_inmem` feature
/// is disabled.
pub fn from_settings(settings: &CacheSettings) -> Result<Cache> {
    let driver = match settings.driver {
        CacheDriverKind::File => drivers::file::new(settings.dir.clone(), &settings.extension),
        #[cfg(feature = "cache_inmem")]
        CacheDriverKind::Memory => drivers::inmem::new(settings.max_capacity),
        #[cfg(not(feature = "cache_inmem"))]
        CacheDriverKind::Memory => {
            return Err(crate::Error::string(
                "the memory cache driver requires the `cache_inmem` feature",
            ))
        }
        CacheDriverKind::None => drivers::null::new(),
    };
    debug!(driver = ?settings.driver, "cache initialized");
    Ok(Cache::new(driver))
}

#[cfg(test)]
mod tests {
    use super::{drivers, from_settings, Cache, CacheError};
    use crate::{
        config::{CacheDriverKind, CacheSettings},
        schema::value_objects::CacheKey,
    };

    fn key(text: &str) -> CacheKey {
        CacheKey::new(text).expect("valid key")
    }

    #[tokio::test]
    async fn find_maps_missing_entries_to_none() {
        let cache = Cache::new(drivers::null::new());
        assert_eq!(cache.find(&key("absent")).await.expect("find"), None);
        assert!(matches!(
            cache.get(&key("absent")).await,
            Err(CacheError::NotFound { .. })
        ));
    }

    #[cfg(feature = "cache_inmem")]
    #[tokio::test]
    async fn delegates_to_driver() {
        let cache = Cache::new(drivers::inmem::new(16));
        cache.set(&key("k"), "v").await.expect("set");
        assert!(cache.exists(&key("k")).await.expect("exists"));
        assert_eq!(cache.find(&key("k")).await.expect("find").as_deref(), Some("v"));
        cache.unset(&key("k")).await.expect("unset");
        assert!(!cache.exists(&key("k")).await.expect("exists"));
    }

    #[tokio::test]
    async fn null_settings_disable_caching() {
        let settings = CacheSettings {
            driver: CacheDriverKind::None,
            ..CacheSettings::default()
        };
        let cache = from_settings(&settings).expect("cache");
        cache.set(&key("k"), "v").await.expect("set");
        assert_eq!(cache.find(&key("k")).await.expect("find"), None);
    }
}
