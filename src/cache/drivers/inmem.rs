//! # In-Memory Cache Driver
//!
//! Process-local cache backed by [`moka`]. Entries do not survive restarts,
//! which makes this driver a fit for tests and short-lived tools.

use async_trait::async_trait;
use moka::sync::Cache;

use super::CacheDriver;
use crate::{
    cache::{CacheError, CacheResult},
    schema::value_objects::CacheKey,
};

/// Creates a new in-memory driver holding at most `max_capacity` entries.
#[must_use]
pub fn new(max_capacity: u64) -> Box<dyn CacheDriver> {
    Box::new(Inmem::new(max_capacity))
}

/// Represents the in-memory cache driver.
pub struct Inmem {
    cache: Cache<String, String>,
}

impl Inmem {
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(max_capacity).build(),
        }
    }
}

#[async_trait]
impl CacheDriver for Inmem {
    async fn exists(&self, key: &CacheKey) -> CacheResult<bool> {
        Ok(self.cache.contains_key(key.as_str()))
    }

    async fn get(&self, key: &CacheKey) -> CacheResult<String> {
        self.cache
            .get(key.as_str())
            .ok_or_else(|| CacheError::NotFound { key: key.clone() })
    }

    async fn set(&self, key: &CacheKey, value: &str) -> CacheResult<()> {
        self.cache.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn unset(&self, key: &CacheKey) -> CacheResult<()> {
        self.cache.invalidate(key.as_str());
        Ok(())
    }

    async fn purge(&self) -> CacheResult<()> {
        self.cache.invalidate_all();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{CacheDriver, Inmem};
    use crate::schema::value_objects::CacheKey;

    fn key(text: &str) -> CacheKey {
        CacheKey::new(text).expect("valid key")
    }

    #[tokio::test]
    async fn purge_forgets_every_entry() {
        let cache = Inmem::new(8);
        cache.set(&key("a"), "1").await.expect("set");
        cache.set(&key("b"), "2").await.expect("set");
        assert_eq!(cache.get(&key("b")).await.expect("get"), "2");

        cache.purge().await.expect("purge");

        assert!(!cache.exists(&key("a")).await.expect("exists"));
        assert!(cache.get(&key("b")).await.is_err());
    }
}
