//! # Null Cache Driver
//!
//! Accepts writes and forgets them, so every resolution is computed from the
//! directory schema.

use async_trait::async_trait;

use super::CacheDriver;
use crate::{
    cache::{CacheError, CacheResult},
    schema::value_objects::CacheKey,
};

/// Represents the null cache driver.
pub struct Null {}

/// Creates a new null cache instance
#[must_use]
pub fn new() -> Box<dyn CacheDriver> {
    Box::new(Null {})
}

#[async_trait]
impl CacheDriver for Null {
    async fn exists(&self, _key: &CacheKey) -> CacheResult<bool> {
        Ok(false)
    }

    async fn get(&self, key: &CacheKey) -> CacheResult<String> {
        Err(CacheError::NotFound { key: key.clone() })
    }

    async fn set(&self, _key: &CacheKey, _value: &str) -> CacheResult<()> {
        Ok(())
    }

    async fn unset(&self, _key: &CacheKey) -> CacheResult<()> {
        Ok(())
    }

    async fn purge(&self) -> CacheResult<()> {
        Ok(())
    }
}
