use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use thiserror::Error;

/// Value object ensuring that supplied text can be used as a cache key.
///
/// Keys end up as file names inside the cache directory, so the constructor
/// rejects anything that could address a path outside of it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    value: String,
}

impl CacheKey {
    const PARENTS_PREFIX: &'static str = "parents_of_";
    const ATTRIBUTES_PREFIX: &'static str = "attributes_of_";

    /// Validates and constructs a new [`CacheKey`].
    pub fn new(value: impl Into<String>) -> Result<Self, CacheKeyError> {
        let value = value.into();
        if value.is_empty() {
            return Err(CacheKeyError::Empty);
        }
        if value.starts_with('.') {
            return Err(CacheKeyError::Invalid {
                value,
                reason: "leading dot",
            });
        }
        if value
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '\0') || c.is_control())
        {
            return Err(CacheKeyError::Invalid {
                value,
                reason: "path separator or control character",
            });
        }
        Ok(Self { value })
    }

    /// Key holding the resolved ancestor chain of an object class.
    pub fn parents_of(class: &str) -> Result<Self, CacheKeyError> {
        Self::namespaced(Self::PARENTS_PREFIX, class)
    }

    /// Key holding the resolved attribute set of an object class.
    pub fn attributes_of(class: &str) -> Result<Self, CacheKeyError> {
        Self::namespaced(Self::ATTRIBUTES_PREFIX, class)
    }

    fn namespaced(prefix: &str, subject: &str) -> Result<Self, CacheKeyError> {
        if subject.is_empty() {
            return Err(CacheKeyError::Empty);
        }
        Self::new(format!("{prefix}{}", subject.to_lowercase()))
    }

    /// Returns the underlying textual representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for CacheKey {
    type Err = CacheKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_owned())
    }
}

impl TryFrom<String> for CacheKey {
    type Error = CacheKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Errors produced when validating a [`CacheKey`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CacheKeyError {
    /// The key or the subject it is derived from was empty.
    #[error("cache key must not be empty")]
    Empty,
    /// The key contained characters that are not allowed in a file name.
    #[error("invalid cache key `{value}`: {reason}")]
    Invalid { value: String, reason: &'static str },
}
