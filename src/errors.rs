//! # Application Error Handling

use std::path::PathBuf;

use crate::{cache::CacheError, schema::value_objects::CacheKeyError};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Message(String),

    #[error("cannot parse `{1}`: {0}")]
    YAMLFile(#[source] serde_yaml::Error, String),

    #[error(transparent)]
    YAML(#[from] serde_yaml::Error),

    #[error(transparent)]
    JSON(#[from] serde_json::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    Tera(#[from] tera::Error),

    #[error("cannot read schema source `{path}`: {source}")]
    SchemaSource {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The directory could not answer a schema lookup. Unlike a missing
    /// definition this aborts the resolution in progress.
    #[error("schema lookup for `{name}` unavailable: {reason}")]
    LookupUnavailable { name: String, reason: String },

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    CacheKey(#[from] CacheKeyError),

    #[error("logger initialization failed: {0}")]
    Logger(String),
}

impl Error {
    #[must_use]
    pub fn string(s: &str) -> Self {
        Self::Message(s.to_string())
    }

    pub fn unavailable(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::LookupUnavailable {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
