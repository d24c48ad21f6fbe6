//! File-per-key cache driver.
//!
//! Each entry lives in `<dir>/<key>.<extension>` encoded as UTF-8. Existence
//! is filesystem presence; there is no index file. Purging removes every
//! file carrying the extension and leaves other files alone.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::fs;

use super::CacheDriver;
use crate::{
    cache::{CacheError, CacheResult},
    schema::value_objects::CacheKey,
};

pub const DEFAULT_EXTENSION: &str = "json";

/// Creates a new file cache driver rooted at `dir`.
#[must_use]
pub fn new(dir: impl Into<PathBuf>, extension: &str) -> Box<dyn CacheDriver> {
    Box::new(FileCache::new(dir, extension))
}

#[derive(Clone, Debug)]
pub struct FileCache {
    dir: PathBuf,
    extension: String,
}

impl FileCache {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, extension: &str) -> Self {
        let extension = extension.trim_start_matches('.');
        Self {
            dir: dir.into(),
            extension: if extension.is_empty() {
                DEFAULT_EXTENSION.to_string()
            } else {
                extension.to_string()
            },
        }
    }

    fn path_of(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{key}.{}", self.extension))
    }

    fn owns(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|extension| extension == self.extension.as_str())
    }
}

fn io_error(path: &Path, source: std::io::Error) -> CacheError {
    CacheError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[async_trait]
impl CacheDriver for FileCache {
    async fn exists(&self, key: &CacheKey) -> CacheResult<bool> {
        let path = self.path_of(key);
        fs::try_exists(&path)
            .await
            .map_err(|source| io_error(&path, source))
    }

    async fn get(&self, key: &CacheKey) -> CacheResult<String> {
        let path = self.path_of(key);
        match fs::read_to_string(&path).await {
            Ok(value) => Ok(value),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(CacheError::NotFound { key: key.clone() })
            }
            Err(source) => Err(io_error(&path, source)),
        }
    }

    async fn set(&self, key: &CacheKey, value: &str) -> CacheResult<()> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| io_error(&self.dir, source))?;
        let path = self.path_of(key);
        fs::write(&path, value.as_bytes())
            .await
            .map_err(|source| io_error(&path, source))
    }

    async fn unset(&self, key: &CacheKey) -> CacheResult<()> {
        let path = self.path_of(key);
        match fs::remove_file(&path).await {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(io_error(&path, err)),
            _ => Ok(()),
        }
    }

    async fn purge(&self) -> CacheResult<()> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
            Err(source) => return Err(io_error(&self.dir, source)),
        };

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|source| io_error(&self.dir, source))?
        {
            let path = entry.path();
            if !self.owns(&path) {
                continue;
            }
            match fs::remove_file(&path).await {
                Err(err) if err.kind() != ErrorKind::NotFound => {
                    return Err(io_error(&path, err));
                }
                _ => {}
            }
        }
        Ok(())
    }
}
