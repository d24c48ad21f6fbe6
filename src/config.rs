//! # Configuration Management
//!
//! Configuration lives in `config/<environment>.yaml`. Files are rendered as
//! [`tera`] templates before being parsed, so values can be pulled from the
//! environment:
//!
//! ```yaml
//! logger:
//!   level: {{ get_env(name="LOG_LEVEL", default="info") }}
//! cache:
//!   driver: file
//!   dir: data/cache
//! schema:
//!   source: data/schema/subschema.ldif
//! ```
//!
//! Set `DIRSCHEMA_CONFIG_FOLDER` to load files from another folder.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{logger, Error, Result};

const DEFAULT_FOLDER: &str = "config";
const CONFIG_FOLDER_ENV: &str = "DIRSCHEMA_CONFIG_FOLDER";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub logger: Logger,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub schema: SchemaSettings,
}

/// Logger configuration
///
/// Example (development):
/// ```yaml
/// logger:
///   enable: true
///   level: debug
///   format: compact
///   file_appender:
///     enable: true
///     dir: data/logs
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Logger {
    #[serde(default = "default_true")]
    pub enable: bool,

    /// Set the logger level.
    #[serde(default)]
    pub level: logger::LogLevel,

    /// Set the logger format.
    #[serde(default)]
    pub format: logger::Format,

    /// Replaces the computed filter directive entirely, e.g. `dirschema=trace`.
    pub override_filter: Option<String>,

    /// Writes logs to rolling files in addition to stdout.
    pub file_appender: Option<LoggerFileAppender>,
}

impl Default for Logger {
    fn default() -> Self {
        Self {
            enable: true,
            level: logger::LogLevel::default(),
            format: logger::Format::default(),
            override_filter: None,
            file_appender: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggerFileAppender {
    #[serde(default)]
    pub enable: bool,

    /// Set the logger file appender level.
    #[serde(default)]
    pub level: logger::LogLevel,

    /// Set the logger file appender format.
    #[serde(default)]
    pub format: logger::Format,

    /// Set the logger file appender rotation.
    #[serde(default)]
    pub rotation: logger::Rotation,

    /// Set the logger file appender dir
    #[serde(default = "default_log_dir")]
    pub dir: String,

    /// Set log filename prefix
    #[serde(default = "default_log_prefix")]
    pub filename_prefix: String,

    /// Set log filename suffix
    #[serde(default = "default_log_suffix")]
    pub filename_suffix: String,

    /// Set the logger file appender keep max log files.
    #[serde(default = "default_max_log_files")]
    pub max_log_files: usize,
}

/// Storage backend of the resolution cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheDriverKind {
    /// One file per entry under [`CacheSettings::dir`].
    #[default]
    File,
    /// Process-local memory, lost on exit.
    Memory,
    /// Caching disabled.
    None,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheSettings {
    #[serde(default)]
    pub driver: CacheDriverKind,

    /// Directory holding cache files.
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,

    /// Extension of cache files; purge removes every file carrying it.
    #[serde(default = "default_cache_extension")]
    pub extension: String,

    /// Entry bound for the memory driver.
    #[serde(default = "default_memory_capacity")]
    pub max_capacity: u64,

    /// Purge the cache when the directory's schema stamp changes.
    #[serde(default = "default_true")]
    pub invalidate_on_schema_change: bool,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            driver: CacheDriverKind::default(),
            dir: default_cache_dir(),
            extension: default_cache_extension(),
            max_capacity: default_memory_capacity(),
            invalidate_on_schema_change: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchemaSettings {
    /// LDIF export of the directory's subschema entry.
    #[serde(default = "default_schema_source")]
    pub source: PathBuf,
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            source: default_schema_source(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_dir() -> String {
    "data/logs".to_string()
}

fn default_log_prefix() -> String {
    "dirschema".to_string()
}

fn default_log_suffix() -> String {
    "log".to_string()
}

fn default_max_log_files() -> usize {
    5
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("data/cache")
}

fn default_cache_extension() -> String {
    crate::cache::drivers::file::DEFAULT_EXTENSION.to_string()
}

fn default_memory_capacity() -> u64 {
    10_000
}

fn default_schema_source() -> PathBuf {
    PathBuf::from("data/schema/subschema.ldif")
}

impl Config {
    /// Loads `<folder>/<environment>.yaml`, where the folder defaults to
    /// `config` and can be overridden with `DIRSCHEMA_CONFIG_FOLDER`.
    ///
    /// # Errors
    ///
    /// Fails when the file is missing, cannot be rendered or is not valid YAML.
    pub fn new(environment: &str) -> Result<Self> {
        let folder = std::env::var(CONFIG_FOLDER_ENV).map_or_else(
            |_| PathBuf::from(DEFAULT_FOLDER),
            PathBuf::from,
        );
        Self::from_folder(environment, &folder)
    }

    /// Loads `<folder>/<environment>.yaml`.
    ///
    /// # Errors
    ///
    /// Fails when the file is missing, cannot be rendered or is not valid YAML.
    pub fn from_folder(environment: &str, folder: &Path) -> Result<Self> {
        let path = folder.join(format!("{environment}.yaml"));
        if !path.exists() {
            return Err(Error::Message(format!(
                "no configuration file found at `{}`",
                path.display()
            )));
        }
        info!(selected_path = %path.display(), "loading environment from");

        let content = fs::read_to_string(&path)?;
        let rendered = render_template(&content)?;
        serde_yaml::from_str(&rendered)
            .map_err(|err| Error::YAMLFile(err, path.to_string_lossy().to_string()))
    }
}

impl std::str::FromStr for Config {
    type Err = Error;

    /// Renders and parses configuration text.
    fn from_str(content: &str) -> Result<Self> {
        let rendered = render_template(content)?;
        Ok(serde_yaml::from_str(&rendered)?)
    }
}

fn render_template(content: &str) -> Result<String> {
    Ok(tera::Tera::one_off(content, &tera::Context::new(), false)?)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{CacheDriverKind, Config};
    use crate::logger::{Format, LogLevel};

    #[test]
    fn empty_document_uses_defaults() {
        let config: Config = "{}".parse().expect("valid config");
        assert!(config.logger.enable);
        assert_eq!(config.cache.driver, CacheDriverKind::File);
        assert_eq!(config.cache.dir, PathBuf::from("data/cache"));
        assert_eq!(config.cache.extension, "json");
        assert!(config.cache.invalidate_on_schema_change);
        assert_eq!(
            config.schema.source,
            PathBuf::from("data/schema/subschema.ldif")
        );
    }

    #[test]
    fn renders_environment_lookups() {
        let config: Config = r#"
logger:
  level: {{ get_env(name="DIRSCHEMA_TEST_UNSET_LEVEL", default="trace") }}
  format: json
cache:
  driver: memory
  max_capacity: 42
"#
        .parse()
        .expect("valid config");

        assert!(matches!(config.logger.level, LogLevel::Trace));
        assert!(matches!(config.logger.format, Format::Json));
        assert_eq!(config.cache.driver, CacheDriverKind::Memory);
        assert_eq!(config.cache.max_capacity, 42);
    }

    #[test]
    fn loads_environment_file_from_folder() {
        let tree = tree_fs::TreeBuilder::default()
            .drop(true)
            .add_file(
                "config/test.yaml",
                "cache:\n  driver: none\nschema:\n  source: fixtures/schema.ldif\n",
            )
            .create()
            .expect("create temp tree");

        let config = Config::from_folder("test", &tree.root.join("config")).expect("config");
        assert_eq!(config.cache.driver, CacheDriverKind::None);
        assert_eq!(config.schema.source, PathBuf::from("fixtures/schema.ldif"));

        assert!(Config::from_folder("production", &tree.root.join("config")).is_err());
    }
}
