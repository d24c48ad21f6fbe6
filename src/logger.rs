//! # Logger
//!
//! Initializes the global `tracing` subscriber from [`config::Logger`]. A
//! `RUST_LOG` value in the environment takes precedence over the configured
//! level.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self, MakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::{config, Error, Result};

// Keeps the file appender worker alive for the lifetime of the process.
static NONBLOCKING_WORK_GUARD_KEEP: OnceLock<WorkerGuard> = OnceLock::new();

// Crates whose events pass the filter at the configured level.
const MODULE_WHITELIST: &[&str] = &["dirschema"];

#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize)]
pub enum LogLevel {
    /// The "off" level.
    #[serde(rename = "off")]
    Off,
    /// The "trace" level.
    #[serde(rename = "trace")]
    Trace,
    /// The "debug" level.
    #[serde(rename = "debug")]
    Debug,
    /// The "info" level.
    #[serde(rename = "info")]
    #[default]
    Info,
    /// The "warn" level.
    #[serde(rename = "warn")]
    Warn,
    /// The "error" level.
    #[serde(rename = "error")]
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self {
            Self::Off => "off",
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        };
        f.write_str(level)
    }
}

#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize)]
pub enum Format {
    #[serde(rename = "compact")]
    #[default]
    Compact,
    #[serde(rename = "pretty")]
    Pretty,
    #[serde(rename = "json")]
    Json,
}

#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize)]
pub enum Rotation {
    #[serde(rename = "minutely")]
    Minutely,
    #[serde(rename = "hourly")]
    #[default]
    Hourly,
    #[serde(rename = "daily")]
    Daily,
    #[serde(rename = "never")]
    Never,
}

impl From<Rotation> for tracing_appender::rolling::Rotation {
    fn from(rotation: Rotation) -> Self {
        match rotation {
            Rotation::Minutely => Self::MINUTELY,
            Rotation::Hourly => Self::HOURLY,
            Rotation::Daily => Self::DAILY,
            Rotation::Never => Self::NEVER,
        }
    }
}

/// Builds the filter directive for `level`, e.g. `dirschema=debug`.
#[must_use]
pub fn filter_directive(level: LogLevel) -> String {
    MODULE_WHITELIST
        .iter()
        .map(|module| format!("{module}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Installs the global subscriber.
///
/// Does nothing when logging is disabled. Calling it twice is an error,
/// since only one global subscriber can be installed.
///
/// # Errors
///
/// Fails when the file appender cannot be created or a subscriber is
/// already installed.
pub fn init(config: &config::Logger) -> Result<()> {
    if !config.enable {
        return Ok(());
    }

    let mut layers: Vec<Box<dyn Layer<Registry> + Sync + Send>> = Vec::new();

    if let Some(file_appender) = config.file_appender.as_ref().filter(|fa| fa.enable) {
        let appender = tracing_appender::rolling::Builder::new()
            .rotation(file_appender.rotation.into())
            .filename_prefix(&file_appender.filename_prefix)
            .filename_suffix(&file_appender.filename_suffix)
            .max_log_files(file_appender.max_log_files)
            .build(&file_appender.dir)
            .map_err(|err| Error::Logger(err.to_string()))?;

        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        // A second init fails below; the first guard stays in place.
        let _ = NONBLOCKING_WORK_GUARD_KEEP.set(guard);
        layers.push(init_layer(non_blocking, file_appender.format, false));
    }

    layers.push(init_layer(std::io::stdout, config.format, true));

    let env_filter = init_env_filter(config.override_filter.as_ref(), config.level);
    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .try_init()
        .map_err(|err| Error::Logger(err.to_string()))
}

fn init_env_filter(override_filter: Option<&String>, level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| {
            override_filter.map_or_else(
                || EnvFilter::try_new(filter_directive(level)),
                EnvFilter::try_new,
            )
        })
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(LogLevel::default())))
}

fn init_layer<W2>(
    make_writer: W2,
    format: Format,
    ansi: bool,
) -> Box<dyn Layer<Registry> + Sync + Send>
where
    W2: for<'writer> MakeWriter<'writer> + Sync + Send + 'static,
{
    match format {
        Format::Compact => fmt::Layer::default()
            .with_ansi(ansi)
            .with_writer(make_writer)
            .compact()
            .boxed(),
        Format::Pretty => fmt::Layer::default()
            .with_ansi(ansi)
            .with_writer(make_writer)
            .pretty()
            .boxed(),
        Format::Json => fmt::Layer::default()
            .with_ansi(ansi)
            .with_writer(make_writer)
            .json()
            .boxed(),
    }
}

#[cfg(test)]
mod tests {
    use super::{filter_directive, LogLevel};

    #[test]
    fn directive_scopes_level_to_crate() {
        assert_eq!(filter_directive(LogLevel::Debug), "dirschema=debug");
        assert_eq!(filter_directive(LogLevel::default()), "dirschema=info");
    }

    #[test]
    fn disabled_logger_installs_nothing() {
        let config = crate::config::Logger {
            enable: false,
            ..Default::default()
        };
        assert!(super::init(&config).is_ok());
    }
}
