#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_name_repetitions)]
//! Schema resolution for hierarchical directories.
//!
//! Directory servers publish their schema as one raw description string per
//! object class and attribute type. This crate turns those strings into
//! structured definitions, resolves an object class's inheritance chain,
//! aggregates the required and optional attributes across that chain and
//! memoizes both results behind a persistent key-value cache.
//!
//! The entry point is [`schema::SchemaService`]:
//!
//! ```rust,no_run
//! # async fn run() -> dirschema::Result<()> {
//! let config = dirschema::config::Config::new("development")?;
//! let service = dirschema::schema::SchemaService::from_config(&config).await?;
//!
//! let ancestors = service.resolve_ancestors("inetOrgPerson").await?;
//! let attributes = service
//!     .resolve_attributes("inetOrgPerson", &ancestors)
//!     .await?;
//! println!("must: {:?}", attributes.required());
//! # Ok(())
//! # }
//! ```

pub use self::errors::Error;

pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod errors;
pub mod logger;
pub mod schema;

/// Application results options list
pub type Result<T, E = Error> = std::result::Result<T, E>;
