use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::{
    aggregator::AttributeAggregator,
    entities::{AttributeTypeDefinition, ObjectClassDefinition, ResolvedAttributes},
    lookup::SchemaLookup,
    reader::SchemaReader,
    resolver::InheritanceResolver,
    subschema::SubschemaLookup,
    value_objects::CacheKey,
};
use crate::{
    cache::{self, Cache},
    config::Config,
    Error, Result,
};

/// Type alias simplifying lookup trait object usage inside the service.
pub type LookupHandle = dyn SchemaLookup<Error = Error> + Send + Sync + 'static;

const STAMP_KEY: &str = "schema_stamp";

/// Everything known about one object class.
#[derive(Clone, Debug, Serialize)]
pub struct ClassReport {
    pub definition: ObjectClassDefinition,
    pub raw: String,
    pub ancestors: Vec<String>,
    pub attributes: ResolvedAttributes,
}

/// Outcome of comparing the directory's schema stamp with the cached one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StampStatus {
    /// The lookup does not report a stamp; nothing was checked.
    Unsupported,
    /// No stamp was cached yet; the current one has been recorded.
    Recorded,
    Unchanged,
    /// The schema changed; every entry was purged.
    Invalidated { previous: String, current: String },
}

/// High level schema service wiring the lookup, cache and resolvers together.
#[derive(Clone)]
pub struct SchemaService {
    lookup: Arc<LookupHandle>,
    cache: Arc<Cache>,
    reader: SchemaReader,
    resolver: InheritanceResolver,
    aggregator: AttributeAggregator,
}

impl SchemaService {
    /// Creates a new [`SchemaService`] from a lookup handle and a cache,
    /// which may be shared with other services.
    pub fn new(lookup: Arc<LookupHandle>, cache: impl Into<Arc<Cache>>) -> Self {
        let cache = cache.into();
        let reader = SchemaReader::new(Arc::clone(&lookup));
        Self {
            resolver: InheritanceResolver::new(reader.clone(), Arc::clone(&cache)),
            aggregator: AttributeAggregator::new(reader.clone(), Arc::clone(&cache)),
            lookup,
            cache,
            reader,
        }
    }

    /// Builds a service from configuration: the subschema LDIF named by
    /// `schema.source` and the cache driver named by `cache.driver`.
    ///
    /// # Errors
    ///
    /// Fails when the schema source cannot be read, the cache cannot be
    /// built or the stamp check cannot access the cache.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let lookup = SubschemaLookup::from_path(&config.schema.source).await?;
        info!(
            source = %config.schema.source.display(),
            object_classes = lookup.object_class_count(),
            attribute_types = lookup.attribute_type_count(),
            "schema source loaded"
        );
        let service = Self::new(Arc::new(lookup), cache::from_settings(&config.cache)?);
        if config.cache.invalidate_on_schema_change {
            service.sync_schema_stamp().await?;
        }
        Ok(service)
    }

    /// Ordered ancestors of `class`, starting with `top`.
    ///
    /// # Errors
    ///
    /// Fails when the lookup is unavailable, the cache cannot be accessed or
    /// the name cannot form a cache key.
    pub async fn resolve_ancestors(&self, class: &str) -> Result<Vec<String>> {
        self.resolver.resolve(class).await
    }

    /// Required and optional attributes of `class`, given the chain returned
    /// by [`Self::resolve_ancestors`] for the same class.
    ///
    /// # Errors
    ///
    /// Fails when the lookup is unavailable, the cache cannot be accessed or
    /// the name cannot form a cache key.
    pub async fn resolve_attributes(
        &self,
        class: &str,
        ancestors: &[String],
    ) -> Result<ResolvedAttributes> {
        self.aggregator.resolve(class, ancestors).await
    }

    /// # Errors
    ///
    /// Fails when the lookup is unavailable.
    pub async fn object_class(&self, name: &str) -> Result<Option<ObjectClassDefinition>> {
        self.reader.object_class(name).await
    }

    /// # Errors
    ///
    /// Fails when the lookup is unavailable.
    pub async fn attribute_type(&self, name: &str) -> Result<Option<AttributeTypeDefinition>> {
        self.reader.attribute_type(name).await
    }

    /// `true` when `class` is defined and carries the STRUCTURAL keyword.
    ///
    /// # Errors
    ///
    /// Fails when the lookup is unavailable.
    pub async fn is_structural(&self, class: &str) -> Result<bool> {
        Ok(self
            .object_class(class)
            .await?
            .is_some_and(|definition| definition.is_structural()))
    }

    /// `true` when `attribute` is defined and carries SINGLE-VALUE.
    ///
    /// # Errors
    ///
    /// Fails when the lookup is unavailable.
    pub async fn is_single_valued(&self, attribute: &str) -> Result<bool> {
        Ok(self
            .attribute_type(attribute)
            .await?
            .is_some_and(|definition| definition.is_single_valued()))
    }

    /// Definition, ancestors and effective attributes of `class`, `None` when
    /// the class is not defined.
    ///
    /// # Errors
    ///
    /// Fails when the lookup is unavailable or the cache cannot be accessed.
    pub async fn describe_object_class(&self, class: &str) -> Result<Option<ClassReport>> {
        let Some((definition, raw)) = self.reader.object_class_with_raw(class).await? else {
            return Ok(None);
        };
        let ancestors = self.resolve_ancestors(class).await?;
        let attributes = self.resolve_attributes(class, &ancestors).await?;
        Ok(Some(ClassReport {
            definition,
            raw,
            ancestors,
            attributes,
        }))
    }

    /// Removes every cached resolution.
    ///
    /// # Errors
    ///
    /// Fails when the cache cannot be written.
    pub async fn purge_caches(&self) -> Result<()> {
        self.cache.purge().await?;
        info!("schema caches purged");
        Ok(())
    }

    /// Purges the cache when the directory's schema stamp differs from the
    /// one recorded by a previous run, then records the current stamp.
    ///
    /// # Errors
    ///
    /// Fails when the lookup is unavailable or the cache cannot be accessed.
    pub async fn sync_schema_stamp(&self) -> Result<StampStatus> {
        let Some(current) = self.lookup.schema_stamp().await? else {
            return Ok(StampStatus::Unsupported);
        };
        let key = CacheKey::new(STAMP_KEY)?;

        let previous = match self.cache.find(&key).await? {
            Some(stored) => Some(serde_json::from_str::<String>(&stored)?),
            None => None,
        };
        let status = match previous {
            Some(previous) if previous == current => return Ok(StampStatus::Unchanged),
            Some(previous) => {
                self.cache.purge().await?;
                info!(%previous, %current, "schema changed, caches purged");
                StampStatus::Invalidated {
                    previous,
                    current: current.clone(),
                }
            }
            None => StampStatus::Recorded,
        };
        self.cache.set(&key, &serde_json::to_string(&current)?).await?;
        Ok(status)
    }
}
