//! Aggregation of the effective attributes of an object class.

use std::{collections::HashMap, iter, sync::Arc};

use tracing::debug;

use super::{
    entities::{Presence, ResolvedAttributes},
    reader::{DeclaredAttributes, SchemaReader},
    value_objects::CacheKey,
};
use crate::{cache::Cache, Result};

/// Unions the MUST and MAY declarations along an ancestor chain.
#[derive(Clone)]
pub struct AttributeAggregator {
    reader: SchemaReader,
    cache: Arc<Cache>,
}

impl AttributeAggregator {
    #[must_use]
    pub fn new(reader: SchemaReader, cache: Arc<Cache>) -> Self {
        Self { reader, cache }
    }

    /// Returns the required and optional attributes of `class` given its
    /// resolved `ancestors` (which must not contain `class` itself).
    ///
    /// # Errors
    ///
    /// Fails when the class name cannot form a cache key, the lookup is
    /// unavailable or the cache cannot be accessed.
    pub async fn resolve(&self, class: &str, ancestors: &[String]) -> Result<ResolvedAttributes> {
        let key = CacheKey::attributes_of(class)?;
        if let Some(cached) = self.cache.find(&key).await? {
            return Ok(serde_json::from_str(&cached)?);
        }

        let own = self.reader.attributes_of(class).await?;
        let mut inherited = Vec::with_capacity(ancestors.len());
        for ancestor in ancestors {
            inherited.push(self.reader.attributes_of(ancestor).await?.unwrap_or_default());
        }

        let Some(own) = own else {
            debug!(class, "unknown object class, attributes are not cached");
            return Ok(merge(&DeclaredAttributes::default(), &inherited));
        };

        let attributes = merge(&own, &inherited);
        self.cache
            .set(&key, &serde_json::to_string(&attributes)?)
            .await?;
        debug!(
            class,
            required = attributes.required().len(),
            optional = attributes.optional().len(),
            "resolved attributes"
        );
        Ok(attributes)
    }
}

/// Merges the class's own declarations with the inherited ones.
///
/// Which list an attribute lands in is decided by its first declaration,
/// looking at the class itself before its ancestors in chain order. The
/// lists are then ordered from the root-most declaration down to the class.
fn merge(own: &DeclaredAttributes, inherited: &[DeclaredAttributes]) -> ResolvedAttributes {
    let mut presence: HashMap<String, Presence> = HashMap::new();
    for level in iter::once(own).chain(inherited) {
        for (name, declared) in level.declared() {
            presence.entry(name.to_lowercase()).or_insert(declared);
        }
    }

    let mut attributes = ResolvedAttributes::default();
    for level in inherited.iter().chain(iter::once(own)) {
        for (name, _) in level.declared() {
            if let Some(decided) = presence.get(&name.to_lowercase()) {
                attributes.insert(name, *decided);
            }
        }
    }
    attributes
}
