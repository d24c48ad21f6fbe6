//! Resolution of an object class's ancestor chain.

use std::sync::Arc;

use tracing::debug;

use super::{
    entities::{is_root, AncestorChain, ObjectClassDefinition, ROOT_CLASS},
    reader::SchemaReader,
    value_objects::CacheKey,
};
use crate::{cache::Cache, Result};

/// Walks SUP references depth-first and memoizes the resulting chain.
#[derive(Clone)]
pub struct InheritanceResolver {
    reader: SchemaReader,
    cache: Arc<Cache>,
}

impl InheritanceResolver {
    #[must_use]
    pub fn new(reader: SchemaReader, cache: Arc<Cache>) -> Self {
        Self { reader, cache }
    }

    /// Returns the ancestors of `class`, starting with the root class.
    ///
    /// The root class itself has no ancestors. An undefined class resolves to
    /// the root-only chain and is not cached.
    ///
    /// # Errors
    ///
    /// Fails when the class name cannot form a cache key, the lookup is
    /// unavailable or the cache cannot be accessed.
    pub async fn resolve(&self, class: &str) -> Result<Vec<String>> {
        if is_root(class) {
            return Ok(vec![]);
        }

        let key = CacheKey::parents_of(class)?;
        if let Some(cached) = self.cache.find(&key).await? {
            return Ok(serde_json::from_str(&cached)?);
        }

        let Some(definition) = self.reader.object_class(class).await? else {
            debug!(class, "unknown object class resolves to the root chain");
            return Ok(vec![ROOT_CLASS.to_string()]);
        };

        let chain = self.walk(class, &definition).await?;
        self.cache
            .set(&key, &serde_json::to_string(chain.names())?)
            .await?;
        debug!(class, ancestors = ?chain.names(), "resolved ancestors");
        Ok(chain.into_names())
    }

    /// Depth-first, pre-order expansion in superior declaration order.
    ///
    /// A superior is appended the first time it is reached and expanded right
    /// away; names already in the chain are neither appended nor expanded
    /// again, so cycles terminate.
    async fn walk(&self, class: &str, definition: &ObjectClassDefinition) -> Result<AncestorChain> {
        let mut chain = AncestorChain::rooted_at(class);
        for alias in definition.names() {
            chain.exclude(alias);
        }
        if let Some(oid) = definition.oid() {
            chain.exclude(oid);
        }

        let mut pending = vec![self.reader.confirmed_superiors(definition).await?.into_iter()];
        while let Some(level) = pending.last_mut() {
            let Some(superior) = level.next() else {
                pending.pop();
                continue;
            };
            if !chain.insert(&superior) {
                continue;
            }
            let next = self.reader.superiors_of(&superior).await?;
            pending.push(next.into_iter());
        }

        Ok(chain)
    }
}
