//! Fetches raw descriptions through the lookup, parses them and confirms the
//! tokens they reference.
//!
//! A token that does not name a real schema element is dropped without an
//! error. Lookup failures other than "not found" propagate unchanged.

use std::sync::Arc;

use tracing::{debug, warn};

use super::{
    entities::{is_root, AttributeTypeDefinition, ObjectClassDefinition, Presence},
    lookup::{Lookup, SchemaLookup},
    parser::{parse_attribute_type, parse_object_class, ParseWarning},
    service::LookupHandle,
};
use crate::Result;

/// Attributes a single class declares itself, after confirmation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DeclaredAttributes {
    pub required: Vec<String>,
    pub optional: Vec<String>,
}

impl DeclaredAttributes {
    /// Iterates required declarations first, then optional ones.
    pub fn declared(&self) -> impl Iterator<Item = (&str, Presence)> {
        self.required
            .iter()
            .map(|name| (name.as_str(), Presence::Required))
            .chain(
                self.optional
                    .iter()
                    .map(|name| (name.as_str(), Presence::Optional)),
            )
    }
}

#[derive(Clone)]
pub struct SchemaReader {
    lookup: Arc<LookupHandle>,
}

fn report(kind: &str, name: &str, warnings: &[ParseWarning]) {
    for warning in warnings {
        warn!(kind, name, %warning, "schema description parsed with problems");
    }
}

impl SchemaReader {
    pub fn new(lookup: Arc<LookupHandle>) -> Self {
        Self { lookup }
    }

    /// Fetches and parses an object class, `None` when it is not defined.
    pub async fn object_class(&self, name: &str) -> Result<Option<ObjectClassDefinition>> {
        Ok(self
            .object_class_with_raw(name)
            .await?
            .map(|(definition, _)| definition))
    }

    /// Like [`Self::object_class`], also returning the raw description.
    pub async fn object_class_with_raw(
        &self,
        name: &str,
    ) -> Result<Option<(ObjectClassDefinition, String)>> {
        match self.lookup.object_class(name).await? {
            Lookup::Found(raw) => {
                let parsed = parse_object_class(&raw);
                report("objectClass", name, &parsed.warnings);
                Ok(Some((parsed.definition, raw)))
            }
            Lookup::NotFound => {
                debug!(name, "object class not defined");
                Ok(None)
            }
        }
    }

    /// Fetches and parses an attribute type, `None` when it is not defined.
    pub async fn attribute_type(&self, name: &str) -> Result<Option<AttributeTypeDefinition>> {
        match self.lookup.attribute_type(name).await? {
            Lookup::Found(raw) => {
                let parsed = parse_attribute_type(&raw);
                report("attributeType", name, &parsed.warnings);
                Ok(Some(parsed.definition))
            }
            Lookup::NotFound => {
                debug!(name, "attribute type not defined");
                Ok(None)
            }
        }
    }

    /// Superiors of `class` that are real object classes, root excluded.
    pub async fn confirmed_superiors(&self, class: &ObjectClassDefinition) -> Result<Vec<String>> {
        let mut superiors = Vec::with_capacity(class.superiors().len());
        for token in class.superiors() {
            if token.is_empty() || is_root(token) {
                continue;
            }
            if self.lookup.class_exists(token).await? {
                superiors.push(token.clone());
            } else {
                debug!(class = class.name(), superior = %token, "dropping unknown superior");
            }
        }
        Ok(superiors)
    }

    /// Confirmed superiors of the class named `name`; empty when undefined.
    pub async fn superiors_of(&self, name: &str) -> Result<Vec<String>> {
        match self.object_class(name).await? {
            Some(class) => self.confirmed_superiors(&class).await,
            None => Ok(vec![]),
        }
    }

    /// MUST and MAY tokens of `class` that are real attribute types.
    pub async fn confirmed_attributes(
        &self,
        class: &ObjectClassDefinition,
    ) -> Result<DeclaredAttributes> {
        Ok(DeclaredAttributes {
            required: self.confirm_attributes(class, class.required()).await?,
            optional: self.confirm_attributes(class, class.optional()).await?,
        })
    }

    /// Confirmed attributes the class named `name` declares itself, `None`
    /// when the class is undefined.
    pub async fn attributes_of(&self, name: &str) -> Result<Option<DeclaredAttributes>> {
        match self.object_class(name).await? {
            Some(class) => Ok(Some(self.confirmed_attributes(&class).await?)),
            None => Ok(None),
        }
    }

    async fn confirm_attributes(
        &self,
        class: &ObjectClassDefinition,
        tokens: &[String],
    ) -> Result<Vec<String>> {
        let mut confirmed = Vec::with_capacity(tokens.len());
        for token in tokens {
            if token.is_empty() {
                continue;
            }
            if self.lookup.attribute_exists(token).await? {
                confirmed.push(token.clone());
            } else {
                debug!(class = class.name(), attribute = %token, "dropping unknown attribute");
            }
        }
        Ok(confirmed)
    }
}
