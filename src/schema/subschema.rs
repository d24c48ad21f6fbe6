//! Schema lookup over the values of a directory's subschema entry.
//!
//! Directory servers publish their schema in a single entry (usually
//! `cn=subschema`) whose multi-valued `objectClasses` and `attributeTypes`
//! attributes hold one description per schema element. [`SubschemaLookup`]
//! keeps those values and answers lookups with a linear scan, matching the
//! requested name against the OID and every NAME alias of each description.
//!
//! The values can be supplied directly or read from an LDIF export of the
//! subschema entry.

use std::path::Path;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{
    lookup::{Lookup, SchemaLookup},
    parser::{parse_attribute_type, parse_object_class},
};
use crate::{Error, Result};

#[derive(Clone, Debug)]
struct SchemaEntry {
    identifiers: Vec<String>,
    raw: String,
}

impl SchemaEntry {
    fn new(identifiers: impl IntoIterator<Item = String>, raw: String) -> Self {
        Self {
            identifiers: identifiers
                .into_iter()
                .map(|identifier| identifier.to_lowercase())
                .collect(),
            raw,
        }
    }

    fn object_class(raw: String) -> Self {
        let definition = parse_object_class(&raw).definition;
        let identifiers = definition
            .oid()
            .map(str::to_string)
            .into_iter()
            .chain(definition.names().iter().cloned());
        Self::new(identifiers, raw)
    }

    fn attribute_type(raw: String) -> Self {
        let definition = parse_attribute_type(&raw).definition;
        let identifiers = definition
            .oid()
            .map(str::to_string)
            .into_iter()
            .chain(definition.names().iter().cloned());
        Self::new(identifiers, raw)
    }
}

fn scan<'a>(entries: &'a [SchemaEntry], name: &str) -> Option<&'a str> {
    let name = name.trim().to_lowercase();
    if name.is_empty() {
        return None;
    }
    entries
        .iter()
        .find(|entry| entry.identifiers.iter().any(|id| *id == name))
        .map(|entry| entry.raw.as_str())
}

/// In-memory [`SchemaLookup`] built from subschema entry values.
#[derive(Clone, Debug, Default)]
pub struct SubschemaLookup {
    object_classes: Vec<SchemaEntry>,
    attribute_types: Vec<SchemaEntry>,
    modify_timestamp: Option<String>,
}

impl SubschemaLookup {
    /// Builds a lookup from raw `objectClasses` and `attributeTypes` values.
    #[must_use]
    pub fn new(
        object_classes: impl IntoIterator<Item = String>,
        attribute_types: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            object_classes: object_classes
                .into_iter()
                .map(SchemaEntry::object_class)
                .collect(),
            attribute_types: attribute_types
                .into_iter()
                .map(SchemaEntry::attribute_type)
                .collect(),
            modify_timestamp: None,
        }
    }

    /// Sets the subschema entry's `modifyTimestamp`.
    #[must_use]
    pub fn with_modify_timestamp(mut self, stamp: impl Into<String>) -> Self {
        self.modify_timestamp = Some(stamp.into());
        self
    }

    /// Parses an LDIF export of the subschema entry.
    ///
    /// Folded lines are joined and comments ignored. Base64 and URL values
    /// cannot hold schema descriptions in practice and are skipped with a
    /// warning.
    #[must_use]
    pub fn from_ldif(text: &str) -> Self {
        let mut object_classes = Vec::new();
        let mut attribute_types = Vec::new();
        let mut modify_timestamp = None;

        for line in unfold(text) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((attribute, value)) = line.split_once(':') else {
                warn!(line = %line, "ignoring LDIF line without attribute separator");
                continue;
            };
            if value.starts_with(':') || value.starts_with('<') {
                warn!(attribute, "skipping encoded LDIF value");
                continue;
            }
            let value = value.trim().to_string();
            match attribute.trim().to_ascii_lowercase().as_str() {
                "objectclasses" => object_classes.push(value),
                "attributetypes" => attribute_types.push(value),
                "modifytimestamp" => modify_timestamp = Some(value),
                _ => {}
            }
        }

        debug!(
            object_classes = object_classes.len(),
            attribute_types = attribute_types.len(),
            "loaded subschema entry"
        );
        let lookup = Self::new(object_classes, attribute_types);
        match modify_timestamp {
            Some(stamp) => lookup.with_modify_timestamp(stamp),
            None => lookup,
        }
    }

    /// Reads and parses an LDIF export of the subschema entry.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read.
    pub async fn from_path(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| Error::SchemaSource {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::from_ldif(&text))
    }

    #[must_use]
    pub fn object_class_count(&self) -> usize {
        self.object_classes.len()
    }

    #[must_use]
    pub fn attribute_type_count(&self) -> usize {
        self.attribute_types.len()
    }
}

/// Joins LDIF continuation lines (lines starting with one space) onto the
/// preceding line.
fn unfold(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    for line in text.lines() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        match (line.strip_prefix(' '), lines.last_mut()) {
            (Some(continuation), Some(last)) => last.push_str(continuation),
            _ => lines.push(line.to_string()),
        }
    }
    lines
}

#[async_trait]
impl SchemaLookup for SubschemaLookup {
    type Error = Error;

    async fn object_class(&self, name: &str) -> Result<Lookup> {
        Ok(scan(&self.object_classes, name).map(str::to_string).into())
    }

    async fn attribute_type(&self, name: &str) -> Result<Lookup> {
        Ok(scan(&self.attribute_types, name).map(str::to_string).into())
    }

    async fn schema_stamp(&self) -> Result<Option<String>> {
        Ok(self.modify_timestamp.clone())
    }
}
