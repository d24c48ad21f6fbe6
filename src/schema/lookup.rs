use async_trait::async_trait;

/// Outcome of a schema lookup that reached the directory.
///
/// A directory that cannot be reached is not an outcome: implementors report
/// it as an error so resolutions abort instead of silently losing data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lookup {
    /// Raw description of the requested schema element.
    Found(String),
    /// The directory schema does not define the requested name.
    NotFound,
}

impl Lookup {
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

impl From<Option<String>> for Lookup {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::NotFound, Self::Found)
    }
}

/// Contract describing how raw schema descriptions are fetched from the directory.
#[async_trait]
pub trait SchemaLookup {
    /// Associated error type allowing infrastructure specific failures.
    type Error;

    /// Returns the raw description of the object class named `name`.
    ///
    /// Implementors must match `name` case-insensitively against every name
    /// of a class and return `Ok(Lookup::NotFound)` when none matches.
    async fn object_class(&self, name: &str) -> Result<Lookup, Self::Error>;

    /// Returns the raw description of the attribute type named `name`.
    async fn attribute_type(&self, name: &str) -> Result<Lookup, Self::Error>;

    /// Returns `true` when the schema defines an object class named `name`.
    async fn class_exists(&self, name: &str) -> Result<bool, Self::Error> {
        Ok(self.object_class(name).await?.is_found())
    }

    /// Returns `true` when the schema defines an attribute type named `name`.
    async fn attribute_exists(&self, name: &str) -> Result<bool, Self::Error> {
        Ok(self.attribute_type(name).await?.is_found())
    }

    /// Returns a stamp that changes whenever the directory schema is modified,
    /// typically the subschema entry's `modifyTimestamp`.
    ///
    /// Implementors without such a stamp return `Ok(None)`.
    async fn schema_stamp(&self) -> Result<Option<String>, Self::Error> {
        Ok(None)
    }
}
