//! Directory schema resolution.
//!
//! Raw descriptions come from a [`SchemaLookup`], are parsed by [`parser`]
//! and confirmed by the reader, then expanded into ancestor chains and
//! attribute sets that are memoized in the [`crate::cache`].

pub mod aggregator;
pub mod entities;
pub mod lookup;
pub mod parser;
pub mod reader;
pub mod resolver;
pub mod service;
pub mod subschema;
pub mod value_objects;

pub use entities::{
    AncestorChain, AttributeTypeDefinition, AttributeUsage, ClassKind, ObjectClassDefinition,
    Presence, ResolvedAttributes, ROOT_CLASS,
};
pub use lookup::{Lookup, SchemaLookup};
pub use parser::{parse_attribute_type, parse_object_class, ParseWarning, Parsed};
pub use service::{ClassReport, LookupHandle, SchemaService, StampStatus};
pub use subschema::SubschemaLookup;
pub use value_objects::{CacheKey, CacheKeyError};
