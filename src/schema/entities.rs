use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Name of the class every inheritance chain starts from.
pub const ROOT_CLASS: &str = "top";

/// Returns `true` when `name` designates the root class.
#[must_use]
pub fn is_root(name: &str) -> bool {
    name.eq_ignore_ascii_case(ROOT_CLASS)
}

/// Object class kind declared in a description.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    Abstract,
    Structural,
    Auxiliary,
}

/// Object class definition as declared by one raw schema description.
///
/// Tokens are kept exactly as written. Whether they name real schema
/// elements is checked later against the directory lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ObjectClassDefinition {
    oid: Option<String>,
    names: Vec<String>,
    description: Option<String>,
    obsolete: bool,
    kind: Option<ClassKind>,
    superiors: Vec<String>,
    required: Vec<String>,
    optional: Vec<String>,
}

impl ObjectClassDefinition {
    /// Creates an empty definition carrying the supplied primary name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            oid: None,
            names: if name.is_empty() { vec![] } else { vec![name] },
            description: None,
            obsolete: false,
            kind: None,
            superiors: vec![],
            required: vec![],
            optional: vec![],
        }
    }

    #[must_use]
    pub fn with_oid(mut self, oid: impl Into<String>) -> Self {
        self.oid = Some(oid.into());
        self
    }

    /// Replaces every name of the class; the first one becomes the primary name.
    #[must_use]
    pub fn with_names(mut self, names: Vec<String>) -> Self {
        self.names = names;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_obsolete(mut self, obsolete: bool) -> Self {
        self.obsolete = obsolete;
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: ClassKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn with_superiors(mut self, superiors: Vec<String>) -> Self {
        self.superiors = superiors;
        self
    }

    #[must_use]
    pub fn with_required(mut self, required: Vec<String>) -> Self {
        self.required = required;
        self
    }

    #[must_use]
    pub fn with_optional(mut self, optional: Vec<String>) -> Self {
        self.optional = optional;
        self
    }

    /// Returns the primary name, falling back to the numeric OID.
    #[must_use]
    pub fn name(&self) -> &str {
        self.names
            .first()
            .or(self.oid.as_ref())
            .map_or("", String::as_str)
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn oid(&self) -> Option<&str> {
        self.oid.as_deref()
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn is_obsolete(&self) -> bool {
        self.obsolete
    }

    #[must_use]
    pub fn kind(&self) -> Option<ClassKind> {
        self.kind
    }

    /// `true` only when the description carries the STRUCTURAL marker.
    #[must_use]
    pub fn is_structural(&self) -> bool {
        self.kind == Some(ClassKind::Structural)
    }

    /// Superior class tokens in declaration order.
    #[must_use]
    pub fn superiors(&self) -> &[String] {
        &self.superiors
    }

    /// Required (MUST) attribute tokens in declaration order.
    #[must_use]
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Optional (MAY) attribute tokens in declaration order.
    #[must_use]
    pub fn optional(&self) -> &[String] {
        &self.optional
    }

    /// Case-insensitive match against the OID and every declared name.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.oid.as_deref() == Some(name) || self.names.iter().any(|n| n.eq_ignore_ascii_case(name))
    }
}

/// Usage of an attribute type (RFC 4512 `USAGE`).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttributeUsage {
    #[default]
    UserApplications,
    DirectoryOperation,
    DistributedOperation,
    DSAOperation,
}

impl AttributeUsage {
    /// Parses the usage keyword, ignoring case.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text.to_ascii_lowercase().as_str() {
            "userapplications" => Some(Self::UserApplications),
            "directoryoperation" => Some(Self::DirectoryOperation),
            "distributedoperation" => Some(Self::DistributedOperation),
            "dsaoperation" => Some(Self::DSAOperation),
            _ => None,
        }
    }
}

/// Attribute type definition as declared by one raw schema description.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AttributeTypeDefinition {
    oid: Option<String>,
    names: Vec<String>,
    description: Option<String>,
    obsolete: bool,
    superior: Option<String>,
    equality: Option<String>,
    ordering: Option<String>,
    substring: Option<String>,
    syntax: Option<String>,
    single_valued: bool,
    collective: bool,
    user_modifiable: bool,
    usage: AttributeUsage,
}

impl AttributeTypeDefinition {
    /// Creates a multi-valued, user-modifiable definition with the supplied name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            names: if name.is_empty() { vec![] } else { vec![name] },
            user_modifiable: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_oid(mut self, oid: impl Into<String>) -> Self {
        self.oid = Some(oid.into());
        self
    }

    #[must_use]
    pub fn with_names(mut self, names: Vec<String>) -> Self {
        self.names = names;
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_obsolete(mut self, obsolete: bool) -> Self {
        self.obsolete = obsolete;
        self
    }

    #[must_use]
    pub fn with_superior(mut self, superior: impl Into<String>) -> Self {
        self.superior = Some(superior.into());
        self
    }

    #[must_use]
    pub fn with_equality(mut self, rule: impl Into<String>) -> Self {
        self.equality = Some(rule.into());
        self
    }

    #[must_use]
    pub fn with_ordering(mut self, rule: impl Into<String>) -> Self {
        self.ordering = Some(rule.into());
        self
    }

    #[must_use]
    pub fn with_substring(mut self, rule: impl Into<String>) -> Self {
        self.substring = Some(rule.into());
        self
    }

    #[must_use]
    pub fn with_syntax(mut self, syntax: impl Into<String>) -> Self {
        self.syntax = Some(syntax.into());
        self
    }

    #[must_use]
    pub fn with_single_value(mut self, single_valued: bool) -> Self {
        self.single_valued = single_valued;
        self
    }

    #[must_use]
    pub fn with_collective(mut self, collective: bool) -> Self {
        self.collective = collective;
        self
    }

    #[must_use]
    pub fn with_user_modifiable(mut self, user_modifiable: bool) -> Self {
        self.user_modifiable = user_modifiable;
        self
    }

    #[must_use]
    pub fn with_usage(mut self, usage: AttributeUsage) -> Self {
        self.usage = usage;
        self
    }

    /// Returns the primary name, falling back to the numeric OID.
    #[must_use]
    pub fn name(&self) -> &str {
        self.names
            .first()
            .or(self.oid.as_ref())
            .map_or("", String::as_str)
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn oid(&self) -> Option<&str> {
        self.oid.as_deref()
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn is_obsolete(&self) -> bool {
        self.obsolete
    }

    #[must_use]
    pub fn superior(&self) -> Option<&str> {
        self.superior.as_deref()
    }

    #[must_use]
    pub fn equality(&self) -> Option<&str> {
        self.equality.as_deref()
    }

    #[must_use]
    pub fn ordering(&self) -> Option<&str> {
        self.ordering.as_deref()
    }

    #[must_use]
    pub fn substring(&self) -> Option<&str> {
        self.substring.as_deref()
    }

    #[must_use]
    pub fn syntax(&self) -> Option<&str> {
        self.syntax.as_deref()
    }

    #[must_use]
    pub fn is_single_valued(&self) -> bool {
        self.single_valued
    }

    #[must_use]
    pub fn is_collective(&self) -> bool {
        self.collective
    }

    #[must_use]
    pub fn is_user_modifiable(&self) -> bool {
        self.user_modifiable
    }

    #[must_use]
    pub fn usage(&self) -> AttributeUsage {
        self.usage
    }

    /// Case-insensitive match against the OID and every declared name.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.oid.as_deref() == Some(name) || self.names.iter().any(|n| n.eq_ignore_ascii_case(name))
    }
}

/// Ancestor chain under construction, doubling as the visited set of the walk.
///
/// Names are compared case-insensitively. Every name that was ever inserted,
/// plus the subject class itself, counts as visited and is never expanded
/// twice, which bounds the walk by the number of distinct classes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AncestorChain {
    names: Vec<String>,
    visited: HashSet<String>,
}

impl AncestorChain {
    /// Starts the chain of `subject` with the root class.
    ///
    /// The subject is marked visited without being part of the chain, so a
    /// cycle leading back to it stops there.
    #[must_use]
    pub fn rooted_at(subject: &str) -> Self {
        let mut chain = Self::default();
        chain.visited.insert(subject.to_lowercase());
        chain.insert(ROOT_CLASS);
        chain
    }

    /// Appends `name` unless it was already visited. Returns whether it was added.
    pub fn insert(&mut self, name: &str) -> bool {
        if name.is_empty() || !self.visited.insert(name.to_lowercase()) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    /// Marks `name` visited without adding it to the chain.
    pub fn exclude(&mut self, name: &str) {
        self.visited.insert(name.to_lowercase());
    }

    /// Returns `true` when `name` was already visited.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.visited.contains(&name.to_lowercase())
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn into_names(self) -> Vec<String> {
        self.names
    }
}

/// Presence obligation of an attribute within a class.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
}

/// Effective required and optional attributes of an object class.
///
/// No name appears twice, neither within one list nor across both.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAttributes {
    required: Vec<String>,
    optional: Vec<String>,
}

impl ResolvedAttributes {
    /// Adds `name` to the list matching `presence` unless it is already
    /// present in either list. Returns whether it was added.
    pub fn insert(&mut self, name: &str, presence: Presence) -> bool {
        if name.is_empty() || self.contains(name) {
            return false;
        }
        match presence {
            Presence::Required => self.required.push(name.to_string()),
            Presence::Optional => self.optional.push(name.to_string()),
        }
        true
    }

    /// Case-insensitive membership test across both lists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.presence_of(name).is_some()
    }

    /// Returns which list holds `name`, if any.
    #[must_use]
    pub fn presence_of(&self, name: &str) -> Option<Presence> {
        if self.required.iter().any(|n| n.eq_ignore_ascii_case(name)) {
            Some(Presence::Required)
        } else if self.optional.iter().any(|n| n.eq_ignore_ascii_case(name)) {
            Some(Presence::Optional)
        } else {
            None
        }
    }

    #[must_use]
    pub fn required(&self) -> &[String] {
        &self.required
    }

    #[must_use]
    pub fn optional(&self) -> &[String] {
        &self.optional
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.optional.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        is_root, AncestorChain, AttributeTypeDefinition, ClassKind, ObjectClassDefinition,
        Presence, ResolvedAttributes,
    };

    #[test]
    fn class_accessors_reflect_builder() {
        let class = ObjectClassDefinition::new("person")
            .with_oid("2.5.6.6")
            .with_kind(ClassKind::Structural)
            .with_superiors(vec!["top".into()])
            .with_required(vec!["sn".into(), "cn".into()]);

        assert_eq!(class.name(), "person");
        assert!(class.is_structural());
        assert!(class.is_named("PERSON"));
        assert!(class.is_named("2.5.6.6"));
        assert_eq!(class.required(), ["sn", "cn"]);
        assert!(class.optional().is_empty());
    }

    #[test]
    fn unnamed_definitions_fall_back_to_oid() {
        let class = ObjectClassDefinition::new("").with_oid("1.2.3");
        assert_eq!(class.name(), "1.2.3");
        assert!(!class.is_structural());

        let attribute = AttributeTypeDefinition::new("").with_oid("1.2.4");
        assert_eq!(attribute.name(), "1.2.4");
        assert!(attribute.is_user_modifiable());
    }

    #[test]
    fn chain_skips_visited_names() {
        let mut chain = AncestorChain::rooted_at("organizationalPerson");
        assert_eq!(chain.names(), ["top"]);
        assert!(!chain.insert("TOP"));
        assert!(chain.insert("person"));
        assert!(!chain.insert("Person"));
        assert!(!chain.insert("OrganizationalPerson"));
        assert!(!chain.insert(""));
        assert!(chain.contains("organizationalperson"));
        assert_eq!(chain.into_names(), vec!["top", "person"]);
    }

    #[test]
    fn resolved_attributes_keep_first_presence() {
        let mut attributes = ResolvedAttributes::default();
        assert!(attributes.insert("cn", Presence::Required));
        assert!(!attributes.insert("CN", Presence::Optional));
        assert!(attributes.insert("description", Presence::Optional));
        assert!(!attributes.insert("description", Presence::Required));

        assert_eq!(attributes.presence_of("Cn"), Some(Presence::Required));
        assert_eq!(attributes.required(), ["cn"]);
        assert_eq!(attributes.optional(), ["description"]);
    }

    #[test]
    fn resolved_attributes_serialize_as_pair() {
        let mut attributes = ResolvedAttributes::default();
        attributes.insert("sn", Presence::Required);
        attributes.insert("title", Presence::Optional);
        let json = serde_json::to_string(&attributes).expect("serialize");
        assert_eq!(json, r#"{"required":["sn"],"optional":["title"]}"#);
    }

    #[test]
    fn root_detection_ignores_case() {
        assert!(is_root("top"));
        assert!(is_root("Top"));
        assert!(!is_root("topology"));
    }
}
