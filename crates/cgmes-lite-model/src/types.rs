// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core types for CGMES data representation
//!
//! This module defines the fundamental types used throughout the parsing
//! pipeline: the generic element tree produced by the loader, the typed
//! entities produced by the extractor, and the resolved references that
//! connect them.

use crate::FieldError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Field carrying the human readable name of most CIM objects
pub const NAME_FIELD: &str = "IdentifiedObject.name";

/// Field carrying the model-wide identifier of most CIM objects
pub const MRID_FIELD: &str = "IdentifiedObject.mRID";

/// Strip an RDF identifier down to its bare form
///
/// Takes the part after the last `#` (so full URIs work too), drops a
/// `urn:uuid:` prefix and removes a single leading `_`:
///
/// - `"#_2184f365"` -> `"2184f365"`
/// - `"_2184f365"` -> `"2184f365"`
/// - `"urn:uuid:2184f365"` -> `"2184f365"`
/// - `"http://iec.ch/TC57/CIM100#Kind.member"` -> `"Kind.member"`
pub fn strip_identifier(raw: &str) -> &str {
    let raw = raw.trim();
    let tail = match raw.rfind('#') {
        Some(pos) => &raw[pos + 1..],
        None => raw,
    };
    let tail = tail.strip_prefix(URN_UUID_PREFIX).unwrap_or(tail);
    tail.strip_prefix('_').unwrap_or(tail)
}

const URN_UUID_PREFIX: &str = "urn:uuid:";

/// Type-safe entity identifier
///
/// Holds the stripped identifier; `rdf:ID="_abc"`, `rdf:about="#_abc"` and
/// `<cim:IdentifiedObject.mRID>abc</...>` all produce `EntityId("abc")`.
#[derive(
    Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize, Default,
)]
pub struct EntityId(pub String);

impl EntityId {
    /// Wrap an already-stripped identifier
    pub fn new(id: impl Into<String>) -> Self {
        EntityId(id.into())
    }

    /// Build an identifier from a raw RDF form (`#_x`, `_x`, `x`)
    pub fn from_raw(raw: &str) -> Self {
        EntityId(strip_identifier(raw).to_string())
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether this is a canonical 8-4-4-4-12 hexadecimal UUID
    pub fn is_uuid(&self) -> bool {
        let groups: Vec<&str> = self.0.split('-').collect();
        groups.len() == 5
            && groups
                .iter()
                .zip([8usize, 4, 4, 4, 12])
                .all(|(g, len)| g.len() == len && g.bytes().all(|b| b.is_ascii_hexdigit()))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        EntityId(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        EntityId(id)
    }
}

/// Namespace-qualified XML name
///
/// `namespace` is the URI bound to the element's prefix, not the prefix
/// itself, so `cim:Terminal` and `x:Terminal` compare equal when both
/// prefixes are bound to the same URI.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct QualifiedName {
    /// Namespace URI (None for unqualified names)
    pub namespace: Option<String>,
    /// Local name without prefix
    pub local: String,
}

impl QualifiedName {
    /// Create a qualified name
    pub fn new(namespace: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            local: local.into(),
        }
    }

    /// Create a name without namespace
    pub fn unqualified(local: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local: local.into(),
        }
    }

    /// Check whether the name lives in the given namespace
    pub fn is_in(&self, namespace: &str) -> bool {
        self.namespace.as_deref() == Some(namespace)
    }

    /// Check namespace and local name at once
    pub fn matches(&self, namespace: &str, local: &str) -> bool {
        self.is_in(namespace) && self.local == local
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// Generic namespaced XML element produced by the loader
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawElement {
    /// Element tag
    pub name: QualifiedName,
    /// Attributes in document order (namespace declarations excluded)
    pub attributes: Vec<(QualifiedName, String)>,
    /// Child elements in document order
    pub children: Vec<RawElement>,
    /// Trimmed text content, if any
    pub text: Option<String>,
}

impl RawElement {
    /// Create an element with no attributes, children or text
    pub fn new(name: QualifiedName) -> Self {
        Self {
            name,
            attributes: Vec::new(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Get an attribute value by namespace and local name
    pub fn attribute(&self, namespace: &str, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(name, _)| name.matches(namespace, local))
            .map(|(_, value)| value.as_str())
    }

    /// Find the first child with the given namespace and local name
    pub fn child(&self, namespace: &str, local: &str) -> Option<&RawElement> {
        self.children
            .iter()
            .find(|child| child.name.matches(namespace, local))
    }

    /// Count this element and all of its descendants
    pub fn element_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(RawElement::element_count)
            .sum::<usize>()
    }
}

/// Value of an entity field, kept uncoerced
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Inline text content, coerced lazily at read time
    Text(String),
    /// Raw `rdf:resource` token, resolved by a separate pass
    Reference(String),
}

impl FieldValue {
    /// Get inline text (None for references)
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Reference(_) => None,
        }
    }

    /// Get the raw reference token (None for text)
    pub fn as_reference(&self) -> Option<&str> {
        match self {
            FieldValue::Reference(s) => Some(s),
            FieldValue::Text(_) => None,
        }
    }

    /// Check if this is a reference
    pub fn is_reference(&self) -> bool {
        matches!(self, FieldValue::Reference(_))
    }
}

/// Named field of an entity
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Local name of the property element (e.g. `IdentifiedObject.name`)
    pub name: String,
    /// Field value
    pub value: FieldValue,
}

/// Typed record extracted from one XML element
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Stripped identifier
    pub id: EntityId,
    /// Local tag name of the element (e.g. `PowerTransformerEnd`)
    pub type_name: String,
    /// Fields in document order
    pub fields: Vec<Field>,
    /// Document-order index of the source element among extraction candidates
    pub position: usize,
}

impl Entity {
    /// Create an entity with no fields
    pub fn new(id: EntityId, type_name: impl Into<String>, position: usize) -> Self {
        Self {
            id,
            type_name: type_name.into(),
            fields: Vec::new(),
            position,
        }
    }

    /// Add a field (builder style)
    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.push(Field {
            name: name.into(),
            value,
        });
        self
    }

    /// Check the entity type
    pub fn is_type(&self, type_name: &str) -> bool {
        self.type_name == type_name
    }

    /// Get a field value by name
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    /// Get inline text of a field
    pub fn text(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(FieldValue::as_text)
    }

    /// Get `IdentifiedObject.name`
    pub fn name(&self) -> Option<&str> {
        self.text(NAME_FIELD)
    }

    /// Get the entity name, falling back to its id
    pub fn display_name(&self) -> &str {
        self.name().unwrap_or(self.id.as_str())
    }

    /// Coerce a field to a float
    ///
    /// Absent or blank fields give `Ok(None)`; present but unparsable text is
    /// an error so callers can tell missing data from bad data.
    pub fn number(&self, name: &str) -> std::result::Result<Option<f64>, FieldError> {
        let Some(text) = self.non_blank_text(name) else {
            return Ok(None);
        };
        lexical_core::parse::<f64>(text.as_bytes())
            .map(Some)
            .map_err(|_| FieldError::InvalidNumber {
                entity: self.id.clone(),
                field: name.to_string(),
                value: text.to_string(),
            })
    }

    /// Coerce a field to an integer
    pub fn integer(&self, name: &str) -> std::result::Result<Option<i64>, FieldError> {
        let Some(text) = self.non_blank_text(name) else {
            return Ok(None);
        };
        lexical_core::parse::<i64>(text.as_bytes())
            .map(Some)
            .map_err(|_| FieldError::InvalidInteger {
                entity: self.id.clone(),
                field: name.to_string(),
                value: text.to_string(),
            })
    }

    /// Coerce a field to a boolean (case-insensitive `"true"`)
    pub fn flag(&self, name: &str) -> Option<bool> {
        self.text(name)
            .map(|text| text.trim().eq_ignore_ascii_case("true"))
    }

    /// Get the raw reference token of a field
    pub fn reference_token(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(FieldValue::as_reference)
    }

    /// Iterate over the fields holding resource references
    pub fn reference_fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.value.is_reference())
    }

    fn non_blank_text(&self, name: &str) -> Option<&str> {
        self.text(name).map(str::trim).filter(|t| !t.is_empty())
    }
}

/// One source element that carried a given identifier
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    /// Type of the element
    pub type_name: String,
    /// Document-order position of the element
    pub position: usize,
}

/// Enumeration literal referenced as a resource (e.g. `RegulatingControlModeKind.voltage`)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumValue {
    /// Enumeration type (`RegulatingControlModeKind`)
    pub kind: String,
    /// Member name (`voltage`)
    pub member: String,
}

impl EnumValue {
    /// Create an enumeration value
    pub fn new(kind: impl Into<String>, member: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            member: member.into(),
        }
    }
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.kind, self.member)
    }
}

/// Outcome of resolving one reference token
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Resolution {
    /// Points at an entity in the same document
    Entity(EntityId),
    /// Names an enumeration literal
    Enum(EnumValue),
    /// Target is absent from the document; holds the stripped token
    Dangling(String),
}

impl Resolution {
    /// Get the target entity id
    pub fn as_entity(&self) -> Option<&EntityId> {
        match self {
            Resolution::Entity(id) => Some(id),
            _ => None,
        }
    }

    /// Get the enumeration value
    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Resolution::Enum(value) => Some(value),
            _ => None,
        }
    }

    /// Check if the reference could not be resolved
    pub fn is_dangling(&self) -> bool {
        matches!(self, Resolution::Dangling(_))
    }
}

/// Directed, resolved edge of the entity graph
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    /// Entity holding the reference field
    pub source: EntityId,
    /// Field name
    pub field: String,
    /// Raw `rdf:resource` token as written in the document
    pub token: String,
    /// Resolution outcome
    pub target: Resolution,
}

/// Counters describing one extraction pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Elements considered as entity candidates
    pub candidates: usize,
    /// Entities extracted (including ones later superseded by a duplicate id)
    pub extracted: usize,
    /// Candidates skipped because their type is not recognised
    pub skipped: usize,
    /// Recognised elements dropped for lack of an identifier
    pub missing_identity: usize,
    /// Entities replaced by a later element with the same id
    pub superseded: usize,
}
