//! Compound document model.
//!
//! These types serialise to the top-level document shape clients receive:
//!
//! ```json
//! {
//!   "data": [{"type": "articles", "id": "1", "attributes": {...}, "relationships": {...}}],
//!   "included": [...],
//!   "links": {"self": "...", "next": "..."},
//!   "meta": {"total": 13}
//! }
//! ```
//!
//! Optional members are omitted rather than written as `null`, except for an
//! empty to-one linkage, which is an explicit `null`.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use tessera_query::types::Cardinality;

/// A `(type, id)` pair identifying a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ResourceIdentifier {
    /// Resource type.
    #[serde(rename = "type")]
    pub resource_type: String,
    /// Identifier.
    pub id: String,
}

impl ResourceIdentifier {
    /// Creates an identifier.
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }
}

/// Named links.
///
/// The well-known relations have their own fields; hooks may add others.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Links {
    /// Link to this document or object.
    #[serde(rename = "self", skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,

    /// Link to the related resource(s) of a relationship.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related: Option<String>,

    /// First page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first: Option<String>,

    /// Previous page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,

    /// Next page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,

    /// Last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,

    /// Additional links.
    #[serde(flatten)]
    pub other: BTreeMap<String, String>,
}

impl Links {
    /// Creates links with only `self` set.
    pub fn self_only(url: impl Into<String>) -> Self {
        Self {
            self_link: Some(url.into()),
            ..Default::default()
        }
    }

    /// Adds a custom link.
    pub fn insert(&mut self, relation: impl Into<String>, url: impl Into<String>) {
        self.other.insert(relation.into(), url.into());
    }

    /// Returns true if no link is set.
    pub fn is_empty(&self) -> bool {
        self.self_link.is_none()
            && self.related.is_none()
            && self.first.is_none()
            && self.prev.is_none()
            && self.next.is_none()
            && self.last.is_none()
            && self.other.is_empty()
    }
}

/// Resource identifiers embedded in a relationship.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RelationshipData {
    /// To-one linkage; `None` serialises as `null`.
    ToOne(Option<ResourceIdentifier>),
    /// To-many linkage.
    ToMany(Vec<ResourceIdentifier>),
}

impl RelationshipData {
    /// Returns the identifiers as a slice-like list.
    pub fn identifiers(&self) -> Vec<&ResourceIdentifier> {
        match self {
            RelationshipData::ToOne(Some(id)) => vec![id],
            RelationshipData::ToOne(None) => Vec::new(),
            RelationshipData::ToMany(ids) => ids.iter().collect(),
        }
    }
}

/// One relationship of a resource object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipLinkage {
    /// Whether the relationship is to-one or to-many.
    #[serde(skip)]
    pub cardinality: Cardinality,

    /// `self` and `related` links.
    #[serde(skip_serializing_if = "Links::is_empty")]
    pub links: Links,

    /// Identifiers, when the linking policy calls for them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<RelationshipData>,

    /// Free-form metadata added by hooks.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
}

/// A resource in `data` or `included`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceObject {
    /// Resource type.
    #[serde(rename = "type")]
    pub resource_type: String,

    /// Identifier.
    pub id: String,

    /// Projected attributes.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,

    /// Relationships by name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub relationships: BTreeMap<String, RelationshipLinkage>,

    /// Object links.
    #[serde(skip_serializing_if = "Links::is_empty")]
    pub links: Links,
}

impl ResourceObject {
    /// Returns the identifier of this object.
    pub fn identifier(&self) -> ResourceIdentifier {
        ResourceIdentifier::new(&self.resource_type, &self.id)
    }
}

/// Primary data of a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PrimaryData {
    /// A single resource.
    Single(Box<ResourceObject>),
    /// A collection.
    Collection(Vec<ResourceObject>),
}

impl PrimaryData {
    /// Returns the primary resources in order.
    pub fn resources(&self) -> Vec<&ResourceObject> {
        match self {
            PrimaryData::Single(resource) => vec![resource.as_ref()],
            PrimaryData::Collection(resources) => resources.iter().collect(),
        }
    }
}

/// A top-level compound document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// Primary data.
    pub data: PrimaryData,

    /// Related resources, present only when includes were requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub included: Option<Vec<ResourceObject>>,

    /// Top-level links.
    #[serde(skip_serializing_if = "Links::is_empty")]
    pub links: Links,

    /// Top-level metadata.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
}

impl Document {
    /// Serialises the document to JSON.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Returns the included resources, or an empty slice.
    pub fn included(&self) -> &[ResourceObject] {
        self.included.as_deref().unwrap_or(&[])
    }
}
