//! Resource metadata lookup.
//!
//! The engine does not discover metadata itself. Hosts describe each resource
//! type (attributes, relationships, filterable and sortable fields) and hand
//! the description over through the [`MetadataLookup`] trait. A ready-made
//! in-memory [`MetadataRegistry`] can be built programmatically or loaded
//! from JSON.
//!
//! # Example
//!
//! ```
//! use tessera_query::filter::FilterOperator;
//! use tessera_query::types::{
//!     LinkingPolicy, MetadataLookup, MetadataRegistry, RelationshipDef, ResourceMetadata,
//! };
//!
//! let registry = MetadataRegistry::new().with_type(
//!     ResourceMetadata::new("articles")
//!         .with_attributes(["title", "body"])
//!         .with_relationship(
//!             RelationshipDef::to_one("author", "people").with_linking(LinkingPolicy::Always),
//!         )
//!         .with_filterable("title", [FilterOperator::Eq, FilterOperator::Like]),
//! );
//!
//! assert!(registry.has_type("articles"));
//! assert!(registry.get_by_type("articles").unwrap().relationship("author").is_some());
//! ```

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::filter::FilterOperator;

/// Whether a relationship points at one or many resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cardinality {
    /// At most one related resource.
    ToOne,
    /// Zero or more related resources.
    ToMany,
}

/// Rule deciding whether relationship linkage embeds resource identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkingPolicy {
    /// Links only, never identifiers.
    Reference,
    /// Always embed identifiers.
    Always,
    /// Embed identifiers only when the relationship was included.
    #[default]
    WhenIncluded,
}

/// A declared relationship on a resource type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipDef {
    /// Relationship name as used in include paths.
    pub name: String,

    /// Type of the related resources.
    pub target_type: String,

    /// To-one or to-many.
    pub cardinality: Cardinality,

    /// Linkage policy.
    #[serde(default)]
    pub linking: LinkingPolicy,
}

impl RelationshipDef {
    /// Creates a to-one relationship with the default linking policy.
    pub fn to_one(name: impl Into<String>, target_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_type: target_type.into(),
            cardinality: Cardinality::ToOne,
            linking: LinkingPolicy::default(),
        }
    }

    /// Creates a to-many relationship with the default linking policy.
    pub fn to_many(name: impl Into<String>, target_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_type: target_type.into(),
            cardinality: Cardinality::ToMany,
            linking: LinkingPolicy::default(),
        }
    }

    /// Sets the linking policy.
    pub fn with_linking(mut self, linking: LinkingPolicy) -> Self {
        self.linking = linking;
        self
    }

    /// Returns true for to-many relationships.
    pub fn is_to_many(&self) -> bool {
        self.cardinality == Cardinality::ToMany
    }
}

/// Per-type whitelist of filterable fields and their operators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterableFieldSpec {
    fields: HashMap<String, BTreeSet<FilterOperator>>,
}

impl FilterableFieldSpec {
    /// Creates an empty spec; nothing is filterable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allows the given operators on a field, adding to any already allowed.
    pub fn allow<I>(mut self, field: impl Into<String>, operators: I) -> Self
    where
        I: IntoIterator<Item = FilterOperator>,
    {
        self.fields
            .entry(field.into())
            .or_default()
            .extend(operators);
        self
    }

    /// Returns the operators allowed on a field, or None if the field is not filterable.
    pub fn operators(&self, field: &str) -> Option<&BTreeSet<FilterOperator>> {
        self.fields.get(field)
    }

    /// Returns true if the field is filterable with the operator.
    pub fn permits(&self, field: &str, operator: FilterOperator) -> bool {
        self.operators(field)
            .is_some_and(|ops| ops.contains(&operator))
    }

    /// Returns true if no field is filterable.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Description of one resource type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMetadata {
    /// The resource type name.
    #[serde(rename = "type")]
    pub resource_type: String,

    /// Declared attribute names, in output order.
    #[serde(default)]
    pub attributes: Vec<String>,

    /// Declared relationships, in output order.
    #[serde(default)]
    pub relationships: Vec<RelationshipDef>,

    /// Filter whitelist.
    #[serde(default)]
    pub filterable: FilterableFieldSpec,

    /// Fields clients may sort on.
    #[serde(default)]
    pub sortable: BTreeSet<String>,
}

impl ResourceMetadata {
    /// Creates metadata for a type with no attributes or relationships.
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: Vec::new(),
            relationships: Vec::new(),
            filterable: FilterableFieldSpec::default(),
            sortable: BTreeSet::new(),
        }
    }

    /// Sets the declared attributes.
    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a relationship.
    pub fn with_relationship(mut self, relationship: RelationshipDef) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Allows filtering a field with the given operators.
    pub fn with_filterable<I>(mut self, field: impl Into<String>, operators: I) -> Self
    where
        I: IntoIterator<Item = FilterOperator>,
    {
        self.filterable = self.filterable.allow(field, operators);
        self
    }

    /// Sets the sortable fields.
    pub fn with_sortable<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sortable = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Looks up a relationship by name.
    pub fn relationship(&self, name: &str) -> Option<&RelationshipDef> {
        self.relationships.iter().find(|r| r.name == name)
    }

    /// Returns true if the name is a declared attribute.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a == name)
    }
}

/// Lookup interface for resource metadata.
pub trait MetadataLookup: Send + Sync {
    /// Returns true if the type is known.
    fn has_type(&self, resource_type: &str) -> bool {
        self.get_by_type(resource_type).is_some()
    }

    /// Returns the metadata for a type.
    fn get_by_type(&self, resource_type: &str) -> Option<&ResourceMetadata>;
}

/// In-memory metadata registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataRegistry {
    types: Vec<ResourceMetadata>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl MetadataRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a type, replacing any previous registration with the same name.
    pub fn register(&mut self, metadata: ResourceMetadata) {
        match self.index.get(&metadata.resource_type) {
            Some(&pos) => self.types[pos] = metadata,
            None => {
                self.index
                    .insert(metadata.resource_type.clone(), self.types.len());
                self.types.push(metadata);
            }
        }
    }

    /// Registers a type and returns the registry.
    pub fn with_type(mut self, metadata: ResourceMetadata) -> Self {
        self.register(metadata);
        self
    }

    /// Loads a registry from its JSON form: `{"types": [ ... ]}`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let loaded: MetadataRegistry = serde_json::from_str(json)?;
        let mut registry = MetadataRegistry::new();
        for metadata in loaded.types {
            registry.register(metadata);
        }
        Ok(registry)
    }

    /// Returns all registered types in registration order.
    pub fn types(&self) -> impl Iterator<Item = &ResourceMetadata> {
        self.types.iter()
    }
}

impl MetadataLookup for MetadataRegistry {
    fn get_by_type(&self, resource_type: &str) -> Option<&ResourceMetadata> {
        self.index.get(resource_type).map(|&pos| &self.types[pos])
    }
}
