//! Domain entities as seen by the engine.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::ResourceIdentifier;

/// A domain entity handed to the engine by a fetch collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Resource type.
    #[serde(rename = "type")]
    pub resource_type: String,

    /// Identifier, unique within the type.
    pub id: String,

    /// Attribute values by name.
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl Entity {
    /// Creates an entity without attributes.
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
            attributes: Map::new(),
        }
    }

    /// Sets an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Returns the identity key.
    pub fn identity(&self) -> IdentityKey {
        IdentityKey::new(&self.resource_type, &self.id)
    }

    /// Returns the resource identifier.
    pub fn identifier(&self) -> ResourceIdentifier {
        ResourceIdentifier::new(&self.resource_type, &self.id)
    }
}

/// `(type, id)`: two entities with the same key are the same entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentityKey {
    /// Resource type.
    pub resource_type: String,
    /// Identifier.
    pub id: String,
}

impl IdentityKey {
    /// Creates a key.
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource_type, self.id)
    }
}
