//! Fetch collaborator traits.
//!
//! The engine never talks to storage directly. Hosts supply a
//! [`RelationshipFetcher`] for walking includes and, when the engine should
//! also load primary data, a [`PrimaryFetcher`]. Both are object safe and are
//! held as `Arc<dyn ...>` so fetches can run on spawned tasks.
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//! use tessera_document::{Entity, FetchError, Related, RelationshipFetcher};
//! use tessera_query::types::RelationshipDef;
//!
//! struct Authors;
//!
//! #[async_trait]
//! impl RelationshipFetcher for Authors {
//!     async fn fetch_related(
//!         &self,
//!         source: &Entity,
//!         relationship: &RelationshipDef,
//!     ) -> Result<Related, FetchError> {
//!         Ok(Related::ToOne(Some(Entity::new("people", "9"))))
//!     }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tessera_query::Criteria;
use tessera_query::types::RelationshipDef;

use crate::entity::Entity;
use crate::error::FetchError;
use crate::model::{RelationshipData, ResourceIdentifier};

/// Entities reached through one relationship of one source entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Related {
    /// To-one result; `None` when the relationship is empty.
    ToOne(Option<Entity>),
    /// To-many result, in collaborator order.
    ToMany(Vec<Entity>),
}

impl Related {
    /// Returns the related entities in order.
    pub fn entities(&self) -> &[Entity] {
        match self {
            Related::ToOne(Some(entity)) => std::slice::from_ref(entity),
            Related::ToOne(None) => &[],
            Related::ToMany(entities) => entities,
        }
    }

    /// Converts to linkage identifiers.
    pub fn to_data(&self) -> RelationshipData {
        match self {
            Related::ToOne(entity) => RelationshipData::ToOne(entity.as_ref().map(Entity::identifier)),
            Related::ToMany(entities) => RelationshipData::ToMany(
                entities
                    .iter()
                    .map(Entity::identifier)
                    .collect::<Vec<ResourceIdentifier>>(),
            ),
        }
    }
}

/// Follows relationships of an entity.
#[async_trait]
pub trait RelationshipFetcher: Send + Sync {
    /// Returns the entities `source` points at through `relationship`.
    async fn fetch_related(
        &self,
        source: &Entity,
        relationship: &RelationshipDef,
    ) -> Result<Related, FetchError>;
}

/// A page of primary entities.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionPage {
    /// Entities on the requested page.
    pub items: Vec<Entity>,
    /// Matching entities across all pages.
    pub total: u64,
}

/// Loads primary data.
#[async_trait]
pub trait PrimaryFetcher: Send + Sync {
    /// Returns one page of entities of a type matching `criteria`.
    async fn fetch_collection(
        &self,
        resource_type: &str,
        criteria: &Criteria,
    ) -> Result<CollectionPage, FetchError>;

    /// Returns one entity; [`FetchError::NotFound`] if it does not exist.
    async fn fetch_one(&self, resource_type: &str, id: &str) -> Result<Entity, FetchError>;
}

/// Shared relationship fetcher.
pub type DynRelationshipFetcher = Arc<dyn RelationshipFetcher>;

/// Shared primary fetcher.
pub type DynPrimaryFetcher = Arc<dyn PrimaryFetcher>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_related_entities() {
        let one = Related::ToOne(Some(Entity::new("people", "9")));
        assert_eq!(one.entities().len(), 1);
        assert_eq!(Related::ToOne(None).entities().len(), 0);

        let many = Related::ToMany(vec![Entity::new("comments", "5"), Entity::new("comments", "12")]);
        assert_eq!(
            many.to_data(),
            RelationshipData::ToMany(vec![
                ResourceIdentifier::new("comments", "5"),
                ResourceIdentifier::new("comments", "12"),
            ])
        );
        assert_eq!(Related::ToOne(None).to_data(), RelationshipData::ToOne(None));
    }
}
