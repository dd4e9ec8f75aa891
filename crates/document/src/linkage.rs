//! Relationship linkage.
//!
//! Every emitted relationship carries `self` and `related` links. Whether it
//! also embeds resource identifiers depends on its [`LinkingPolicy`]:
//!
//! - `Reference`: never
//! - `Always`: always, fetching the identifiers if needed
//! - `WhenIncluded`: only when this relationship of this resource was walked
//!   while resolving includes

use serde_json::Map;
use tessera_query::types::{LinkingPolicy, RelationshipDef};

use crate::entity::Entity;
use crate::fetch::Related;
use crate::links::LinkBuilder;
use crate::model::RelationshipLinkage;

/// Returns true if the linkage should embed identifiers.
pub fn embeds_data(policy: LinkingPolicy, traversed: bool) -> bool {
    match policy {
        LinkingPolicy::Reference => false,
        LinkingPolicy::Always => true,
        LinkingPolicy::WhenIncluded => traversed,
    }
}

/// Builds the linkage of one relationship of `entity`.
///
/// `related` is the fetched relationship content, if any. It is embedded only
/// when the policy allows it.
pub fn build_linkage(
    links: &LinkBuilder,
    entity: &Entity,
    relationship: &RelationshipDef,
    related: Option<&Related>,
    traversed: bool,
) -> RelationshipLinkage {
    let data = if embeds_data(relationship.linking, traversed) {
        related.map(Related::to_data)
    } else {
        None
    };

    RelationshipLinkage {
        cardinality: relationship.cardinality,
        links: links.relationship(&entity.resource_type, &entity.id, &relationship.name),
        data,
        meta: Map::new(),
    }
}
