//! Sparse fieldset projection.
//!
//! Without a fieldset for its type a resource shows every declared attribute
//! and relationship. With one, it shows exactly the named members; `type`
//! and `id` are always present. Attributes an entity carries but its type
//! does not declare are never exposed.

use std::collections::BTreeSet;

use serde_json::{Map, Value};
use tessera_query::types::{RelationshipDef, ResourceMetadata};

use crate::entity::Entity;

/// Returns the visible attributes of an entity, in declaration order.
pub fn project_attributes(
    metadata: &ResourceMetadata,
    entity: &Entity,
    fieldset: Option<&BTreeSet<String>>,
) -> Map<String, Value> {
    let mut result = Map::new();

    for name in &metadata.attributes {
        if !is_visible(name, fieldset) {
            continue;
        }
        if let Some(value) = entity.attributes.get(name) {
            result.insert(name.clone(), value.clone());
        }
    }

    result
}

/// Returns the declared relationships visible under a fieldset, in declaration order.
pub fn visible_relationships<'a>(
    metadata: &'a ResourceMetadata,
    fieldset: Option<&BTreeSet<String>>,
) -> impl Iterator<Item = &'a RelationshipDef> + 'a {
    let fieldset = fieldset.cloned();
    metadata
        .relationships
        .iter()
        .filter(move |rel| is_visible(&rel.name, fieldset.as_ref()))
}

fn is_visible(name: &str, fieldset: Option<&BTreeSet<String>>) -> bool {
    fieldset.is_none_or(|fields| fields.contains(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata() -> ResourceMetadata {
        ResourceMetadata::new("articles")
            .with_attributes(["title", "body", "slug"])
            .with_relationship(RelationshipDef::to_one("author", "people"))
            .with_relationship(RelationshipDef::to_many("comments", "comments"))
    }

    fn entity() -> Entity {
        Entity::new("articles", "1")
            .with_attribute("slug", "hello")
            .with_attribute("title", "Hello")
            .with_attribute("secret", "hidden")
    }

    #[test]
    fn test_all_declared_attributes_in_declaration_order() {
        let attributes = project_attributes(&metadata(), &entity(), None);
        let keys: Vec<&String> = attributes.keys().collect();
        assert_eq!(keys, vec!["title", "slug"]);
        assert!(!attributes.contains_key("secret"));
    }

    #[test]
    fn test_fieldset_restricts_attributes() {
        let fields: BTreeSet<String> = ["slug".to_string(), "author".to_string()].into();
        let attributes = project_attributes(&metadata(), &entity(), Some(&fields));
        assert_eq!(Value::Object(attributes), json!({"slug": "hello"}));

        let meta = metadata();
        let rels: Vec<&str> = visible_relationships(&meta, Some(&fields))
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(rels, vec!["author"]);
    }

    #[test]
    fn test_empty_fieldset_hides_everything() {
        let fields = BTreeSet::new();
        assert!(project_attributes(&metadata(), &entity(), Some(&fields)).is_empty());
        assert_eq!(visible_relationships(&metadata(), Some(&fields)).count(), 0);
    }
}
