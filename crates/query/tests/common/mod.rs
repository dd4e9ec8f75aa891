//! Shared fixtures for query integration tests.

#![allow(dead_code)]

use tessera_query::filter::FilterOperator;
use tessera_query::types::{
    LinkingPolicy, MetadataRegistry, RelationshipDef, ResourceMetadata,
};

/// Fields the `articles` whitelist allows, with their operators.
pub const ALLOWED: &[(&str, &[FilterOperator])] = &[
    (
        "title",
        &[FilterOperator::Eq, FilterOperator::Like, FilterOperator::In],
    ),
    (
        "views",
        &[
            FilterOperator::Gt,
            FilterOperator::Gte,
            FilterOperator::Lt,
            FilterOperator::Between,
        ],
    ),
    ("status", &[FilterOperator::Eq, FilterOperator::Neq]),
];

/// Blog-style schema: articles, comments and people.
pub fn blog_registry() -> MetadataRegistry {
    let mut articles = ResourceMetadata::new("articles")
        .with_attributes(["title", "body", "slug", "views", "status", "created"])
        .with_relationship(RelationshipDef::to_one("author", "people"))
        .with_relationship(
            RelationshipDef::to_many("comments", "comments")
                .with_linking(LinkingPolicy::WhenIncluded),
        )
        .with_sortable(["created", "title", "views"]);
    for (field, ops) in ALLOWED {
        articles = articles.with_filterable(*field, ops.iter().copied());
    }

    MetadataRegistry::new()
        .with_type(articles)
        .with_type(
            ResourceMetadata::new("comments")
                .with_attributes(["body"])
                .with_relationship(RelationshipDef::to_one("author", "people")),
        )
        .with_type(
            ResourceMetadata::new("people")
                .with_attributes(["name", "email"])
                .with_relationship(RelationshipDef::to_one("profile", "profiles")),
        )
        .with_type(ResourceMetadata::new("profiles").with_attributes(["bio"]))
}

/// Returns true if the `articles` whitelist allows this pair.
pub fn is_allowed(field: &str, operator: FilterOperator) -> bool {
    ALLOWED
        .iter()
        .any(|(f, ops)| *f == field && ops.contains(&operator))
}
