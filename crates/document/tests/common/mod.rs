//! Shared fixtures for document integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tessera_document::{
    Document, DocumentEngine, DocumentHook, EngineConfig, Entity, FetchError, Links,
    MemoryStore, Related, RelationshipFetcher, RelationshipLinkage, ResourceIdentifier,
    ResourceObject,
};
use tessera_query::types::{LinkingPolicy, MetadataRegistry, RelationshipDef, ResourceMetadata};

/// Blog schema covering every linking policy.
///
/// - `articles.author`, `articles.comments`: when included
/// - `articles.tags`: always
/// - `articles.editor`: reference only
pub fn blog_registry() -> MetadataRegistry {
    MetadataRegistry::new()
        .with_type(
            ResourceMetadata::new("articles")
                .with_attributes(["title", "body", "views"])
                .with_relationship(RelationshipDef::to_one("author", "people"))
                .with_relationship(RelationshipDef::to_many("comments", "comments"))
                .with_relationship(
                    RelationshipDef::to_many("tags", "tags").with_linking(LinkingPolicy::Always),
                )
                .with_relationship(
                    RelationshipDef::to_one("editor", "people")
                        .with_linking(LinkingPolicy::Reference),
                )
                .with_sortable(["title", "views"]),
        )
        .with_type(
            ResourceMetadata::new("comments")
                .with_attributes(["body"])
                .with_relationship(RelationshipDef::to_one("author", "people"))
                .with_relationship(RelationshipDef::to_one("article", "articles")),
        )
        .with_type(
            ResourceMetadata::new("people")
                .with_attributes(["name", "email"])
                .with_relationship(RelationshipDef::to_one("profile", "profiles")),
        )
        .with_type(ResourceMetadata::new("profiles").with_attributes(["bio"]))
        .with_type(ResourceMetadata::new("tags").with_attributes(["label"]))
}

/// Three articles, three comments, three people.
///
/// | source      | relationship | targets                 |
/// |-------------|--------------|-------------------------|
/// | articles/1  | author       | people/9                |
/// | articles/1  | comments     | comments/5, comments/6  |
/// | articles/1  | tags         | tags/rust               |
/// | articles/1  | editor       | people/10               |
/// | articles/2  | author       | people/9                |
/// | articles/2  | comments     | comments/7              |
/// | articles/3  | author       | people/10               |
/// | comments/5  | author       | people/10               |
/// | comments/6  | author       | people/9                |
/// | comments/7  | author       | people/11               |
/// | people/9    | profile      | profiles/p9             |
pub const BLOG_DATASET: &str = r#"{"resources": [
    {"type": "articles", "id": "1",
     "attributes": {"title": "Rust", "body": "Ownership", "views": 10},
     "relationships": {
        "author": {"type": "people", "id": "9"},
        "comments": [{"type": "comments", "id": "5"}, {"type": "comments", "id": "6"}],
        "tags": [{"type": "tags", "id": "rust"}],
        "editor": {"type": "people", "id": "10"}}},
    {"type": "articles", "id": "2",
     "attributes": {"title": "Tokio", "body": "Tasks", "views": 30},
     "relationships": {
        "author": {"type": "people", "id": "9"},
        "comments": [{"type": "comments", "id": "7"}]}},
    {"type": "articles", "id": "3",
     "attributes": {"title": "Serde", "body": "Derives", "views": 20},
     "relationships": {"author": {"type": "people", "id": "10"}}},
    {"type": "comments", "id": "5", "attributes": {"body": "First"},
     "relationships": {"author": {"type": "people", "id": "10"},
                       "article": {"type": "articles", "id": "1"}}},
    {"type": "comments", "id": "6", "attributes": {"body": "Second"},
     "relationships": {"author": {"type": "people", "id": "9"},
                       "article": {"type": "articles", "id": "1"}}},
    {"type": "comments", "id": "7", "attributes": {"body": "Third"},
     "relationships": {"author": {"type": "people", "id": "11"},
                       "article": {"type": "articles", "id": "2"}}},
    {"type": "people", "id": "9", "attributes": {"name": "Dan", "email": "dan@example.com"},
     "relationships": {"profile": {"type": "profiles", "id": "p9"}}},
    {"type": "people", "id": "10", "attributes": {"name": "Ana", "email": "ana@example.com"}},
    {"type": "people", "id": "11", "attributes": {"name": "Lee", "email": "lee@example.com"}},
    {"type": "profiles", "id": "p9", "attributes": {"bio": "Rustacean"}},
    {"type": "tags", "id": "rust", "attributes": {"label": "rust"}}
]}"#;

/// Loads the blog dataset.
pub fn blog_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::from_json(BLOG_DATASET).expect("blog dataset should parse"))
}

/// A store with `count` articles numbered from 1, without relationships.
pub fn numbered_articles(count: usize) -> Arc<MemoryStore> {
    let mut store = MemoryStore::new();
    for n in 1..=count {
        store.insert(
            Entity::new("articles", n.to_string())
                .with_attribute("title", format!("Article {}", n))
                .with_attribute("views", n as i64),
        );
    }
    Arc::new(store)
}

/// Builds an engine backed by `store` for both fetch roles.
pub fn engine_with(config: EngineConfig, store: Arc<MemoryStore>) -> DocumentEngine {
    DocumentEngine::new(&config, Arc::new(blog_registry()), store.clone())
        .with_primary_fetcher(store)
}

/// Builds an unlimited test engine over `store`.
pub fn engine(store: Arc<MemoryStore>) -> DocumentEngine {
    engine_with(EngineConfig::for_testing(), store)
}

/// Returns `type/id` for each resource object.
pub fn keys(resources: &[ResourceObject]) -> Vec<String> {
    resources
        .iter()
        .map(|r| format!("{}/{}", r.resource_type, r.id))
        .collect()
}

/// Returns `type/id` for each primary resource of a document.
pub fn data_keys(document: &Document) -> Vec<String> {
    document
        .data
        .resources()
        .into_iter()
        .map(|r| format!("{}/{}", r.resource_type, r.id))
        .collect()
}

/// Relationship fetcher that answers later sources first.
///
/// Every fetch sleeps for a delay that shrinks as the source id grows, so
/// with several sources in flight completion order is the reverse of
/// request order. Run tests using it with paused time.
pub struct ReversingFetcher {
    inner: Arc<MemoryStore>,
}

impl ReversingFetcher {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self { inner }
    }

    fn delay(source: &Entity) -> Duration {
        let rank: u64 = source.id.parse().unwrap_or(0);
        Duration::from_millis(1_000u64.saturating_sub(rank * 10))
    }
}

#[async_trait]
impl RelationshipFetcher for ReversingFetcher {
    async fn fetch_related(
        &self,
        source: &Entity,
        relationship: &RelationshipDef,
    ) -> Result<Related, FetchError> {
        tokio::time::sleep(Self::delay(source)).await;
        self.inner.fetch_related(source, relationship).await
    }
}

/// Relationship fetcher that always fails.
pub struct FailingFetcher;

#[async_trait]
impl RelationshipFetcher for FailingFetcher {
    async fn fetch_related(
        &self,
        _source: &Entity,
        _relationship: &RelationshipDef,
    ) -> Result<Related, FetchError> {
        Err(FetchError::backend("connection reset"))
    }
}

/// Hook that records its calls into a shared log and tags the document.
pub struct RecordingHook {
    pub name: &'static str,
    pub log: Arc<Mutex<Vec<String>>>,
}

impl RecordingHook {
    pub fn new(name: &'static str, log: Arc<Mutex<Vec<String>>>) -> Arc<Self> {
        Arc::new(Self { name, log })
    }
}

impl DocumentHook for RecordingHook {
    fn on_relationship(
        &self,
        resource: &ResourceIdentifier,
        name: &str,
        linkage: &mut RelationshipLinkage,
    ) {
        linkage
            .meta
            .insert("seen_by".to_string(), Value::from(self.name));
        self.log.lock().unwrap().push(format!(
            "{}:{}/{}.{}",
            self.name, resource.resource_type, resource.id, name
        ));
    }

    fn on_document(&self, links: &mut Links, meta: &mut serde_json::Map<String, Value>) {
        links.insert("describedby", format!("http://docs.example.com/{}", self.name));
        let order = meta
            .entry("hooks")
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(names) = order {
            names.push(Value::from(self.name));
        }
        self.log.lock().unwrap().push(format!("{}:document", self.name));
    }
}
