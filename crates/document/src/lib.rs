//! # tessera-document - Compound Document Assembly
//!
//! Turns primary entities and a validated [`Criteria`] into a compound
//! document: primary data, an `included` list built by walking include
//! paths, sparse fieldsets, relationship linkage and pagination links.
//!
//! ## Features
//!
//! - **Include graphs**: dot-separated paths walked segment by segment,
//!   deduplicated by `(type, id)` and ordered by first discovery
//! - **Bounded concurrency**: fetches for one segment run in parallel and are
//!   merged in source order
//! - **Fail-fast limits**: static limits before any fetch, the included-count
//!   limit after every merged fetch
//! - **Linkage policies**: `Reference`, `Always` and `WhenIncluded`
//! - **Pagination links**: the request's query re-serialised with only
//!   `page[number]` changed
//! - **Hooks**: editable top-level `links`/`meta` and relationship payloads
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use tessera_document::{DocumentEngine, EngineConfig, MemoryStore};
//! use tessera_query::types::{MetadataRegistry, RelationshipDef, ResourceMetadata};
//!
//! # tokio_test_block(async {
//! let registry = MetadataRegistry::new()
//!     .with_type(
//!         ResourceMetadata::new("articles")
//!             .with_attributes(["title"])
//!             .with_relationship(RelationshipDef::to_one("author", "people")),
//!     )
//!     .with_type(ResourceMetadata::new("people").with_attributes(["name"]));
//!
//! let store = Arc::new(MemoryStore::from_json(r#"{"resources": [
//!     {"type": "articles", "id": "1", "attributes": {"title": "Hello"},
//!      "relationships": {"author": {"type": "people", "id": "9"}}},
//!     {"type": "people", "id": "9", "attributes": {"name": "Dan"}}
//! ]}"#).unwrap());
//!
//! let engine = DocumentEngine::new(&EngineConfig::default(), Arc::new(registry), store.clone())
//!     .with_primary_fetcher(store);
//!
//! let document = engine.serve_query("articles", "include=author").await.unwrap();
//! assert_eq!(document.included().len(), 1);
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```
//!
//! ## Configuration
//!
//! See [`EngineConfig`] for the `TESSERA_*` environment variables.

#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod entity;
pub mod error;
pub mod fetch;
pub mod hooks;
mod include;
pub mod linkage;
pub mod links;
pub mod memory;
pub mod model;
pub mod projection;

pub use config::EngineConfig;
pub use engine::DocumentEngine;
pub use entity::{Entity, IdentityKey};
pub use error::{DocumentError, DocumentResult, FetchError};
pub use fetch::{
    CollectionPage, DynPrimaryFetcher, DynRelationshipFetcher, PrimaryFetcher, Related,
    RelationshipFetcher,
};
pub use hooks::{DocumentHook, HookRegistry};
pub use links::{LinkBuilder, PaginationInfo};
pub use memory::MemoryStore;
pub use model::{
    Document, Links, PrimaryData, RelationshipData, RelationshipLinkage, ResourceIdentifier,
    ResourceObject,
};

pub use tessera_query::Criteria;

/// Assembles a collection document with `engine`.
///
/// Shorthand for [`DocumentEngine::build_collection`].
pub async fn build_collection_document(
    engine: &DocumentEngine,
    resource_type: &str,
    items: Vec<Entity>,
    criteria: &Criteria,
    pagination: PaginationInfo,
) -> DocumentResult<Document> {
    engine
        .build_collection(resource_type, items, criteria, pagination)
        .await
}

/// Assembles a single-resource document with `engine`.
///
/// Shorthand for [`DocumentEngine::build_resource`].
pub async fn build_resource_document(
    engine: &DocumentEngine,
    resource_type: &str,
    item: Entity,
    criteria: &Criteria,
) -> DocumentResult<Document> {
    engine.build_resource(resource_type, item, criteria).await
}

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
