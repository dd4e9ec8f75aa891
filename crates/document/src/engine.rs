//! Document assembly engine.
//!
//! [`DocumentEngine::build_collection`] and [`DocumentEngine::build_resource`]
//! assemble a document from primary entities the host already loaded.
//! [`DocumentEngine::serve_collection`] and [`DocumentEngine::serve_resource`]
//! run the whole request: validation, limits, primary fetch, assembly.
//!
//! Assembly steps:
//!
//! 1. Resolve every include path against metadata (no fetch yet)
//! 2. Walk the include graph, deduplicating by `(type, id)`
//! 3. Fetch identifiers for `Always` relationships not yet known
//! 4. Project primary and included entities into resource objects
//! 5. Build top-level links and run hooks

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use tessera_query::types::{
    IncludePath, LinkingPolicy, MetadataLookup, RelationshipDef, ResolvedSegment,
    ResourceMetadata,
};
use tessera_query::{Criteria, LimitsEnforcer, QueryError, validate_criteria};
use tracing::{debug, instrument};

use crate::config::EngineConfig;
use crate::entity::Entity;
use crate::error::{DocumentResult, FetchError};
use crate::fetch::{DynPrimaryFetcher, DynRelationshipFetcher};
use crate::hooks::{DocumentHook, HookRegistry};
use crate::include::{IncludeResolver, WorkingSet};
use crate::linkage::build_linkage;
use crate::links::{LinkBuilder, PaginationInfo};
use crate::model::{Document, Links, PrimaryData, ResourceObject};
use crate::projection::{project_attributes, visible_relationships};

/// Assembles compound documents.
pub struct DocumentEngine {
    metadata: Arc<dyn MetadataLookup>,
    relationships: DynRelationshipFetcher,
    primary: Option<DynPrimaryFetcher>,
    limits: LimitsEnforcer,
    links: LinkBuilder,
    hooks: HookRegistry,
    fetch_concurrency: usize,
    default_page_size: u32,
}

impl DocumentEngine {
    /// Creates an engine.
    pub fn new(
        config: &EngineConfig,
        metadata: Arc<dyn MetadataLookup>,
        relationships: DynRelationshipFetcher,
    ) -> Self {
        Self {
            metadata,
            relationships,
            primary: None,
            limits: LimitsEnforcer::new(config.limits()),
            links: LinkBuilder::new(&config.base_url),
            hooks: HookRegistry::new(),
            fetch_concurrency: config.fetch_concurrency,
            default_page_size: config.default_page_size,
        }
    }

    /// Sets the primary data fetcher used by the `serve_*` methods.
    pub fn with_primary_fetcher(mut self, primary: DynPrimaryFetcher) -> Self {
        self.primary = Some(primary);
        self
    }

    /// Appends a hook.
    pub fn with_hook(mut self, hook: Arc<dyn DocumentHook>) -> Self {
        self.hooks.register(hook);
        self
    }

    /// Returns the limits enforcer.
    pub fn limits(&self) -> &LimitsEnforcer {
        &self.limits
    }

    /// Returns the metadata lookup.
    pub fn metadata(&self) -> &dyn MetadataLookup {
        self.metadata.as_ref()
    }

    /// Returns the default page size.
    pub fn default_page_size(&self) -> u32 {
        self.default_page_size
    }

    /// Assembles a collection document from one page of primary entities.
    #[instrument(skip(self, items, criteria), fields(resource_type = %resource_type, items = items.len()))]
    pub async fn build_collection(
        &self,
        resource_type: &str,
        items: Vec<Entity>,
        criteria: &Criteria,
        pagination: PaginationInfo,
    ) -> DocumentResult<Document> {
        let (data, included) = self.assemble(resource_type, &items, criteria).await?;

        let mut links = self.links.pagination(resource_type, criteria, pagination);
        let mut meta = Map::new();
        meta.insert("total".to_string(), Value::from(pagination.total));
        self.hooks.apply_document(&mut links, &mut meta);

        Ok(Document {
            data: PrimaryData::Collection(data),
            included,
            links,
            meta,
        })
    }

    /// Assembles a single-resource document.
    #[instrument(skip(self, item, criteria), fields(resource_type = %resource_type, id = %item.id))]
    pub async fn build_resource(
        &self,
        resource_type: &str,
        item: Entity,
        criteria: &Criteria,
    ) -> DocumentResult<Document> {
        let id = item.id.clone();
        let (mut data, included) = self
            .assemble(resource_type, std::slice::from_ref(&item), criteria)
            .await?;
        let resource = data.pop().ok_or_else(|| FetchError::NotFound {
            resource_type: resource_type.to_string(),
            id: id.clone(),
        })?;

        let mut links = self.links.resource_document(resource_type, &id, criteria);
        let mut meta = Map::new();
        self.hooks.apply_document(&mut links, &mut meta);

        Ok(Document {
            data: PrimaryData::Single(Box::new(resource)),
            included,
            links,
            meta,
        })
    }

    /// Validates, enforces limits, loads a page and assembles it.
    #[instrument(skip(self, criteria), fields(resource_type = %resource_type))]
    pub async fn serve_collection(
        &self,
        resource_type: &str,
        criteria: &Criteria,
    ) -> DocumentResult<Document> {
        self.admit(resource_type, criteria)?;

        let page = self
            .primary_fetcher()?
            .fetch_collection(resource_type, criteria)
            .await?;
        debug!(
            fetched = page.items.len(),
            total = page.total,
            "Primary collection fetched"
        );

        self.build_collection(
            resource_type,
            page.items,
            criteria,
            PaginationInfo::new(page.total),
        )
        .await
    }

    /// Validates, enforces limits, loads one resource and assembles it.
    #[instrument(skip(self, criteria), fields(resource_type = %resource_type, id = %id))]
    pub async fn serve_resource(
        &self,
        resource_type: &str,
        id: &str,
        criteria: &Criteria,
    ) -> DocumentResult<Document> {
        self.admit(resource_type, criteria)?;

        let item = self.primary_fetcher()?.fetch_one(resource_type, id).await?;
        self.build_resource(resource_type, item, criteria).await
    }

    /// Decodes a query string and serves the collection it asks for.
    pub async fn serve_query(&self, resource_type: &str, query: &str) -> DocumentResult<Document> {
        let criteria = Criteria::from_query(query, self.default_page_size)?;
        self.serve_collection(resource_type, &criteria).await
    }

    /// Checks everything that can be checked before touching storage.
    fn admit(&self, resource_type: &str, criteria: &Criteria) -> DocumentResult<()> {
        validate_criteria(self.metadata.as_ref(), resource_type, criteria)?;
        self.limits.enforce(resource_type, criteria)?;
        debug!("Request admitted");
        Ok(())
    }

    fn primary_fetcher(&self) -> DocumentResult<&DynPrimaryFetcher> {
        self.primary
            .as_ref()
            .ok_or_else(|| FetchError::backend("no primary fetcher configured").into())
    }

    /// Resolves every include path before any fetch happens.
    fn resolve_paths(
        &self,
        resource_type: &str,
        criteria: &Criteria,
    ) -> DocumentResult<Vec<Vec<ResolvedSegment>>> {
        if !self.metadata.has_type(resource_type) {
            return Err(QueryError::UnknownResourceType {
                resource_type: resource_type.to_string(),
            }
            .into());
        }

        let mut paths = Vec::with_capacity(criteria.include.len());
        for raw in &criteria.include {
            let path = IncludePath::parse(raw)?;
            paths.push(path.resolve(self.metadata.as_ref(), resource_type)?);
        }
        Ok(paths)
    }

    /// Runs include resolution and projection. Returns primary objects and,
    /// when includes were requested, included objects.
    async fn assemble(
        &self,
        resource_type: &str,
        items: &[Entity],
        criteria: &Criteria,
    ) -> DocumentResult<(Vec<ResourceObject>, Option<Vec<ResourceObject>>)> {
        let paths = self.resolve_paths(resource_type, criteria)?;
        let resolver =
            IncludeResolver::new(&self.relationships, &self.limits, self.fetch_concurrency);

        let mut ws = WorkingSet::new(items);
        resolver.resolve(items, &paths, &mut ws).await?;
        let included_entities = std::mem::take(&mut ws.included);

        let always = self.always_linkage_requests(items, &included_entities, criteria)?;
        resolver.fetch_linkage(always, &mut ws).await?;

        let data = items
            .iter()
            .map(|entity| self.to_resource_object(entity, criteria, &ws))
            .collect::<DocumentResult<Vec<_>>>()?;

        let included = if criteria.has_includes() {
            Some(
                included_entities
                    .iter()
                    .map(|entity| self.to_resource_object(entity, criteria, &ws))
                    .collect::<DocumentResult<Vec<_>>>()?,
            )
        } else {
            None
        };

        debug!(
            primary = data.len(),
            included = included.as_ref().map_or(0, Vec::len),
            "Document assembled"
        );
        Ok((data, included))
    }

    /// Lists the `Always` relationships whose identifiers must be fetched.
    fn always_linkage_requests(
        &self,
        primary: &[Entity],
        included: &[Entity],
        criteria: &Criteria,
    ) -> DocumentResult<Vec<(Entity, RelationshipDef)>> {
        let mut requests = Vec::new();
        for entity in primary.iter().chain(included) {
            let metadata = self.metadata_for(&entity.resource_type)?;
            let fieldset = criteria.fieldset(&entity.resource_type);
            for relationship in visible_relationships(metadata, fieldset) {
                if relationship.linking == LinkingPolicy::Always {
                    requests.push((entity.clone(), relationship.clone()));
                }
            }
        }
        Ok(requests)
    }

    fn to_resource_object(
        &self,
        entity: &Entity,
        criteria: &Criteria,
        ws: &WorkingSet,
    ) -> DocumentResult<ResourceObject> {
        let metadata = self.metadata_for(&entity.resource_type)?;
        let fieldset = criteria.fieldset(&entity.resource_type);
        let identifier = entity.identifier();

        let mut relationships = BTreeMap::new();
        for relationship in visible_relationships(metadata, fieldset) {
            let key = (entity.identity(), relationship.name.clone());
            let mut linkage = build_linkage(
                &self.links,
                entity,
                relationship,
                ws.memo.get(&key),
                ws.traversed.contains(&key),
            );
            self.hooks
                .apply_relationship(&identifier, &relationship.name, &mut linkage);
            relationships.insert(relationship.name.clone(), linkage);
        }

        Ok(ResourceObject {
            resource_type: entity.resource_type.clone(),
            id: entity.id.clone(),
            attributes: project_attributes(metadata, entity, fieldset),
            relationships,
            links: Links::self_only(self.links.resource(&entity.resource_type, &entity.id)),
        })
    }

    fn metadata_for(&self, resource_type: &str) -> DocumentResult<&ResourceMetadata> {
        self.metadata.get_by_type(resource_type).ok_or_else(|| {
            QueryError::UnknownResourceType {
                resource_type: resource_type.to_string(),
            }
            .into()
        })
    }
}

impl std::fmt::Debug for DocumentEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentEngine")
            .field("limits", &self.limits)
            .field("links", &self.links)
            .field("hooks", &self.hooks)
            .field("fetch_concurrency", &self.fetch_concurrency)
            .field("has_primary_fetcher", &self.primary.is_some())
            .finish()
    }
}
