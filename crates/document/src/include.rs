//! Include graph resolution.
//!
//! Include paths are walked in client order, segment by segment. For one
//! segment the relationship of every source entity is fetched concurrently
//! (bounded by a semaphore), but results are merged by a single reducer in
//! source order. Discovery order, and therefore the order of `included`, is
//! the same whatever order fetches complete in.
//!
//! The included-count limit is re-checked after every merged result. On a
//! violation the reducer returns early and dropping the [`JoinSet`] aborts
//! the fetches still in flight.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tessera_query::LimitsEnforcer;
use tessera_query::types::{RelationshipDef, ResolvedSegment};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

use crate::entity::{Entity, IdentityKey};
use crate::error::{DocumentResult, FetchError};
use crate::fetch::{DynRelationshipFetcher, Related};

/// `(source entity, relationship name)`.
pub(crate) type FetchKey = (IdentityKey, String);

/// Request-scoped state of one assembly.
#[derive(Debug, Default)]
pub(crate) struct WorkingSet {
    primary: HashSet<IdentityKey>,
    seen: HashSet<IdentityKey>,
    /// Included entities in first-discovery order.
    pub(crate) included: Vec<Entity>,
    /// Fetch results for this request.
    pub(crate) memo: HashMap<FetchKey, Related>,
    /// Relationships walked while resolving includes.
    pub(crate) traversed: HashSet<FetchKey>,
}

impl WorkingSet {
    pub(crate) fn new(primary: &[Entity]) -> Self {
        Self {
            primary: primary.iter().map(Entity::identity).collect(),
            ..Default::default()
        }
    }

    /// Adds an entity to `included` unless it is primary or already present.
    fn discover(&mut self, entity: &Entity) {
        let key = entity.identity();
        if !self.primary.contains(&key) && self.seen.insert(key) {
            self.included.push(entity.clone());
        }
    }
}

/// One pending fetch: slot index, source and relationship.
type PendingFetch = (usize, Entity, RelationshipDef);

/// Walks include paths through a relationship fetcher.
pub(crate) struct IncludeResolver<'a> {
    fetcher: &'a DynRelationshipFetcher,
    limits: &'a LimitsEnforcer,
    concurrency: usize,
}

impl<'a> IncludeResolver<'a> {
    pub(crate) fn new(
        fetcher: &'a DynRelationshipFetcher,
        limits: &'a LimitsEnforcer,
        concurrency: usize,
    ) -> Self {
        Self {
            fetcher,
            limits,
            concurrency: concurrency.max(1),
        }
    }

    /// Resolves every path starting from the primary entities.
    pub(crate) async fn resolve(
        &self,
        primary: &[Entity],
        paths: &[Vec<ResolvedSegment>],
        ws: &mut WorkingSet,
    ) -> DocumentResult<()> {
        for path in paths {
            let mut sources = primary.to_vec();
            for segment in path {
                if sources.is_empty() {
                    break;
                }
                sources = self.walk_segment(sources, &segment.relationship, ws).await?;
                debug!(
                    relationship = %segment.relationship.name,
                    source_type = %segment.source_type,
                    reached = sources.len(),
                    included = ws.included.len(),
                    "Include segment resolved"
                );
            }
        }
        Ok(())
    }

    /// Follows one relationship from every source; returns the reached entities.
    async fn walk_segment(
        &self,
        sources: Vec<Entity>,
        relationship: &RelationshipDef,
        ws: &mut WorkingSet,
    ) -> DocumentResult<Vec<Entity>> {
        let mut unique = HashSet::new();
        let sources: Vec<Entity> = sources
            .into_iter()
            .filter(|s| unique.insert(s.identity()))
            .collect();

        let mut slots = Vec::with_capacity(sources.len());
        let mut pending = Vec::new();
        for (index, source) in sources.iter().enumerate() {
            let key = (source.identity(), relationship.name.clone());
            match ws.memo.get(&key) {
                Some(related) => slots.push(Some(related.clone())),
                None => {
                    slots.push(None);
                    pending.push((index, source.clone(), relationship.clone()));
                }
            }
        }

        let mut reached = Vec::new();
        let mut reached_keys = HashSet::new();
        let limits = self.limits;

        self.fetch_ordered(slots, pending, |index, related| {
            let key = (sources[index].identity(), relationship.name.clone());
            for target in related.entities() {
                if reached_keys.insert(target.identity()) {
                    reached.push(target.clone());
                }
                ws.discover(target);
            }
            ws.traversed.insert(key.clone());
            ws.memo.entry(key).or_insert(related);

            limits.assert_included_count(&relationship.target_type, ws.included.len() as u64)?;
            Ok(())
        })
        .await?;

        Ok(reached)
    }

    /// Fetches relationship content needed for linkage only.
    ///
    /// Results go into the memo; nothing is added to `included`.
    pub(crate) async fn fetch_linkage(
        &self,
        requests: Vec<(Entity, RelationshipDef)>,
        ws: &mut WorkingSet,
    ) -> DocumentResult<()> {
        let mut keys = Vec::new();
        let mut pending = Vec::new();
        for (source, relationship) in requests {
            let key = (source.identity(), relationship.name.clone());
            if ws.memo.contains_key(&key) || keys.contains(&key) {
                continue;
            }
            pending.push((keys.len(), source, relationship));
            keys.push(key);
        }
        if pending.is_empty() {
            return Ok(());
        }

        let slots = vec![None; keys.len()];
        self.fetch_ordered(slots, pending, |index, related| {
            ws.memo.insert(keys[index].clone(), related);
            Ok(())
        })
        .await
    }

    /// Runs the pending fetches concurrently and hands every slot to `reduce`
    /// in index order. Pre-filled slots are reduced without fetching.
    async fn fetch_ordered<F>(
        &self,
        mut slots: Vec<Option<Related>>,
        pending: Vec<PendingFetch>,
        mut reduce: F,
    ) -> DocumentResult<()>
    where
        F: FnMut(usize, Related) -> DocumentResult<()>,
    {
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks: JoinSet<(usize, Result<Related, FetchError>)> = JoinSet::new();

        for (index, source, relationship) in pending {
            let fetcher = Arc::clone(self.fetcher);
            let permits = Arc::clone(&permits);
            tasks.spawn(async move {
                let result = match permits.acquire_owned().await {
                    Ok(_permit) => fetcher.fetch_related(&source, &relationship).await,
                    Err(_) => Err(FetchError::backend("fetch semaphore closed")),
                };
                (index, result)
            });
        }

        let mut cursor = 0;
        while cursor < slots.len() {
            if let Some(related) = slots[cursor].take() {
                reduce(cursor, related)?;
                cursor += 1;
                continue;
            }

            match tasks.join_next().await {
                Some(Ok((index, result))) => slots[index] = Some(result?),
                Some(Err(e)) => {
                    return Err(FetchError::backend(format!("fetch task failed: {}", e)).into());
                }
                None => return Err(FetchError::backend("fetch task missing").into()),
            }
        }

        Ok(())
    }
}
