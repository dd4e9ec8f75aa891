//! In-memory fetch collaborator.
//!
//! [`MemoryStore`] implements both [`RelationshipFetcher`] and
//! [`PrimaryFetcher`] over a fixed set of entities. It is meant for tests,
//! demos and the command-line tool, not for production data.
//!
//! # Dataset format
//!
//! ```json
//! {
//!   "resources": [
//!     {
//!       "type": "articles",
//!       "id": "1",
//!       "attributes": {"title": "Hello"},
//!       "relationships": {
//!         "author": {"type": "people", "id": "9"},
//!         "comments": [{"type": "comments", "id": "5"}]
//!       }
//!     }
//!   ]
//! }
//! ```
//!
//! Collection fetches evaluate filters against attribute values (and `id`),
//! sort by attribute, and page with the requested page number and size.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tessera_query::types::{Cardinality, RelationshipDef};
use tessera_query::{Criteria, FilterNode, FilterOperator, Scalar};

use crate::entity::{Entity, IdentityKey};
use crate::error::FetchError;
use crate::fetch::{CollectionPage, PrimaryFetcher, Related, RelationshipFetcher};

#[derive(Debug, Deserialize)]
struct Dataset {
    #[serde(default)]
    resources: Vec<DatasetRecord>,
}

#[derive(Debug, Deserialize)]
struct DatasetRecord {
    #[serde(rename = "type")]
    resource_type: String,
    id: String,
    #[serde(default)]
    attributes: Map<String, Value>,
    #[serde(default)]
    relationships: HashMap<String, DatasetReference>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DatasetReference {
    Many(Vec<DatasetIdentifier>),
    One(Option<DatasetIdentifier>),
}

#[derive(Debug, Deserialize)]
struct DatasetIdentifier {
    #[serde(rename = "type")]
    resource_type: String,
    id: String,
}

impl From<DatasetIdentifier> for IdentityKey {
    fn from(id: DatasetIdentifier) -> Self {
        IdentityKey::new(id.resource_type, id.id)
    }
}

/// In-memory store of entities and their relationships.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entities: HashMap<IdentityKey, Entity>,
    order: Vec<IdentityKey>,
    references: HashMap<(IdentityKey, String), Vec<IdentityKey>>,
    fetches: AtomicUsize,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a store from its JSON dataset form.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let dataset: Dataset = serde_json::from_str(json)?;
        let mut store = MemoryStore::new();

        for record in dataset.resources {
            let key = IdentityKey::new(&record.resource_type, &record.id);
            for (name, reference) in record.relationships {
                let targets = match reference {
                    DatasetReference::One(target) => target.into_iter().map(Into::into).collect(),
                    DatasetReference::Many(targets) => targets.into_iter().map(Into::into).collect(),
                };
                store.references.insert((key.clone(), name), targets);
            }
            store.insert(Entity {
                resource_type: record.resource_type,
                id: record.id,
                attributes: record.attributes,
            });
        }

        Ok(store)
    }

    /// Inserts or replaces an entity.
    pub fn insert(&mut self, entity: Entity) {
        let key = entity.identity();
        if self.entities.insert(key.clone(), entity).is_none() {
            self.order.push(key);
        }
    }

    /// Adds an entity and returns the store.
    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.insert(entity);
        self
    }

    /// Points a to-one relationship of `source` at `target`.
    pub fn with_to_one(
        mut self,
        source: IdentityKey,
        relationship: impl Into<String>,
        target: Option<IdentityKey>,
    ) -> Self {
        self.references
            .insert((source, relationship.into()), target.into_iter().collect());
        self
    }

    /// Points a to-many relationship of `source` at `targets`.
    pub fn with_to_many(
        mut self,
        source: IdentityKey,
        relationship: impl Into<String>,
        targets: Vec<IdentityKey>,
    ) -> Self {
        self.references
            .insert((source, relationship.into()), targets);
        self
    }

    /// Returns the number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if the store holds no entity.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Returns how many relationship fetches have been served.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(AtomicOrdering::SeqCst)
    }

    fn lookup(&self, key: &IdentityKey) -> Result<Entity, FetchError> {
        self.entities
            .get(key)
            .cloned()
            .ok_or_else(|| FetchError::NotFound {
                resource_type: key.resource_type.clone(),
                id: key.id.clone(),
            })
    }
}

#[async_trait]
impl RelationshipFetcher for MemoryStore {
    async fn fetch_related(
        &self,
        source: &Entity,
        relationship: &RelationshipDef,
    ) -> Result<Related, FetchError> {
        self.fetches.fetch_add(1, AtomicOrdering::SeqCst);

        let key = (source.identity(), relationship.name.clone());
        let entities = self
            .references
            .get(&key)
            .map(|targets| {
                targets
                    .iter()
                    .map(|t| self.lookup(t))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();

        Ok(match relationship.cardinality {
            Cardinality::ToOne => Related::ToOne(entities.into_iter().next()),
            Cardinality::ToMany => Related::ToMany(entities),
        })
    }
}

#[async_trait]
impl PrimaryFetcher for MemoryStore {
    async fn fetch_collection(
        &self,
        resource_type: &str,
        criteria: &Criteria,
    ) -> Result<CollectionPage, FetchError> {
        let mut matching: Vec<&Entity> = self
            .order
            .iter()
            .filter_map(|key| self.entities.get(key))
            .filter(|e| e.resource_type == resource_type)
            .filter(|e| criteria.filter.as_ref().is_none_or(|f| matches(f, e)))
            .collect();

        if !criteria.sort.is_empty() {
            matching.sort_by(|a, b| {
                for sort in &criteria.sort {
                    let order = compare_values(field_value(a, &sort.field), field_value(b, &sort.field));
                    let order = if sort.descending { order.reverse() } else { order };
                    if order != Ordering::Equal {
                        return order;
                    }
                }
                Ordering::Equal
            });
        }

        let total = matching.len() as u64;
        let offset = usize::try_from(criteria.pagination.offset()).unwrap_or(usize::MAX);
        let items = matching
            .into_iter()
            .skip(offset)
            .take(criteria.pagination.size as usize)
            .cloned()
            .collect();

        Ok(CollectionPage { items, total })
    }

    async fn fetch_one(&self, resource_type: &str, id: &str) -> Result<Entity, FetchError> {
        self.lookup(&IdentityKey::new(resource_type, id))
    }
}

/// Returns the value of a field; `id` is addressable like an attribute.
fn field_value(entity: &Entity, field: &str) -> Option<Value> {
    if field == "id" {
        return Some(Value::String(entity.id.clone()));
    }
    entity.attributes.get(field).cloned()
}

fn matches(node: &FilterNode, entity: &Entity) -> bool {
    match node {
        FilterNode::Comparison {
            field,
            operator,
            values,
        } => evaluate(field_value(entity, field).as_ref(), *operator, values),
        FilterNode::Conjunction { children } => children.iter().all(|c| matches(c, entity)),
        FilterNode::Disjunction { children } => children.iter().any(|c| matches(c, entity)),
    }
}

fn evaluate(actual: Option<&Value>, operator: FilterOperator, values: &[Scalar]) -> bool {
    let is_null = actual.is_none_or(Value::is_null);
    let first = values.first();
    let ordering = |expected: Option<&Scalar>| match (actual, expected) {
        (Some(a), Some(e)) => compare_scalar(a, e),
        _ => None,
    };

    match operator {
        FilterOperator::IsNull => is_null,
        FilterOperator::NotNull => !is_null,
        FilterOperator::Eq => ordering(first) == Some(Ordering::Equal),
        FilterOperator::Neq => ordering(first) != Some(Ordering::Equal),
        FilterOperator::Lt => ordering(first) == Some(Ordering::Less),
        FilterOperator::Lte => matches!(ordering(first), Some(Ordering::Less | Ordering::Equal)),
        FilterOperator::Gt => ordering(first) == Some(Ordering::Greater),
        FilterOperator::Gte => {
            matches!(ordering(first), Some(Ordering::Greater | Ordering::Equal))
        }
        FilterOperator::In => values
            .iter()
            .any(|v| ordering(Some(v)) == Some(Ordering::Equal)),
        FilterOperator::Nin => !values
            .iter()
            .any(|v| ordering(Some(v)) == Some(Ordering::Equal)),
        FilterOperator::Between => {
            matches!(ordering(values.first()), Some(Ordering::Greater | Ordering::Equal))
                && matches!(ordering(values.get(1)), Some(Ordering::Less | Ordering::Equal))
        }
        FilterOperator::Like => match (actual, first) {
            (Some(Value::String(text)), Some(Scalar::String(pattern))) => like(text, pattern),
            _ => false,
        },
    }
}

/// Orders an attribute value against a filter operand.
///
/// Strings compare against the textual form of numbers and booleans, so
/// `filter[id]=1` matches id `"1"`.
fn compare_scalar(actual: &Value, expected: &Scalar) -> Option<Ordering> {
    match (actual, expected) {
        (Value::Null, Scalar::Null) => Some(Ordering::Equal),
        (Value::Bool(a), Scalar::Bool(b)) => Some(a.cmp(b)),
        (Value::Number(a), Scalar::Integer(b)) => a.as_f64()?.partial_cmp(&(*b as f64)),
        (Value::Number(a), Scalar::Float(b)) => a.as_f64()?.partial_cmp(b),
        (Value::String(a), Scalar::String(b)) => Some(a.as_str().cmp(b.as_str())),
        (Value::String(a), Scalar::Integer(b)) => Some(a.cmp(&b.to_string())),
        (Value::String(a), Scalar::Float(b)) => Some(a.cmp(&b.to_string())),
        (Value::String(a), Scalar::Bool(b)) => Some(a.cmp(&b.to_string())),
        _ => None,
    }
}

/// Orders two attribute values for sorting; missing values sort first.
fn compare_values(a: Option<Value>, b: Option<Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(&b),
        (Some(Value::Bool(a)), Some(Value::Bool(b))) => a.cmp(&b),
        _ => Ordering::Equal,
    }
}

/// SQL-style `LIKE`: `%` matches any run of characters, `_` exactly one.
fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    // dp[j]: pattern[..i] matches text[..j]
    let mut dp = vec![false; text.len() + 1];
    dp[0] = true;
    for p in &pattern {
        let mut next = vec![false; text.len() + 1];
        match p {
            '%' => {
                let mut any = false;
                for j in 0..=text.len() {
                    any |= dp[j];
                    next[j] = any;
                }
            }
            '_' => {
                for j in 1..=text.len() {
                    next[j] = dp[j - 1];
                }
            }
            c => {
                for j in 1..=text.len() {
                    next[j] = dp[j - 1] && text[j - 1] == *c;
                }
            }
        }
        dp = next;
    }
    dp[text.len()]
}
