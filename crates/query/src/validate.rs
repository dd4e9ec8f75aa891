//! Criteria validation against resource metadata.

use tracing::debug;

use crate::error::{QueryError, QueryResult};
use crate::filter::validate_filter;
use crate::types::{Criteria, IncludePath, MetadataLookup};

/// Validates everything in `criteria` that depends on metadata.
///
/// Checks, in order: the resource type exists, every include path resolves,
/// every sparse fieldset names a known type, every sort field is sortable,
/// and the filter passes the whitelist. Nothing here touches storage.
pub fn validate_criteria(
    lookup: &dyn MetadataLookup,
    resource_type: &str,
    criteria: &Criteria,
) -> QueryResult<()> {
    let metadata =
        lookup
            .get_by_type(resource_type)
            .ok_or_else(|| QueryError::UnknownResourceType {
                resource_type: resource_type.to_string(),
            })?;

    for raw in &criteria.include {
        IncludePath::parse(raw)?.resolve(lookup, resource_type)?;
    }

    for fieldset_type in criteria.fields.keys() {
        if !lookup.has_type(fieldset_type) {
            return Err(QueryError::UnknownFieldsetType {
                resource_type: fieldset_type.clone(),
            });
        }
    }

    for sort in &criteria.sort {
        if !metadata.sortable.contains(&sort.field) {
            return Err(QueryError::SortNotAllowed {
                resource_type: resource_type.to_string(),
                field: sort.field.clone(),
            });
        }
    }

    if let Some(filter) = &criteria.filter {
        validate_filter(lookup, resource_type, filter)?;
    }

    debug!(resource_type = %resource_type, "Criteria validated");
    Ok(())
}
