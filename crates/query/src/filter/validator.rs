//! Filter whitelist validation.
//!
//! Every comparison anywhere in the tree must name a filterable field and an
//! operator allowed on that field. Combinators are walked unconditionally:
//! a branch that is never visited would let a disallowed leaf through.
//! The walk is depth-first, left to right, and stops at the first violation.

use tracing::debug;

use super::ast::FilterNode;
use crate::error::{QueryError, QueryResult, WhitelistError};
use crate::types::{FilterableFieldSpec, MetadataLookup};

/// Validates a filter tree against an explicit whitelist.
pub fn validate_against(
    spec: &FilterableFieldSpec,
    resource_type: &str,
    node: &FilterNode,
) -> Result<(), WhitelistError> {
    match node {
        FilterNode::Comparison {
            field, operator, ..
        } => {
            let allowed = spec
                .operators(field)
                .ok_or_else(|| WhitelistError::FieldNotAllowed {
                    resource_type: resource_type.to_string(),
                    field: field.clone(),
                })?;
            if !allowed.contains(operator) {
                return Err(WhitelistError::OperatorNotAllowed {
                    resource_type: resource_type.to_string(),
                    field: field.clone(),
                    operator: operator.as_str().to_string(),
                });
            }
            Ok(())
        }
        FilterNode::Conjunction { children } | FilterNode::Disjunction { children } => {
            for child in children {
                validate_against(spec, resource_type, child)?;
            }
            Ok(())
        }
    }
}

/// Validates a filter tree against the whitelist of a registered type.
pub fn validate_filter(
    lookup: &dyn MetadataLookup,
    resource_type: &str,
    node: &FilterNode,
) -> QueryResult<()> {
    let metadata =
        lookup
            .get_by_type(resource_type)
            .ok_or_else(|| QueryError::UnknownResourceType {
                resource_type: resource_type.to_string(),
            })?;

    validate_against(&metadata.filterable, resource_type, node).map_err(|e| {
        debug!(resource_type = %resource_type, error = %e, "Filter rejected by whitelist");
        QueryError::from(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterOperator;

    fn spec() -> FilterableFieldSpec {
        FilterableFieldSpec::new()
            .allow("title", [FilterOperator::Eq, FilterOperator::Like])
            .allow("status", [FilterOperator::Eq])
    }

    #[test]
    fn test_allowed_leaf() {
        let node = FilterNode::comparison("title", FilterOperator::Like, ["%a%"]);
        assert!(validate_against(&spec(), "articles", &node).is_ok());
    }

    #[test]
    fn test_field_not_allowed() {
        let node = FilterNode::eq("password", "x");
        assert_eq!(
            validate_against(&spec(), "articles", &node).unwrap_err(),
            WhitelistError::FieldNotAllowed {
                resource_type: "articles".to_string(),
                field: "password".to_string(),
            }
        );
    }

    #[test]
    fn test_operator_not_allowed() {
        let node = FilterNode::comparison("status", FilterOperator::Like, ["%"]);
        assert_eq!(
            validate_against(&spec(), "articles", &node).unwrap_err(),
            WhitelistError::OperatorNotAllowed {
                resource_type: "articles".to_string(),
                field: "status".to_string(),
                operator: "like".to_string(),
            }
        );
    }

    #[test]
    fn test_disallowed_leaf_hidden_in_nesting() {
        let node = FilterNode::and(vec![
            FilterNode::eq("title", "a"),
            FilterNode::or(vec![
                FilterNode::eq("status", "draft"),
                FilterNode::and(vec![FilterNode::or(vec![FilterNode::eq("secret", 1i64)])]),
            ]),
        ]);
        let err = validate_against(&spec(), "articles", &node).unwrap_err();
        assert!(matches!(err, WhitelistError::FieldNotAllowed { ref field, .. } if field == "secret"));
    }

    #[test]
    fn test_first_violation_left_to_right() {
        let node = FilterNode::or(vec![
            FilterNode::eq("first_bad", 1i64),
            FilterNode::eq("second_bad", 1i64),
        ]);
        let err = validate_against(&spec(), "articles", &node).unwrap_err();
        assert!(
            matches!(err, WhitelistError::FieldNotAllowed { ref field, .. } if field == "first_bad")
        );
    }

    #[test]
    fn test_isnull_is_gated_per_field() {
        let node = FilterNode::comparison("title", FilterOperator::IsNull, [true]);
        assert!(validate_against(&spec(), "articles", &node).is_err());
    }

    #[test]
    fn test_empty_combinators_pass() {
        assert!(validate_against(&spec(), "articles", &FilterNode::and(vec![])).is_ok());
        assert!(validate_against(&spec(), "articles", &FilterNode::or(vec![])).is_ok());
    }
}
