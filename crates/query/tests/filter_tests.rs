//! Filter parsing and whitelist integration tests.
//!
//! Covers:
//! - Whitelist soundness for arbitrarily nested trees (property based)
//! - Serialise/parse round trips
//! - Query-string decoding through to validation

mod common;

use proptest::prelude::*;
use serde_json::json;
use tessera_query::filter::{FilterNode, FilterOperator, FilterParser, Scalar, validate_filter};
use tessera_query::{Criteria, QueryError, WhitelistError, parse_filter, validate_criteria};

use common::{blog_registry, is_allowed};

const FIELD_POOL: &[&str] = &["title", "views", "status", "password", "secret"];

fn scalar_strategy() -> impl Strategy<Value = Scalar> {
    prop_oneof![
        Just(Scalar::Null),
        any::<bool>().prop_map(Scalar::Bool),
        any::<i64>().prop_map(Scalar::Integer),
        "[a-z%]{0,8}".prop_map(Scalar::String),
    ]
}

fn comparison_strategy() -> impl Strategy<Value = FilterNode> {
    (
        prop::sample::select(FIELD_POOL),
        prop::sample::select(FilterOperator::ALL.to_vec()),
        prop::collection::vec(scalar_strategy(), 2..5),
    )
        .prop_map(|(field, operator, mut values)| {
            if operator == FilterOperator::Between {
                values.truncate(2);
            } else if !operator.takes_list() {
                values.truncate(1);
            }
            FilterNode::comparison(field, operator, values)
        })
}

fn tree_strategy() -> impl Strategy<Value = FilterNode> {
    comparison_strategy().prop_recursive(6, 48, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(FilterNode::and),
            prop::collection::vec(inner, 0..4).prop_map(FilterNode::or),
        ]
    })
}

fn first_violation(node: &FilterNode) -> Option<(String, FilterOperator)> {
    node.comparisons().into_iter().find_map(|c| match c {
        FilterNode::Comparison {
            field, operator, ..
        } if !is_allowed(field, *operator) => Some((field.clone(), *operator)),
        _ => None,
    })
}

proptest! {
    #[test]
    fn test_whitelist_soundness(tree in tree_strategy()) {
        let registry = blog_registry();
        let result = validate_filter(&registry, "articles", &tree);

        match first_violation(&tree) {
            None => prop_assert!(result.is_ok()),
            Some((field, operator)) => {
                let err = result.unwrap_err();
                let QueryError::Whitelist(violation) = err else {
                    return Err(TestCaseError::fail("expected a whitelist error"));
                };
                match violation {
                    WhitelistError::FieldNotAllowed { field: reported, .. } => {
                        prop_assert_eq!(reported, field);
                    }
                    WhitelistError::OperatorNotAllowed { field: reported, operator: op, .. } => {
                        prop_assert_eq!(reported, field);
                        prop_assert_eq!(op, operator.as_str());
                    }
                }
            }
        }
    }

    #[test]
    fn test_round_trip(tree in tree_strategy()) {
        let reparsed = FilterParser::parse(&tree.to_value()).unwrap();
        prop_assert_eq!(reparsed, tree);
    }

    #[test]
    fn test_validation_is_deterministic(tree in tree_strategy()) {
        let registry = blog_registry();
        prop_assert_eq!(
            validate_filter(&registry, "articles", &tree),
            validate_filter(&registry, "articles", &tree)
        );
    }
}

#[test]
fn test_deeply_hidden_field_rejected() {
    let filter = parse_filter(&json!({
        "and": [
            {"title": {"like": "%rust%"}},
            {"or": [
                {"status": "published"},
                {"and": [{"or": [{"and": [{"password": {"like": "a%"}}]}]}]}
            ]}
        ]
    }))
    .unwrap();

    let err = validate_filter(&blog_registry(), "articles", &filter).unwrap_err();
    assert_eq!(
        err,
        QueryError::Whitelist(WhitelistError::FieldNotAllowed {
            resource_type: "articles".to_string(),
            field: "password".to_string(),
        })
    );
}

#[test]
fn test_parse_error_path() {
    let err = parse_filter(&json!({"or": [{"status": "x"}, {"title": {"regex": ".*"}}]}))
        .unwrap_err();
    assert_eq!(err.path, "filter.or[1].title.regex");
}

#[test]
fn test_multi_operator_field_is_conjunction() {
    let node = parse_filter(&json!({"views": {"gt": 10, "lt": 100}})).unwrap();
    assert_eq!(
        node,
        FilterNode::and(vec![
            FilterNode::comparison("views", FilterOperator::Gt, [10i64]),
            FilterNode::comparison("views", FilterOperator::Lt, [100i64]),
        ])
    );
}

#[test]
fn test_bracket_query_through_validation() {
    let criteria = Criteria::from_query(
        "filter[or][0][title][like]=%25rust%25&filter[or][1][views][between][]=10&filter[or][1][views][between][]=20",
        20,
    )
    .unwrap();

    assert_eq!(
        criteria.filter,
        Some(FilterNode::or(vec![
            FilterNode::comparison("title", FilterOperator::Like, ["%rust%"]),
            FilterNode::comparison("views", FilterOperator::Between, [10i64, 20]),
        ]))
    );
    assert!(validate_criteria(&blog_registry(), "articles", &criteria).is_ok());
}

#[test]
fn test_isnull_needs_explicit_allowance() {
    let criteria = Criteria::from_query("filter[title][isnull]=true", 20).unwrap();
    let err = validate_criteria(&blog_registry(), "articles", &criteria).unwrap_err();
    assert_eq!(err.code(), "operator-not-allowed");
}

#[test]
fn test_deep_bracket_query_is_a_parse_error() {
    let query = format!("filter{}[title][eq]=1", "[and][0]".repeat(5_000));
    let err = Criteria::from_query(&query, 20).unwrap_err();
    assert!(matches!(err, QueryError::Parse(_)));
    assert_eq!(err.status_code(), 400);
}
