//! Filter parser.
//!
//! Turns the nested key/value structure decoded from a query string (or a
//! JSON body) into a [`FilterNode`] tree.
//!
//! # Grammar
//!
//! ```text
//! filter     = object
//! object     = { entry* }                       ; several entries are ANDed
//! entry      = ("and" | "or") : [ object* ]
//!            | field : scalar                   ; sugar for field eq scalar
//!            | field : { operator : operand+ }  ; several operators are ANDed
//! operand    = scalar | [ scalar* ]             ; lists only for in/nin/between
//! ```
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use tessera_query::filter::{FilterNode, FilterOperator, FilterParser};
//!
//! let node = FilterParser::parse(&json!({
//!     "or": [
//!         {"title": {"like": "%rust%"}},
//!         {"status": "published"}
//!     ]
//! }))
//! .unwrap();
//!
//! assert_eq!(
//!     node,
//!     FilterNode::or(vec![
//!         FilterNode::comparison("title", FilterOperator::Like, ["%rust%"]),
//!         FilterNode::eq("status", "published"),
//!     ])
//! );
//! ```

use serde_json::{Map, Value};

use super::ast::{FilterNode, FilterOperator, Scalar};
use crate::error::ParseError;

/// Default limit on nesting of the raw structure.
pub const DEFAULT_MAX_NESTING: usize = 32;

/// Root path used in error messages.
const ROOT_PATH: &str = "filter";

/// Parser for nested filter structures.
#[derive(Debug, Clone)]
pub struct FilterParser {
    max_nesting: usize,
}

impl Default for FilterParser {
    fn default() -> Self {
        Self {
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }
}

impl FilterParser {
    /// Creates a parser with the default nesting limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum nesting of logical groups.
    pub fn with_max_nesting(mut self, max_nesting: usize) -> Self {
        self.max_nesting = max_nesting;
        self
    }

    /// Parses a filter with default settings.
    pub fn parse(raw: &Value) -> Result<FilterNode, ParseError> {
        Self::default().parse_value(raw)
    }

    /// Parses a filter structure into a tree.
    pub fn parse_value(&self, raw: &Value) -> Result<FilterNode, ParseError> {
        self.parse_object(raw, ROOT_PATH, 0)
    }

    fn parse_object(&self, raw: &Value, path: &str, depth: usize) -> Result<FilterNode, ParseError> {
        if depth > self.max_nesting {
            return Err(ParseError::new(
                path,
                format!("filter nesting exceeds {} levels", self.max_nesting),
            ));
        }

        let obj = raw
            .as_object()
            .ok_or_else(|| ParseError::new(path, "expected an object"))?;

        let mut children = Vec::with_capacity(obj.len());
        for (key, value) in obj {
            children.push(self.parse_entry(key, value, path, depth)?);
        }

        Ok(collapse_and(children))
    }

    fn parse_entry(
        &self,
        key: &str,
        value: &Value,
        path: &str,
        depth: usize,
    ) -> Result<FilterNode, ParseError> {
        let entry_path = format!("{}.{}", path, key);

        match key {
            "and" | "or" => {
                let items = value.as_array().ok_or_else(|| {
                    ParseError::new(&entry_path, format!("'{}' expects a list of filters", key))
                })?;
                let mut children = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let item_path = format!("{}[{}]", entry_path, i);
                    children.push(self.parse_object(item, &item_path, depth + 1)?);
                }
                Ok(if key == "and" {
                    FilterNode::Conjunction { children }
                } else {
                    FilterNode::Disjunction { children }
                })
            }
            "" => Err(ParseError::new(&entry_path, "empty field name")),
            field => match value {
                Value::Object(ops) => self.parse_operators(field, ops, &entry_path),
                Value::Array(_) => Err(ParseError::new(
                    &entry_path,
                    "a list is not a valid equality value; use an explicit operator such as 'in'",
                )),
                scalar => {
                    // Checked above: arrays and objects never reach here.
                    let value = Scalar::from_json(scalar)
                        .ok_or_else(|| ParseError::new(&entry_path, "expected a scalar"))?;
                    Ok(FilterNode::Comparison {
                        field: field.to_string(),
                        operator: FilterOperator::Eq,
                        values: vec![value],
                    })
                }
            },
        }
    }

    fn parse_operators(
        &self,
        field: &str,
        ops: &Map<String, Value>,
        path: &str,
    ) -> Result<FilterNode, ParseError> {
        if ops.is_empty() {
            return Err(ParseError::new(path, "no operator given"));
        }

        let mut comparisons = Vec::with_capacity(ops.len());
        for (name, operand) in ops {
            let op_path = format!("{}.{}", path, name);
            let operator = FilterOperator::parse(name)
                .ok_or_else(|| ParseError::new(&op_path, format!("unknown operator '{}'", name)))?;
            let values = normalize_operand(operator, operand, &op_path)?;
            comparisons.push(FilterNode::Comparison {
                field: field.to_string(),
                operator,
                values,
            });
        }

        Ok(collapse_and(comparisons))
    }
}

/// Coerces an operand into the value list of a comparison.
fn normalize_operand(
    operator: FilterOperator,
    operand: &Value,
    path: &str,
) -> Result<Vec<Scalar>, ParseError> {
    if operator.takes_list() {
        let items = operand.as_array().ok_or_else(|| {
            ParseError::new(path, format!("operator '{}' expects a list", operator))
        })?;
        let mut values = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let value = Scalar::from_json(item).ok_or_else(|| {
                ParseError::new(format!("{}[{}]", path, i), "list items must be scalars")
            })?;
            values.push(value);
        }
        if operator == FilterOperator::Between && values.len() != 2 {
            return Err(ParseError::new(
                path,
                format!("'between' expects exactly 2 bounds, got {}", values.len()),
            ));
        }
        Ok(values)
    } else {
        let value = Scalar::from_json(operand).ok_or_else(|| {
            ParseError::new(path, format!("operator '{}' expects a scalar", operator))
        })?;
        Ok(vec![value])
    }
}

/// A single child stands for itself; several are ANDed.
fn collapse_and(mut children: Vec<FilterNode>) -> FilterNode {
    if children.len() == 1 {
        children.remove(0)
    } else {
        FilterNode::Conjunction { children }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_shorthand_eq() {
        let node = FilterParser::parse(&json!({"title": "Rust"})).unwrap();
        assert_eq!(node, FilterNode::eq("title", "Rust"));
    }

    #[test]
    fn test_parse_explicit_operator() {
        let node = FilterParser::parse(&json!({"views": {"gte": 10}})).unwrap();
        assert_eq!(
            node,
            FilterNode::comparison("views", FilterOperator::Gte, [10i64])
        );
    }

    #[test]
    fn test_parse_in_list() {
        let node = FilterParser::parse(&json!({"id": {"in": ["1", "2"]}})).unwrap();
        assert_eq!(
            node,
            FilterNode::comparison("id", FilterOperator::In, ["1", "2"])
        );
    }

    #[test]
    fn test_parse_in_requires_list() {
        let err = FilterParser::parse(&json!({"id": {"in": "1"}})).unwrap_err();
        assert_eq!(err.path, "filter.id.in");
        assert!(err.reason.contains("expects a list"));
    }

    #[test]
    fn test_parse_between_requires_two_bounds() {
        let err = FilterParser::parse(&json!({"views": {"between": [1, 2, 3]}})).unwrap_err();
        assert_eq!(err.path, "filter.views.between");

        let node = FilterParser::parse(&json!({"views": {"between": [1, 9]}})).unwrap();
        assert_eq!(
            node,
            FilterNode::comparison("views", FilterOperator::Between, [1i64, 9])
        );
    }

    #[test]
    fn test_parse_unknown_operator() {
        let err =
            FilterParser::parse(&json!({"or": [{"a": 1}, {"title": {"regex": ".*"}}]})).unwrap_err();
        assert_eq!(err.path, "filter.or[1].title.regex");
        assert!(err.reason.contains("unknown operator"));
    }

    #[test]
    fn test_parse_list_shorthand_rejected() {
        let err = FilterParser::parse(&json!({"title": ["a", "b"]})).unwrap_err();
        assert_eq!(err.path, "filter.title");
    }

    #[test]
    fn test_parse_scalar_operator_rejects_list() {
        let err = FilterParser::parse(&json!({"title": {"eq": ["a"]}})).unwrap_err();
        assert!(err.reason.contains("expects a scalar"));
    }

    #[test]
    fn test_parse_combinator_requires_list() {
        let err = FilterParser::parse(&json!({"and": {"a": 1}})).unwrap_err();
        assert_eq!(err.path, "filter.and");
    }

    #[test]
    fn test_parse_non_object_root() {
        let err = FilterParser::parse(&json!("title")).unwrap_err();
        assert_eq!(err.path, "filter");
    }

    #[test]
    fn test_parse_nested_combinators() {
        let node = FilterParser::parse(&json!({
            "and": [
                {"status": "published"},
                {"or": [{"views": {"gt": 100}}, {"featured": true}]}
            ]
        }))
        .unwrap();
        assert_eq!(
            node,
            FilterNode::and(vec![
                FilterNode::eq("status", "published"),
                FilterNode::or(vec![
                    FilterNode::comparison("views", FilterOperator::Gt, [100i64]),
                    FilterNode::eq("featured", true),
                ]),
            ])
        );
    }

    #[test]
    fn test_parse_multiple_keys_are_anded_in_order() {
        let node = FilterParser::parse(&json!({"b": 1, "a": {"gt": 1, "lt": 5}})).unwrap();
        assert_eq!(
            node,
            FilterNode::and(vec![
                FilterNode::eq("b", 1i64),
                FilterNode::and(vec![
                    FilterNode::comparison("a", FilterOperator::Gt, [1i64]),
                    FilterNode::comparison("a", FilterOperator::Lt, [5i64]),
                ]),
            ])
        );
    }

    #[test]
    fn test_parse_empty_combinator() {
        let node = FilterParser::parse(&json!({"or": []})).unwrap();
        assert_eq!(node, FilterNode::or(vec![]));
    }

    #[test]
    fn test_parse_nesting_limit() {
        let mut raw = json!({"a": 1});
        for _ in 0..5 {
            raw = json!({"and": [raw]});
        }
        assert!(FilterParser::new().with_max_nesting(5).parse_value(&raw).is_ok());
        let err = FilterParser::new()
            .with_max_nesting(4)
            .parse_value(&raw)
            .unwrap_err();
        assert!(err.reason.contains("nesting"));
    }

    #[test]
    fn test_roundtrip() {
        let raw = json!({
            "or": [
                {"title": {"like": "%rust%"}},
                {"and": [
                    {"id": {"nin": [1, 2]}},
                    {"deleted_at": {"isnull": true}}
                ]}
            ]
        });
        let node = FilterParser::parse(&raw).unwrap();
        let reparsed = FilterParser::parse(&node.to_value()).unwrap();
        assert_eq!(node, reparsed);
        assert_eq!(node.to_value(), raw);
    }
}
