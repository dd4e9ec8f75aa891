//! Filter expression tree.
//!
//! A parsed filter is a closed tree of three node kinds. Consumers match on
//! [`FilterNode`] exhaustively, so adding a node kind forces every walker
//! (validator, serializer, cost accounting) to be revisited.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Comparison operators accepted in filter expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    /// Equal.
    Eq,
    /// Not equal.
    Neq,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Pattern match.
    Like,
    /// Member of a list.
    In,
    /// Not a member of a list.
    Nin,
    /// Inclusive range, exactly two bounds.
    Between,
    /// Value is null.
    IsNull,
    /// Value is not null.
    #[serde(rename = "nnull")]
    NotNull,
}

impl FilterOperator {
    /// All operators, in declaration order.
    pub const ALL: [FilterOperator; 12] = [
        FilterOperator::Eq,
        FilterOperator::Neq,
        FilterOperator::Lt,
        FilterOperator::Lte,
        FilterOperator::Gt,
        FilterOperator::Gte,
        FilterOperator::Like,
        FilterOperator::In,
        FilterOperator::Nin,
        FilterOperator::Between,
        FilterOperator::IsNull,
        FilterOperator::NotNull,
    ];

    /// Parses an operator name, returning None for unknown operators.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "eq" => Some(FilterOperator::Eq),
            "neq" => Some(FilterOperator::Neq),
            "lt" => Some(FilterOperator::Lt),
            "lte" => Some(FilterOperator::Lte),
            "gt" => Some(FilterOperator::Gt),
            "gte" => Some(FilterOperator::Gte),
            "like" => Some(FilterOperator::Like),
            "in" => Some(FilterOperator::In),
            "nin" => Some(FilterOperator::Nin),
            "between" => Some(FilterOperator::Between),
            "isnull" => Some(FilterOperator::IsNull),
            "nnull" => Some(FilterOperator::NotNull),
            _ => None,
        }
    }

    /// Returns the wire name of this operator.
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "eq",
            FilterOperator::Neq => "neq",
            FilterOperator::Lt => "lt",
            FilterOperator::Lte => "lte",
            FilterOperator::Gt => "gt",
            FilterOperator::Gte => "gte",
            FilterOperator::Like => "like",
            FilterOperator::In => "in",
            FilterOperator::Nin => "nin",
            FilterOperator::Between => "between",
            FilterOperator::IsNull => "isnull",
            FilterOperator::NotNull => "nnull",
        }
    }

    /// Returns true if the operand must be a list.
    pub fn takes_list(&self) -> bool {
        matches!(
            self,
            FilterOperator::In | FilterOperator::Nin | FilterOperator::Between
        )
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown filter operator: {}", s))
    }
}

/// A scalar operand in a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// JSON null.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// String.
    String(String),
}

impl Scalar {
    /// Converts a JSON value, returning None for arrays and objects.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Scalar::Null),
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(Scalar::Integer)
                .or_else(|| n.as_f64().map(Scalar::Float)),
            Value::String(s) => Some(Scalar::String(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Parses a raw query-string value leniently.
    ///
    /// `true`, `false` and `null` become their JSON counterparts, numbers
    /// become numbers, anything else stays a string.
    pub fn from_query_value(raw: &str) -> Self {
        match raw {
            "true" => Scalar::Bool(true),
            "false" => Scalar::Bool(false),
            "null" => Scalar::Null,
            _ => {
                if let Ok(i) = raw.parse::<i64>() {
                    Scalar::Integer(i)
                } else if let Some(f) = raw.parse::<f64>().ok().filter(|f| f.is_finite()) {
                    Scalar::Float(f)
                } else {
                    Scalar::String(raw.to_string())
                }
            }
        }
    }

    /// Converts back to a JSON value.
    pub fn to_json(&self) -> Value {
        match self {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Integer(i) => Value::from(*i),
            Scalar::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Scalar::String(s) => Value::String(s.clone()),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Integer(n)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<f64> for Scalar {
    fn from(f: f64) -> Self {
        Scalar::Float(f)
    }
}

/// A parsed filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    /// A leaf predicate: `field operator values`.
    Comparison {
        /// Field name, possibly dotted.
        field: String,
        /// Comparison operator.
        operator: FilterOperator,
        /// Operands; the operator's arity decides how many.
        values: Vec<Scalar>,
    },
    /// Logical AND of zero or more children.
    Conjunction {
        /// Sub-expressions, in input order.
        children: Vec<FilterNode>,
    },
    /// Logical OR of zero or more children.
    Disjunction {
        /// Sub-expressions, in input order.
        children: Vec<FilterNode>,
    },
}

impl FilterNode {
    /// Creates a comparison node.
    pub fn comparison<I, V>(field: impl Into<String>, operator: FilterOperator, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        FilterNode::Comparison {
            field: field.into(),
            operator,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates an equality comparison against a single value.
    pub fn eq(field: impl Into<String>, value: impl Into<Scalar>) -> Self {
        FilterNode::Comparison {
            field: field.into(),
            operator: FilterOperator::Eq,
            values: vec![value.into()],
        }
    }

    /// Creates a conjunction.
    pub fn and(children: Vec<FilterNode>) -> Self {
        FilterNode::Conjunction { children }
    }

    /// Creates a disjunction.
    pub fn or(children: Vec<FilterNode>) -> Self {
        FilterNode::Disjunction { children }
    }

    /// Returns every comparison in depth-first, left-to-right order.
    pub fn comparisons(&self) -> Vec<&FilterNode> {
        let mut out = Vec::new();
        self.collect_comparisons(&mut out);
        out
    }

    fn collect_comparisons<'a>(&'a self, out: &mut Vec<&'a FilterNode>) {
        match self {
            FilterNode::Comparison { .. } => out.push(self),
            FilterNode::Conjunction { children } | FilterNode::Disjunction { children } => {
                for child in children {
                    child.collect_comparisons(out);
                }
            }
        }
    }

    /// Returns the nesting depth of the tree (a lone comparison is 1).
    pub fn depth(&self) -> usize {
        match self {
            FilterNode::Comparison { .. } => 1,
            FilterNode::Conjunction { children } | FilterNode::Disjunction { children } => {
                1 + children.iter().map(FilterNode::depth).max().unwrap_or(0)
            }
        }
    }

    /// Serializes the tree back into the nested map form accepted by the parser.
    ///
    /// Combinators become `{"and": [...]}` / `{"or": [...]}` and comparisons
    /// become `{field: {operator: operand}}`. Re-parsing the output yields an
    /// equal tree.
    pub fn to_value(&self) -> Value {
        match self {
            FilterNode::Comparison {
                field,
                operator,
                values,
            } => {
                let operand = if operator.takes_list() || values.len() != 1 {
                    Value::Array(values.iter().map(Scalar::to_json).collect())
                } else {
                    values[0].to_json()
                };
                let mut ops = Map::new();
                ops.insert(operator.as_str().to_string(), operand);
                let mut obj = Map::new();
                obj.insert(field.clone(), Value::Object(ops));
                Value::Object(obj)
            }
            FilterNode::Conjunction { children } => combinator("and", children),
            FilterNode::Disjunction { children } => combinator("or", children),
        }
    }
}

fn combinator(keyword: &str, children: &[FilterNode]) -> Value {
    let mut obj = Map::new();
    obj.insert(
        keyword.to_string(),
        Value::Array(children.iter().map(FilterNode::to_value).collect()),
    );
    Value::Object(obj)
}

impl fmt::Display for FilterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterNode::Comparison {
                field,
                operator,
                values,
            } => {
                let rendered: Vec<String> = values.iter().map(|v| v.to_json().to_string()).collect();
                write!(f, "{} {} [{}]", field, operator, rendered.join(", "))
            }
            FilterNode::Conjunction { children } | FilterNode::Disjunction { children } => {
                let keyword = if matches!(self, FilterNode::Conjunction { .. }) {
                    " and "
                } else {
                    " or "
                };
                let parts: Vec<String> = children.iter().map(|c| c.to_string()).collect();
                write!(f, "({})", parts.join(keyword))
            }
        }
    }
}
