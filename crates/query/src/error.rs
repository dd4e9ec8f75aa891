//! Error types for query validation.
//!
//! Every error here is a deterministic function of the incoming request: the
//! same request always fails the same way, so none of them are retried. Each
//! variant carries enough structure (type, field, segment, observed and
//! threshold values) for a transport layer to render a precise diagnostic.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The primary error type for query validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    /// Malformed filter input.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Filter whitelist violations.
    #[error(transparent)]
    Whitelist(#[from] WhitelistError),

    /// A configured request limit was exceeded.
    #[error(transparent)]
    Limit(#[from] LimitViolation),

    /// An include path names a relationship the type does not declare.
    #[error("unknown relationship '{segment}' on resource type '{resource_type}'")]
    UnknownRelationshipPath {
        resource_type: String,
        segment: String,
    },

    /// The resource type is not known to the metadata lookup.
    #[error("unknown resource type: {resource_type}")]
    UnknownResourceType { resource_type: String },

    /// A sparse fieldset names a type the metadata lookup does not know.
    #[error("sparse fieldset requested for unknown resource type: {resource_type}")]
    UnknownFieldsetType { resource_type: String },

    /// Sorting on a field that is not declared sortable.
    #[error("sorting on '{field}' is not allowed for resource type '{resource_type}'")]
    SortNotAllowed {
        resource_type: String,
        field: String,
    },

    /// A query parameter could not be decoded.
    #[error("invalid query parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },
}

impl QueryError {
    /// Returns a stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::Parse(_) => "filter-parse",
            QueryError::Whitelist(WhitelistError::FieldNotAllowed { .. }) => "field-not-allowed",
            QueryError::Whitelist(WhitelistError::OperatorNotAllowed { .. }) => {
                "operator-not-allowed"
            }
            QueryError::Limit(violation) => violation.kind.as_str(),
            QueryError::UnknownRelationshipPath { .. } => "unknown-relationship-path",
            QueryError::UnknownResourceType { .. } => "unknown-resource-type",
            QueryError::UnknownFieldsetType { .. } => "unknown-fieldset-type",
            QueryError::SortNotAllowed { .. } => "sort-not-allowed",
            QueryError::InvalidParameter { .. } => "invalid-parameter",
        }
    }

    /// Returns the HTTP status code a transport should answer with.
    ///
    /// All query errors are client errors; an unknown resource type maps to
    /// 404 since it usually means the route itself does not exist.
    pub fn status_code(&self) -> u16 {
        match self {
            QueryError::UnknownResourceType { .. } => 404,
            _ => 400,
        }
    }
}

/// Malformed filter input.
///
/// `path` is the dotted location of the offending node inside the raw
/// filter structure, e.g. `filter.or[1].title.like`.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("invalid filter at '{path}': {reason}")]
pub struct ParseError {
    pub path: String,
    pub reason: String,
}

impl ParseError {
    /// Creates a new parse error.
    pub fn new(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Filter whitelist violations.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WhitelistError {
    /// The field is not filterable on this resource type.
    #[error("filtering on '{field}' is not allowed for resource type '{resource_type}'")]
    FieldNotAllowed {
        resource_type: String,
        field: String,
    },

    /// The field is filterable but not with this operator.
    #[error(
        "operator '{operator}' is not allowed on field '{field}' of resource type '{resource_type}'"
    )]
    OperatorNotAllowed {
        resource_type: String,
        field: String,
        operator: String,
    },
}

/// The kind of limit that was exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LimitKind {
    /// Number of include paths.
    IncludePaths,
    /// Dot-segments in a single include path.
    IncludeDepth,
    /// Total requested sparse fieldset entries.
    FieldsTotal,
    /// Requested page size.
    PageSize,
    /// Aggregate complexity score.
    ComplexityBudget,
    /// Resources discovered while resolving includes.
    IncludedCount,
}

impl LimitKind {
    /// Returns the kebab-case name of this limit.
    pub fn as_str(&self) -> &'static str {
        match self {
            LimitKind::IncludePaths => "include-paths",
            LimitKind::IncludeDepth => "include-depth",
            LimitKind::FieldsTotal => "fields-total",
            LimitKind::PageSize => "page-size",
            LimitKind::ComplexityBudget => "complexity-budget",
            LimitKind::IncludedCount => "included-count",
        }
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configured request limit was exceeded.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[error("limit '{kind}' exceeded: observed {observed}, maximum is {threshold}")]
pub struct LimitViolation {
    pub kind: LimitKind,
    pub observed: u64,
    pub threshold: u64,
}

/// Result type alias for query validation.
pub type QueryResult<T> = Result<T, QueryError>;
