//! Tessera query safety layer.
//!
//! This crate decides whether a client request is safe to execute before any
//! storage is touched. It turns raw query parameters into a typed
//! [`Criteria`], checks filters against per-type whitelists, scores how
//! expensive the request is, and enforces configured limits.
//!
//! # Architecture
//!
//! - [`filter`] - filter tree, parser, bracket decoding and whitelist validation
//! - [`types`] - criteria, include paths and resource metadata
//! - [`limits`] - complexity scoring and limits enforcement
//! - [`error`] - error taxonomy shared by every stage
//!
//! # Quick Start
//!
//! ```
//! use tessera_query::filter::FilterOperator;
//! use tessera_query::limits::{LimitsConfig, LimitsEnforcer};
//! use tessera_query::types::{Criteria, MetadataRegistry, RelationshipDef, ResourceMetadata};
//! use tessera_query::validate_criteria;
//!
//! let registry = MetadataRegistry::new()
//!     .with_type(
//!         ResourceMetadata::new("articles")
//!             .with_attributes(["title", "status"])
//!             .with_relationship(RelationshipDef::to_one("author", "people"))
//!             .with_filterable("status", [FilterOperator::Eq, FilterOperator::In]),
//!     )
//!     .with_type(ResourceMetadata::new("people").with_attributes(["name"]));
//!
//! let criteria = Criteria::from_query(
//!     "include=author&filter[status][in][]=draft&filter[status][in][]=published",
//!     20,
//! )
//! .unwrap();
//!
//! validate_criteria(&registry, "articles", &criteria).unwrap();
//! LimitsEnforcer::new(LimitsConfig::default())
//!     .enforce("articles", &criteria)
//!     .unwrap();
//! ```
//!
//! # Filters
//!
//! Filters arrive either as bracketed query parameters or as a JSON object:
//!
//! ```
//! use serde_json::json;
//! use tessera_query::{parse_filter, validate_filter};
//! use tessera_query::filter::FilterOperator;
//! use tessera_query::types::{MetadataRegistry, ResourceMetadata};
//!
//! let registry = MetadataRegistry::new().with_type(
//!     ResourceMetadata::new("articles").with_filterable("title", [FilterOperator::Like]),
//! );
//!
//! let allowed = parse_filter(&json!({"title": {"like": "%rust%"}})).unwrap();
//! assert!(validate_filter(&registry, "articles", &allowed).is_ok());
//!
//! let hidden = parse_filter(&json!({"or": [{"title": {"like": "%"}}, {"secret": 1}]})).unwrap();
//! assert!(validate_filter(&registry, "articles", &hidden).is_err());
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod error;
pub mod filter;
pub mod limits;
mod query_string;
pub mod types;
mod validate;

pub use error::{
    LimitKind, LimitViolation, ParseError, QueryError, QueryResult, WhitelistError,
};
pub use filter::{FilterNode, FilterOperator, FilterParser, Scalar, validate_filter};
pub use limits::{ComplexityBreakdown, LimitsConfig, LimitsEnforcer};
pub use types::{Criteria, IncludePath, MetadataLookup, MetadataRegistry, ResourceMetadata};
pub use validate::validate_criteria;

use serde_json::Value;

/// Parses a nested filter structure with default settings.
pub fn parse_filter(raw: &Value) -> Result<FilterNode, ParseError> {
    FilterParser::parse(raw)
}

/// Returns the complexity score of a request.
pub fn score_complexity(criteria: &Criteria) -> u64 {
    limits::score(criteria)
}

/// Checks the static limits of a request.
pub fn enforce_limits(
    config: &LimitsConfig,
    resource_type: &str,
    criteria: &Criteria,
) -> Result<(), LimitViolation> {
    LimitsEnforcer::new(config.clone()).enforce(resource_type, criteria)
}

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
