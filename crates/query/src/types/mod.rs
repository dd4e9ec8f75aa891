//! Core types for query handling.
//!
//! - [`Criteria`] - everything a client asked for in one request
//! - [`IncludePath`] - parsed include paths and their resolution
//! - [`ResourceMetadata`], [`MetadataLookup`] - per-type descriptions supplied by the host
//!
//! # Building Criteria
//!
//! ```
//! use tessera_query::filter::FilterNode;
//! use tessera_query::types::{Criteria, PageRequest, Sorting};
//!
//! let criteria = Criteria::new()
//!     .with_filter(FilterNode::eq("status", "published"))
//!     .with_include("comments.author")
//!     .with_fields("articles", ["title"])
//!     .with_sort(Sorting::parse("-created"))
//!     .with_page(PageRequest::new(2, 10).unwrap());
//!
//! assert_eq!(criteria.pagination.offset(), 10);
//! ```

mod criteria;
mod include;
mod metadata;

pub use criteria::{Criteria, DEFAULT_PAGE_SIZE, PageRequest, Sorting};
pub use include::{IncludePath, ResolvedSegment};
pub use metadata::{
    Cardinality, FilterableFieldSpec, LinkingPolicy, MetadataLookup, MetadataRegistry,
    RelationshipDef, ResourceMetadata,
};
