//! Per-request query criteria.
//!
//! A [`Criteria`] gathers everything a client asked for: filter, include
//! paths, sparse fieldsets, sorting and pagination. It is assembled once per
//! request and only ever read by the engine.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{QueryError, QueryResult};
use crate::filter::FilterNode;

/// Default page size when the client does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// A sort directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sorting {
    /// The field to sort by.
    pub field: String,
    /// Descending order when true.
    pub descending: bool,
}

impl Sorting {
    /// Creates an ascending sort.
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    /// Creates a descending sort.
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    /// Parses a sort token (e.g., "-created" for descending).
    pub fn parse(s: &str) -> Self {
        match s.strip_prefix('-') {
            Some(stripped) => Self::desc(stripped),
            None => Self::asc(s),
        }
    }

    /// Returns the token form of this sort.
    pub fn to_token(&self) -> String {
        if self.descending {
            format!("-{}", self.field)
        } else {
            self.field.clone()
        }
    }
}

/// Requested page, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number, at least 1.
    pub number: u32,
    /// Page size, at least 1.
    pub size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            number: 1,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Creates a page request, rejecting zero values.
    pub fn new(number: u32, size: u32) -> QueryResult<Self> {
        if number == 0 {
            return Err(QueryError::InvalidParameter {
                name: "page[number]".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if size == 0 {
            return Err(QueryError::InvalidParameter {
                name: "page[size]".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(Self { number, size })
    }

    /// Returns the number of items skipped before this page.
    ///
    /// A page number of zero, which only deserialization can produce, is
    /// read as the first page.
    pub fn offset(&self) -> u64 {
        u64::from(self.number.saturating_sub(1)) * u64::from(self.size)
    }
}

/// The full set of query options for one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Criteria {
    /// Parsed filter, if any.
    #[serde(skip)]
    pub filter: Option<FilterNode>,

    /// Dot-separated include paths, in client order.
    pub include: Vec<String>,

    /// Sparse fieldsets per resource type.
    pub fields: BTreeMap<String, BTreeSet<String>>,

    /// Sort directives.
    pub sort: Vec<Sorting>,

    /// Requested page.
    pub pagination: PageRequest,

    /// Original query parameters, kept verbatim for link building.
    pub raw_params: Vec<(String, String)>,
}

impl Criteria {
    /// Creates criteria with default pagination and nothing else.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filter.
    pub fn with_filter(mut self, filter: FilterNode) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Adds an include path.
    pub fn with_include(mut self, path: impl Into<String>) -> Self {
        self.include.push(path.into());
        self
    }

    /// Sets the sparse fieldset for a type.
    pub fn with_fields<I, S>(mut self, resource_type: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.insert(
            resource_type.into(),
            fields.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Adds a sort directive.
    pub fn with_sort(mut self, sort: Sorting) -> Self {
        self.sort.push(sort);
        self
    }

    /// Sets the page.
    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.pagination = page;
        self
    }

    /// Sets the raw query parameters used for link building.
    pub fn with_raw_params(mut self, params: Vec<(String, String)>) -> Self {
        self.raw_params = params;
        self
    }

    /// Returns the sparse fieldset for a type, if one was requested.
    pub fn fieldset(&self, resource_type: &str) -> Option<&BTreeSet<String>> {
        self.fields.get(resource_type)
    }

    /// Returns true if any include path was requested.
    pub fn has_includes(&self) -> bool {
        !self.include.is_empty()
    }

    /// Returns the total number of sparse fieldset entries across types.
    pub fn total_fields(&self) -> usize {
        self.fields.values().map(BTreeSet::len).sum()
    }
}
