//! Link construction.
//!
//! All URLs are built from a configured base URL:
//!
//! | link                  | form                                        |
//! |-----------------------|---------------------------------------------|
//! | collection            | `{base}/{type}`                             |
//! | resource              | `{base}/{type}/{id}`                        |
//! | relationship `self`   | `{base}/{type}/{id}/relationships/{name}`   |
//! | relationship `related`| `{base}/{type}/{id}/{name}`                 |
//!
//! Every appended piece is percent-encoded as a path segment, so an id like
//! `a/b c` stays one segment (`a%2Fb%20c`).
//!
//! Pagination links re-serialise the request's query parameters in their
//! original order and change only `page[number]`. When the request carries
//! no `page[number]` or `page[size]` (criteria built in code, or defaults),
//! the effective values are appended so every link names its page exactly.

use tessera_query::Criteria;
use url::Url;

use crate::model::Links;

const PAGE_NUMBER_PARAM: &str = "page[number]";
const PAGE_SIZE_PARAM: &str = "page[size]";

/// Total number of matching primary resources, across all pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaginationInfo {
    /// Matching resources across all pages.
    pub total: u64,
}

impl PaginationInfo {
    /// Creates pagination info.
    pub fn new(total: u64) -> Self {
        Self { total }
    }

    /// Returns the last page number for a page size; at least 1.
    pub fn last_page(&self, size: u32) -> u64 {
        let size = u64::from(size.max(1));
        self.total.div_ceil(size).max(1)
    }
}

/// Builds resource, relationship and pagination links.
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    base_url: String,
    base: Option<Url>,
}

impl LinkBuilder {
    /// Creates a builder. A trailing slash on the base URL is ignored.
    ///
    /// A base that does not parse as a hierarchical URL falls back to plain
    /// string joining; configuration validation rejects such bases.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        let base = Url::parse(&base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            base,
        }
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the URL of a collection.
    pub fn collection(&self, resource_type: &str) -> String {
        self.join(&[resource_type])
    }

    /// Returns the URL of a resource.
    pub fn resource(&self, resource_type: &str, id: &str) -> String {
        self.join(&[resource_type, id])
    }

    /// Returns `self` and `related` links of a relationship.
    pub fn relationship(&self, resource_type: &str, id: &str, name: &str) -> Links {
        Links {
            self_link: Some(self.join(&[resource_type, id, "relationships", name])),
            related: Some(self.join(&[resource_type, id, name])),
            ..Default::default()
        }
    }

    /// Returns the top-level links of a resource document.
    pub fn resource_document(&self, resource_type: &str, id: &str, criteria: &Criteria) -> Links {
        let url = self.resource(resource_type, id);
        Links::self_only(with_query(url, &criteria.raw_params))
    }

    /// Returns the top-level links of a collection document.
    ///
    /// `prev` is omitted on the first page and `next` on the last one.
    pub fn pagination(
        &self,
        resource_type: &str,
        criteria: &Criteria,
        info: PaginationInfo,
    ) -> Links {
        let base = self.collection(resource_type);
        let current = u64::from(criteria.pagination.number);
        let last = info.last_page(criteria.pagination.size);
        let params = effective_params(criteria);
        let page = |number: u64| page_url(&base, &params, number);

        Links {
            self_link: Some(page(current)),
            first: Some(page(1)),
            prev: (current > 1).then(|| page(current - 1)),
            next: (current < last).then(|| page(current + 1)),
            last: Some(page(last)),
            ..Default::default()
        }
    }

    /// Appends path segments to the base URL, encoding each one.
    fn join(&self, segments: &[&str]) -> String {
        if let Some(mut url) = self.base.clone() {
            if let Ok(mut path) = url.path_segments_mut() {
                path.pop_if_empty().extend(segments);
            }
            return url.into();
        }
        let mut joined = self.base_url.clone();
        for segment in segments {
            joined.push('/');
            joined.push_str(segment);
        }
        joined
    }
}

/// The request's parameters with the effective page number and size added
/// when the client did not send them.
fn effective_params(criteria: &Criteria) -> Vec<(String, String)> {
    let mut params = criteria.raw_params.clone();
    let has = |params: &[(String, String)], name: &str| params.iter().any(|(n, _)| n == name);
    if !has(&params, PAGE_NUMBER_PARAM) {
        params.push((
            PAGE_NUMBER_PARAM.to_string(),
            criteria.pagination.number.to_string(),
        ));
    }
    if !has(&params, PAGE_SIZE_PARAM) {
        params.push((
            PAGE_SIZE_PARAM.to_string(),
            criteria.pagination.size.to_string(),
        ));
    }
    params
}

/// Rebuilds the query string with every `page[number]` set to `number`.
fn page_url(base: &str, params: &[(String, String)], number: u64) -> String {
    let number = number.to_string();
    let pairs: Vec<(&str, &str)> = params
        .iter()
        .map(|(name, value)| {
            if name == PAGE_NUMBER_PARAM {
                (name.as_str(), number.as_str())
            } else {
                (name.as_str(), value.as_str())
            }
        })
        .collect();
    with_query_pairs(base.to_string(), pairs)
}

fn with_query(base: String, params: &[(String, String)]) -> String {
    with_query_pairs(
        base,
        params.iter().map(|(n, v)| (n.as_str(), v.as_str())).collect(),
    )
}

fn with_query_pairs(base: String, pairs: Vec<(&str, &str)>) -> String {
    if pairs.is_empty() {
        return base;
    }
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    format!("{}?{}", base, query)
}
