//! Criteria decoding from query strings.
//!
//! Recognised parameters:
//!
//! - `include=comments.author,author`
//! - `fields[articles]=title,body`
//! - `sort=-created,title`
//! - `page[number]=2`, `page[size]=10`
//! - `filter[...]=...` (see [`crate::filter::decode_filter_pairs`])
//!
//! Anything else is ignored here but kept in [`Criteria::raw_params`] so
//! pagination links can re-serialise it unchanged.

use tracing::debug;

use crate::error::{QueryError, QueryResult};
use crate::filter::{FilterParser, decode_filter_pairs, is_filter_param};
use crate::types::{Criteria, PageRequest, Sorting};

const INCLUDE_PARAM: &str = "include";
const SORT_PARAM: &str = "sort";
const PAGE_NUMBER_PARAM: &str = "page[number]";
const PAGE_SIZE_PARAM: &str = "page[size]";

impl Criteria {
    /// Decodes criteria from a raw (percent-encoded) query string.
    ///
    /// A leading `?` is tolerated.
    pub fn from_query(query: &str, default_page_size: u32) -> QueryResult<Self> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect();
        Self::from_pairs(pairs, default_page_size)
    }

    /// Decodes criteria from already-decoded name/value pairs.
    pub fn from_pairs(pairs: Vec<(String, String)>, default_page_size: u32) -> QueryResult<Self> {
        let mut criteria = Criteria::new();
        let mut page_number = 1;
        let mut page_size = default_page_size;

        for (name, value) in &pairs {
            match name.as_str() {
                INCLUDE_PARAM => {
                    criteria.include.extend(split_list(value));
                }
                SORT_PARAM => {
                    criteria.sort.extend(split_list(value).map(|s| Sorting::parse(&s)));
                }
                PAGE_NUMBER_PARAM => page_number = parse_page_value(name, value)?,
                PAGE_SIZE_PARAM => page_size = parse_page_value(name, value)?,
                other => {
                    if let Some(resource_type) = fieldset_type(other) {
                        criteria
                            .fields
                            .insert(resource_type.to_string(), split_list(value).collect());
                    }
                }
            }
        }

        criteria.pagination = PageRequest::new(page_number, page_size)?;

        let filter_pairs = pairs
            .iter()
            .filter(|(name, _)| is_filter_param(name))
            .map(|(name, value)| (name.as_str(), value.as_str()));
        if let Some(raw) = decode_filter_pairs(filter_pairs)? {
            criteria.filter = Some(FilterParser::parse(&raw)?);
        }

        debug!(
            includes = criteria.include.len(),
            fieldsets = criteria.fields.len(),
            sorts = criteria.sort.len(),
            has_filter = criteria.filter.is_some(),
            "Decoded query criteria"
        );

        criteria.raw_params = pairs;
        Ok(criteria)
    }
}

/// Splits a comma-separated value, dropping empty items.
fn split_list(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Extracts `type` from `fields[type]`.
fn fieldset_type(name: &str) -> Option<&str> {
    name.strip_prefix("fields[")
        .and_then(|rest| rest.strip_suffix(']'))
        .filter(|t| !t.is_empty() && !t.contains(['[', ']']))
}

fn parse_page_value(name: &str, value: &str) -> QueryResult<u32> {
    let parsed: u32 = value
        .trim()
        .parse()
        .map_err(|_| QueryError::InvalidParameter {
            name: name.to_string(),
            reason: format!("'{}' is not a positive integer", value),
        })?;
    if parsed == 0 {
        return Err(QueryError::InvalidParameter {
            name: name.to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(parsed)
}
