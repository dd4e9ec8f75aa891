//! Request complexity scoring.
//!
//! The score is a single integer estimating how expensive a request is:
//!
//! | component  | cost                                   |
//! |------------|----------------------------------------|
//! | include    | sum of depth² over all include paths   |
//! | fields     | total sparse fieldset entries          |
//! | sort       | 2 per sort directive                   |
//! | pagination | requested page size                    |
//!
//! Deep include paths fan out multiplicatively, hence the square.

use serde::{Deserialize, Serialize};

use crate::types::Criteria;

/// Per-component complexity cost.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplexityBreakdown {
    /// Sum of squared include path depths.
    pub include: u64,
    /// Total sparse fieldset entries.
    pub fields: u64,
    /// Twice the number of sort directives.
    pub sort: u64,
    /// Requested page size.
    pub pagination: u64,
}

impl ComplexityBreakdown {
    /// Returns the aggregate score.
    pub fn total(&self) -> u64 {
        self.include
            .saturating_add(self.fields)
            .saturating_add(self.sort)
            .saturating_add(self.pagination)
    }
}

/// Returns the cost of each component of a request.
pub fn breakdown(criteria: &Criteria) -> ComplexityBreakdown {
    let include = criteria
        .include
        .iter()
        .map(|path| {
            let depth = include_depth(path);
            depth.saturating_mul(depth)
        })
        .fold(0u64, u64::saturating_add);

    ComplexityBreakdown {
        include,
        fields: criteria.total_fields() as u64,
        sort: 2 * criteria.sort.len() as u64,
        pagination: u64::from(criteria.pagination.size),
    }
}

/// Scores a request.
pub fn score(criteria: &Criteria) -> u64 {
    breakdown(criteria).total()
}

pub(crate) fn include_depth(path: &str) -> u64 {
    path.split('.').count() as u64
}
