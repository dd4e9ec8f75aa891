//! Limits enforcement.

use tracing::warn;

use super::complexity;
use super::config::LimitsConfig;
use crate::error::{LimitKind, LimitViolation};
use crate::types::Criteria;

/// Checks requests against configured [`LimitsConfig`] thresholds.
#[derive(Debug, Clone, Default)]
pub struct LimitsEnforcer {
    config: LimitsConfig,
}

impl LimitsEnforcer {
    /// Creates an enforcer.
    pub fn new(config: LimitsConfig) -> Self {
        Self { config }
    }

    /// Returns the configured thresholds.
    pub fn config(&self) -> &LimitsConfig {
        &self.config
    }

    /// Checks the static limits of a request.
    ///
    /// Checks run in a fixed order (include paths, include depth, fields
    /// total, page size, complexity budget) and the first failure wins.
    pub fn enforce(&self, resource_type: &str, criteria: &Criteria) -> Result<(), LimitViolation> {
        let deepest = criteria
            .include
            .iter()
            .map(|path| complexity::include_depth(path))
            .max()
            .unwrap_or(0);

        let checks = [
            (
                LimitKind::IncludePaths,
                criteria.include.len() as u64,
                self.config.include_max_paths,
            ),
            (
                LimitKind::IncludeDepth,
                deepest,
                self.config.include_max_depth,
            ),
            (
                LimitKind::FieldsTotal,
                criteria.total_fields() as u64,
                self.config.fields_max_total,
            ),
            (
                LimitKind::PageSize,
                u64::from(criteria.pagination.size),
                self.config.page_max_size,
            ),
            (
                LimitKind::ComplexityBudget,
                complexity::score(criteria),
                self.config.complexity_budget,
            ),
        ];

        for (kind, observed, threshold) in checks {
            check(resource_type, kind, observed, threshold)?;
        }

        Ok(())
    }

    /// Checks the number of resources discovered so far while resolving includes.
    ///
    /// `resource_type` is the type being walked into when the count was taken.
    pub fn assert_included_count(
        &self,
        resource_type: &str,
        observed: u64,
    ) -> Result<(), LimitViolation> {
        check(
            resource_type,
            LimitKind::IncludedCount,
            observed,
            self.config.included_max_resources,
        )
    }
}

fn check(
    resource_type: &str,
    kind: LimitKind,
    observed: u64,
    threshold: Option<u64>,
) -> Result<(), LimitViolation> {
    match threshold {
        Some(threshold) if observed > threshold => {
            warn!(
                resource_type = %resource_type,
                kind = %kind,
                observed,
                threshold,
                "Request limit exceeded"
            );
            Err(LimitViolation {
                kind,
                observed,
                threshold,
            })
        }
        _ => Ok(()),
    }
}
