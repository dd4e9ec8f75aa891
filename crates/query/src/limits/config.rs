//! Limit thresholds.

use serde::{Deserialize, Serialize};

/// Configured request limits. `None` disables a check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum number of include paths.
    pub include_max_paths: Option<u64>,

    /// Maximum dot-segments in any single include path.
    pub include_max_depth: Option<u64>,

    /// Maximum total sparse fieldset entries across all types.
    pub fields_max_total: Option<u64>,

    /// Maximum page size.
    pub page_max_size: Option<u64>,

    /// Maximum resources discovered while resolving includes.
    pub included_max_resources: Option<u64>,

    /// Maximum aggregate complexity score.
    pub complexity_budget: Option<u64>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            include_max_paths: Some(10),
            include_max_depth: Some(3),
            fields_max_total: Some(100),
            page_max_size: Some(100),
            included_max_resources: Some(1000),
            complexity_budget: Some(500),
        }
    }
}

impl LimitsConfig {
    /// Returns a config with every check disabled.
    pub fn unlimited() -> Self {
        Self {
            include_max_paths: None,
            include_max_depth: None,
            fields_max_total: None,
            page_max_size: None,
            included_max_resources: None,
            complexity_budget: None,
        }
    }

    /// Validates the thresholds. A threshold of zero would reject every request.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        let thresholds = [
            ("include_max_paths", self.include_max_paths),
            ("include_max_depth", self.include_max_depth),
            ("fields_max_total", self.fields_max_total),
            ("page_max_size", self.page_max_size),
            ("complexity_budget", self.complexity_budget),
        ];
        for (name, value) in thresholds {
            if value == Some(0) {
                errors.push(format!("{} must be greater than 0", name));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
