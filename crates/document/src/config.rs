//! Engine configuration.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `TESSERA_BASE_URL` | http://localhost:8080 | Base URL for generated links |
//! | `TESSERA_DEFAULT_PAGE_SIZE` | 20 | Page size when the client sends none |
//! | `TESSERA_FETCH_CONCURRENCY` | 8 | Concurrent relationship fetches per include segment |
//! | `TESSERA_INCLUDE_MAX_PATHS` | 10 | Max include paths (0 disables) |
//! | `TESSERA_INCLUDE_MAX_DEPTH` | 3 | Max segments per include path (0 disables) |
//! | `TESSERA_FIELDS_MAX_TOTAL` | 100 | Max sparse fieldset entries (0 disables) |
//! | `TESSERA_PAGE_MAX_SIZE` | 100 | Max page size (0 disables) |
//! | `TESSERA_INCLUDED_MAX_RESOURCES` | 1000 | Max included resources (0 disables) |
//! | `TESSERA_COMPLEXITY_BUDGET` | 500 | Max complexity score (0 disables) |
//! | `TESSERA_LOG_LEVEL` | info | Log level |
//!
//! # Example
//!
//! ```rust
//! use tessera_document::EngineConfig;
//!
//! let config = EngineConfig {
//!     base_url: "https://api.example.com".to_string(),
//!     include_max_depth: 2,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! assert_eq!(config.limits().include_max_depth, Some(2));
//! ```

use clap::Parser;
use tessera_query::LimitsConfig;

/// Engine configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "tessera")]
pub struct EngineConfig {
    /// Base URL for generated links.
    #[arg(long, env = "TESSERA_BASE_URL", default_value = "http://localhost:8080")]
    pub base_url: String,

    /// Page size when the client sends none.
    #[arg(long, env = "TESSERA_DEFAULT_PAGE_SIZE", default_value = "20")]
    pub default_page_size: u32,

    /// Concurrent relationship fetches per include segment.
    #[arg(long, env = "TESSERA_FETCH_CONCURRENCY", default_value = "8")]
    pub fetch_concurrency: usize,

    /// Maximum include paths per request (0 disables).
    #[arg(long, env = "TESSERA_INCLUDE_MAX_PATHS", default_value = "10")]
    pub include_max_paths: u64,

    /// Maximum segments in one include path (0 disables).
    #[arg(long, env = "TESSERA_INCLUDE_MAX_DEPTH", default_value = "3")]
    pub include_max_depth: u64,

    /// Maximum total sparse fieldset entries (0 disables).
    #[arg(long, env = "TESSERA_FIELDS_MAX_TOTAL", default_value = "100")]
    pub fields_max_total: u64,

    /// Maximum page size (0 disables).
    #[arg(long, env = "TESSERA_PAGE_MAX_SIZE", default_value = "100")]
    pub page_max_size: u64,

    /// Maximum resources in `included` (0 disables).
    #[arg(long, env = "TESSERA_INCLUDED_MAX_RESOURCES", default_value = "1000")]
    pub included_max_resources: u64,

    /// Maximum complexity score (0 disables).
    #[arg(long, env = "TESSERA_COMPLEXITY_BUDGET", default_value = "500")]
    pub complexity_budget: u64,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "TESSERA_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            default_page_size: 20,
            fetch_concurrency: 8,
            include_max_paths: 10,
            include_max_depth: 3,
            fields_max_total: 100,
            page_max_size: 100,
            included_max_resources: 1000,
            complexity_budget: 500,
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Returns the limit thresholds, mapping 0 to "disabled".
    pub fn limits(&self) -> LimitsConfig {
        let enabled = |value: u64| (value > 0).then_some(value);
        LimitsConfig {
            include_max_paths: enabled(self.include_max_paths),
            include_max_depth: enabled(self.include_max_depth),
            fields_max_total: enabled(self.fields_max_total),
            page_max_size: enabled(self.page_max_size),
            included_max_resources: enabled(self.included_max_resources),
            complexity_budget: enabled(self.complexity_budget),
        }
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.base_url.is_empty() {
            errors.push("Base URL cannot be empty".to_string());
        } else if url::Url::parse(&self.base_url).is_err() {
            errors.push(format!("Base URL is not a valid URL: {}", self.base_url));
        }

        if self.default_page_size == 0 {
            errors.push("Default page size cannot be 0".to_string());
        }

        if self.page_max_size > 0 && u64::from(self.default_page_size) > self.page_max_size {
            errors.push("Default page size cannot exceed max page size".to_string());
        }

        if self.fetch_concurrency == 0 {
            errors.push("Fetch concurrency cannot be 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration suitable for testing: small pages, no limits.
    pub fn for_testing() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            default_page_size: 10,
            fetch_concurrency: 4,
            include_max_paths: 0,
            include_max_depth: 0,
            fields_max_total: 0,
            page_max_size: 0,
            included_max_resources: 0,
            complexity_budget: 0,
            log_level: "debug".to_string(),
        }
    }
}
