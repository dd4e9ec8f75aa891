//! Request complexity scoring and limits enforcement.

mod complexity;
mod config;
mod enforcer;

pub use complexity::{ComplexityBreakdown, breakdown, score};
pub use config::LimitsConfig;
pub use enforcer::LimitsEnforcer;
