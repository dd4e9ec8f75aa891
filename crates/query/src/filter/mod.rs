//! Filter expressions: tree, parser, query-string decoding and whitelist validation.

mod ast;
mod brackets;
mod parser;
mod validator;

pub use ast::{FilterNode, FilterOperator, Scalar};
pub use brackets::{FILTER_PARAM, decode_filter_pairs, is_filter_param};
pub use parser::{DEFAULT_MAX_NESTING, FilterParser};
pub use validator::{validate_against, validate_filter};
