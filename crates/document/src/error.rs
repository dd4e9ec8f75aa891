//! Error types for document assembly.
//!
//! Query errors are deterministic rejections of the request. Fetch errors come
//! from collaborators and are passed through unchanged; whether to retry them
//! is the collaborator's concern.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use tessera_query::{LimitViolation, QueryError};
use thiserror::Error;

/// The primary error type for document assembly.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    /// The request was rejected.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// A collaborator failed to fetch data.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl From<LimitViolation> for DocumentError {
    fn from(violation: LimitViolation) -> Self {
        DocumentError::Query(QueryError::Limit(violation))
    }
}

impl DocumentError {
    /// Returns the limit violation, if that is what aborted assembly.
    pub fn as_limit_violation(&self) -> Option<&LimitViolation> {
        match self {
            DocumentError::Query(QueryError::Limit(violation)) => Some(violation),
            _ => None,
        }
    }

    /// Returns the HTTP status code a transport should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            DocumentError::Query(err) => err.status_code(),
            DocumentError::Fetch(FetchError::NotFound { .. }) => 404,
            DocumentError::Fetch(FetchError::Backend { .. }) => 502,
        }
    }
}

/// Errors raised by fetch collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The requested entity does not exist.
    #[error("resource not found: {resource_type}/{id}")]
    NotFound { resource_type: String, id: String },

    /// The backing store failed.
    #[error("backend error: {message}")]
    Backend { message: String },
}

impl FetchError {
    /// Creates a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        FetchError::Backend {
            message: message.into(),
        }
    }
}

/// Result type alias for document assembly.
pub type DocumentResult<T> = Result<T, DocumentError>;
