//! Error types for the query crate

use thiserror::Error;

use taplog_store::StoreError;

/// Errors that can occur while parsing or running a query
#[derive(Error, Debug)]
pub enum QueryError {
    /// Malformed filter expression; rejected before any reading begins
    #[error("invalid filter expression: {0}")]
    Parse(String),

    /// Record bytes not parseable as JSON; the record is skipped, the
    /// session continues
    #[error("record not parseable: {0}")]
    Eval(String),

    /// Underlying log error
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for query operations
pub type Result<T> = std::result::Result<T, QueryError>;
