//! Error types for the server crate

use std::io;
use thiserror::Error;

use taplog_query::QueryError;
use taplog_store::StoreError;

/// Errors that can occur in the server
#[derive(Error, Debug)]
pub enum ServerError {
    /// Failed to bind the listen socket
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    /// I/O error (socket operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Log storage error
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Query error
    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Result type for server operations
pub type Result<T> = std::result::Result<T, ServerError>;
