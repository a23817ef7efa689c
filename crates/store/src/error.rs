//! Error types for the store crate

use std::io;
use thiserror::Error;

/// Errors that can occur in the record store
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The log file disappeared out from under a reader. Terminal for the
    /// session driving the reader, not a fault.
    #[error("log source gone")]
    SourceGone,

    /// Ordinal not present in the index
    #[error("ordinal {ordinal} out of range (log has {len} records)")]
    OrdinalOutOfRange { ordinal: u64, len: u64 },
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
