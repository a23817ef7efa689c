//! TCP front end for the record store
//!
//! Exposes the log and query engine over a line-oriented TCP protocol.
//! Each connection picks its mode with its first command and keeps it for
//! the life of the connection:
//!
//! ```text
//!   /insert            ingest: every following line is appended as a record
//!   /query <expr>      stream records matching <expr>, live
//!   /single <ordinal>  fetch one record by ordinal (repeatable, one per line)
//! ```
//!
//! The log file's lifetime is tied to the ingest connection that owns it:
//! when that connection ends, the file is deleted and tailing readers
//! observe source-gone. On shutdown every connected client receives the
//! `%quit%` sentinel line before the server exits.

pub mod config;
pub mod error;
pub mod metrics;
pub mod server;
pub mod session;
pub mod state;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use metrics::{ServerMetrics, ServerMetricsSnapshot};
pub use server::Server;
pub use state::{ActiveLog, ServerState};
