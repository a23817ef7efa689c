//! Query session: a tailing reader filtered by one predicate
//!
//! One session serves one subscriber. The expression is parsed eagerly at
//! open so malformed queries fail before any reading begins; matching is
//! lazy and unbounded, ending only when the log disappears or the
//! subscriber goes away.

use bytes::Bytes;
use tracing::warn;

use taplog_store::TailingReader;

use crate::error::Result;
use crate::predicate::Predicate;

/// Live filtered view over a record log for one subscriber
#[derive(Debug)]
pub struct QuerySession {
    reader: TailingReader,
    predicate: Predicate,
}

impl QuerySession {
    /// Open a session over `reader` with the given filter expression.
    ///
    /// Fails fast with [`crate::QueryError::Parse`] on a malformed
    /// expression, before the reader is touched.
    pub fn open(reader: TailingReader, expression: &str) -> Result<Self> {
        let predicate = Predicate::parse(expression)?;
        Ok(Self { reader, predicate })
    }

    /// The session's parsed predicate
    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Return the next record matching the predicate, in log order.
    ///
    /// Waits for new records at the end of the log. Records that fail to
    /// parse are logged and skipped; the session only ends with
    /// `StoreError::SourceGone` once the log is deleted.
    pub async fn next_match(&mut self) -> Result<Bytes> {
        loop {
            let payload = self.reader.next().await?;
            match self.predicate.matches(&payload) {
                Ok(true) => return Ok(payload),
                Ok(false) => {}
                Err(e) => warn!(error = %e, "skipping record"),
            }
        }
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
