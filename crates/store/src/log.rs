//! Append-only record log writer
//!
//! `RecordLog` is the single writer handle for one log file. Exclusive
//! write access is enforced by construction: the handle is owned, not
//! shared, and only the session that owns it may append. Readers see a
//! frame only after its bytes are durable and its index entry published.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::Result;
use crate::frame::encode_frame;
use crate::index::{OffsetIndex, SharedIndex};

/// Owned writer handle for one append-only log file
pub struct RecordLog {
    file: File,
    path: PathBuf,
    index: SharedIndex,
}

impl RecordLog {
    /// Create a fresh log at `path`, truncating any existing file.
    ///
    /// `index` must be empty; it is populated as records are appended and
    /// may be shared with concurrent readers.
    pub async fn create(path: impl AsRef<Path>, index: SharedIndex) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .await?;
        Ok(Self { file, path, index })
    }

    /// Open an existing log at `path` for append, rebuilding the index by
    /// scanning the file from offset 0
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let index = OffsetIndex::rebuild(&path).await?;
        debug!(records = index.len(), path = %path.display(), "index rebuilt");
        let file = OpenOptions::new().append(true).open(&path).await?;
        Ok(Self {
            file,
            path,
            index: Arc::new(parking_lot::RwLock::new(index)),
        })
    }

    /// Append one record; returns its ordinal.
    ///
    /// The frame is flushed and synced before the index entry is published,
    /// so a reader never observes an offset whose bytes are not durable.
    pub async fn append(&mut self, payload: &[u8]) -> Result<u64> {
        let frame = encode_frame(payload);
        self.file.write_all(&frame).await?;
        self.file.flush().await?;
        self.file.sync_data().await?;

        let ordinal = self.index.write().record_appended(payload.len() as u64);
        Ok(ordinal)
    }

    /// Shared handle to this log's offset index
    pub fn index(&self) -> SharedIndex {
        Arc::clone(&self.index)
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records appended so far
    pub fn len(&self) -> u64 {
        self.index.read().len()
    }

    /// Whether the log holds no records
    pub fn is_empty(&self) -> bool {
        self.index.read().is_empty()
    }

    /// Close the writer and delete the log file.
    ///
    /// Readers currently tailing the file will observe source-gone on
    /// their next poll.
    pub async fn remove(self) -> Result<()> {
        drop(self.file);
        tokio::fs::remove_file(&self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "log_test.rs"]
mod tests;
