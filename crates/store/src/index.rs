//! In-memory ordinal → byte-offset index
//!
//! The index is derived, disposable state: entries are appended only
//! after the corresponding frame is durably written, are never removed
//! or mutated, and the whole thing can be rebuilt by scanning the log
//! file from offset 0.

use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::fs::File;

use crate::error::{Result, StoreError};
use crate::frame::{ReadFrame, frame_size, read_frame_at};

/// Index shared between one writer task and any number of reader tasks
pub type SharedIndex = Arc<RwLock<OffsetIndex>>;

/// Ordered mapping from record ordinal to frame start offset
#[derive(Debug, Default)]
pub struct OffsetIndex {
    /// Start offset of each frame, in ordinal order. Strictly increasing.
    offsets: Vec<u64>,
    /// Offset one past the last indexed frame
    end_offset: u64,
}

impl OffsetIndex {
    /// Create an empty index for a fresh log
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty index behind a shared handle
    pub fn new_shared() -> SharedIndex {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Record one durable append of `payload_len` bytes; returns the new
    /// record's ordinal
    pub fn record_appended(&mut self, payload_len: u64) -> u64 {
        let ordinal = self.offsets.len() as u64;
        self.offsets.push(self.end_offset);
        self.end_offset += frame_size(payload_len);
        ordinal
    }

    /// Start offset of the frame for `ordinal`
    pub fn offset_of(&self, ordinal: u64) -> Result<u64> {
        self.offsets
            .get(ordinal as usize)
            .copied()
            .ok_or(StoreError::OrdinalOutOfRange {
                ordinal,
                len: self.len(),
            })
    }

    /// Number of indexed records
    pub fn len(&self) -> u64 {
        self.offsets.len() as u64
    }

    /// Whether the index holds no records
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Offset one past the last indexed frame
    pub fn end_offset(&self) -> u64 {
        self.end_offset
    }

    /// Reconstruct an index by scanning frames from offset 0.
    ///
    /// Used on restart over an existing log file. A trailing incomplete
    /// frame is not indexed; it stays invisible until completed.
    pub async fn rebuild(path: &Path) -> Result<Self> {
        let mut file = File::open(path).await?;
        let mut index = Self::new();
        let mut offset = 0;
        loop {
            match read_frame_at(&mut file, offset).await? {
                ReadFrame::Frame {
                    payload,
                    next_offset,
                } => {
                    index.record_appended(payload.len() as u64);
                    offset = next_offset;
                }
                ReadFrame::Incomplete | ReadFrame::EndOfLog => break,
            }
        }
        Ok(index)
    }
}

#[cfg(test)]
#[path = "index_test.rs"]
mod tests;
