//! Tailing reader over a record log
//!
//! A `TailingReader` holds a byte cursor into one log file and delivers
//! frames to exactly one consumer, in append order. Behind the end of the
//! log it reads immediately; at the end it polls at a fixed interval for
//! new frames instead of signaling end-of-stream. The cursor only ever
//! advances, and only past complete frames.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bytes::Bytes;
use tokio::fs::File;

use crate::error::{Result, StoreError};
use crate::frame::{ReadFrame, read_frame_at};

/// How long to wait between polls once the reader catches up with the log
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Cursor-based reader that follows a growing log file
#[derive(Debug)]
pub struct TailingReader {
    path: PathBuf,
    file: Option<File>,
    cursor: u64,
    poll_interval: Duration,
}

impl TailingReader {
    /// Create a reader over the log at `path`, positioned at offset 0
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            file: None,
            cursor: 0,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set the starting cursor. Must be the start offset of a frame, as
    /// obtained from the offset index.
    pub fn with_start_offset(mut self, offset: u64) -> Self {
        self.cursor = offset;
        self
    }

    /// Set the end-of-log poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Current cursor position
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Return the next frame's payload, waiting for one to be appended if
    /// the cursor is at the end of the log.
    ///
    /// Fails with [`StoreError::SourceGone`] once the log file has been
    /// deleted; that is terminal for this reader.
    pub async fn next(&mut self) -> Result<Bytes> {
        loop {
            if let Some(payload) = self.read_once().await? {
                return Ok(payload);
            }
            // Drop the handle so the next attempt reopens the file: an
            // unlinked file stays readable through an open handle, and
            // reopening is the only way deletion becomes observable.
            self.file = None;
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Try to read one frame at the cursor without waiting.
    ///
    /// Returns `None` when no complete frame is available yet. Used
    /// directly for one-shot fetches of an already-indexed record.
    pub async fn read_once(&mut self) -> Result<Option<Bytes>> {
        if self.file.is_none() {
            self.file = Some(open_log(&self.path).await?);
        }
        let Some(file) = self.file.as_mut() else {
            return Ok(None);
        };
        match read_frame_at(file, self.cursor).await? {
            ReadFrame::Frame {
                payload,
                next_offset,
            } => {
                self.cursor = next_offset;
                Ok(Some(payload))
            }
            ReadFrame::Incomplete | ReadFrame::EndOfLog => Ok(None),
        }
    }
}

async fn open_log(path: &Path) -> Result<File> {
    match File::open(path).await {
        Ok(file) => Ok(file),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::SourceGone),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[path = "reader_test.rs"]
mod tests;
