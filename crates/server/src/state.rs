//! Shared server state: the active log
//!
//! At most one log is active at a time, and at most one live ingest
//! session holds its writer. Query and single-fetch sessions only ever
//! see the path and the shared offset index; the writer handle itself is
//! owned by the ingest session's task, never stored here.
//!
//! Every log generation gets its own file name (`<base>.<generation>`).
//! A path is never reused once readers may hold cursors into it: when a
//! log is replaced, the old generation's file is deleted and stale
//! readers observe source-gone instead of misreading the new file's
//! bytes through an old cursor.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::info;

use taplog_store::{OffsetIndex, SharedIndex};

/// File name for one generation of the log at `base`, e.g. `data.bin.3`
pub fn generation_path(base: &Path, generation: u64) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(format!(".{generation}"));
    PathBuf::from(name)
}

/// One log known to the server: its file path and shared index
pub struct ActiveLog {
    path: PathBuf,
    index: SharedIndex,
    /// Whether a live ingest session owns this log's writer. Adopted
    /// logs (rebuilt from a leftover file at startup) have no writer.
    has_writer: bool,
}

impl ActiveLog {
    fn new(path: PathBuf, index: SharedIndex, has_writer: bool) -> Self {
        Self {
            path,
            index,
            has_writer,
        }
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Shared handle to the log's offset index
    pub fn index(&self) -> SharedIndex {
        Arc::clone(&self.index)
    }
}

/// Registry of the (at most one) active log
#[derive(Default)]
pub struct ServerState {
    active: RwLock<Option<Arc<ActiveLog>>>,
    /// Next log generation number; never reused within one server run
    generation: AtomicU64,
}

impl ServerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The currently active log, if any
    pub fn active(&self) -> Option<Arc<ActiveLog>> {
        self.active.read().clone()
    }

    /// Claim the single-writer slot for a new ingest session.
    ///
    /// Fails (returns `None`) while another live ingest session holds the
    /// writer. The new log gets a fresh generation path under `base`; a
    /// writerless adopted log is evicted and its path handed back so the
    /// caller can delete the file, turning its stale readers' next poll
    /// into source-gone.
    pub fn claim_writer(&self, base: &Path) -> Option<(Arc<ActiveLog>, Option<PathBuf>)> {
        let mut guard = self.active.write();
        if let Some(active) = guard.as_ref()
            && active.has_writer
        {
            return None;
        }

        let evicted = guard.take().map(|stale| {
            info!(path = %stale.path().display(), "evicting adopted log for new ingest session");
            stale.path().to_path_buf()
        });

        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let path = generation_path(base, generation);
        let active = Arc::new(ActiveLog::new(path, OffsetIndex::new_shared(), true));
        *guard = Some(Arc::clone(&active));
        Some((active, evicted))
    }

    /// Adopt an existing log file (no writer), e.g. one rebuilt at
    /// startup. `generation` is the adopted file's generation number;
    /// later claims are numbered after it so its path is never reused.
    pub fn adopt(&self, path: PathBuf, index: SharedIndex, generation: u64) {
        self.generation.fetch_max(generation + 1, Ordering::Relaxed);
        let mut guard = self.active.write();
        *guard = Some(Arc::new(ActiveLog::new(path, index, false)));
    }

    /// Drop `log` from the registry if it is still the active one
    pub fn release(&self, log: &Arc<ActiveLog>) {
        let mut guard = self.active.write();
        if let Some(active) = guard.as_ref()
            && Arc::ptr_eq(active, log)
        {
            *guard = None;
        }
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
