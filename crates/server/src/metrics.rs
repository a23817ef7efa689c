//! Server metrics
//!
//! Plain atomic counters, shared via `Arc` with every connection task.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for server activity
#[derive(Debug, Default)]
pub struct ServerMetrics {
    /// Connections accepted
    pub connections: AtomicU64,
    /// Connections whose session has ended
    pub disconnects: AtomicU64,
    /// Records appended by ingest sessions
    pub records_appended: AtomicU64,
    /// Matching records streamed to query sessions
    pub records_streamed: AtomicU64,
    /// Records served to single-fetch sessions
    pub records_fetched: AtomicU64,
}

impl ServerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all counters
    pub fn snapshot(&self) -> ServerMetricsSnapshot {
        ServerMetricsSnapshot {
            connections: self.connections.load(Ordering::Relaxed),
            disconnects: self.disconnects.load(Ordering::Relaxed),
            records_appended: self.records_appended.load(Ordering::Relaxed),
            records_streamed: self.records_streamed.load(Ordering::Relaxed),
            records_fetched: self.records_fetched.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of the server counters
#[derive(Debug, Clone, Copy)]
pub struct ServerMetricsSnapshot {
    pub connections: u64,
    pub disconnects: u64,
    pub records_appended: u64,
    pub records_streamed: u64,
    pub records_fetched: u64,
}
