//! TCP listener and accept loop

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use taplog_store::OffsetIndex;

use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::metrics::ServerMetrics;
use crate::session::handle_connection;
use crate::state::ServerState;

/// TCP server exposing the record store
pub struct Server {
    config: ServerConfig,
    state: Arc<ServerState>,
    metrics: Arc<ServerMetrics>,
}

impl Server {
    /// Create a server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            state: Arc::new(ServerState::new()),
            metrics: Arc::new(ServerMetrics::new()),
        }
    }

    /// Shared handle to the server's metrics
    pub fn metrics(&self) -> Arc<ServerMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Adopt a log file left over from a previous run, rebuilding its
    /// index so query and single-fetch sessions can read it.
    ///
    /// Generations are stored as `<data_path>.<n>`; the newest leftover
    /// is adopted and older ones are deleted. Returns `false` when no
    /// leftover exists. The adopted log has no writer; the next ingest
    /// session replaces it.
    pub async fn adopt_existing_log(&self) -> Result<bool> {
        let mut leftovers = find_leftover_logs(&self.config.data_path).await?;
        leftovers.sort_by_key(|&(_, generation)| generation);
        let Some((path, generation)) = leftovers.pop() else {
            return Ok(false);
        };
        for (old, _) in leftovers {
            if let Err(e) = tokio::fs::remove_file(&old).await {
                warn!(path = %old.display(), error = %e, "failed to remove old log generation");
            }
        }

        let index = OffsetIndex::rebuild(&path).await?;
        info!(
            records = index.len(),
            path = %path.display(),
            "adopted existing log"
        );
        self.state
            .adopt(path, Arc::new(RwLock::new(index)), generation);
        Ok(true)
    }

    /// Run the accept loop until `cancel` fires.
    ///
    /// Each connection task watches the same token and delivers the quit
    /// sentinel to its client before exiting. Any log file still present
    /// after shutdown is removed.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        let bind_address = self.config.bind_address();
        let listener = TcpListener::bind(&bind_address)
            .await
            .map_err(|e| ServerError::Bind {
                address: bind_address.clone(),
                source: e,
            })?;
        info!(address = %bind_address, "listening");

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            self.metrics.connections.fetch_add(1, Ordering::Relaxed);
                            info!(peer = %peer, "client connected");

                            let state = Arc::clone(&self.state);
                            let metrics = Arc::clone(&self.metrics);
                            let config = self.config.clone();
                            let cancel = cancel.clone();
                            tokio::spawn(async move {
                                let outcome =
                                    handle_connection(stream, state, config, Arc::clone(&metrics), cancel)
                                        .await;
                                metrics.disconnects.fetch_add(1, Ordering::Relaxed);
                                match outcome {
                                    Ok(()) => info!(peer = %peer, "client disconnected"),
                                    Err(e) => debug!(peer = %peer, error = %e, "client connection ended"),
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "failed to accept connection");
                        }
                    }
                }
                _ = cancel.cancelled() => {
                    info!("shutdown requested");
                    break;
                }
            }
        }

        // Let connection tasks deliver the quit sentinel, then clear any
        // log file no ingest session got to remove (e.g. an adopted log).
        tokio::time::sleep(Duration::from_millis(50)).await;
        if let Some(active) = self.state.active()
            && let Err(e) = tokio::fs::remove_file(active.path()).await
            && e.kind() != io::ErrorKind::NotFound
        {
            warn!(error = %e, "failed to remove log file at shutdown");
        }

        let snapshot = self.metrics.snapshot();
        info!(
            connections = snapshot.connections,
            appended = snapshot.records_appended,
            streamed = snapshot.records_streamed,
            fetched = snapshot.records_fetched,
            "server stopped"
        );
        Ok(())
    }

    /// Start the server in a background task
    pub fn spawn(self, cancel: CancellationToken) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run(cancel).await })
    }
}

/// Leftover generation files for the log at `base` (named `<base>.<n>`)
async fn find_leftover_logs(base: &Path) -> Result<Vec<(PathBuf, u64)>> {
    let Some(file_name) = base.file_name().and_then(|n| n.to_str()) else {
        return Ok(Vec::new());
    };
    let prefix = format!("{file_name}.");
    let dir = match base.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut found = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(suffix) = name.to_str().and_then(|n| n.strip_prefix(&prefix)) else {
            continue;
        };
        if let Ok(generation) = suffix.parse::<u64>() {
            found.push((entry.path(), generation));
        }
    }
    Ok(found)
}
