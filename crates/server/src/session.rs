//! Per-connection session handling
//!
//! A connection starts undetermined and is switched into its mode by the
//! first recognized command. The mode is fixed for the life of the
//! connection; there is no way back.
//!
//! - `/insert`: every following line is appended to the log as one
//!   record. On disconnect the log is torn down and its file deleted.
//! - `/query <expr>`: streams every record matching the expression,
//!   including records appended after the session began. Ends when the
//!   log disappears or the client goes away.
//! - `/single <ordinal>`: replies with that record's payload. Further
//!   lines are treated as additional ordinals, one fetch per line.
//!
//! Unrecognized slash commands get an error reply and leave the mode
//! unset so the client may retry.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use taplog_query::{QueryError, QuerySession};
use taplog_store::{RecordLog, StoreError, TailingReader};

use crate::config::ServerConfig;
use crate::error::Result;
use crate::metrics::ServerMetrics;
use crate::state::ServerState;

/// Command that switches a connection into ingest mode
pub const CMD_INSERT: &str = "/insert";
/// Command prefix that switches a connection into query mode
pub const CMD_QUERY: &str = "/query";
/// Command prefix that switches a connection into single-fetch mode
pub const CMD_SINGLE: &str = "/single";

/// Sentinel line sent to every connected client at shutdown
pub const QUIT_SENTINEL: &str = "%quit%";

type CommandLines = Lines<BufReader<OwnedReadHalf>>;

/// Drive one client connection through its session lifecycle
pub async fn handle_connection(
    stream: TcpStream,
    state: Arc<ServerState>,
    config: ServerConfig,
    metrics: Arc<ServerMetrics>,
    cancel: CancellationToken,
) -> Result<()> {
    let (read_half, mut writer) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = cancel.cancelled() => {
                let _ = send_line(&mut writer, QUIT_SENTINEL).await;
                return Ok(());
            }
        };
        let Some(line) = line else {
            // Disconnected before picking a mode.
            return Ok(());
        };
        let command = line.trim_end();

        if command == CMD_INSERT {
            return run_ingest(lines, writer, state, config, metrics, cancel).await;
        }
        if let Some(expression) = command.strip_prefix(CMD_QUERY) {
            return run_query(expression.trim(), lines, writer, state, config, metrics, cancel)
                .await;
        }
        if let Some(ordinal) = command.strip_prefix(CMD_SINGLE) {
            let ordinal = ordinal.trim().to_string();
            return run_single_fetch(ordinal, lines, writer, state, metrics, cancel).await;
        }
        if command.starts_with('/') {
            send_line(&mut writer, "Unrecognized command.").await?;
        } else {
            debug!(line = command, "ignoring data before a mode was chosen");
        }
    }
}

/// Ingest mode: append every line as one record until disconnect, then
/// tear the log down
async fn run_ingest(
    mut lines: CommandLines,
    mut writer: OwnedWriteHalf,
    state: Arc<ServerState>,
    config: ServerConfig,
    metrics: Arc<ServerMetrics>,
    cancel: CancellationToken,
) -> Result<()> {
    let Some((active, evicted)) = state.claim_writer(&config.data_path) else {
        send_line(&mut writer, "error: an ingest session is already active").await?;
        return Ok(());
    };

    // Delete the evicted generation's file so its stale readers observe
    // source-gone; the new log lives at a path of its own.
    if let Some(stale) = evicted
        && let Err(e) = tokio::fs::remove_file(&stale).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!(path = %stale.display(), error = %e, "failed to remove evicted log file");
    }

    let mut log = match RecordLog::create(active.path(), active.index()).await {
        Ok(log) => log,
        Err(e) => {
            state.release(&active);
            return Err(e.into());
        }
    };
    info!(path = %active.path().display(), "ingest session started");

    let result = ingest_loop(&mut lines, &mut log, &mut writer, &metrics, &cancel).await;

    // The log's lifetime is tied to this session: tear it down so tailing
    // readers observe source-gone.
    state.release(&active);
    let records = log.len();
    if let Err(e) = log.remove().await {
        warn!(error = %e, "failed to remove log file");
    }
    info!(records, "ingest session ended, log removed");
    result
}

async fn ingest_loop(
    lines: &mut CommandLines,
    log: &mut RecordLog,
    writer: &mut OwnedWriteHalf,
    metrics: &ServerMetrics,
    cancel: &CancellationToken,
) -> Result<()> {
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(());
                };
                let ordinal = log.append(line.as_bytes()).await?;
                metrics.records_appended.fetch_add(1, Ordering::Relaxed);
                debug!(ordinal, bytes = line.len(), "record appended");
            }
            _ = cancel.cancelled() => {
                let _ = send_line(writer, QUIT_SENTINEL).await;
                return Ok(());
            }
        }
    }
}

/// Query mode: stream matching records until the log disappears or the
/// client goes away
async fn run_query(
    expression: &str,
    mut lines: CommandLines,
    mut writer: OwnedWriteHalf,
    state: Arc<ServerState>,
    config: ServerConfig,
    metrics: Arc<ServerMetrics>,
    cancel: CancellationToken,
) -> Result<()> {
    let Some(active) = state.active() else {
        send_line(&mut writer, "error: no active log").await?;
        return Ok(());
    };

    let reader = TailingReader::new(active.path()).with_poll_interval(config.poll_interval());
    let mut session = match QuerySession::open(reader, expression) {
        Ok(session) => session,
        Err(e) => {
            send_line(&mut writer, &format!("error: {e}")).await?;
            return Ok(());
        }
    };
    info!(filter = expression, "query session started");

    loop {
        tokio::select! {
            matched = session.next_match() => {
                match matched {
                    Ok(payload) => {
                        writer.write_all(&payload).await?;
                        writer.write_all(b"\n").await?;
                        metrics.records_streamed.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(QueryError::Store(StoreError::SourceGone)) => {
                        info!("log removed, query session ended");
                        return Ok(());
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            // Watch the read half so a disconnect stops the reader loop
            // even while no records match. Queries take no further input;
            // anything else the client sends is ignored.
            line = lines.next_line() => {
                if line?.is_none() {
                    debug!("query client disconnected");
                    return Ok(());
                }
            }
            _ = cancel.cancelled() => {
                let _ = send_line(&mut writer, QUIT_SENTINEL).await;
                return Ok(());
            }
        }
    }
}

/// Single-fetch mode: one record per requested ordinal
async fn run_single_fetch(
    first_ordinal: String,
    mut lines: CommandLines,
    mut writer: OwnedWriteHalf,
    state: Arc<ServerState>,
    metrics: Arc<ServerMetrics>,
    cancel: CancellationToken,
) -> Result<()> {
    serve_single(&first_ordinal, &mut writer, &state, &metrics).await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(());
                };
                serve_single(line.trim(), &mut writer, &state, &metrics).await?;
            }
            _ = cancel.cancelled() => {
                let _ = send_line(&mut writer, QUIT_SENTINEL).await;
                return Ok(());
            }
        }
    }
}

async fn serve_single(
    raw_ordinal: &str,
    writer: &mut OwnedWriteHalf,
    state: &ServerState,
    metrics: &ServerMetrics,
) -> Result<()> {
    let Some(active) = state.active() else {
        send_line(writer, "error: no active log").await?;
        return Ok(());
    };
    let Ok(ordinal) = raw_ordinal.parse::<u64>() else {
        send_line(writer, &format!("error: invalid ordinal: {raw_ordinal}")).await?;
        return Ok(());
    };

    let index = active.index();
    let offset = index.read().offset_of(ordinal);
    let offset = match offset {
        Ok(offset) => offset,
        Err(StoreError::OrdinalOutOfRange { .. }) => {
            send_line(writer, &format!("Index out of range: {ordinal}")).await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let mut reader = TailingReader::new(active.path()).with_start_offset(offset);
    match reader.read_once().await {
        Ok(Some(payload)) => {
            writer.write_all(&payload).await?;
            writer.write_all(b"\n").await?;
            metrics.records_fetched.fetch_add(1, Ordering::Relaxed);
        }
        // Indexed but no longer readable (log deleted between the index
        // lookup and the read).
        Ok(None) | Err(StoreError::SourceGone) => {
            send_line(writer, "error: record unavailable").await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

async fn send_line(writer: &mut OwnedWriteHalf, line: &str) -> Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    Ok(())
}
