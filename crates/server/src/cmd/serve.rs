//! `serve` subcommand: run the record store server

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::info;

use taplog_server::{Server, ServerConfig};

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, default_value = "0.0.0.0")]
    pub address: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8000)]
    pub port: u16,

    /// Path of the log file
    #[arg(long, default_value = "data.bin")]
    pub data_path: PathBuf,

    /// Tailing poll interval in milliseconds
    #[arg(long, default_value_t = 10)]
    pub poll_interval_ms: u64,
}

pub async fn run(args: ServeArgs) -> Result<()> {
    let config = ServerConfig::default()
        .with_address(args.address)
        .with_port(args.port)
        .with_data_path(&args.data_path)
        .with_poll_interval_ms(args.poll_interval_ms);

    let server = Server::new(config);
    if server.adopt_existing_log().await? {
        info!("serving records left over from a previous run");
    }

    // Ctrl-C broadcasts the quit sentinel to every client and stops the
    // accept loop.
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            signal_cancel.cancel();
        }
    });

    server.run(cancel).await?;
    Ok(())
}
