//! taplog - append-only record store served over TCP
//!
//! # Usage
//!
//! ```bash
//! # Run the server (default)
//! taplog
//! taplog serve --port 8000 --data-path data.bin
//!
//! # Stream records matching a filter from a running server
//! taplog tail "brand.name == 'Ford'"
//!
//! # Fetch one record by ordinal
//! taplog get 2
//! ```

mod cmd;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use taplog_server::ServerConfig;

/// taplog - append-only record store served over TCP
#[derive(Parser, Debug)]
#[command(name = "taplog")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the record store server
    Serve(cmd::serve::ServeArgs),

    /// Stream records matching a filter from a running server
    Tail(cmd::tail::TailArgs),

    /// Fetch one record by ordinal from a running server
    Get(cmd::get::GetArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Serve(args)) => {
            init_logging(&cli.log_level)?;
            cmd::serve::run(args).await
        }
        Some(Command::Tail(args)) => {
            init_logging("warn")?;
            cmd::tail::run(args).await
        }
        Some(Command::Get(args)) => {
            init_logging("warn")?;
            cmd::get::run(args).await
        }
        // No subcommand = run the server with default settings
        None => {
            init_logging(&cli.log_level)?;
            let defaults = ServerConfig::default();
            let args = cmd::serve::ServeArgs {
                address: defaults.address,
                port: defaults.port,
                data_path: defaults.data_path,
                poll_interval_ms: defaults.poll_interval_ms,
            };
            cmd::serve::run(args).await
        }
    }
}

/// Initialize the tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(false))
        .with(filter)
        .init();

    Ok(())
}
