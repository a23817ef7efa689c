//! `tail` subcommand: stream matching records from a running server

use anyhow::{Context, Result};
use clap::Args;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use taplog_server::session::{CMD_QUERY, QUIT_SENTINEL};

#[derive(Args, Debug)]
pub struct TailArgs {
    /// Filter expression, e.g. "brand.name == 'Ford'"
    pub expression: String,

    /// Server to connect to
    #[arg(long, default_value = "127.0.0.1:8000")]
    pub connect: String,
}

pub async fn run(args: TailArgs) -> Result<()> {
    let stream = TcpStream::connect(&args.connect)
        .await
        .with_context(|| format!("connecting to {}", args.connect))?;
    let (read_half, mut writer) = stream.into_split();

    writer
        .write_all(format!("{CMD_QUERY} {}\n", args.expression).as_bytes())
        .await?;

    let mut lines = BufReader::new(read_half).lines();
    while let Some(line) = lines.next_line().await? {
        if line == QUIT_SENTINEL {
            break;
        }
        println!("{line}");
    }
    Ok(())
}
