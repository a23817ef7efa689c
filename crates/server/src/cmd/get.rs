//! `get` subcommand: fetch one record by ordinal

use anyhow::{Context, Result, bail};
use clap::Args;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use taplog_server::session::CMD_SINGLE;

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Zero-based ordinal of the record to fetch
    pub ordinal: u64,

    /// Server to connect to
    #[arg(long, default_value = "127.0.0.1:8000")]
    pub connect: String,
}

pub async fn run(args: GetArgs) -> Result<()> {
    let stream = TcpStream::connect(&args.connect)
        .await
        .with_context(|| format!("connecting to {}", args.connect))?;
    let (read_half, mut writer) = stream.into_split();

    writer
        .write_all(format!("{CMD_SINGLE} {}\n", args.ordinal).as_bytes())
        .await?;

    let mut lines = BufReader::new(read_half).lines();
    match lines.next_line().await? {
        Some(line) => println!("{line}"),
        None => bail!("server closed the connection without a reply"),
    }
    Ok(())
}
