//! `ferry upload` / `ferry download` — one request, one response.

use std::path::PathBuf;

use anyhow::{Context, Result};
use ferry::Client;

/// Default server address for client commands.
const DEFAULT_ADDR: &str = "127.0.0.1:8080";

/// Arguments for `ferry upload`.
///
/// Usage: `ferry upload [OPTIONS] LOCAL REMOTE`
#[derive(clap::Args)]
pub struct UploadArgs {
    /// File to send.
    local: PathBuf,

    /// Name to store it under on the server.
    remote: String,

    /// Server address.
    #[arg(short, long, env = "FERRY_ADDR", default_value = DEFAULT_ADDR)]
    addr: String,
}

/// Arguments for `ferry download`.
///
/// Usage: `ferry download [OPTIONS] REMOTE LOCAL`
#[derive(clap::Args)]
pub struct DownloadArgs {
    /// Name of the file on the server.
    remote: String,

    /// Where to write it locally.
    local: PathBuf,

    /// Server address.
    #[arg(short, long, env = "FERRY_ADDR", default_value = DEFAULT_ADDR)]
    addr: String,
}

pub async fn upload(args: UploadArgs) -> Result<()> {
    let mut client = connect(&args.addr).await?;
    let ack = client
        .upload_file(&args.local, &args.remote)
        .await
        .with_context(|| format!("upload {} failed", args.local.display()))?;
    println!("Server ACK: {ack}");
    Ok(())
}

pub async fn download(args: DownloadArgs) -> Result<()> {
    let mut client = connect(&args.addr).await?;
    let n = client
        .download_file(&args.remote, &args.local)
        .await
        .with_context(|| format!("download {} failed", args.remote))?;
    println!(
        "Downloaded {} -> {} ({n} bytes)",
        args.remote,
        args.local.display()
    );
    Ok(())
}

async fn connect(addr: &str) -> Result<Client> {
    Client::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))
}
