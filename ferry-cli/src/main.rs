//! CLI for the ferry file transfer server and client.

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::missing_docs_in_private_items
)]

mod serve;
mod transfer;

use anyhow::Result;
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ferry", version, about = "Send whole files to and from a ferry server")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the file server.
    Serve(serve::ServeArgs),

    /// Upload a local file to the server.
    Upload(transfer::UploadArgs),

    /// Download a file from the server.
    Download(transfer::DownloadArgs),

    /// Generate shell completion scripts.
    #[command(hide = true)]
    Completion {
        /// Target shell.
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, matches!(cli.command, Command::Serve(_)));

    if let Err(e) = cli.dispatch().await {
        eprintln!("ferry: {e:#}");
        std::process::exit(1);
    }
}

impl Cli {
    async fn dispatch(self) -> Result<()> {
        match self.command {
            Command::Serve(args) => serve::serve(args).await,
            Command::Upload(args) => transfer::upload(args).await,
            Command::Download(args) => transfer::download(args).await,
            Command::Completion { shell } => {
                clap_complete::generate(shell, &mut Self::command(), "ferry", &mut std::io::stdout());
                Ok(())
            }
        }
    }
}

/// Installs the log subscriber. `RUST_LOG` wins over `-v`.
///
/// The server logs at info by default; client commands only report
/// warnings so their own output stays readable.
fn init_tracing(verbose: u8, server: bool) {
    let level = match (verbose, server) {
        (0, false) => "warn",
        (0, true) => "info",
        (1, _) => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
