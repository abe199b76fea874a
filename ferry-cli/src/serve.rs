//! `ferry serve` — run the file server until Ctrl-C.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use ferry::{Server, ServerConfig};

/// Arguments for `ferry serve`.
#[derive(clap::Args)]
pub struct ServeArgs {
    /// JSON config file; flags below override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on [default: 0.0.0.0:8080].
    #[arg(short, long, env = "FERRY_LISTEN")]
    listen: Option<SocketAddr>,

    /// Directory that uploads are stored in and downloads served from [default: .].
    #[arg(short, long, env = "FERRY_ROOT")]
    root: Option<PathBuf>,
}

impl ServeArgs {
    /// Merges the config file (if any) with the command-line overrides.
    fn into_config(self) -> Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => ServerConfig::default(),
        };
        if let Some(listen) = self.listen {
            config = config.with_listen(listen);
        }
        if let Some(root) = self.root {
            config = config.with_root(root);
        }
        Ok(config)
    }
}

pub async fn serve(args: ServeArgs) -> Result<()> {
    let config = args.into_config()?;
    let server = Server::bind(&config)
        .await
        .with_context(|| format!("failed to listen on {}", config.listen))?;

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "cannot wait for Ctrl-C");
            }
        })
        .await?;
    Ok(())
}
