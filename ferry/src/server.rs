//! TCP listener and per-connection session spawning.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{BufReader, BufWriter};
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};

use crate::Result;
use crate::config::ServerConfig;
use crate::session::Session;
use crate::storage::Storage;

/// Pause after a failed accept, so descriptor exhaustion does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// A bound ferry server.
#[derive(Debug)]
pub struct Server {
    /// Accepting socket.
    listener: TcpListener,
    /// Root shared (by clone) with every session.
    storage: Storage,
}

impl Server {
    /// Creates the storage root and binds the listen address.
    pub async fn bind(config: &ServerConfig) -> Result<Self> {
        tokio::fs::create_dir_all(&config.root).await?;
        let listener = TcpListener::bind(config.listen).await?;
        Ok(Self {
            listener,
            storage: Storage::new(&config.root),
        })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections forever.
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Accepts connections until `shutdown` resolves.
    ///
    /// Each connection runs on its own task; sessions already in flight are
    /// left to finish when the loop stops.
    pub async fn run_until(self, shutdown: impl Future<Output = ()>) -> Result<()> {
        info!(addr = %self.local_addr()?, root = %self.storage.root().display(), "listening");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let storage = self.storage.clone();
                        tokio::spawn(serve_connection(stream, peer, storage));
                    }
                    Err(e) => accept_failed(&e).await,
                },
            }
        }
    }
}

/// Runs one session to completion and logs how it ended.
async fn serve_connection(stream: TcpStream, peer: SocketAddr, storage: Storage) {
    info!(%peer, "client connected");
    let (reader, writer) = stream.into_split();
    let mut session = Session::new(BufReader::new(reader), BufWriter::new(writer), storage);

    match session.run().await {
        Ok(()) => info!(%peer, served = session.served(), "client disconnected"),
        Err(e) => error!(%peer, served = session.served(), error = %e, "session closed"),
    }
}

/// Logs a failed accept and waits before the next one.
async fn accept_failed(e: &io::Error) {
    warn!(error = %e, "accept failed");
    tokio::time::sleep(ACCEPT_BACKOFF).await;
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    #[tokio::test]
    async fn accept_failure_backs_off() {
        let err = io::Error::other("too many open files");
        let start = Instant::now();
        accept_failed(&err).await;
        assert!(start.elapsed() >= ACCEPT_BACKOFF);
    }
}
