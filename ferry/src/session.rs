//! Per-connection request loop.
//!
//! A [`Session`] reads one packet, answers it, and reads the next, until the
//! peer closes the stream or the stream breaks. Storage failures are sent
//! back as error packets and the session carries on; framing and transport
//! failures close it.

use ferry_proto::{ACK_UPLOAD, Op, Packet};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

use crate::Result;
use crate::storage::Storage;

/// Whether a session still accepts requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionState {
    /// Waiting for the next request.
    Open,
    /// The stream ended or failed; nothing more is processed.
    Closed,
}

/// Request/response loop over one connection.
#[derive(Debug)]
pub struct Session<R, W> {
    /// Read half of the connection.
    reader: R,
    /// Write half of the connection.
    writer: W,
    /// Handlers for upload and download requests.
    storage: Storage,
    /// Current state.
    state: SessionState,
    /// Requests answered so far.
    served: u64,
}

impl<R, W> Session<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates an open session.
    pub const fn new(reader: R, writer: W, storage: Storage) -> Self {
        Self {
            reader,
            writer,
            storage,
            state: SessionState::Open,
            served: 0,
        }
    }

    /// Current state.
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Number of requests answered.
    pub const fn served(&self) -> u64 {
        self.served
    }

    /// Serves requests until the session closes.
    ///
    /// Returns `Ok(())` when the peer closed the stream between packets and
    /// the error otherwise.
    pub async fn run(&mut self) -> Result<()> {
        while self.state == SessionState::Open {
            self.step().await?;
        }
        Ok(())
    }

    /// Reads one request and writes its response.
    ///
    /// Any error closes the session.
    pub async fn step(&mut self) -> Result<()> {
        if self.state == SessionState::Closed {
            return Ok(());
        }
        let result = self.exchange().await;
        if result.is_err() {
            self.state = SessionState::Closed;
        }
        result
    }

    /// One decode/dispatch/respond cycle.
    async fn exchange(&mut self) -> Result<()> {
        let Some(request) = ferry_proto::recv(&mut self.reader).await? else {
            debug!("peer closed the stream");
            self.state = SessionState::Closed;
            return Ok(());
        };
        debug!(op = %request.op, name = %request.name_lossy(), size = request.size(), "request");

        let response = dispatch(&self.storage, request).await;
        ferry_proto::send(&mut self.writer, &response).await?;
        self.served += 1;
        Ok(())
    }
}

/// Runs the handler for `request` and builds the response packet.
async fn dispatch(storage: &Storage, request: Packet) -> Packet {
    match request.op {
        Op::Upload => {
            let stored = storage.store(&request.name, &request.payload).await;
            match stored {
                Ok(()) => {
                    info!(name = %request.name_lossy(), size = request.size(), "stored file");
                    Packet::ack(ACK_UPLOAD)
                }
                Err(e) => {
                    warn!(error = %e, "upload failed");
                    Packet::error(e.to_string())
                }
            }
        }
        Op::DownloadRequest => {
            let retrieved = storage.retrieve(&request.name).await;
            match retrieved {
                Ok(data) => {
                    info!(name = %request.name_lossy(), size = data.len(), "served file");
                    Packet::upload(request.name, data)
                }
                Err(e) => {
                    warn!(error = %e, "download failed");
                    Packet::error(e.to_string())
                }
            }
        }
        Op::Unknown(code) => {
            warn!(code, "unknown operation");
            Packet::error("unknown operation")
        }
        other => {
            warn!(op = %other, "unexpected operation");
            Packet::error(format!("unexpected operation {other}"))
        }
    }
}
