//! Client side of the transfer protocol.
//!
//! Every call sends exactly one request and waits for its response before
//! returning, so a [`Client`] never has more than one request in flight.

use std::path::Path;

use ferry_proto::{Field, Op, Packet};
use tokio::io::{AsyncRead, AsyncWrite, BufStream};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::{Error, Result};

/// A connection to a ferry server.
#[derive(Debug)]
pub struct Client<S = TcpStream> {
    /// Buffered connection stream.
    stream: BufStream<S>,
}

impl Client<TcpStream> {
    /// Connects to a server over TCP.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::new(stream))
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Client<S> {
    /// Wraps an established stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream: BufStream::new(stream),
        }
    }

    /// Stores `data` under `remote` and returns the server's ack message.
    pub async fn upload(&mut self, remote: &str, data: Vec<u8>) -> Result<String> {
        let resp = self.request(&Packet::upload(remote, data)).await?;
        match resp.op {
            Op::Ack => Ok(resp.message().into_owned()),
            Op::Error => Err(Error::Remote(resp.message().into_owned())),
            other => Err(Error::UnexpectedResponse(other)),
        }
    }

    /// Fetches the file stored under `remote`.
    pub async fn download(&mut self, remote: &str) -> Result<Vec<u8>> {
        let resp = self.request(&Packet::download_request(remote)).await?;
        match resp.op {
            Op::Upload => Ok(resp.payload),
            Op::Error => Err(Error::Remote(resp.message().into_owned())),
            other => Err(Error::UnexpectedResponse(other)),
        }
    }

    /// Reads `local` and uploads it as `remote`.
    pub async fn upload_file(&mut self, local: impl AsRef<Path>, remote: &str) -> Result<String> {
        let data = tokio::fs::read(local).await?;
        self.upload(remote, data).await
    }

    /// Downloads `remote` into `local` and returns the byte count.
    ///
    /// Missing parent directories of `local` are created. Nothing is written
    /// if the server reports an error.
    pub async fn download_file(&mut self, remote: &str, local: impl AsRef<Path>) -> Result<u64> {
        let data = self.download(remote).await?;
        let local = local.as_ref();
        if let Some(parent) = local.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(local, &data).await?;
        Ok(data.len() as u64)
    }

    /// Sends `req` and reads the matching response.
    async fn request(&mut self, req: &Packet) -> Result<Packet> {
        ferry_proto::send(&mut self.stream, req).await?;
        ferry_proto::recv(&mut self.stream)
            .await?
            .ok_or(Error::Proto(ferry_proto::Error::ShortRead(Field::Op)))
    }
}
