//! Field-by-field packet codec over any byte stream.
//!
//! Every field is read with a full-fill read: the call returns only once the
//! whole field has arrived, or fails. A stream that closes before the first
//! byte of a packet is a clean end and decodes to `None`; closing anywhere
//! later is [`Error::ShortRead`].

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Field, Result};
use crate::packet::{MAX_PAYLOAD, Op, Packet};

/// Bytes of op, name length and size.
const FIXED_HEADER: usize = 1 + 1 + 8;

impl Packet {
    /// Serializes the packet into a fresh buffer.
    ///
    /// Fails if the name does not fit in one length byte or the payload is
    /// larger than any receiver accepts.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let name_len =
            u8::try_from(self.name.len()).map_err(|_| Error::NameTooLong(self.name.len()))?;
        let size = wire_size(self.payload.len())?;

        let mut buf = Vec::with_capacity(FIXED_HEADER + self.name.len() + self.payload.len());
        buf.push(self.op.into());
        buf.push(name_len);
        buf.extend_from_slice(&self.name);
        buf.extend_from_slice(&size.to_be_bytes());
        buf.extend_from_slice(&self.payload);
        Ok(buf)
    }
}

/// Encodes `packet`, writes it to `w` and flushes.
pub async fn send(w: &mut (impl AsyncWrite + Unpin), packet: &Packet) -> Result<()> {
    let buf = packet.encode()?;
    w.write_all(&buf).await?;
    w.flush().await?;
    Ok(())
}

/// Reads one packet from `r`.
///
/// Returns `Ok(None)` if the stream ended before the packet started.
pub async fn recv(r: &mut (impl AsyncRead + Unpin)) -> Result<Option<Packet>> {
    let mut op = [0u8; 1];
    if r.read(&mut op).await? == 0 {
        return Ok(None);
    }

    let mut name_len = [0u8; 1];
    r.read_exact(&mut name_len)
        .await
        .map_err(|e| short_read(e, Field::NameLen))?;

    let mut name = vec![0u8; usize::from(name_len[0])];
    r.read_exact(&mut name)
        .await
        .map_err(|e| short_read(e, Field::Name))?;

    let mut size = [0u8; 8];
    r.read_exact(&mut size)
        .await
        .map_err(|e| short_read(e, Field::Size))?;

    let mut payload = vec![0u8; payload_len(i64::from_be_bytes(size))?];
    r.read_exact(&mut payload)
        .await
        .map_err(|e| short_read(e, Field::Payload))?;

    Ok(Some(Packet::new(Op::from(op[0]), name, payload)))
}

/// Size field for a payload of `len` bytes.
fn wire_size(len: usize) -> Result<i64> {
    let size = i64::try_from(len).unwrap_or(i64::MAX);
    if size.unsigned_abs() > MAX_PAYLOAD {
        return Err(Error::PayloadTooLarge(size));
    }
    Ok(size)
}

/// Validates a declared size before anything is allocated for it.
fn payload_len(size: i64) -> Result<usize> {
    if size < 0 {
        return Err(Error::NegativeSize(size));
    }
    if size.unsigned_abs() > MAX_PAYLOAD {
        return Err(Error::PayloadTooLarge(size));
    }
    usize::try_from(size).map_err(|_| Error::PayloadTooLarge(size))
}

/// Maps an early EOF to [`Error::ShortRead`] for `field`.
fn short_read(e: io::Error, field: Field) -> Error {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        Error::ShortRead(field)
    } else {
        Error::Io(e)
    }
}
