//! Packet model shared by client and server.

use std::borrow::Cow;
use std::fmt;

/// Default TCP port of the ferry server.
pub const DEFAULT_PORT: u16 = 8080;

/// Longest name a packet can carry (one length byte).
pub const MAX_NAME: usize = u8::MAX as usize;

/// Largest payload a receiver accepts (2 GiB).
pub const MAX_PAYLOAD: u64 = 1 << 31;

/// Ack message sent after a successful upload.
pub const ACK_UPLOAD: &str = "upload successful";

/// Packet op code.
///
/// Codes outside `1..=4` decode as [`Op::Unknown`] so that a server can
/// answer them instead of dropping the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Op {
    /// File bytes, in either direction (code 1).
    Upload,
    /// Request for a stored file (code 2).
    DownloadRequest,
    /// Success acknowledgement, message in the payload (code 3).
    Ack,
    /// Failure, message in the payload (code 4).
    Error,
    /// Any unrecognized code.
    Unknown(u8),
}

impl From<u8> for Op {
    fn from(code: u8) -> Self {
        match code {
            1 => Self::Upload,
            2 => Self::DownloadRequest,
            3 => Self::Ack,
            4 => Self::Error,
            other => Self::Unknown(other),
        }
    }
}

impl From<Op> for u8 {
    fn from(op: Op) -> Self {
        match op {
            Op::Upload => 1,
            Op::DownloadRequest => 2,
            Op::Ack => 3,
            Op::Error => 4,
            Op::Unknown(code) => code,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upload => f.write_str("upload"),
            Self::DownloadRequest => f.write_str("download-request"),
            Self::Ack => f.write_str("ack"),
            Self::Error => f.write_str("error"),
            Self::Unknown(code) => write!(f, "unknown({code})"),
        }
    }
}

/// A single message on the wire.
///
/// The declared size is always `payload.len()`; an empty payload means
/// "no body".
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Packet {
    /// What the packet asks for or answers with.
    pub op: Op,
    /// Resource name, at most [`MAX_NAME`] bytes. Empty for acks and errors.
    pub name: Vec<u8>,
    /// Body bytes.
    pub payload: Vec<u8>,
}

impl Packet {
    /// Creates a packet from its parts.
    pub fn new(op: Op, name: impl Into<Vec<u8>>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            op,
            name: name.into(),
            payload: payload.into(),
        }
    }

    /// File contents stored under `name`.
    pub fn upload(name: impl Into<Vec<u8>>, payload: impl Into<Vec<u8>>) -> Self {
        Self::new(Op::Upload, name, payload)
    }

    /// Request for the file stored under `name`.
    pub fn download_request(name: impl Into<Vec<u8>>) -> Self {
        Self::new(Op::DownloadRequest, name, Vec::new())
    }

    /// Acknowledgement carrying `msg`.
    pub fn ack(msg: impl Into<String>) -> Self {
        Self::new(Op::Ack, Vec::new(), msg.into())
    }

    /// Error report carrying `msg`.
    pub fn error(msg: impl Into<String>) -> Self {
        Self::new(Op::Error, Vec::new(), msg.into())
    }

    /// Declared payload size.
    pub fn size(&self) -> u64 {
        self.payload.len() as u64
    }

    /// Name as text, with invalid UTF-8 replaced.
    pub fn name_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    /// Payload as text, for ack and error messages.
    pub fn message(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}
