//! Codec errors.

use std::fmt;
use std::io;

/// Alias for `Result<T, ferry_proto::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Packet field being read when a decode failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Field {
    /// The op code byte.
    Op,
    /// The name length byte.
    NameLen,
    /// The name bytes.
    Name,
    /// The 8-byte size.
    Size,
    /// The payload bytes.
    Payload,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Op => "op code",
            Self::NameLen => "name length",
            Self::Name => "name",
            Self::Size => "size",
            Self::Payload => "payload",
        })
    }
}

/// Errors produced while encoding or decoding packets.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The name does not fit in the one-byte length field.
    #[error("name is {0} bytes, limit is 255")]
    NameTooLong(usize),

    /// The stream ended in the middle of a packet.
    #[error("stream ended while reading {0}")]
    ShortRead(Field),

    /// The declared payload size exceeds [`MAX_PAYLOAD`](crate::MAX_PAYLOAD).
    #[error("declared payload of {0} bytes exceeds the 2 GiB limit")]
    PayloadTooLarge(i64),

    /// The declared payload size is negative.
    #[error("negative payload size {0}")]
    NegativeSize(i64),

    /// The underlying transport failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Returns `true` for errors that leave the stream misaligned.
    ///
    /// After a framing error the byte position of the next packet is
    /// unknown, so the connection cannot be used any further.
    pub const fn is_framing(&self) -> bool {
        matches!(
            self,
            Self::ShortRead(_) | Self::PayloadTooLarge(_) | Self::NegativeSize(_)
        )
    }
}
