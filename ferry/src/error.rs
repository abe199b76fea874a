//! Error types for ferry operations.

use std::io;

use ferry_proto::Op;

/// Alias for `Result<T, ferry::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the server, client and configuration loaders.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Encoding or decoding a packet failed.
    #[error(transparent)]
    Proto(#[from] ferry_proto::Error),

    /// A storage handler failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The configuration file could not be parsed.
    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),

    /// The server answered with an error packet.
    #[error("server error: {0}")]
    Remote(String),

    /// The server answered with a packet that does not fit the request.
    #[error("unexpected server response op={0}")]
    UnexpectedResponse(Op),

    /// An I/O error outside the wire protocol.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Failures of the store and retrieve handlers.
///
/// These are reported to the peer as error packets and never end a session.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StorageError {
    /// The name is empty, not UTF-8, absolute, or escapes the root.
    #[error("invalid name {0:?}")]
    InvalidName(String),

    /// No file is stored under the name.
    #[error("{0}: no such file")]
    NotFound(String),

    /// The file exists but could not be read.
    #[error("read {name}: {source}")]
    Read {
        /// Requested name.
        name: String,
        /// Underlying cause.
        source: io::Error,
    },

    /// The file could not be created or written.
    #[error("write {name}: {source}")]
    Write {
        /// Requested name.
        name: String,
        /// Underlying cause.
        source: io::Error,
    },

    /// The file is larger than a packet may carry.
    #[error("{name}: {size} bytes exceeds the 2 GiB transfer limit")]
    TooLarge {
        /// Requested name.
        name: String,
        /// File size on disk.
        size: u64,
    },
}
