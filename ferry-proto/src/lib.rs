//! Wire protocol for ferry file transfer.
//!
//! A connection carries a sequence of [`Packet`]s with no outer envelope.
//! Each packet is laid out field by field, multi-byte integers big-endian:
//!
//! ```text
//! [op: u8][name_len: u8][name: name_len bytes][size: i64][payload: size bytes]
//! ```
//!
//! The receiver learns the payload length before reading it, so a single
//! packet never costs more than [`MAX_PAYLOAD`] bytes of memory.

mod codec;
mod error;
mod packet;

pub use codec::{recv, send};
pub use error::{Error, Field, Result};
pub use packet::{ACK_UPLOAD, DEFAULT_PORT, MAX_NAME, MAX_PAYLOAD, Op, Packet};
