//! Whole-file transfer over a single framed TCP connection.
//!
//! A [`Server`] hands every accepted connection to its own [`Session`],
//! which answers upload and download requests against a rooted
//! [`Storage`]. A [`Client`] issues one request at a time over the same
//! connection.
//!
//! # Quick start
//!
//! ```no_run
//! # async fn demo() -> ferry::Result<()> {
//! use ferry::{Client, Server, ServerConfig};
//!
//! let config = ServerConfig::default().with_root("/srv/ferry");
//! let server = Server::bind(&config).await?;
//! tokio::spawn(server.run());
//!
//! let mut client = Client::connect("127.0.0.1:8080").await?;
//! client.upload("notes/today.txt", b"hello".to_vec()).await?;
//! let data = client.download("notes/today.txt").await?;
//! assert_eq!(data, b"hello");
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod server;
mod session;
mod storage;

pub use client::Client;
pub use config::ServerConfig;
pub use error::{Error, Result, StorageError};
pub use ferry_proto::{Op, Packet};
pub use server::Server;
pub use session::{Session, SessionState};
pub use storage::Storage;
