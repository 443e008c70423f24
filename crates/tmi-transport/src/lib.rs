//! Transport abstraction layer for tmi.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract over
//! the socket carrying chat lines. The session layer only ever sees whole
//! text lines: framing (one WebSocket frame may hold several `\r\n`
//! separated lines) is the transport's job.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket client via `tokio-tungstenite`,
//!   with TLS for `wss://` endpoints

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Opens outgoing connections to a chat server.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Opens a new connection and resolves once it is established.
    async fn connect(&self) -> Result<Self::Connection, Self::Error>;
}

/// A single connection that exchanges text lines with the remote peer.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sends one line. The line must not carry a trailing newline.
    async fn send(&self, line: &str) -> Result<(), Self::Error>;

    /// Receives the next non-empty line from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    /// Implementations must be cancel-safe: dropping the future before it
    /// resolves must not lose a line.
    async fn recv(&self) -> Result<Option<String>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
