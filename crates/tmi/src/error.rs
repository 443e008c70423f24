//! Unified error type for the tmi client.

use tmi_protocol::ProtocolError;
use tmi_session::SessionError;
use tmi_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// Listeners never see these: a failed connection is only ever a `close`
/// event to them. The error is available to whoever awaits
/// [`ChatClient::closed`](crate::ChatClient::closed).
#[derive(Debug, thiserror::Error)]
pub enum TmiError {
    /// A transport-level error (connect, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (closed, sink failure).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The driver task panicked or was aborted.
    #[error("session driver task failed: {0}")]
    Driver(#[from] tokio::task::JoinError),
}
