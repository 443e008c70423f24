//! Error types for the session layer.

/// Errors returned by session commands.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The session has reached `Closed`; nothing more can be sent.
    #[error("session is closed")]
    Closed,

    /// The outbound sink refused a line.
    #[error("failed to queue line: {0}")]
    SendFailed(String),
}
