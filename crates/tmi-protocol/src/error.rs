//! Error types for the protocol layer.
//!
//! Classification never fails: a line that matches no known shape is simply
//! not classified. The errors here cover the typed conversions around the
//! grammar.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// A message command keyword that is neither `PRIVMSG` nor `WHISPER`.
    #[error("unknown message kind: {0}")]
    UnknownMessageKind(String),
}
