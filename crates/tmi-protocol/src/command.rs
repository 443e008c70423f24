//! Outbound protocol lines.
//!
//! Every line the client writes is built from a [`Command`]. Rendering is
//! done through `Display`, so `command.to_string()` is exactly the text
//! handed to the transport (without a line terminator).

use std::fmt;

/// A single outbound protocol line.
///
/// Channel-carrying variants hold the name as given; callers normalize
/// with [`normalize_channel`](crate::normalize_channel) first. Nothing
/// here validates its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `PASS <token>`
    Pass(String),
    /// `NICK <username>`
    Nick(String),
    /// `CAP REQ :<capability>`
    CapReq(String),
    /// `JOIN <channel>`
    Join(String),
    /// `PART <channel>`
    Part(String),
    /// `PRIVMSG <target> :<text>`
    Privmsg { target: String, text: String },
    /// `PONG :<host>`
    Pong(String),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass(token) => write!(f, "PASS {token}"),
            Self::Nick(username) => write!(f, "NICK {username}"),
            Self::CapReq(capability) => write!(f, "CAP REQ :{capability}"),
            Self::Join(channel) => write!(f, "JOIN {channel}"),
            Self::Part(channel) => write!(f, "PART {channel}"),
            Self::Privmsg { target, text } => {
                write!(f, "PRIVMSG {target} :{text}")
            }
            Self::Pong(host) => write!(f, "PONG :{host}"),
        }
    }
}
