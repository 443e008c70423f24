//! Core protocol types: credentials, channel names, and the structured
//! payloads produced by classifying inbound lines.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Wire constants
// ---------------------------------------------------------------------------

/// Default chat endpoint. TLS on the standard port.
pub const DEFAULT_ENDPOINT: &str = "wss://irc-ws.chat.twitch.tv:443";

/// Host the server names itself as in `PING` and expects back in `PONG`.
pub const SERVER_HOST: &str = "tmi.twitch.tv";

/// Capability requested during the handshake. Enables the server's
/// extended command set (NOTICE, HOSTTARGET, ...).
pub const COMMANDS_CAPABILITY: &str = "twitch.tv/commands";

/// Prefix every password token must carry on the `PASS` line.
pub const TOKEN_PREFIX: &str = "oauth:";

/// Sigil that marks a channel name.
pub const CHANNEL_SIGIL: char = '#';

/// Username prefix the server accepts for unauthenticated, read-only logins.
const ANONYMOUS_PREFIX: &str = "justinfan";

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Returns `name` with a leading `#`, adding it only when missing.
///
/// ```
/// use tmi_protocol::normalize_channel;
///
/// assert_eq!(normalize_channel("foo"), "#foo");
/// assert_eq!(normalize_channel("#foo"), "#foo");
/// ```
pub fn normalize_channel(name: &str) -> String {
    if name.starts_with(CHANNEL_SIGIL) {
        name.to_owned()
    } else {
        format!("{CHANNEL_SIGIL}{name}")
    }
}

/// Returns `token` carrying exactly one `oauth:` prefix.
pub fn normalize_token(token: &str) -> String {
    if token.starts_with(TOKEN_PREFIX) {
        token.to_owned()
    } else {
        format!("{TOKEN_PREFIX}{token}")
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Login credentials for one chat session.
///
/// The token is normalized once, here, and never changes afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    token: String,
}

impl Credentials {
    /// Creates credentials, prefixing `token` with `oauth:` if needed.
    pub fn new(username: impl Into<String>, token: impl AsRef<str>) -> Self {
        Self {
            username: username.into(),
            token: normalize_token(token.as_ref()),
        }
    }

    /// Read-only anonymous login (`justinfan<random digits>`).
    ///
    /// The server lets these sessions join channels and read chat, but
    /// rejects anything they try to send.
    pub fn anonymous() -> Self {
        let suffix: u32 = rand::rng().random_range(1_000..100_000);
        Self::new(format!("{ANONYMOUS_PREFIX}{suffix}"), "anonymous")
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Whether these are [`Credentials::anonymous`] credentials.
    pub fn is_anonymous(&self) -> bool {
        self.username.starts_with(ANONYMOUS_PREFIX)
    }
}

/// Never prints the token; it ends up in logs otherwise.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Classified payloads
// ---------------------------------------------------------------------------

/// Which command carried a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageKind {
    /// A regular channel message.
    Privmsg,
    /// A direct user-to-user message.
    Whisper,
}

impl MessageKind {
    /// The wire keyword for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Privmsg => "PRIVMSG",
            Self::Whisper => "WHISPER",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PRIVMSG" => Ok(Self::Privmsg),
            "WHISPER" => Ok(Self::Whisper),
            other => Err(ProtocolError::UnknownMessageKind(other.to_owned())),
        }
    }
}

/// A chat line addressed to a channel or, for whispers, to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Sender's nickname.
    pub user: String,
    /// Sender's `user@host` part of the prefix.
    pub host: String,
    pub kind: MessageKind,
    /// Target exactly as sent: `#channel` for PRIVMSG, a username for
    /// WHISPER.
    pub channel: String,
    /// Everything after the first ` :` following the target. May contain
    /// colons.
    pub content: String,
}

impl ChatMessage {
    pub fn is_whisper(&self) -> bool {
        self.kind == MessageKind::Whisper
    }
}

/// An administrative notice from the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub host: String,
    pub channel: String,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_channel_adds_sigil() {
        assert_eq!(normalize_channel("foo"), "#foo");
    }

    #[test]
    fn test_normalize_channel_keeps_existing_sigil() {
        assert_eq!(normalize_channel("#foo"), "#foo");
    }

    #[test]
    fn test_normalize_channel_is_idempotent() {
        for raw in ["foo", "#foo", "", "##double", "bar_baz"] {
            let once = normalize_channel(raw);
            assert_eq!(normalize_channel(&once), once, "input {raw:?}");
        }
    }

    #[test]
    fn test_normalize_token_adds_prefix_once() {
        let token = normalize_token("abc123");
        assert_eq!(token, "oauth:abc123");
        assert_eq!(token.matches(TOKEN_PREFIX).count(), 1);
    }

    #[test]
    fn test_normalize_token_is_idempotent() {
        let once = normalize_token("abc123");
        assert_eq!(normalize_token(&once), once);
        assert_eq!(normalize_token("oauth:xyz"), "oauth:xyz");
    }

    #[test]
    fn test_credentials_new_normalizes_token() {
        let creds = Credentials::new("bot", "abc123");
        assert_eq!(creds.username(), "bot");
        assert_eq!(creds.token(), "oauth:abc123");
    }

    #[test]
    fn test_credentials_debug_redacts_token() {
        let creds = Credentials::new("bot", "supersecret");
        let printed = format!("{creds:?}");
        assert!(printed.contains("bot"));
        assert!(!printed.contains("supersecret"));
    }

    #[test]
    fn test_credentials_anonymous_uses_justinfan() {
        let creds = Credentials::anonymous();
        assert!(creds.is_anonymous());
        let digits = &creds.username()[ANONYMOUS_PREFIX.len()..];
        assert!(!digits.is_empty());
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
        assert!(creds.token().starts_with(TOKEN_PREFIX));
    }

    #[test]
    fn test_message_kind_parse_and_display() {
        assert_eq!("PRIVMSG".parse::<MessageKind>(), Ok(MessageKind::Privmsg));
        assert_eq!("WHISPER".parse::<MessageKind>(), Ok(MessageKind::Whisper));
        assert_eq!(MessageKind::Whisper.to_string(), "WHISPER");
    }

    #[test]
    fn test_message_kind_parse_is_case_sensitive() {
        assert_eq!(
            "privmsg".parse::<MessageKind>(),
            Err(ProtocolError::UnknownMessageKind("privmsg".into()))
        );
    }

    #[test]
    fn test_message_kind_serializes_as_wire_keyword() {
        let json = serde_json::to_string(&MessageKind::Privmsg).unwrap();
        assert_eq!(json, "\"PRIVMSG\"");
    }
}
