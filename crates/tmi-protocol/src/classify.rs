//! Inbound line classification.
//!
//! A raw line is tried against three patterns in fixed order: chat message,
//! notice, liveness probe. The first match wins. Lines that match none are
//! not an error; the server sends plenty of chatter (numerics, JOIN echoes,
//! CAP ACK, ...) that the session has no use for.
//!
//! Patterns are unanchored, so a line with an IRCv3 tag prefix still
//! classifies on its command part.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::{ChatMessage, Notice};

/// `:<user>!<host> (PRIVMSG|WHISPER) <channel> :<content>`
///
/// User, host and channel are lazy so they stop at the first delimiter;
/// content is greedy to the end of the line.
static MESSAGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r":(?P<user>[^ ]+?)!(?P<host>[^ ]+?) (?P<kind>PRIVMSG|WHISPER) (?P<channel>[^ ]+?) :(?P<content>.*)",
    )
    .expect("message pattern is valid")
});

/// `:<host> NOTICE <channel> :<content>`
static NOTICE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r":(?P<host>[^ ]+?) NOTICE (?P<channel>[^ ]+?) :(?P<content>.*)")
        .expect("notice pattern is valid")
});

static PING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"PING :tmi\.twitch\.tv").expect("ping pattern is valid")
});

/// The result of classifying one inbound line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Message(ChatMessage),
    Notice(Notice),
    /// The server's liveness probe. Must be answered with a PONG.
    Ping,
}

/// Classifies one raw line. Returns `None` for lines of no known shape.
pub fn classify(line: &str) -> Option<Inbound> {
    if let Some(caps) = MESSAGE_PATTERN.captures(line) {
        return Some(Inbound::Message(ChatMessage {
            user: group(&caps, "user"),
            host: group(&caps, "host"),
            kind: caps.name("kind")?.as_str().parse().ok()?,
            channel: group(&caps, "channel"),
            content: group(&caps, "content"),
        }));
    }
    if let Some(caps) = NOTICE_PATTERN.captures(line) {
        return Some(Inbound::Notice(Notice {
            host: group(&caps, "host"),
            channel: group(&caps, "channel"),
            content: group(&caps, "content"),
        }));
    }
    if PING_PATTERN.is_match(line) {
        return Some(Inbound::Ping);
    }
    None
}

fn group(caps: &Captures<'_>, name: &str) -> String {
    caps.name(name)
        .map(|m| m.as_str().to_owned())
        .unwrap_or_default()
}
