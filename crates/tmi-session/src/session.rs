//! The session state machine.
//!
//! A [`Session`] performs no I/O. Whoever owns the connection feeds it the
//! three transport signals (connected, line, closed) one at a time, and
//! writes out whatever the session queued on its [`LineSink`] before
//! feeding the next signal. That keeps the probe reply strictly ordered
//! after the probe and before any later line is looked at.

use std::time::Instant;

use tmi_protocol::{
    classify, normalize_channel, Command, Credentials, Inbound,
    COMMANDS_CAPABILITY, DEFAULT_ENDPOINT, SERVER_HOST,
};

use crate::{ChatEvent, LineSink, Listeners, SessionError};

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for a chat session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// WebSocket URL of the chat server.
    ///
    /// Default: `wss://irc-ws.chat.twitch.tv:443`.
    pub endpoint: String,

    /// Capability requested in the handshake's `CAP REQ` line.
    ///
    /// Default: `twitch.tv/commands`.
    pub capability: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            capability: COMMANDS_CAPABILITY.to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Lifecycle of a session.
///
/// ```text
///   Connecting ──(connected)──→ Authenticated ──(closed)──→ Closed
///       │                                                     ↑
///       └──────────────────────(closed)───────────────────────┘
/// ```
///
/// There is no way back out of `Closed`; a new connection needs a new
/// session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the transport to come up.
    Connecting,
    /// Handshake sent. Commands are meaningful from here on.
    Authenticated,
    /// Transport closed. Terminal.
    Closed,
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// An outbound command, in a form that can be queued across tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Join(String),
    Leave(String),
    Host(String),
    Unhost,
    Send { channel: String, text: String },
    Close,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One chat connection's protocol state.
pub struct Session<S: LineSink> {
    credentials: Credentials,
    config: SessionConfig,
    state: SessionState,
    last_ping: Instant,
    close_requested: bool,
    sink: S,
    listeners: Listeners,
}

impl<S: LineSink> Session<S> {
    /// Creates a session in the `Connecting` state.
    ///
    /// The last-ping timestamp starts at construction time.
    pub fn new(
        credentials: Credentials,
        config: SessionConfig,
        sink: S,
        listeners: Listeners,
    ) -> Self {
        Self {
            credentials,
            config,
            state: SessionState::Connecting,
            last_ping: Instant::now(),
            close_requested: false,
            sink,
            listeners,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// When the server last probed this session with `PING`.
    pub fn last_ping(&self) -> Instant {
        self.last_ping
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn listeners_mut(&mut self) -> &mut Listeners {
        &mut self.listeners
    }

    // -- Transport signals ------------------------------------------------

    /// The transport is up: send PASS, NICK and CAP REQ, in that order,
    /// then raise `ready`.
    ///
    /// Ignored unless the session is still `Connecting`.
    pub fn handle_connected(&mut self) -> Result<(), SessionError> {
        if self.state != SessionState::Connecting {
            tracing::warn!(state = ?self.state, "connected signal ignored");
            return Ok(());
        }

        let handshake = [
            Command::Pass(self.credentials.token().to_owned()),
            Command::Nick(self.credentials.username().to_owned()),
            Command::CapReq(self.config.capability.clone()),
        ];
        for command in handshake {
            self.sink.send_line(command.to_string())?;
        }

        self.state = SessionState::Authenticated;
        tracing::info!(
            username = self.credentials.username(),
            "handshake sent, session authenticated"
        );
        self.listeners.emit(&ChatEvent::Ready);
        Ok(())
    }

    /// Routes one inbound line.
    ///
    /// Messages and notices become events. A probe refreshes the last-ping
    /// timestamp and queues the PONG before this returns. Anything else is
    /// dropped.
    pub fn handle_line(&mut self, line: &str) -> Result<(), SessionError> {
        if self.state == SessionState::Closed {
            tracing::debug!(line, "line after close ignored");
            return Ok(());
        }

        match classify(line) {
            Some(Inbound::Message(msg)) => {
                tracing::debug!(user = %msg.user, channel = %msg.channel, kind = %msg.kind, "message");
                self.listeners.emit(&ChatEvent::Message(msg));
            }
            Some(Inbound::Notice(notice)) => {
                tracing::debug!(channel = %notice.channel, "notice");
                self.listeners.emit(&ChatEvent::Notice(notice));
            }
            Some(Inbound::Ping) => {
                self.last_ping = Instant::now();
                tracing::debug!("ping received, answering");
                self.sink
                    .send_line(Command::Pong(SERVER_HOST.to_owned()).to_string())?;
            }
            None => tracing::trace!(line, "unrecognized line ignored"),
        }
        Ok(())
    }

    /// The transport closed. Raises `close` the first time only.
    ///
    /// Returns `true` if this call performed the transition.
    pub fn handle_closed(&mut self) -> bool {
        if self.state == SessionState::Closed {
            return false;
        }
        self.state = SessionState::Closed;
        tracing::info!(username = self.credentials.username(), "session closed");
        self.listeners.emit(&ChatEvent::Close);
        true
    }

    // -- Outbound commands ------------------------------------------------

    /// `JOIN <#channel>`
    pub fn join_channel(&mut self, channel: &str) -> Result<(), SessionError> {
        self.send(Command::Join(normalize_channel(channel)))
    }

    /// `PART <#channel>`
    pub fn leave_channel(&mut self, channel: &str) -> Result<(), SessionError> {
        self.send(Command::Part(normalize_channel(channel)))
    }

    /// Asks the server to host `channel` on our own channel.
    pub fn host_channel(&mut self, channel: &str) -> Result<(), SessionError> {
        let text = format!(".host {}", normalize_channel(channel));
        self.send(Command::Privmsg {
            target: self.own_channel(),
            text,
        })
    }

    /// Stops hosting on our own channel.
    pub fn unhost_channel(&mut self) -> Result<(), SessionError> {
        self.send(Command::Privmsg {
            target: self.own_channel(),
            text: ".unhost".to_owned(),
        })
    }

    /// `PRIVMSG <#channel> :<text>`
    pub fn send_message(
        &mut self,
        channel: &str,
        text: &str,
    ) -> Result<(), SessionError> {
        self.send(Command::Privmsg {
            target: normalize_channel(channel),
            text: text.to_owned(),
        })
    }

    /// Requests the transport be closed. No QUIT line is sent; `close`
    /// is raised when the transport reports it has closed.
    ///
    /// Repeated calls, and calls after `Closed`, do nothing.
    pub fn close(&mut self) {
        if self.state == SessionState::Closed || self.close_requested {
            return;
        }
        self.close_requested = true;
        tracing::debug!("close requested");
        self.sink.close();
    }

    /// Applies a queued [`Request`].
    pub fn handle_request(&mut self, request: Request) -> Result<(), SessionError> {
        match request {
            Request::Join(channel) => self.join_channel(&channel),
            Request::Leave(channel) => self.leave_channel(&channel),
            Request::Host(channel) => self.host_channel(&channel),
            Request::Unhost => self.unhost_channel(),
            Request::Send { channel, text } => self.send_message(&channel, &text),
            Request::Close => {
                self.close();
                Ok(())
            }
        }
    }

    fn own_channel(&self) -> String {
        normalize_channel(self.credentials.username())
    }

    fn send(&mut self, command: Command) -> Result<(), SessionError> {
        if self.state == SessionState::Closed {
            return Err(SessionError::Closed);
        }
        self.sink.send_line(command.to_string())
    }
}

impl<S: LineSink + std::fmt::Debug> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("credentials", &self.credentials)
            .field("state", &self.state)
            .field("last_ping", &self.last_ping)
            .field("sink", &self.sink)
            .field("listeners", &self.listeners)
            .finish()
    }
}

// =========================================================================
// Tests
// =========================================================================
