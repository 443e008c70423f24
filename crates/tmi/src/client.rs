//! `ChatClient` builder and handles.
//!
//! This is the entry point for running a chat session. It ties together all
//! the layers: transport → protocol → session.

use std::ops::Deref;
use std::time::{Duration, Instant};

use tmi_protocol::{ChatMessage, Credentials, Notice};
use tmi_session::{
    ChatEvent, Listeners, OutboundBuffer, Request, Session, SessionConfig,
    SessionError, SessionState,
};
use tmi_transport::WebSocketTransport;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::driver::{drive, Status};
use crate::TmiError;

/// Builder for configuring and starting a chat client.
///
/// # Example
///
/// ```rust,no_run
/// use tmi::prelude::*;
///
/// # async fn demo() -> Result<(), TmiError> {
/// let mut builder = ChatClient::builder()
///     .on_message(|msg| println!("{}: {}", msg.user, msg.content));
/// let mut events = builder.subscribe();
///
/// let client = builder.connect(Credentials::new("bot", "abc123"));
/// while let Some(event) = events.recv().await {
///     if event == ChatEvent::Ready {
///         client.join_channel("bar")?;
///     }
/// }
/// client.closed().await
/// # }
/// ```
pub struct ChatClientBuilder {
    config: SessionConfig,
    listeners: Listeners,
}

impl ChatClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
            listeners: Listeners::new(),
        }
    }

    /// Sets the WebSocket URL to connect to.
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.endpoint = url.into();
        self
    }

    /// Sets the capability requested during the handshake.
    pub fn capability(mut self, capability: impl Into<String>) -> Self {
        self.config.capability = capability.into();
        self
    }

    /// Replaces the whole session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn on_ready(mut self, listener: impl FnMut() + Send + 'static) -> Self {
        self.listeners.on_ready(listener);
        self
    }

    pub fn on_message(
        mut self,
        listener: impl FnMut(&ChatMessage) + Send + 'static,
    ) -> Self {
        self.listeners.on_message(listener);
        self
    }

    pub fn on_notice(mut self, listener: impl FnMut(&Notice) + Send + 'static) -> Self {
        self.listeners.on_notice(listener);
        self
    }

    pub fn on_close(mut self, listener: impl FnMut() + Send + 'static) -> Self {
        self.listeners.on_close(listener);
        self
    }

    /// Returns a receiver that gets every event as a [`ChatEvent`].
    ///
    /// The channel is itself a listener: it sees each event after the
    /// callbacks registered before this call.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ChatEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.listeners.forward(tx);
        rx
    }

    /// Starts the session.
    ///
    /// Returns immediately with the client in the `Connecting` state; the
    /// connection and handshake happen on a spawned task. Must be called
    /// from within a Tokio runtime.
    pub fn connect(self, credentials: Credentials) -> ChatClient {
        let transport = WebSocketTransport::new(self.config.endpoint.clone());
        let username = credentials.username().to_owned();
        tracing::info!(%username, endpoint = %self.config.endpoint, "starting chat session");

        let session = Session::new(
            credentials,
            self.config,
            OutboundBuffer::new(),
            self.listeners,
        );
        let (status_tx, status_rx) = watch::channel(Status::of(&session));
        let (request_tx, request_rx) = mpsc::unbounded_channel();

        let driver = tokio::spawn(drive(transport, session, request_rx, status_tx));

        ChatClient {
            handle: ChatHandle {
                requests: request_tx,
                status: status_rx,
                username,
            },
            driver,
        }
    }
}

impl Default for ChatClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// ChatClient
// ---------------------------------------------------------------------------

/// A running chat session.
///
/// Dereferences to [`ChatHandle`] for the command API. Use
/// [`handle`](Self::handle) to get a clone that can move into other tasks.
pub struct ChatClient {
    handle: ChatHandle,
    driver: JoinHandle<Result<(), TmiError>>,
}

impl ChatClient {
    /// Creates a new builder.
    pub fn builder() -> ChatClientBuilder {
        ChatClientBuilder::new()
    }

    /// Connects to the default endpoint with no listeners.
    pub fn connect(credentials: Credentials) -> Self {
        ChatClientBuilder::new().connect(credentials)
    }

    /// A cloneable handle to this session.
    pub fn handle(&self) -> ChatHandle {
        self.handle.clone()
    }

    /// Waits for the session to end.
    ///
    /// Returns the error that ended the connection, if any. A close
    /// requested through [`ChatHandle::close`] or a clean close from the
    /// server is `Ok`.
    pub async fn closed(self) -> Result<(), TmiError> {
        // Keep our handle alive while waiting: dropping the last handle
        // closes the connection.
        let ChatClient {
            handle: _handle,
            driver,
        } = self;
        driver.await?
    }
}

impl Deref for ChatClient {
    type Target = ChatHandle;

    fn deref(&self) -> &ChatHandle {
        &self.handle
    }
}

// ---------------------------------------------------------------------------
// ChatHandle
// ---------------------------------------------------------------------------

/// Command API for a running session.
///
/// Every command is queued for the driver task and returns immediately;
/// nothing waits for the server. Commands fail with
/// [`SessionError::Closed`] once the session has closed.
#[derive(Clone)]
pub struct ChatHandle {
    requests: mpsc::UnboundedSender<Request>,
    status: watch::Receiver<Status>,
    username: String,
}

impl ChatHandle {
    /// Sends `JOIN #channel`.
    pub fn join_channel(&self, channel: &str) -> Result<(), SessionError> {
        self.request(Request::Join(channel.to_owned()))
    }

    /// Sends `PART #channel`.
    pub fn leave_channel(&self, channel: &str) -> Result<(), SessionError> {
        self.request(Request::Leave(channel.to_owned()))
    }

    /// Hosts `channel` on this user's own channel.
    pub fn host_channel(&self, channel: &str) -> Result<(), SessionError> {
        self.request(Request::Host(channel.to_owned()))
    }

    /// Stops hosting on this user's own channel.
    pub fn unhost_channel(&self) -> Result<(), SessionError> {
        self.request(Request::Unhost)
    }

    /// Sends `text` to `channel`.
    pub fn send_message(&self, channel: &str, text: &str) -> Result<(), SessionError> {
        self.request(Request::Send {
            channel: channel.to_owned(),
            text: text.to_owned(),
        })
    }

    /// Closes the connection. No QUIT is sent. Closing an already closed
    /// session is a no-op.
    pub fn close(&self) {
        let _ = self.request(Request::Close);
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn state(&self) -> SessionState {
        self.status.borrow().state
    }

    /// When the server last sent `PING`; the session's creation time if it
    /// never has. Watchdogs compare this against their own deadline.
    pub fn last_ping(&self) -> Instant {
        self.status.borrow().last_ping
    }

    pub fn since_last_ping(&self) -> Duration {
        self.last_ping().elapsed()
    }

    /// Resolves once the session reaches `state`, or has closed.
    pub async fn wait_for(&self, state: SessionState) -> SessionState {
        let mut status = self.status.clone();
        match status
            .wait_for(|s| s.state == state || s.state == SessionState::Closed)
            .await
        {
            Ok(s) => s.state,
            // Driver gone without a final publish; treat as closed.
            Err(_) => SessionState::Closed,
        }
    }

    fn request(&self, request: Request) -> Result<(), SessionError> {
        if self.state() == SessionState::Closed {
            return Err(SessionError::Closed);
        }
        self.requests.send(request).map_err(|_| SessionError::Closed)
    }
}

impl std::fmt::Debug for ChatHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatHandle")
            .field("username", &self.username)
            .field("state", &self.state())
            .finish()
    }
}
