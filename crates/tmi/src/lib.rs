//! # tmi
//!
//! Async client for Twitch-style IRC chat carried over WebSocket.
//!
//! One [`ChatClient`] is one authenticated chat session. It sends the
//! credential handshake as soon as the socket is up, answers the server's
//! `PING` probes, and reports chat traffic to listeners as `ready`,
//! `message`, `notice` and `close` events.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tmi::prelude::*;
//!
//! # async fn demo() -> Result<(), TmiError> {
//! let client = ChatClient::builder()
//!     .on_message(|msg| println!("[{}] {}: {}", msg.channel, msg.user, msg.content))
//!     .connect(Credentials::anonymous());
//!
//! client.wait_for(SessionState::Authenticated).await;
//! client.join_channel("somechannel")?;
//! client.closed().await
//! # }
//! ```
//!
//! There is no reconnection: when `close` fires, build a new client.

mod client;
mod driver;
mod error;

pub use client::{ChatClient, ChatClientBuilder, ChatHandle};
pub use error::TmiError;

pub use tmi_protocol as protocol;
pub use tmi_session as session;
pub use tmi_transport as transport;

pub mod prelude {
    //! The types most programs need.

    pub use crate::{ChatClient, ChatClientBuilder, ChatHandle, TmiError};
    pub use tmi_protocol::{ChatMessage, Credentials, MessageKind, Notice};
    pub use tmi_session::{ChatEvent, SessionConfig, SessionError, SessionState};
}
