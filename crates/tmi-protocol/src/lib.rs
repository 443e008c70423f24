//! Wire protocol for tmi.
//!
//! This crate defines the text-line grammar the chat server speaks:
//!
//! - **Types** ([`Credentials`], [`ChatMessage`], [`Notice`], ...) and the
//!   normalization rules for tokens and channel names.
//! - **Commands** ([`Command`]): every line the client sends.
//! - **Classification** ([`classify`], [`Inbound`]): what an inbound
//!   line means, if anything.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw lines) and session
//! (state machine and events). It holds no state and performs no I/O.
//!
//! ```text
//! Transport (lines) → Protocol (Inbound / Command) → Session (events)
//! ```

mod classify;
mod command;
mod error;
mod types;

pub use classify::{classify, Inbound};
pub use command::Command;
pub use error::ProtocolError;
pub use types::{
    normalize_channel, normalize_token, ChatMessage, Credentials, MessageKind,
    Notice, CHANNEL_SIGIL, COMMANDS_CAPABILITY, DEFAULT_ENDPOINT, SERVER_HOST,
    TOKEN_PREFIX,
};
