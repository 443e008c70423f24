//! Chat session state machine for tmi.
//!
//! This crate owns the protocol behavior of one connection:
//!
//! 1. **Handshake**: PASS / NICK / CAP REQ as soon as the transport is up
//! 2. **Inbound routing**: classified lines become events; probes are
//!    answered on the spot
//! 3. **Outbound commands**: join, leave, host, unhost, send, close
//! 4. **Events**: per-kind [`Listeners`], delivered in registration order
//!
//! # How it fits in the stack
//!
//! ```text
//! Client driver (above)  ← owns the connection, feeds signals in, writes lines out
//!     ↕
//! Session layer (this crate)  ← state machine, no I/O
//!     ↕
//! Protocol layer (below)  ← classify(), Command, Credentials
//! ```

mod error;
mod events;
mod session;
mod sink;

pub use error::SessionError;
pub use events::{ChatEvent, Listeners};
pub use session::{Request, Session, SessionConfig, SessionState};
pub use sink::{LineSink, OutboundBuffer};
