//! Tokio driver and transport for the reelchat session.
//!
//! The session state machine in [`reelchat_core`] is pure; this crate wires
//! it to the real world:
//!
//! - [`transport::TcpTransport`]: newline-delimited JSON over TCP, exposed
//!   as a channel pair serviced by a background task
//! - [`Driver`]: the event loop that owns a [`ChatSession`], serializes user
//!   commands, transport events, and timer ticks through one task, and
//!   executes the actions the session emits
//! - [`ChatHandle`]: the consumer facade - commands in, atomic
//!   [`SessionView`] snapshots out via a watch channel

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod driver;
mod error;
pub mod transport;

pub use driver::{ChatHandle, Command, Driver};
pub use error::{ClientError, TransportError};
pub use reelchat_core::{
    ChatSession, ConnectionState, Identity, SessionConfig, SessionError, SessionView,
    TransportEvent,
};
