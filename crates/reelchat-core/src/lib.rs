//! Chat session core for reelchat.
//!
//! Pure state machine for one client-side chat session: connection
//! lifecycle, message history, presence, and typing state. The session does
//! no I/O of its own; it consumes user operations and transport callbacks,
//! takes the current time as a parameter, and returns [`SessionAction`]s for
//! a driver to execute. The same code runs against real sockets in
//! production and against a virtual clock in tests.
//!
//! # Components
//!
//! - [`ChatSession`]: the session state machine
//! - [`SessionAction`]: instructions for the driver (dial, send, close)
//! - [`TransportEvent`]: callbacks the driver feeds back in
//! - [`SessionView`]: atomic snapshot consumers observe
//! - [`SessionConfig`]: retry, timeout, and debounce tuning

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod config;
mod error;
mod event;
mod session;
mod state;

pub use action::SessionAction;
pub use config::SessionConfig;
pub use error::SessionError;
pub use event::TransportEvent;
pub use reelchat_proto::{Message, PresenceEntry};
pub use session::{ChatSession, Identity};
pub use state::{ConnectionState, SessionView};
