//! Wire contract for the reelchat socket protocol.
//!
//! The chat server speaks a JSON event protocol: each frame is one JSON
//! object per line, `{"event": <name>, "data": <payload>}`. Event and field
//! names on the wire are the server's contract and are preserved exactly
//! (camelCase and all); Rust-side names follow Rust conventions with serde
//! renames bridging the two.
//!
//! # Components
//!
//! - [`ClientFrame`]: frames the client emits (`join`, `sendMessage`,
//!   `typing`)
//! - [`ServerFrame`]: frames the server emits (`message_history`, `message`,
//!   `usersList`, `userTyping`)
//! - [`Message`], [`PresenceEntry`]: the records those frames carry

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod error;
mod frame;
mod payloads;

pub use error::ProtoError;
pub use frame::{ClientFrame, MAX_FRAME_SIZE, ServerFrame};
pub use payloads::{Join, Message, PresenceEntry, SendMessage, Typing, UserTyping};
