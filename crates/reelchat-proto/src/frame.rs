//! Frame enums and line codec.
//!
//! A frame travels as one JSON object per line:
//! `{"event": <name>, "data": <payload>}`. Event names are the server's
//! routing key and must match the wire spelling exactly.
//!
//! # Invariants
//!
//! - Encoded frames never contain a newline; the line is the frame boundary.
//! - Inbound lines over [`MAX_FRAME_SIZE`] are rejected before parsing.

use serde::{Deserialize, Serialize};

use crate::{
    error::ProtoError,
    payloads::{Join, Message, PresenceEntry, SendMessage, Typing, UserTyping},
};

/// Cap on a single encoded frame, in bytes.
///
/// Generous for chat traffic; its purpose is to bound memory on hostile or
/// corrupt input, not to limit legitimate messages.
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Frames the client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientFrame {
    /// Announce identity after the transport comes up.
    Join(Join),

    /// Send a chat message.
    SendMessage(SendMessage),

    /// Report composing state.
    Typing(Typing),
}

/// Frames the server sends to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerFrame {
    /// Full history snapshot, sent once after `join`. Replaces any message
    /// list the client holds.
    #[serde(rename = "message_history")]
    MessageHistory(Vec<Message>),

    /// A single new message, appended in arrival order.
    #[serde(rename = "message")]
    Message(Message),

    /// Full presence list. Replaces the client's presence set; may contain
    /// duplicate usernames.
    #[serde(rename = "usersList")]
    UsersList(Vec<PresenceEntry>),

    /// Typing signal about one user.
    #[serde(rename = "userTyping")]
    UserTyping(UserTyping),
}

impl ClientFrame {
    /// Encode to a single wire line (no trailing newline).
    pub fn encode(&self) -> Result<String, ProtoError> {
        encode(self)
    }

    /// Decode from a wire line.
    pub fn decode(line: &str) -> Result<Self, ProtoError> {
        decode(line)
    }
}

impl ServerFrame {
    /// Encode to a single wire line (no trailing newline).
    pub fn encode(&self) -> Result<String, ProtoError> {
        encode(self)
    }

    /// Decode from a wire line.
    pub fn decode(line: &str) -> Result<Self, ProtoError> {
        decode(line)
    }
}

fn encode<T: Serialize>(frame: &T) -> Result<String, ProtoError> {
    let line = serde_json::to_string(frame)?;
    if line.len() > MAX_FRAME_SIZE {
        return Err(ProtoError::Oversized { size: line.len() });
    }
    debug_assert!(!line.contains('\n'));
    Ok(line)
}

fn decode<T: for<'de> Deserialize<'de>>(line: &str) -> Result<T, ProtoError> {
    if line.len() > MAX_FRAME_SIZE {
        return Err(ProtoError::Oversized { size: line.len() });
    }
    Ok(serde_json::from_str(line)?)
}
