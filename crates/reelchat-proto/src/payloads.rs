//! Payload records carried by wire frames.
//!
//! Field names serialize to the wire spelling the server expects; Rust-side
//! names stay snake_case.

use serde::{Deserialize, Serialize};

/// A single chat message.
///
/// Messages are append-only from the client's perspective: a history
/// snapshot arrives once on connect, later messages arrive one at a time.
/// There is no client-side edit or delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Server-assigned message ID.
    pub id: String,

    /// Author username. For system messages this is the server's label.
    pub user: String,

    /// Message body text.
    #[serde(rename = "message")]
    pub body: String,

    /// Unix timestamp in milliseconds.
    pub timestamp: u64,

    /// True for server-generated notices (joins, leaves). The server omits
    /// the field for ordinary user messages.
    #[serde(default, skip_serializing_if = "is_false")]
    pub system: bool,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_false(flag: &bool) -> bool {
    !flag
}

/// One connected user, as reported by the presence list.
///
/// The server may report the same username once per open connection;
/// deduplication by username is the client's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceEntry {
    /// Server-assigned connection ID.
    pub id: String,

    /// Username of the connected user.
    pub username: String,
}

/// Identity announcement sent immediately after the transport comes up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Join {
    /// Username to announce.
    pub username: String,
}

/// Outbound chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessage {
    /// Message body text.
    pub message: String,

    /// Target channel.
    pub room: String,
}

/// Outbound typing signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Typing {
    /// Target channel.
    pub room: String,

    /// True while the sender is composing, false once they stop.
    pub is_typing: bool,
}

/// Inbound typing signal about another user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTyping {
    /// Username the signal is about.
    pub user: String,

    /// True while that user is composing.
    pub is_typing: bool,
}
