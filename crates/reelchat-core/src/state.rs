//! Observable session state types.
//!
//! [`SessionView`] is the view model the display layer renders. The session
//! hands out whole snapshots rather than references into live state, so a
//! consumer never observes a half-applied update.

use reelchat_proto::{Message, PresenceEntry};
use serde::Serialize;

/// Connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    /// No connection and none wanted.
    Disconnected,
    /// Dial in flight.
    Connecting,
    /// Transport up, identity announced.
    Connected,
    /// Waiting out the fixed delay before the next redial.
    Reconnecting,
    /// Retry budget exhausted. Only an explicit reconnect leaves this state.
    Failed,
}

/// Atomic snapshot of everything a consumer renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    /// Connection lifecycle state.
    pub connection: ConnectionState,

    /// Messages in arrival order.
    pub messages: Vec<Message>,

    /// Presence entries, deduplicated by username, in first-seen order.
    pub presence: Vec<PresenceEntry>,

    /// Usernames currently typing, sorted for stable display.
    pub typing: Vec<String>,
}

impl Default for SessionView {
    fn default() -> Self {
        Self {
            connection: ConnectionState::Disconnected,
            messages: Vec::new(),
            presence: Vec::new(),
            typing: Vec::new(),
        }
    }
}
