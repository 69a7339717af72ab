//! Transport callbacks fed into the session.

use reelchat_proto::ServerFrame;

/// Events the driver reports from the transport layer.
///
/// Every event carries the generation of the dial that produced it (passed
/// alongside to [`crate::ChatSession::handle_transport`]); events from a
/// superseded generation are discarded without touching state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Connection established.
    Up,

    /// Connection closed by the peer or the network.
    Down {
        /// Human-readable close reason.
        reason: String,
    },

    /// Connection attempt or live stream failed.
    Error {
        /// Transport diagnostic.
        error: String,
    },

    /// Decoded frame from the server.
    Frame(ServerFrame),
}
