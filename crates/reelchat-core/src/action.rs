//! Session side-effects.
//!
//! The session state machine never performs I/O; it returns these
//! instructions for the driver to execute in order.

use reelchat_proto::ClientFrame;

/// Actions produced by the session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Open a transport connection, tagged with the generation that every
    /// resulting [`crate::TransportEvent`] must carry.
    Dial {
        /// Generation of this connection attempt.
        generation: u64,
    },

    /// Send a frame to the server.
    Send(ClientFrame),

    /// Tear down the transport belonging to the given generation. Drivers
    /// ignore this for generations they no longer hold.
    CloseTransport {
        /// Generation of the connection to close.
        generation: u64,
    },
}
