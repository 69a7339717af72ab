//! Client-side error types.

use reelchat_core::SessionError;
use thiserror::Error;

/// Transport errors.
///
/// These feed the session's bounded retry policy as
/// [`reelchat_core::TransportEvent::Error`]; they are not surfaced to
/// consumers directly.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Established stream failed.
    #[error("stream error: {0}")]
    Stream(String),
}

/// Errors surfaced through [`crate::ChatHandle`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The driver task has shut down; the handle is dead.
    #[error("chat driver has shut down")]
    DriverGone,

    /// The session rejected the operation.
    #[error(transparent)]
    Session(#[from] SessionError),
}
