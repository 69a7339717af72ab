//! Session error types.

use thiserror::Error;

use crate::state::ConnectionState;

/// Errors returned by session operations.
///
/// Both variants are synchronous rejections of a caller mistake; neither
/// changes session state. Transport failures are not errors here — they flow
/// in as [`crate::TransportEvent`]s and drive the retry policy instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// `connect` called while a connection attempt or live connection
    /// exists. Callers must `disconnect` first.
    #[error("connection already active (state {state:?})")]
    AlreadyActive {
        /// State at the time of the call.
        state: ConnectionState,
    },

    /// Send attempted while not connected. Nothing is buffered; the caller
    /// re-sends after the session reports connected again.
    #[error("not connected (state {state:?})")]
    NotConnected {
        /// State at the time of the call.
        state: ConnectionState,
    },
}
