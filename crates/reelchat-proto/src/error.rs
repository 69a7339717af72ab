//! Protocol error types.
//!
//! Errors stay `Clone + PartialEq` so state machines and tests can match on
//! them; the underlying serde error is flattened to its display form rather
//! than carried by value.

use thiserror::Error;

use crate::frame::MAX_FRAME_SIZE;

/// Errors produced while encoding or decoding wire frames.
///
/// A malformed inbound frame is a recoverable condition: callers log it and
/// drop the frame, they never tear down the session over it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtoError {
    /// Frame payload did not parse as a known event.
    #[error("malformed frame: {reason}")]
    Malformed {
        /// Parser diagnostic.
        reason: String,
    },

    /// Frame exceeds the line size cap.
    #[error("frame of {size} bytes exceeds cap of {MAX_FRAME_SIZE}")]
    Oversized {
        /// Observed frame size in bytes.
        size: usize,
    },
}

impl From<serde_json::Error> for ProtoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed { reason: err.to_string() }
    }
}
