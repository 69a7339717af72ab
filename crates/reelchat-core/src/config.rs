//! Session configuration.

use std::time::Duration;

/// Channel every session speaks to; the server has no other rooms.
pub const DEFAULT_ROOM: &str = "general";

/// Automatic redials after a failed or dropped connection.
pub const DEFAULT_RECONNECT_ATTEMPTS: u32 = 5;

/// Fixed delay between redials.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Time allowed for a single dial to come up before it counts as failed.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Quiet interval after the last keystroke before `typing:false` goes out.
pub const DEFAULT_COMPOSE_QUIET: Duration = Duration::from_secs(1);

/// Idle window after which a remote typing indicator expires without an
/// explicit `isTyping:false`.
pub const DEFAULT_TYPING_IDLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Session tuning knobs.
///
/// Defaults mirror the transport configuration the historical client shipped
/// with (5 retries, 1 s apart, 10 s connect timeout, 1 s typing debounce).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Target channel for outbound messages and typing signals.
    pub room: String,

    /// Redial budget per connect cycle. Exhausting it lands the session in
    /// the failed state until the user reconnects explicitly.
    pub reconnect_attempts: u32,

    /// Delay between redials. Attempts are sequential, never concurrent.
    pub reconnect_delay: Duration,

    /// Per-dial timeout.
    pub connect_timeout: Duration,

    /// Trailing debounce for outbound `typing:false`.
    pub compose_quiet: Duration,

    /// Defensive expiry for remote typing indicators whose stop signal was
    /// lost (sender crashed mid-type).
    pub typing_idle_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            room: DEFAULT_ROOM.to_string(),
            reconnect_attempts: DEFAULT_RECONNECT_ATTEMPTS,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            compose_quiet: DEFAULT_COMPOSE_QUIET,
            typing_idle_timeout: DEFAULT_TYPING_IDLE_TIMEOUT,
        }
    }
}
