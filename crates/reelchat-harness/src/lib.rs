//! Deterministic test harness for the chat session.
//!
//! The session state machine takes time as a parameter, so tests never need
//! a wall clock: [`SimClock`] hands out [`SimInstant`]s that advance only
//! when a test says so, and [`SessionSim`] bundles a session with a clock
//! plus shorthand for the drive-advance-assert loop every timer test runs.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

use std::{ops::Sub, time::Duration};

use reelchat_core::{
    ChatSession, Identity, SessionAction, SessionConfig, SessionError, TransportEvent,
};
use reelchat_proto::{ClientFrame, ServerFrame};

/// Virtual point in time, measured from the clock's origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SimInstant(Duration);

impl Sub for SimInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

/// Virtual clock. Time moves only through [`SimClock::advance`].
#[derive(Debug, Clone, Default)]
pub struct SimClock {
    now: Duration,
}

impl SimClock {
    /// Clock at the origin.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    #[must_use]
    pub fn now(&self) -> SimInstant {
        SimInstant(self.now)
    }

    /// Move time forward.
    pub fn advance(&mut self, delta: Duration) {
        self.now += delta;
    }
}

/// Session plus clock, driven entirely in virtual time.
#[derive(Debug)]
pub struct SessionSim {
    /// Virtual clock feeding every session call.
    pub clock: SimClock,
    /// Session under test.
    pub session: ChatSession<SimInstant>,
}

impl SessionSim {
    /// Session in the disconnected state at the clock origin.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self { clock: SimClock::new(), session: ChatSession::new(config) }
    }

    /// Session already connected as `username`, join frame consumed.
    #[must_use]
    pub fn connected(username: &str) -> Self {
        Self::connected_with(username, SessionConfig::default())
    }

    /// Session already connected as `username` under the given config.
    #[must_use]
    pub fn connected_with(username: &str, config: SessionConfig) -> Self {
        let mut sim = Self::new(config);
        let connected = sim.connect(username);
        debug_assert!(connected.is_ok(), "fresh session rejected connect");
        let actions = sim.transport_up();
        debug_assert_eq!(actions.len(), 1, "expected the join frame");
        sim
    }

    /// Connect as `username` with a throwaway token.
    ///
    /// # Errors
    ///
    /// Propagates [`SessionError::AlreadyActive`] from the session.
    pub fn connect(&mut self, username: &str) -> Result<Vec<SessionAction>, SessionError> {
        self.session.connect(Identity::new(username, "test-token"), self.clock.now())
    }

    /// Report transport up for the current generation.
    pub fn transport_up(&mut self) -> Vec<SessionAction> {
        self.handle(TransportEvent::Up)
    }

    /// Report transport loss for the current generation.
    pub fn transport_down(&mut self, reason: &str) -> Vec<SessionAction> {
        self.handle(TransportEvent::Down { reason: reason.to_string() })
    }

    /// Deliver a server frame on the current generation.
    pub fn deliver(&mut self, frame: ServerFrame) -> Vec<SessionAction> {
        self.handle(TransportEvent::Frame(frame))
    }

    /// Feed a transport event tagged with the current generation.
    pub fn handle(&mut self, event: TransportEvent) -> Vec<SessionAction> {
        let generation = self.session.generation();
        self.session.handle_transport(generation, event, self.clock.now())
    }

    /// Advance virtual time and run one tick.
    pub fn advance(&mut self, delta: Duration) -> Vec<SessionAction> {
        self.clock.advance(delta);
        self.session.tick(self.clock.now())
    }
}

/// Frames contained in `Send` actions, in order.
#[must_use]
pub fn sent_frames(actions: &[SessionAction]) -> Vec<&ClientFrame> {
    actions
        .iter()
        .filter_map(|action| match action {
            SessionAction::Send(frame) => Some(frame),
            _ => None,
        })
        .collect()
}

/// Count of outbound typing signals with the given polarity.
#[must_use]
pub fn typing_signals(actions: &[SessionAction], is_typing: bool) -> usize {
    sent_frames(actions)
        .iter()
        .filter(|frame| matches!(frame, ClientFrame::Typing(t) if t.is_typing == is_typing))
        .count()
}
