//! Chat session state machine.
//!
//! Manages the connection lifecycle, message history, presence set, typing
//! indicators, and the compose debounce for one authenticated identity.
//! Uses the action pattern: methods take time as input and return actions
//! for the driver to execute. This keeps the state machine pure (no I/O)
//! and makes testing straightforward.
//!
//! # State Machine
//!
//! ```text
//! ┌──────────────┐ connect() ┌────────────┐ transport up ┌───────────┐
//! │ Disconnected │──────────>│ Connecting │─────────────>│ Connected │
//! └──────────────┘           └────────────┘              └───────────┘
//!        ↑                     │       ↑                       │
//!        │        error/timeout│       │dial due               │drop
//!        │                     ↓       │                       ↓
//!        │                  ┌──────────────┐  retries   ┌────────┐
//!        │                  │ Reconnecting │───────────>│ Failed │
//!        │                  └──────────────┘ exhausted  └────────┘
//!        │                                                   │
//!        └────────────── disconnect(), any state ────────────┘
//! ```
//!
//! Each dial is tagged with a generation counter. Transport events carry the
//! generation of the dial that produced them; an event whose generation does
//! not match the session's current one belongs to a superseded connection
//! and is discarded without touching state.

use std::{
    collections::HashMap,
    ops::Sub,
    time::{Duration, Instant},
};

use reelchat_proto::{ClientFrame, Join, Message, PresenceEntry, SendMessage, ServerFrame, Typing};

use crate::{
    action::SessionAction,
    config::SessionConfig,
    error::SessionError,
    event::TransportEvent,
    state::{ConnectionState, SessionView},
};

/// Credential the auth layer hands to [`ChatSession::connect`].
///
/// The token is opaque: the session never inspects, refreshes, or transmits
/// it. It is retained for transports that authenticate at dial time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Username announced to the server in the `join` frame.
    pub username: String,

    /// Opaque auth credential.
    pub token: String,
}

impl Identity {
    /// Create an identity from a username and opaque token.
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self { username: username.into(), token: token.into() }
    }
}

/// Internal lifecycle phase with per-phase timestamps.
///
/// `retries_used` counts redials spent in the current connect cycle; it
/// resets once a connection is established.
#[derive(Debug, Clone, Copy)]
enum Phase<I> {
    Disconnected,
    Connecting { started: I, retries_used: u32 },
    Connected,
    Reconnecting { since: I, retries_used: u32 },
    Failed,
}

/// Chat session state machine.
///
/// Owns exactly one logical connection per authenticated identity and
/// presents a consistent view of messages, presence, and typing state via
/// [`ChatSession::view`].
///
/// This is a pure state machine - no I/O, no timers of its own. Time is
/// passed as parameters and timer behavior is driven by [`ChatSession::tick`].
///
/// Generic over `Instant` to support both real time and virtual time for
/// deterministic testing.
#[derive(Debug, Clone)]
pub struct ChatSession<I = Instant>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Configuration.
    config: SessionConfig,
    /// Identity of the current connect cycle. `None` before first connect.
    identity: Option<Identity>,
    /// Lifecycle phase.
    phase: Phase<I>,
    /// Generation of the current connection attempt.
    generation: u64,
    /// Messages in arrival order. Replaced by history snapshots.
    messages: Vec<Message>,
    /// Presence entries, deduplicated by username, first-seen order.
    presence: Vec<PresenceEntry>,
    /// Usernames currently typing, with the time of their last signal.
    typing: HashMap<String, I>,
    /// Time of the last local keystroke, while a trailing `typing:false`
    /// is pending. At most one deadline exists at a time.
    compose_since: Option<I>,
}

impl<I> ChatSession<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Create a session in the disconnected state.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            identity: None,
            phase: Phase::Disconnected,
            generation: 0,
            messages: Vec::new(),
            presence: Vec::new(),
            typing: HashMap::new(),
            compose_since: None,
        }
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        match self.phase {
            Phase::Disconnected => ConnectionState::Disconnected,
            Phase::Connecting { .. } => ConnectionState::Connecting,
            Phase::Connected => ConnectionState::Connected,
            Phase::Reconnecting { .. } => ConnectionState::Reconnecting,
            Phase::Failed => ConnectionState::Failed,
        }
    }

    /// Generation of the current connection attempt.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Identity of the current connect cycle. `None` before first connect.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Snapshot of everything a consumer renders.
    ///
    /// The snapshot is built in one pass over settled state, so it can never
    /// contain a torn combination of fields.
    #[must_use]
    pub fn view(&self) -> SessionView {
        let mut typing: Vec<String> = self.typing.keys().cloned().collect();
        typing.sort_unstable();

        SessionView {
            connection: self.state(),
            messages: self.messages.clone(),
            presence: self.presence.clone(),
            typing,
        }
    }

    /// Start a connect cycle for the given identity.
    ///
    /// Clears all state derived from any previous identity before dialing,
    /// so nothing leaks across identities even if the caller reuses the
    /// session object.
    ///
    /// # Errors
    ///
    /// - [`SessionError::AlreadyActive`] if a connection attempt or live
    ///   connection exists. Call [`ChatSession::disconnect`] first.
    pub fn connect(
        &mut self,
        identity: Identity,
        now: I,
    ) -> Result<Vec<SessionAction>, SessionError> {
        match self.phase {
            Phase::Disconnected | Phase::Failed => {},
            Phase::Connecting { .. } | Phase::Connected | Phase::Reconnecting { .. } => {
                return Err(SessionError::AlreadyActive { state: self.state() });
            },
        }

        self.reset_derived();
        self.identity = Some(identity);
        self.generation += 1;
        self.phase = Phase::Connecting { started: now, retries_used: 0 };

        tracing::debug!(generation = self.generation, "dialing chat server");
        Ok(vec![SessionAction::Dial { generation: self.generation }])
    }

    /// Tear down the session. Idempotent.
    ///
    /// Clears derived state, disarms every pending deadline, and bumps the
    /// generation so events still in flight from the torn-down transport
    /// are discarded on arrival.
    pub fn disconnect(&mut self) -> Vec<SessionAction> {
        if matches!(self.phase, Phase::Disconnected) {
            return Vec::new();
        }

        let stale = self.generation;
        self.generation += 1;
        self.phase = Phase::Disconnected;
        self.reset_derived();

        tracing::debug!(generation = stale, "session disconnected");
        vec![SessionAction::CloseTransport { generation: stale }]
    }

    /// Send a chat message.
    ///
    /// Empty or whitespace-only text is dropped without a server round-trip.
    /// Sending also emits `typing:false`, since a sent message implies the
    /// sender stopped composing.
    ///
    /// # Errors
    ///
    /// - [`SessionError::NotConnected`] unless the session is connected.
    ///   Rejected sends are not buffered; the caller re-sends.
    pub fn send_message(&mut self, text: &str) -> Result<Vec<SessionAction>, SessionError> {
        if text.trim().is_empty() {
            tracing::trace!("dropping empty message");
            return Ok(Vec::new());
        }

        if !matches!(self.phase, Phase::Connected) {
            return Err(SessionError::NotConnected { state: self.state() });
        }

        self.compose_since = None;
        Ok(vec![
            SessionAction::Send(ClientFrame::SendMessage(SendMessage {
                message: text.to_string(),
                room: self.config.room.clone(),
            })),
            SessionAction::Send(ClientFrame::Typing(Typing {
                room: self.config.room.clone(),
                is_typing: false,
            })),
        ])
    }

    /// Record a keystroke in the compose box.
    ///
    /// Emits `typing:true` only on the idle-to-typing edge; every keystroke
    /// re-arms the single trailing deadline that [`ChatSession::tick`] turns
    /// into `typing:false` after the quiet interval. Deadlines re-arm, they
    /// never stack. No-op unless connected.
    pub fn set_composing(&mut self, now: I) -> Vec<SessionAction> {
        if !matches!(self.phase, Phase::Connected) {
            return Vec::new();
        }

        let edge = self.compose_since.is_none();
        self.compose_since = Some(now);

        if edge {
            vec![SessionAction::Send(ClientFrame::Typing(Typing {
                room: self.config.room.clone(),
                is_typing: true,
            }))]
        } else {
            Vec::new()
        }
    }

    /// Process periodic maintenance.
    ///
    /// Drives every timer: the per-dial connect timeout, the scheduled
    /// redial, the compose quiet interval, and the typing idle fallback.
    /// Call this on a coarse interval; all deadlines are compared against
    /// `now`, so tick frequency only affects latency, not correctness.
    pub fn tick(&mut self, now: I) -> Vec<SessionAction> {
        let mut actions = Vec::new();

        match self.phase {
            Phase::Connecting { started, retries_used } => {
                if now - started >= self.config.connect_timeout {
                    tracing::debug!(generation = self.generation, "connect timeout");
                    actions.push(SessionAction::CloseTransport { generation: self.generation });
                    self.schedule_retry(retries_used, now);
                }
            },
            Phase::Reconnecting { since, retries_used } => {
                if now - since >= self.config.reconnect_delay {
                    self.generation += 1;
                    self.phase =
                        Phase::Connecting { started: now, retries_used: retries_used + 1 };
                    tracing::debug!(
                        generation = self.generation,
                        attempt = retries_used + 1,
                        "redialing chat server"
                    );
                    actions.push(SessionAction::Dial { generation: self.generation });
                }
            },
            Phase::Disconnected | Phase::Connected | Phase::Failed => {},
        }

        if let Some(since) = self.compose_since
            && now - since >= self.config.compose_quiet
        {
            self.compose_since = None;
            if matches!(self.phase, Phase::Connected) {
                actions.push(SessionAction::Send(ClientFrame::Typing(Typing {
                    room: self.config.room.clone(),
                    is_typing: false,
                })));
            }
        }

        let idle = self.config.typing_idle_timeout;
        self.typing.retain(|_, seen| now - *seen < idle);

        actions
    }

    /// Process a transport callback.
    ///
    /// `generation` is the tag of the dial that produced the event; events
    /// from superseded generations are discarded. Malformed frames never
    /// reach this method - the transport drops them at decode time.
    pub fn handle_transport(
        &mut self,
        generation: u64,
        event: TransportEvent,
        now: I,
    ) -> Vec<SessionAction> {
        if generation != self.generation {
            tracing::trace!(
                stale = generation,
                current = self.generation,
                "discarding event from superseded connection"
            );
            return Vec::new();
        }

        match event {
            TransportEvent::Up => self.handle_up(),
            TransportEvent::Down { reason } => {
                self.handle_loss(&reason, now);
                Vec::new()
            },
            TransportEvent::Error { error } => {
                self.handle_loss(&error, now);
                Vec::new()
            },
            TransportEvent::Frame(frame) => {
                if matches!(self.phase, Phase::Connected) {
                    self.apply_frame(frame, now);
                } else {
                    tracing::trace!(state = ?self.state(), "dropping frame outside connected state");
                }
                Vec::new()
            },
        }
    }

    fn handle_up(&mut self) -> Vec<SessionAction> {
        let Phase::Connecting { .. } = self.phase else {
            tracing::trace!(state = ?self.state(), "ignoring transport up");
            return Vec::new();
        };

        self.phase = Phase::Connected;

        let Some(identity) = &self.identity else {
            tracing::error!("transport up with no identity set");
            return Vec::new();
        };

        tracing::debug!(username = %identity.username, "transport up, announcing identity");
        vec![SessionAction::Send(ClientFrame::Join(Join { username: identity.username.clone() }))]
    }

    fn handle_loss(&mut self, reason: &str, now: I) {
        match self.phase {
            Phase::Connected => {
                tracing::warn!(reason, "connection dropped");
                // Typing indicators and the compose deadline are connection
                // scoped; history and presence survive until the next
                // snapshot replaces them.
                self.typing.clear();
                self.compose_since = None;
                self.schedule_retry(0, now);
            },
            Phase::Connecting { retries_used, .. } => {
                tracing::debug!(reason, retries_used, "dial failed");
                self.schedule_retry(retries_used, now);
            },
            Phase::Disconnected | Phase::Reconnecting { .. } | Phase::Failed => {},
        }
    }

    fn schedule_retry(&mut self, retries_used: u32, now: I) {
        if retries_used < self.config.reconnect_attempts {
            self.phase = Phase::Reconnecting { since: now, retries_used };
        } else {
            tracing::warn!(
                attempts = self.config.reconnect_attempts,
                "retry budget exhausted, giving up"
            );
            self.phase = Phase::Failed;
        }
    }

    fn apply_frame(&mut self, frame: ServerFrame, now: I) {
        match frame {
            ServerFrame::MessageHistory(history) => {
                tracing::debug!(count = history.len(), "history snapshot");
                self.messages = history;
            },
            ServerFrame::Message(message) => {
                self.messages.push(message);
            },
            ServerFrame::UsersList(entries) => {
                self.presence = dedup_by_username(entries);
            },
            ServerFrame::UserTyping(signal) => {
                if signal.is_typing {
                    self.typing.insert(signal.user, now);
                } else {
                    self.typing.remove(&signal.user);
                }
            },
        }
    }

    fn reset_derived(&mut self) {
        self.messages.clear();
        self.presence.clear();
        self.typing.clear();
        self.compose_since = None;
    }
}

/// Deduplicate a presence list by username.
///
/// The server emits one entry per open connection, so a user with two tabs
/// appears twice. Last entry wins, first-seen position is kept.
fn dedup_by_username(entries: Vec<PresenceEntry>) -> Vec<PresenceEntry> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(entries.len());
    let mut deduped: Vec<PresenceEntry> = Vec::with_capacity(entries.len());

    for entry in entries {
        match index.get(&entry.username) {
            Some(&slot) => deduped[slot] = entry,
            None => {
                index.insert(entry.username.clone(), deduped.len());
                deduped.push(entry);
            },
        }
    }

    deduped
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use reelchat_proto::UserTyping;

    use super::*;

    fn identity(name: &str) -> Identity {
        Identity::new(name, "tok")
    }

    fn message(id: &str, user: &str, body: &str) -> Message {
        Message {
            id: id.into(),
            user: user.into(),
            body: body.into(),
            timestamp: 0,
            system: false,
        }
    }

    fn entry(id: &str, username: &str) -> PresenceEntry {
        PresenceEntry { id: id.into(), username: username.into() }
    }

    /// Drive a fresh session to the connected state, returning its time base.
    fn connected_session() -> (ChatSession, Instant) {
        let t0 = Instant::now();
        let mut session = ChatSession::new(SessionConfig::default());
        session.connect(identity("ada"), t0).unwrap();
        session.handle_transport(session.generation(), TransportEvent::Up, t0);
        (session, t0)
    }

    #[test]
    fn connect_lifecycle() {
        let t0 = Instant::now();
        let mut session: ChatSession = ChatSession::new(SessionConfig::default());
        assert_eq!(session.state(), ConnectionState::Disconnected);

        let actions = session.connect(identity("ada"), t0).unwrap();
        assert_eq!(session.state(), ConnectionState::Connecting);
        let generation = session.generation();
        assert_eq!(actions, vec![SessionAction::Dial { generation }]);

        let actions = session.handle_transport(generation, TransportEvent::Up, t0);
        assert_eq!(session.state(), ConnectionState::Connected);
        assert_eq!(actions, vec![SessionAction::Send(ClientFrame::Join(Join {
            username: "ada".into()
        }))]);
    }

    #[test]
    fn connect_while_active_is_rejected() {
        let (mut session, t0) = connected_session();

        let err = session.connect(identity("bob"), t0).unwrap_err();
        assert_eq!(err, SessionError::AlreadyActive { state: ConnectionState::Connected });

        // Identity unchanged by the rejected call.
        assert_eq!(session.identity().map(|i| i.username.as_str()), Some("ada"));
    }

    #[test]
    fn disconnect_is_idempotent() {
        let (mut session, _) = connected_session();

        let actions = session.disconnect();
        assert_eq!(actions.len(), 1);
        assert_eq!(session.state(), ConnectionState::Disconnected);

        assert!(session.disconnect().is_empty());
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn send_message_requires_connection() {
        let t0 = Instant::now();
        let mut session: ChatSession = ChatSession::new(SessionConfig::default());

        let err = session.send_message("hello").unwrap_err();
        assert_eq!(err, SessionError::NotConnected { state: ConnectionState::Disconnected });

        session.connect(identity("ada"), t0).unwrap();
        let err = session.send_message("hello").unwrap_err();
        assert_eq!(err, SessionError::NotConnected { state: ConnectionState::Connecting });
    }

    #[test]
    fn empty_send_produces_no_actions() {
        let (mut session, _) = connected_session();

        assert!(session.send_message("").unwrap().is_empty());
        assert!(session.send_message("   ").unwrap().is_empty());
        assert!(session.send_message("\t\n").unwrap().is_empty());
    }

    #[test]
    fn send_emits_message_then_typing_false() {
        let (mut session, _) = connected_session();

        let actions = session.send_message("hello").unwrap();
        assert_eq!(actions, vec![
            SessionAction::Send(ClientFrame::SendMessage(SendMessage {
                message: "hello".into(),
                room: "general".into(),
            })),
            SessionAction::Send(ClientFrame::Typing(Typing {
                room: "general".into(),
                is_typing: false,
            })),
        ]);
    }

    #[test]
    fn compose_emits_once_per_burst() {
        let (mut session, t0) = connected_session();

        let mut typing_true = 0;
        for i in 0..5 {
            let at = t0 + Duration::from_millis(200 * i);
            typing_true += session.set_composing(at).len();
        }
        assert_eq!(typing_true, 1);

        // Quiet interval measured from the last keystroke.
        let before_quiet = t0 + Duration::from_millis(800 + 999);
        assert!(session.tick(before_quiet).is_empty());

        let after_quiet = t0 + Duration::from_millis(800 + 1000);
        let actions = session.tick(after_quiet);
        assert_eq!(actions, vec![SessionAction::Send(ClientFrame::Typing(Typing {
            room: "general".into(),
            is_typing: false,
        }))]);

        // Deadline disarmed; nothing further fires.
        assert!(session.tick(after_quiet + Duration::from_secs(5)).is_empty());
    }

    #[test]
    fn send_disarms_compose_deadline() {
        let (mut session, t0) = connected_session();

        session.set_composing(t0);
        session.send_message("hello").unwrap();

        // The trailing typing:false was already emitted by the send.
        assert!(session.tick(t0 + Duration::from_secs(2)).is_empty());
    }

    #[test]
    fn composing_while_disconnected_is_noop() {
        let t0 = Instant::now();
        let mut session: ChatSession = ChatSession::new(SessionConfig::default());
        assert!(session.set_composing(t0).is_empty());
    }

    #[test]
    fn messages_append_in_arrival_order() {
        let (mut session, t0) = connected_session();
        let generation = session.generation();

        session.handle_transport(
            generation,
            TransportEvent::Frame(ServerFrame::MessageHistory(vec![
                message("1", "ada", "first"),
                message("2", "bob", "second"),
            ])),
            t0,
        );
        session.handle_transport(
            generation,
            TransportEvent::Frame(ServerFrame::Message(message("3", "ada", "third"))),
            t0,
        );

        let view = session.view();
        let bodies: Vec<&str> = view.messages.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, ["first", "second", "third"]);
    }

    #[test]
    fn presence_deduplicates_by_username() {
        let (mut session, t0) = connected_session();
        let generation = session.generation();

        session.handle_transport(
            generation,
            TransportEvent::Frame(ServerFrame::UsersList(vec![
                entry("c1", "ada"),
                entry("c2", "bob"),
                entry("c3", "ada"),
            ])),
            t0,
        );

        let view = session.view();
        assert_eq!(view.presence.len(), 2);
        // Last entry wins, first-seen position kept.
        assert_eq!(view.presence[0], entry("c3", "ada"));
        assert_eq!(view.presence[1], entry("c2", "bob"));
    }

    #[test]
    fn typing_clears_on_explicit_false() {
        let (mut session, t0) = connected_session();
        let generation = session.generation();

        let signal = |user: &str, is_typing| {
            TransportEvent::Frame(ServerFrame::UserTyping(UserTyping {
                user: user.into(),
                is_typing,
            }))
        };

        session.handle_transport(generation, signal("bob", true), t0);
        assert_eq!(session.view().typing, vec!["bob".to_string()]);

        session.handle_transport(generation, signal("bob", false), t0);
        assert!(session.view().typing.is_empty());
    }

    #[test]
    fn typing_expires_after_idle_window() {
        let (mut session, t0) = connected_session();
        let generation = session.generation();

        session.handle_transport(
            generation,
            TransportEvent::Frame(ServerFrame::UserTyping(UserTyping {
                user: "bob".into(),
                is_typing: true,
            })),
            t0,
        );

        // Still present inside the idle window.
        session.tick(t0 + Duration::from_secs(4));
        assert_eq!(session.view().typing, vec!["bob".to_string()]);

        // Expires once the window elapses with no stop signal.
        session.tick(t0 + Duration::from_secs(5));
        assert!(session.view().typing.is_empty());
    }

    #[test]
    fn stale_generation_events_are_discarded() {
        let (mut session, t0) = connected_session();
        let stale = session.generation();

        session.disconnect();

        session.handle_transport(
            stale,
            TransportEvent::Frame(ServerFrame::Message(message("9", "ghost", "late"))),
            t0,
        );
        assert!(session.view().messages.is_empty());

        // A stale drop must not disturb a fresh connect cycle either.
        session.connect(identity("ada"), t0).unwrap();
        session.handle_transport(stale, TransportEvent::Down { reason: "late".into() }, t0);
        assert_eq!(session.state(), ConnectionState::Connecting);
    }

    #[test]
    fn identity_change_starts_from_empty_state() {
        let (mut session, t0) = connected_session();
        let generation = session.generation();

        session.handle_transport(
            generation,
            TransportEvent::Frame(ServerFrame::Message(message("1", "ada", "hi"))),
            t0,
        );
        session.handle_transport(
            generation,
            TransportEvent::Frame(ServerFrame::UsersList(vec![entry("c1", "ada")])),
            t0,
        );

        session.disconnect();
        session.connect(identity("bob"), t0).unwrap();

        let view = session.view();
        assert!(view.messages.is_empty());
        assert!(view.presence.is_empty());
        assert!(view.typing.is_empty());
    }

    #[test]
    fn drop_schedules_redial_after_fixed_delay() {
        let (mut session, t0) = connected_session();
        let generation = session.generation();

        session.handle_transport(generation, TransportEvent::Down { reason: "reset".into() }, t0);
        assert_eq!(session.state(), ConnectionState::Reconnecting);

        assert!(session.tick(t0 + Duration::from_millis(999)).is_empty());

        let actions = session.tick(t0 + Duration::from_secs(1));
        assert_eq!(actions, vec![SessionAction::Dial { generation: generation + 1 }]);
        assert_eq!(session.state(), ConnectionState::Connecting);
    }

    #[test]
    fn retry_budget_exhaustion_fails_the_session() {
        let t0 = Instant::now();
        let config = SessionConfig { reconnect_attempts: 2, ..SessionConfig::default() };
        let mut session: ChatSession = ChatSession::new(config);

        session.connect(identity("ada"), t0).unwrap();

        let mut now = t0;
        for _ in 0..2 {
            session.handle_transport(
                session.generation(),
                TransportEvent::Error { error: "refused".into() },
                now,
            );
            assert_eq!(session.state(), ConnectionState::Reconnecting);

            now += Duration::from_secs(1);
            let actions = session.tick(now);
            assert_eq!(actions.len(), 1);
            assert_eq!(session.state(), ConnectionState::Connecting);
        }

        // Third failure exceeds the two-redial budget.
        session.handle_transport(
            session.generation(),
            TransportEvent::Error { error: "refused".into() },
            now,
        );
        assert_eq!(session.state(), ConnectionState::Failed);

        // No further dials out of failed.
        assert!(session.tick(now + Duration::from_secs(60)).is_empty());

        // Explicit reconnect recovers.
        let actions = session.connect(identity("ada"), now).unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(session.state(), ConnectionState::Connecting);
    }

    #[test]
    fn connect_timeout_counts_as_failed_dial() {
        let t0 = Instant::now();
        let mut session: ChatSession = ChatSession::new(SessionConfig::default());
        session.connect(identity("ada"), t0).unwrap();
        let generation = session.generation();

        let actions = session.tick(t0 + Duration::from_secs(10));
        assert_eq!(actions, vec![SessionAction::CloseTransport { generation }]);
        assert_eq!(session.state(), ConnectionState::Reconnecting);
    }

    #[test]
    fn reconnect_resets_retry_budget_after_established_connection() {
        let t0 = Instant::now();
        let config = SessionConfig { reconnect_attempts: 1, ..SessionConfig::default() };
        let mut session: ChatSession = ChatSession::new(config);

        session.connect(identity("ada"), t0).unwrap();
        session.handle_transport(session.generation(), TransportEvent::Up, t0);

        // First drop: one redial available.
        session.handle_transport(
            session.generation(),
            TransportEvent::Down { reason: "reset".into() },
            t0,
        );
        let t1 = t0 + Duration::from_secs(1);
        session.tick(t1);
        session.handle_transport(session.generation(), TransportEvent::Up, t1);
        assert_eq!(session.state(), ConnectionState::Connected);

        // The budget is per cycle: a later drop gets a fresh redial.
        session.handle_transport(
            session.generation(),
            TransportEvent::Down { reason: "reset".into() },
            t1,
        );
        assert_eq!(session.state(), ConnectionState::Reconnecting);
    }

    #[test]
    fn frames_before_connected_are_ignored() {
        let t0 = Instant::now();
        let mut session: ChatSession = ChatSession::new(SessionConfig::default());
        session.connect(identity("ada"), t0).unwrap();

        session.handle_transport(
            session.generation(),
            TransportEvent::Frame(ServerFrame::Message(message("1", "bob", "early"))),
            t0,
        );
        assert!(session.view().messages.is_empty());
    }

    #[test]
    fn drop_clears_typing_but_keeps_history() {
        let (mut session, t0) = connected_session();
        let generation = session.generation();

        session.handle_transport(
            generation,
            TransportEvent::Frame(ServerFrame::Message(message("1", "bob", "hi"))),
            t0,
        );
        session.handle_transport(
            generation,
            TransportEvent::Frame(ServerFrame::UserTyping(UserTyping {
                user: "bob".into(),
                is_typing: true,
            })),
            t0,
        );

        session.handle_transport(generation, TransportEvent::Down { reason: "reset".into() }, t0);

        let view = session.view();
        assert!(view.typing.is_empty());
        assert_eq!(view.messages.len(), 1);
    }
}
