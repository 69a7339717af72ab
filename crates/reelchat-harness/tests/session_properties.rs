//! Property-based tests for the session state machine.
//!
//! Invariants are checked under arbitrary event sequences, not just the
//! happy paths the scenario tests walk.

use std::{collections::HashSet, time::Duration};

use proptest::prelude::*;
use reelchat_core::TransportEvent;
use reelchat_harness::SessionSim;
use reelchat_proto::{Message, PresenceEntry, ServerFrame, UserTyping};

fn message_strategy() -> impl Strategy<Value = Message> {
    ("[a-z0-9]{1,8}", "[a-z]{1,10}", ".{0,40}", 0u64..u64::from(u32::MAX), any::<bool>()).prop_map(
        |(id, user, body, timestamp, system)| Message { id, user, body, timestamp, system },
    )
}

fn presence_strategy() -> impl Strategy<Value = PresenceEntry> {
    ("[a-z0-9]{1,8}", "[a-c]{1,2}").prop_map(|(id, username)| PresenceEntry { id, username })
}

proptest! {
    /// Displayed order equals arrival order for any inbound sequence.
    #[test]
    fn message_order_equals_arrival_order(
        history in prop::collection::vec(message_strategy(), 0..20),
        live in prop::collection::vec(message_strategy(), 0..20),
    ) {
        let mut sim = SessionSim::connected("ada");

        sim.deliver(ServerFrame::MessageHistory(history.clone()));
        for message in &live {
            sim.deliver(ServerFrame::Message(message.clone()));
        }

        let mut expected = history;
        expected.extend(live);
        prop_assert_eq!(sim.session.view().messages, expected);
    }

    /// The presence view never contains two entries with one username, and
    /// covers exactly the usernames the server reported.
    #[test]
    fn presence_is_deduplicated_by_username(
        entries in prop::collection::vec(presence_strategy(), 0..20),
    ) {
        let mut sim = SessionSim::connected("ada");
        sim.deliver(ServerFrame::UsersList(entries.clone()));

        let view = sim.session.view();
        let seen: HashSet<&str> =
            view.presence.iter().map(|entry| entry.username.as_str()).collect();

        prop_assert_eq!(seen.len(), view.presence.len(), "duplicate username in view");

        let reported: HashSet<&str> =
            entries.iter().map(|entry| entry.username.as_str()).collect();
        prop_assert_eq!(seen, reported);
    }

    /// A second presence list replaces the first wholesale.
    #[test]
    fn presence_replaces_not_merges(
        first in prop::collection::vec(presence_strategy(), 0..10),
        second in prop::collection::vec(presence_strategy(), 0..10),
    ) {
        let mut sim = SessionSim::connected("ada");
        sim.deliver(ServerFrame::UsersList(first));
        sim.deliver(ServerFrame::UsersList(second.clone()));

        let reported: HashSet<&str> =
            second.iter().map(|entry| entry.username.as_str()).collect();
        let seen: HashSet<String> = sim
            .session
            .view()
            .presence
            .iter()
            .map(|entry| entry.username.clone())
            .collect();
        let seen: HashSet<&str> = seen.iter().map(String::as_str).collect();
        prop_assert_eq!(seen, reported);
    }

    /// Events tagged with a superseded generation never mutate state.
    #[test]
    fn stale_generation_events_are_inert(
        messages in prop::collection::vec(message_strategy(), 1..10),
        users in prop::collection::vec(presence_strategy(), 1..10),
    ) {
        let mut sim = SessionSim::connected("ada");
        let stale = sim.session.generation();

        sim.session.disconnect();
        let connected = sim.connect("ada");
        prop_assert!(connected.is_ok());
        sim.transport_up();

        let baseline = sim.session.view();
        let now = sim.clock.now();

        for message in messages {
            sim.session.handle_transport(
                stale,
                TransportEvent::Frame(ServerFrame::Message(message)),
                now,
            );
        }
        sim.session.handle_transport(
            stale,
            TransportEvent::Frame(ServerFrame::UsersList(users)),
            now,
        );
        sim.session.handle_transport(
            stale,
            TransportEvent::Down { reason: "late".into() },
            now,
        );

        prop_assert_eq!(sim.session.view(), baseline);
    }

    /// Any keystroke burst inside the quiet interval emits exactly one
    /// typing:true, and exactly one typing:false after it goes quiet.
    #[test]
    fn debounce_collapses_any_burst(gaps in prop::collection::vec(0u64..1000, 1..15)) {
        let mut sim = SessionSim::connected("ada");

        let mut typing_true = 0;
        let mut typing_false = 0;

        for gap in gaps {
            // Gaps stay strictly inside the quiet interval, so the trailing
            // signal can never fire mid-burst.
            let actions = sim.advance(Duration::from_millis(gap));
            typing_false += reelchat_harness::typing_signals(&actions, false);

            let now = sim.clock.now();
            let actions = sim.session.set_composing(now);
            typing_true += reelchat_harness::typing_signals(&actions, true);
        }

        prop_assert_eq!(typing_true, 1);
        prop_assert_eq!(typing_false, 0);

        let actions = sim.advance(Duration::from_secs(1));
        prop_assert_eq!(reelchat_harness::typing_signals(&actions, true), 0);
        prop_assert_eq!(reelchat_harness::typing_signals(&actions, false), 1);
    }

    /// Typing indicators always resolve: after enough quiet time the set is
    /// empty no matter what signals arrived.
    #[test]
    fn typing_set_always_drains(
        signals in prop::collection::vec(("[a-c]{1,2}", any::<bool>()), 0..30),
    ) {
        let mut sim = SessionSim::connected("ada");

        for (user, is_typing) in signals {
            sim.deliver(ServerFrame::UserTyping(UserTyping { user, is_typing }));
        }

        sim.advance(Duration::from_secs(5));
        prop_assert!(sim.session.view().typing.is_empty());
    }
}
