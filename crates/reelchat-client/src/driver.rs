//! Session driver event loop.
//!
//! The [`Driver`] owns the [`ChatSession`] and is the single task through
//! which every input flows: user commands, transport events, dial results,
//! and timer ticks. That serialization is what makes the session's no-lock
//! model sound - mutations are ordered by this loop's `select!`.
//!
//! Consumers hold a [`ChatHandle`]: commands go in over an mpsc channel,
//! state comes out as whole [`SessionView`] snapshots over a watch channel.
//! A snapshot is replaced atomically, so a reader never observes a torn
//! combination of messages, presence, and typing state.

use std::time::{Duration, Instant};

use reelchat_core::{
    ChatSession, ConnectionState, Identity, SessionAction, SessionConfig, SessionError,
    SessionView, TransportEvent,
};
use reelchat_proto::ClientFrame;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::MissedTickBehavior,
};

use crate::{
    error::{ClientError, TransportError},
    transport::TcpTransport,
};

/// Granularity of the timer tick feeding [`ChatSession::tick`]. Deadlines
/// compare against absolute time, so this bounds latency, not correctness.
const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Command channel depth.
const COMMAND_CAPACITY: usize = 32;

/// Commands a [`ChatHandle`] sends to the driver.
#[derive(Debug)]
pub enum Command {
    /// Start a connect cycle for the given identity.
    Connect(Identity),

    /// Tear down the session.
    Disconnect,

    /// Send a chat message.
    SendMessage(String),

    /// Report a keystroke in the compose box.
    Composing,
}

/// Consumer facade over a running [`Driver`].
///
/// Cheap to clone; all clones talk to the same driver task.
#[derive(Debug, Clone)]
pub struct ChatHandle {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<SessionView>,
}

impl ChatHandle {
    /// Current state snapshot.
    #[must_use]
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    /// Watch receiver for state snapshots, for consumers that want to await
    /// changes rather than poll.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    /// Start a connect cycle for the given identity.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Session`] with [`SessionError::AlreadyActive`] if
    ///   the last observed snapshot shows a live connection. The driver
    ///   re-checks authoritatively and logs late rejections.
    /// - [`ClientError::DriverGone`] if the driver task has shut down.
    pub async fn connect(&self, identity: Identity) -> Result<(), ClientError> {
        let connection = self.view.borrow().connection;
        if !matches!(connection, ConnectionState::Disconnected | ConnectionState::Failed) {
            return Err(SessionError::AlreadyActive { state: connection }.into());
        }
        self.send(Command::Connect(identity)).await
    }

    /// Tear down the session. Idempotent.
    ///
    /// # Errors
    ///
    /// - [`ClientError::DriverGone`] if the driver task has shut down.
    pub async fn disconnect(&self) -> Result<(), ClientError> {
        self.send(Command::Disconnect).await
    }

    /// Send a chat message.
    ///
    /// Rejection is synchronous against the last observed snapshot; nothing
    /// is buffered for later delivery. Empty or whitespace-only text is
    /// dropped by the session without a server round-trip.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Session`] with [`SessionError::NotConnected`] if
    ///   the last observed snapshot is not connected.
    /// - [`ClientError::DriverGone`] if the driver task has shut down.
    pub async fn send_message(&self, text: impl Into<String>) -> Result<(), ClientError> {
        let connection = self.view.borrow().connection;
        if connection != ConnectionState::Connected {
            return Err(SessionError::NotConnected { state: connection }.into());
        }
        self.send(Command::SendMessage(text.into())).await
    }

    /// Report a keystroke in the compose box.
    ///
    /// # Errors
    ///
    /// - [`ClientError::DriverGone`] if the driver task has shut down.
    pub async fn set_composing(&self) -> Result<(), ClientError> {
        self.send(Command::Composing).await
    }

    async fn send(&self, command: Command) -> Result<(), ClientError> {
        self.commands.send(command).await.map_err(|_| ClientError::DriverGone)
    }
}

/// Live transport bound to the generation that dialed it.
struct Link {
    generation: u64,
    transport: TcpTransport,
}

/// In-flight dial bound to the generation that requested it.
struct PendingDial {
    generation: u64,
    task: JoinHandle<Result<TcpTransport, TransportError>>,
}

/// Event loop owning one [`ChatSession`] and its transport.
pub struct Driver {
    server_addr: String,
    session: ChatSession,
    commands: mpsc::Receiver<Command>,
    view_tx: watch::Sender<SessionView>,
    link: Option<Link>,
    pending_dial: Option<PendingDial>,
}

impl Driver {
    /// Create a driver and its handle. The caller runs [`Driver::run`].
    pub fn new(server_addr: impl Into<String>, config: SessionConfig) -> (Self, ChatHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (view_tx, view_rx) = watch::channel(SessionView::default());

        let driver = Self {
            server_addr: server_addr.into(),
            session: ChatSession::new(config),
            commands: command_rx,
            view_tx,
            link: None,
            pending_dial: None,
        };

        (driver, ChatHandle { commands: command_tx, view: view_rx })
    }

    /// Create a driver, spawn its event loop, and return the handle.
    ///
    /// The loop exits once every handle clone is dropped.
    pub fn spawn(server_addr: impl Into<String>, config: SessionConfig) -> ChatHandle {
        let (driver, handle) = Self::new(server_addr, config);
        tokio::spawn(driver.run());
        handle
    }

    /// Run the event loop until every handle is dropped.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(TICK_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command).await,
                    None => break,
                },
                (generation, result) = await_dial(&mut self.pending_dial) => {
                    self.handle_dial_result(generation, result).await;
                },
                (generation, event) = next_link_event(&mut self.link) => {
                    self.handle_link_event(generation, event).await;
                },
                _ = ticker.tick() => {
                    let actions = self.session.tick(Instant::now());
                    self.execute(actions).await;
                },
            }

            self.publish();
        }

        // Tear down any live connection before exiting.
        let actions = self.session.disconnect();
        self.execute(actions).await;
        self.publish();
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Connect(identity) => {
                match self.session.connect(identity, Instant::now()) {
                    Ok(actions) => self.execute(actions).await,
                    Err(error) => tracing::warn!(%error, "connect rejected"),
                }
            },
            Command::Disconnect => {
                let actions = self.session.disconnect();
                self.execute(actions).await;
            },
            Command::SendMessage(text) => match self.session.send_message(&text) {
                Ok(actions) => self.execute(actions).await,
                Err(error) => tracing::warn!(%error, "send rejected"),
            },
            Command::Composing => {
                let actions = self.session.set_composing(Instant::now());
                self.execute(actions).await;
            },
        }
    }

    async fn handle_dial_result(
        &mut self,
        generation: u64,
        result: Result<TcpTransport, TransportError>,
    ) {
        if generation != self.session.generation() {
            // A superseded dial; dropping the transport aborts its task.
            tracing::trace!(stale = generation, "discarding superseded dial result");
            return;
        }

        match result {
            Ok(transport) => {
                self.link = Some(Link { generation, transport });
                let actions =
                    self.session.handle_transport(generation, TransportEvent::Up, Instant::now());
                self.execute(actions).await;
            },
            Err(error) => {
                let actions = self.session.handle_transport(
                    generation,
                    TransportEvent::Error { error: error.to_string() },
                    Instant::now(),
                );
                self.execute(actions).await;
            },
        }
    }

    async fn handle_link_event(&mut self, generation: u64, event: Option<TransportEvent>) {
        let event = match event {
            Some(event) => event,
            // Task exited without a terminal event; treat as a drop.
            None => TransportEvent::Down { reason: "transport task ended".to_string() },
        };

        let terminal =
            matches!(event, TransportEvent::Down { .. } | TransportEvent::Error { .. });

        let actions = self.session.handle_transport(generation, event, Instant::now());

        if terminal && let Some(link) = self.link.take() {
            link.transport.stop();
        }

        self.execute(actions).await;
    }

    async fn execute(&mut self, actions: Vec<SessionAction>) {
        for action in actions {
            match action {
                SessionAction::Dial { generation } => self.start_dial(generation),
                SessionAction::Send(frame) => self.send_frame(frame).await,
                SessionAction::CloseTransport { generation } => self.close_transport(generation),
            }
        }
    }

    fn start_dial(&mut self, generation: u64) {
        if let Some(dial) = self.pending_dial.take() {
            dial.task.abort();
        }

        let addr = self.server_addr.clone();
        let task = tokio::spawn(async move { TcpTransport::connect(&addr).await });
        self.pending_dial = Some(PendingDial { generation, task });
    }

    async fn send_frame(&mut self, frame: ClientFrame) {
        let Some(link) = &self.link else {
            tracing::warn!("no live transport for outbound frame");
            return;
        };

        if link.transport.to_server.send(frame).await.is_err() {
            tracing::warn!("transport task gone, dropping outbound frame");
        }
    }

    fn close_transport(&mut self, generation: u64) {
        if let Some(dial) = self.pending_dial.take_if(|dial| dial.generation == generation) {
            dial.task.abort();
        }

        if let Some(link) = self.link.take_if(|link| link.generation == generation) {
            link.transport.stop();
        }
    }

    fn publish(&self) {
        let view = self.session.view();
        self.view_tx.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });
    }
}

/// Await the in-flight dial, or park forever when there is none.
///
/// Cancel-safe: the pending slot is only cleared once the dial completes.
async fn await_dial(
    pending: &mut Option<PendingDial>,
) -> (u64, Result<TcpTransport, TransportError>) {
    let Some(dial) = pending.as_mut() else {
        return std::future::pending().await;
    };

    let generation = dial.generation;
    let joined = (&mut dial.task).await;
    *pending = None;

    let result = match joined {
        Ok(result) => result,
        Err(join_error) => Err(TransportError::Connect(format!("dial task failed: {join_error}"))),
    };

    (generation, result)
}

/// Await the next event from the live transport, or park forever when there
/// is none.
async fn next_link_event(link: &mut Option<Link>) -> (u64, Option<TransportEvent>) {
    match link.as_mut() {
        Some(live) => {
            let event = live.transport.events.recv().await;
            (live.generation, event)
        },
        None => std::future::pending().await,
    }
}
