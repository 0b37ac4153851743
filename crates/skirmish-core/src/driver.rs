//! Async event loop serializing user intents with transport events.
//!
//! A [`Session`] is `&mut self`. Intents come from the presentation layer,
//! events come from the transport's own context. The driver funnels both into
//! one task:
//!
//! ```text
//! SessionHandle ──Command──┐
//!   (cloneable)            ↓
//!                   ┌──────────────┐        watch
//!                   │ SessionDriver│ ──SessionSnapshot──> SessionHandle
//!                   └──────────────┘
//! transport ──TransportEvent─┘
//! ```
//!
//! Both inbound channels are unbounded: nothing on either side may block.
//! The driver stops on [`Command::Shutdown`] or when every handle is dropped,
//! shutting the session down in both cases, and hands the session back.

use skirmish_proto::Choice;
use tokio::sync::{mpsc, watch};

use crate::{
    error::SessionError,
    session::{Session, SessionSnapshot},
    transport::{PeerTransport, TransportEvent},
};

/// User intents accepted by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// [`Session::find_opponent`]
    FindOpponent,
    /// [`Session::disconnect`]
    Disconnect,
    /// [`Session::submit_choice`]
    SubmitChoice(Choice),
    /// [`Session::shutdown`], then stop the driver
    Shutdown,
}

/// Cloneable front end of a running [`SessionDriver`].
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Queue a command.
    ///
    /// # Errors
    ///
    /// Returns `Closed` if the driver has stopped.
    pub fn send(&self, command: Command) -> Result<(), SessionError> {
        self.commands.send(command).map_err(|_| SessionError::Closed)
    }

    /// Start looking for an opponent.
    ///
    /// # Errors
    ///
    /// Returns `Closed` if the driver has stopped.
    pub fn find_opponent(&self) -> Result<(), SessionError> {
        self.send(Command::FindOpponent)
    }

    /// Leave the current peer or stop looking.
    ///
    /// # Errors
    ///
    /// Returns `Closed` if the driver has stopped.
    pub fn disconnect(&self) -> Result<(), SessionError> {
        self.send(Command::Disconnect)
    }

    /// Pick a choice for the current round.
    ///
    /// # Errors
    ///
    /// Returns `Closed` if the driver has stopped.
    pub fn submit_choice(&self, choice: Choice) -> Result<(), SessionError> {
        self.send(Command::SubmitChoice(choice))
    }

    /// Shut the session down and stop the driver.
    ///
    /// # Errors
    ///
    /// Returns `Closed` if the driver has already stopped.
    pub fn shutdown(&self) -> Result<(), SessionError> {
        self.send(Command::Shutdown)
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshots.borrow().clone()
    }

    /// A receiver notified on every snapshot change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshots.clone()
    }
}

/// Single task owning a [`Session`].
pub struct SessionDriver<T: PeerTransport> {
    session: Session<T>,
    commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedReceiver<TransportEvent>,
    snapshots: watch::Sender<SessionSnapshot>,
}

impl<T: PeerTransport> SessionDriver<T> {
    /// Wrap `session`, consuming transport events from `events`.
    ///
    /// Spawn [`SessionDriver::run`] and keep the handle.
    pub fn new(
        session: Session<T>,
        events: mpsc::UnboundedReceiver<TransportEvent>,
    ) -> (SessionHandle, Self) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot().clone());

        let handle = SessionHandle { commands: command_tx, snapshots: snapshot_rx };
        let driver =
            Self { session, commands: command_rx, events, snapshots: snapshot_tx };

        (handle, driver)
    }

    /// Process commands and events until shutdown. Returns the session.
    pub async fn run(self) -> Session<T> {
        let Self { mut session, mut commands, mut events, snapshots } = self;
        let mut events_open = true;

        tracing::debug!(local_name = session.identity().display_name(), "session driver started");

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::FindOpponent) => session.find_opponent(),
                    Some(Command::Disconnect) => session.disconnect(),
                    Some(Command::SubmitChoice(choice)) => session.submit_choice(choice),
                    Some(Command::Shutdown) => {
                        session.shutdown();
                        publish(&snapshots, &session);
                        break;
                    },
                    None => {
                        tracing::debug!("all session handles dropped, shutting down");
                        session.shutdown();
                        publish(&snapshots, &session);
                        break;
                    },
                },

                event = events.recv(), if events_open => match event {
                    Some(event) => session.handle_event(event),
                    None => {
                        tracing::warn!("transport event channel closed");
                        events_open = false;
                    },
                },
            }

            publish(&snapshots, &session);
        }

        tracing::debug!("session driver stopped");
        session
    }
}

fn publish<T: PeerTransport>(snapshots: &watch::Sender<SessionSnapshot>, session: &Session<T>) {
    snapshots.send_if_modified(|current| {
        if current == session.snapshot() {
            return false;
        }
        *current = session.snapshot().clone();
        true
    });
}
