//! Skirmish session core logic
//!
//! This crate pairs two nearby players over an abstract transport and keeps
//! their rounds in step. It performs no I/O of its own: every radio call goes
//! through [`transport::PeerTransport`], every clock or RNG read through
//! [`env::Environment`].
//!
//! # Architecture
//!
//! ```text
//!      ┌───────────────────────────────┐
//!      │ skirmish-core                 │
//!      │ - Pairing state machine       │
//!      │ - Round synchronization       │
//!      │ - Session facade + driver     │
//!      └───────────────────────────────┘
//!         ↓                         ↓
//! ┌──────────────────┐   ┌──────────────────────┐
//! │ skirmish-harness │   │ host application     │
//! │ - SimTransport   │   │ - platform nearby    │
//! │ - Virtual time   │   │   engine binding     │
//! │ - Seeded RNG     │   │ - UI rendering       │
//! └──────────────────┘   └──────────────────────┘
//! ```
//!
//! # Key Principles
//!
//! - Reducers, not callbacks: the [`coordinator`] and the [`round`]
//!   synchronizer return actions; only the [`session`] facade executes them
//! - One writer: all mutation goes through `&mut Session`, serialized by the
//!   [`driver`] task
//! - No fatal errors: failures degrade to searching or idle, never a crash
//!
//! # Modules
//!
//! - [`coordinator`]: Pairing state machine (discover, negotiate, connect)
//! - [`round`]: Round synchronizer (collect both choices, judge, score)
//! - [`session`]: Facade wiring both to the transport and the snapshot
//! - [`driver`]: Tokio task and handle for a running session
//! - [`transport`]: Nearby transport abstraction
//! - [`env`]: Environment abstraction (time, RNG)
//! - [`identity`]: Local player name
//! - [`error`]: Session error types

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod coordinator;
pub mod driver;
pub mod env;
pub mod error;
pub mod identity;
pub mod round;
pub mod session;
pub mod transport;

pub use coordinator::{Coordinator, PeerHandle, SessionState};
pub use driver::{Command, SessionDriver, SessionHandle};
pub use env::Environment;
pub use error::SessionError;
pub use identity::LocalIdentity;
pub use round::{RoundSynchronizer, Score};
pub use session::{Session, SessionConfig, SessionSnapshot};
pub use transport::{EndpointId, PeerTransport, TransferStatus, TransportError, TransportEvent};
