//! Outbound application events.
//!
//! The [`GateService`](super::service::GateService) and the
//! [`PowerScheduler`](crate::power::PowerScheduler) emit these through the
//! [`EventSink`](super::ports::EventSink) port. Adapters on the other side
//! decide what to do with them.

use crate::clock::{DateTime, TimeWindow};
use crate::error::{Error, SyncError};

use super::guard::DropReason;
use super::peer::PeerOutcome;
use super::policy::UnlockOutcome;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Boot finished; carries the initial status.
    Booted(StatusReport),

    /// A button edge was screened out.
    PressDropped(DropReason),

    /// A button edge became a press.
    PressAccepted { at_ms: u32 },

    /// The two-device handshake finished.
    PeerHandshake(PeerOutcome),

    /// The policy decision for the current press.
    Outcome(UnlockOutcome),

    /// An unlock was requested while one was already running.
    UnlockSkipped,

    ClockSynced { now: DateTime },

    ClockSyncFailed(SyncError),

    /// Press processing aborted on a line fault. Busy flags were released.
    HandlerFault(Error),

    /// Outputs forced safe and the scheduler loop is exiting.
    Shutdown,
}

/// Point-in-time status, as printed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReport {
    pub now: DateTime,
    pub window: TimeWindow,
    pub unlock_allowed: bool,
    pub peer_present: bool,
}
