//! Unlock policy.
//!
//! Peer mode always unlocks. Solo mode unlocks only inside the configured
//! half-open daily window.

use crate::clock::{DateTime, TimeWindow};

use super::peer::PeerOutcome;

/// What a press resolves to. Drives LED feedback only; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockOutcome {
    Unlocked,
    DeniedOutsideWindow,
    PeerTimeoutButUnlocked,
}

impl UnlockOutcome {
    /// Whether the relay is pulsed for this outcome.
    pub fn actuates(self) -> bool {
        !matches!(self, Self::DeniedOutsideWindow)
    }
}

/// `start <= hour*60+minute < end`.
pub fn is_unlock_allowed(window: &TimeWindow, now: &DateTime) -> bool {
    window.contains(now.minutes_of_day())
}

/// Decide the outcome of a press. `peer` is `None` in solo mode.
pub fn decide(peer: Option<PeerOutcome>, window: &TimeWindow, now: &DateTime) -> UnlockOutcome {
    match peer {
        Some(PeerOutcome::Responded { .. }) => UnlockOutcome::Unlocked,
        Some(PeerOutcome::TimedOut { .. }) => UnlockOutcome::PeerTimeoutButUnlocked,
        None if is_unlock_allowed(window, now) => UnlockOutcome::Unlocked,
        None => UnlockOutcome::DeniedOutsideWindow,
    }
}
