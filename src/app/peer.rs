//! Two-device handshake.
//!
//! The local controller asserts its signal line and waits, bounded, for the
//! paired device to answer on the response line. The wait is a liveness
//! bound: both outcomes lead to an unlock.

use log::debug;

use crate::config::GateConfig;
use crate::error::Result;

use super::ports::GateHardware;

/// How the handshake ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerOutcome {
    /// The response line was seen asserted `after_ms` into the wait.
    Responded { after_ms: u32 },
    /// No response within the timeout; `waited_ms` equals the timeout.
    TimedOut { waited_ms: u32 },
}

impl PeerOutcome {
    pub fn responded(&self) -> bool {
        matches!(self, Self::Responded { .. })
    }
}

/// Run the handshake. The signal line is deasserted on every exit path,
/// including a line fault while polling.
pub fn handshake(hw: &mut impl GateHardware, cfg: &GateConfig) -> Result<PeerOutcome> {
    hw.set_peer_signal(true)?;
    let outcome = wait_for_response(hw, cfg);
    let cleared = hw.set_peer_signal(false);
    let outcome = outcome?;
    cleared?;
    debug!("peer handshake: {:?}", outcome);
    Ok(outcome)
}

fn wait_for_response(hw: &mut impl GateHardware, cfg: &GateConfig) -> Result<PeerOutcome> {
    let timeout = cfg.peer_response_timeout_ms;
    let start = hw.uptime_ms();
    loop {
        let elapsed = hw.uptime_ms().wrapping_sub(start);
        if hw.peer_responded()? {
            return Ok(PeerOutcome::Responded { after_ms: elapsed });
        }
        if elapsed >= timeout {
            return Ok(PeerOutcome::TimedOut { waited_ms: elapsed });
        }
        // Never sleep past the deadline.
        hw.delay_ms(cfg.peer_poll_interval_ms.min(timeout - elapsed));
        hw.feed();
    }
}
