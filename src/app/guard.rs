//! Debounce and re-entrancy guard.
//!
//! Turns a raw button edge into at most one logical press. The screening
//! order matters: a press that arrives while another is being handled must
//! not touch the debounce timestamp.

use crate::config::GateConfig;
use crate::error::Result;

use super::ports::GateHardware;
use super::state::{ControllerState, Flag, FlagGuard};

/// Why an edge did not become a press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Another press is still being handled.
    Busy,
    /// Too soon after the previous accepted press (contact bounce).
    Bounce { elapsed_ms: u32 },
    /// The button was no longer held at the confirmation read.
    Released,
}

/// Result of screening an edge.
#[derive(Debug)]
pub enum Admission<'s> {
    /// Press accepted; `handler_active` is held until the token drops.
    Accepted(FlagGuard<'s>),
    Dropped(DropReason),
}

/// Screen the edge observed at `edge_ms`.
///
/// On acceptance the caller owns the handler token and must keep it alive
/// for the whole of press processing.
pub fn admit<'s>(
    state: &'s ControllerState,
    cfg: &GateConfig,
    hw: &mut impl GateHardware,
    edge_ms: u32,
) -> Result<Admission<'s>> {
    if state.handler_active() {
        return Ok(Admission::Dropped(DropReason::Busy));
    }

    if let Some(last) = state.last_press_ms() {
        let elapsed_ms = edge_ms.wrapping_sub(last);
        if elapsed_ms < cfg.debounce_ms {
            return Ok(Admission::Dropped(DropReason::Bounce { elapsed_ms }));
        }
    }

    hw.delay_ms(cfg.confirm_delay_ms);
    if !hw.button_pressed()? {
        return Ok(Admission::Dropped(DropReason::Released));
    }

    let Some(token) = state.claim(Flag::Handler) else {
        return Ok(Admission::Dropped(DropReason::Busy));
    };
    state.record_press(edge_ms);
    Ok(Admission::Accepted(token))
}
