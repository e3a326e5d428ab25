//! Application service: the press handler.
//!
//! [`GateService`] owns the configuration and a handle to the process-wide
//! [`ControllerState`]. It exposes a hardware-agnostic API; all I/O flows
//! through port traits injected at call sites, making the whole press path
//! testable with mock adapters.
//!
//! ```text
//!  GateInputs ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                 │        GateService        │
//! GateOutputs ◀── │ guard · peer · policy ·   │
//!                 │ actuation                 │
//!                 └──────────────────────────┘
//! ```

use log::{info, warn};

use crate::config::GateConfig;
use crate::error::Result;

use super::actuation::{blink_red, set_led_exclusive, unlock_gate};
use super::events::{AppEvent, StatusReport};
use super::guard::{Admission, DropReason, admit};
use super::peer::handshake;
use super::policy::{UnlockOutcome, decide, is_unlock_allowed};
use super::ports::{EventSink, GateHardware, Led};
use super::state::ControllerState;

/// How a single edge was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressResult {
    Dropped(DropReason),
    Handled(UnlockOutcome),
}

// ───────────────────────────────────────────────────────────────
// GateService
// ───────────────────────────────────────────────────────────────

pub struct GateService<'s> {
    state: &'s ControllerState,
    config: GateConfig,
}

impl<'s> GateService<'s> {
    pub fn new(state: &'s ControllerState, config: GateConfig) -> Self {
        Self { state, config }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    pub fn state(&self) -> &'s ControllerState {
        self.state
    }

    // ── Press handling ────────────────────────────────────────

    /// Screen the edge at `edge_ms` and, if accepted, run the whole press:
    /// peer handshake, policy, actuation.
    ///
    /// `handler_active` is held from acceptance until `release_settle_ms`
    /// after processing ends, on success and on a fault alike.
    pub fn handle_press(
        &self,
        hw: &mut impl GateHardware,
        sink: &mut impl EventSink,
        edge_ms: u32,
    ) -> Result<PressResult> {
        let token = match admit(self.state, &self.config, hw, edge_ms) {
            Ok(Admission::Accepted(token)) => token,
            Ok(Admission::Dropped(reason)) => {
                sink.emit(&AppEvent::PressDropped(reason));
                return Ok(PressResult::Dropped(reason));
            }
            Err(e) => {
                sink.emit(&AppEvent::HandlerFault(e));
                return Err(e);
            }
        };

        sink.emit(&AppEvent::PressAccepted { at_ms: edge_ms });
        let result = self.process_press(hw, sink);
        if let Err(e) = result {
            warn!("press processing aborted: {}", e);
            sink.emit(&AppEvent::HandlerFault(e));
        }

        // Let a held button settle before the next press can be admitted.
        hw.delay_ms(self.config.release_settle_ms);
        drop(token);

        result.map(PressResult::Handled)
    }

    fn process_press(
        &self,
        hw: &mut impl GateHardware,
        sink: &mut impl EventSink,
    ) -> Result<UnlockOutcome> {
        let peer = if hw.peer_present()? {
            info!("two-device mode: signalling peer");
            let outcome = handshake(hw, &self.config)?;
            sink.emit(&AppEvent::PeerHandshake(outcome));
            Some(outcome)
        } else {
            None
        };

        let outcome = decide(peer, &self.config.unlock_window, &hw.now());
        sink.emit(&AppEvent::Outcome(outcome));

        if outcome.actuates() {
            if !unlock_gate(self.state, hw, &self.config)? {
                sink.emit(&AppEvent::UnlockSkipped);
            }
        } else {
            blink_red(self.state, hw, &self.config)?;
        }
        Ok(outcome)
    }

    // ── Status display ────────────────────────────────────────

    /// Steady LED state: green when a peer is connected, otherwise green or
    /// red depending on the unlock window.
    pub fn display_status(&self, hw: &mut impl GateHardware) -> Result<()> {
        let green = hw.peer_present()? || is_unlock_allowed(&self.config.unlock_window, &hw.now());
        set_led_exclusive(hw, if green { Led::Green } else { Led::Red }, true)
    }

    pub fn status_report(&self, hw: &mut impl GateHardware) -> Result<StatusReport> {
        let now = hw.now();
        Ok(StatusReport {
            now,
            window: self.config.unlock_window,
            unlock_allowed: is_unlock_allowed(&self.config.unlock_window, &now),
            peer_present: hw.peer_present()?,
        })
    }

    /// Drive every output to its safe level: relay released, peer signal
    /// low, LEDs off. Every line is attempted; the first fault is returned.
    pub fn force_safe(&self, hw: &mut impl GateHardware) -> Result<()> {
        let results = [
            hw.set_relay(false),
            hw.set_peer_signal(false),
            hw.set_led(Led::Red, false),
            hw.set_led(Led::Green, false),
            hw.set_led(Led::Activity, false),
        ];
        results.into_iter().collect()
    }
}
