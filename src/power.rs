//! Power/sleep scheduler: the top-level firmware loop.
//!
//! ```text
//!  boot ──▶ ┌─ arm wake ─▶ light sleep ─▶ restore speed ─┐
//!           │                                           │
//!           └── refresh LEDs ◀─ daily sync ◀─ press ◀───┘
//! ```
//!
//! The only concurrency is the button ISR, which records edges on
//! [`ControllerState`](crate::app::state::ControllerState); presses are
//! handled here, on the main task, strictly one at a time.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{ClockSync, EventSink, GateHardware, SleepPort, WakeCause, WallClock};
use crate::app::service::GateService;
use crate::config::GateConfig;
use crate::error::Result;

/// Whether the loop should keep running after a wake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Continue,
    Stop,
}

pub struct PowerScheduler<'s> {
    service: GateService<'s>,
}

impl<'s> PowerScheduler<'s> {
    pub fn new(service: GateService<'s>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &GateService<'s> {
        &self.service
    }

    fn config(&self) -> &GateConfig {
        self.service.config()
    }

    /// Boot sequence: clock sync (best effort), safe outputs, wake source,
    /// initial LEDs, status report.
    ///
    /// The boot sync does not count as the daily re-sync.
    pub fn boot(
        &self,
        hw: &mut (impl GateHardware + SleepPort + ClockSync),
        sink: &mut impl EventSink,
    ) -> Result<()> {
        self.sync_clock(hw, sink);

        self.service.force_safe(hw)?;
        hw.arm_button_wake()?;
        self.service.display_status(hw)?;

        let report = self.service.status_report(hw)?;
        sink.emit(&AppEvent::Booted(report));
        Ok(())
    }

    /// One suspend/resume cycle.
    ///
    /// Faults inside press handling or housekeeping are logged and the loop
    /// carries on; only a shutdown request stops it.
    pub fn wake_cycle(
        &self,
        hw: &mut (impl GateHardware + SleepPort + ClockSync),
        sink: &mut impl EventSink,
    ) -> CycleOutcome {
        let state = self.service.state();

        // An edge that arrived while awake is handled before sleeping again.
        let edge = match state.take_pending_edge() {
            Some(edge_ms) => Some(edge_ms),
            None => {
                if let Err(e) = hw.arm_button_wake() {
                    warn!("re-arming button wake failed: {}", e);
                }

                let cause = hw.suspend(self.config().max_sleep_ms);
                hw.restore_full_speed();
                hw.feed();

                if cause == WakeCause::Shutdown {
                    if let Err(e) = self.service.force_safe(hw) {
                        warn!("forcing outputs safe failed: {}", e);
                    }
                    sink.emit(&AppEvent::Shutdown);
                    return CycleOutcome::Stop;
                }

                state
                    .take_pending_edge()
                    .or_else(|| (cause == WakeCause::Button).then(|| hw.uptime_ms()))
            }
        };

        if let Some(edge_ms) = edge {
            // Lines read unreliably right after a frequency switch.
            hw.delay_ms(self.config().wake_settle_ms);
            if let Err(e) = self.service.handle_press(hw, sink, edge_ms) {
                warn!("press handling failed: {}", e);
            }
        }

        self.housekeeping(hw, sink);
        CycleOutcome::Continue
    }

    /// Boot, then run wake cycles until a shutdown request.
    pub fn run(
        &self,
        hw: &mut (impl GateHardware + SleepPort + ClockSync),
        sink: &mut impl EventSink,
    ) -> Result<()> {
        self.boot(hw, sink)?;
        info!("entering light-sleep loop");
        while self.wake_cycle(hw, sink) == CycleOutcome::Continue {}
        info!("scheduler stopped");
        Ok(())
    }

    // ── Internal ──────────────────────────────────────────────

    /// Daily re-sync and LED refresh.
    fn housekeeping(&self, hw: &mut (impl GateHardware + ClockSync), sink: &mut impl EventSink) {
        let state = self.service.state();
        let now = hw.now();
        let today = now.date();

        let in_window = self.config().sync_window.contains(now.minutes_of_day());
        if in_window && state.last_sync_date() != Some(today) {
            info!("daily clock sync at {}", now);
            self.sync_clock(hw, sink);
            // Recorded even on failure; tomorrow's window retries.
            state.record_sync_date(today);
        }

        if !state.is_blinking() && !state.is_unlocking() {
            if let Err(e) = self.service.display_status(hw) {
                warn!("status LED refresh failed: {}", e);
            }
        }
    }

    /// Best effort: a failure is reported and the held time is kept.
    fn sync_clock(&self, hw: &mut (impl WallClock + ClockSync), sink: &mut impl EventSink) {
        match hw.sync() {
            Ok(()) => sink.emit(&AppEvent::ClockSynced { now: hw.now() }),
            Err(e) => {
                warn!("clock sync failed: {}", e);
                sink.emit(&AppEvent::ClockSyncFailed(e));
            }
        }
    }
}
