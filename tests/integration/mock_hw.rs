//! Simulated board for integration tests.
//!
//! Time only moves when the code under test delays or sleeps, so every
//! timing assertion is exact. Every output change is recorded with its
//! timestamp so tests can assert on the full line history.

use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;

use gatelock::app::events::AppEvent;
use gatelock::app::ports::{
    ClockSync, EventSink, GateInputs, GateOutputs, Led, SleepPort, Timebase, WakeCause, WallClock,
    Watchdog,
};
use gatelock::clock::DateTime;
use gatelock::error::{Error, Line, Result, SyncError};

// ── Output record ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Relay(bool),
    Led(Led, bool),
    PeerSignal(bool),
}

// ── SimBoard ──────────────────────────────────────────────────

pub struct SimBoard {
    now_ns: u64,
    /// Unix seconds at uptime zero.
    epoch_base: i64,

    // Inputs
    pub button_held: bool,
    pub peer_present: bool,
    /// The peer answers this long after the signal is asserted.
    pub peer_reply_after_ms: Option<u32>,
    signal_since_ns: Option<u64>,

    // Outputs
    pub relay: bool,
    pub red: bool,
    pub green: bool,
    pub activity: bool,
    pub peer_signal: bool,
    pub trace: Vec<(u32, Output)>,
    pub both_lit_seen: bool,

    // Faults
    pub fail_relay: bool,
    pub fail_peer_response: bool,

    // Power / time services
    pub feeds: u32,
    pub arms: u32,
    pub suspends: u32,
    pub wakes: VecDeque<WakeCause>,
    pub sync_results: VecDeque<core::result::Result<(), SyncError>>,
    pub syncs_at: Vec<DateTime>,
}

#[allow(dead_code)]
impl SimBoard {
    /// Idle board at 2025-06-01 12:00:00, no peer, button released.
    pub fn new() -> Self {
        Self {
            now_ns: 0,
            epoch_base: DateTime::new(2025, 6, 1, 12, 0, 0).unix_seconds(),
            button_held: false,
            peer_present: false,
            peer_reply_after_ms: None,
            signal_since_ns: None,
            relay: false,
            red: false,
            green: false,
            activity: false,
            peer_signal: false,
            trace: Vec::new(),
            both_lit_seen: false,
            fail_relay: false,
            fail_peer_response: false,
            feeds: 0,
            arms: 0,
            suspends: 0,
            wakes: VecDeque::new(),
            sync_results: VecDeque::new(),
            syncs_at: Vec::new(),
        }
    }

    pub fn at(hour: u8, minute: u8) -> Self {
        let mut hw = Self::new();
        hw.set_time(DateTime::new(2025, 6, 1, hour, minute, 0));
        hw
    }

    /// Jump the wall clock without moving uptime.
    pub fn set_time(&mut self, now: DateTime) {
        self.epoch_base = now.unix_seconds() - (self.now_ns / 1_000_000_000) as i64;
    }

    pub fn advance_ms(&mut self, ms: u32) {
        self.now_ns += u64::from(ms) * 1_000_000;
    }

    fn record(&mut self, out: Output) {
        let at = self.uptime_ms();
        self.trace.push((at, out));
        if self.red && self.green {
            self.both_lit_seen = true;
        }
    }

    // ── Trace queries ─────────────────────────────────────────

    /// Timestamps at which the relay changed to `level`.
    pub fn relay_edges(&self, level: bool) -> Vec<u32> {
        self.trace
            .iter()
            .filter(|(_, o)| *o == Output::Relay(level))
            .map(|(t, _)| *t)
            .collect()
    }

    /// Timestamps at which `led` was switched on.
    pub fn led_on_edges(&self, led: Led) -> Vec<u32> {
        self.trace
            .iter()
            .filter(|(_, o)| *o == Output::Led(led, true))
            .map(|(t, _)| *t)
            .collect()
    }

    pub fn all_outputs_safe(&self) -> bool {
        !self.relay && !self.red && !self.green && !self.activity && !self.peer_signal
    }
}

impl Default for SimBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl GateInputs for SimBoard {
    fn button_pressed(&mut self) -> Result<bool> {
        Ok(self.button_held)
    }

    fn peer_present(&mut self) -> Result<bool> {
        Ok(self.peer_present)
    }

    fn peer_responded(&mut self) -> Result<bool> {
        if self.fail_peer_response {
            return Err(Error::Gpio(Line::PeerResponse));
        }
        let (Some(since), Some(after)) = (self.signal_since_ns, self.peer_reply_after_ms) else {
            return Ok(false);
        };
        Ok(self.now_ns - since >= u64::from(after) * 1_000_000)
    }
}

impl GateOutputs for SimBoard {
    fn set_relay(&mut self, energised: bool) -> Result<()> {
        if self.fail_relay {
            return Err(Error::Gpio(Line::Relay));
        }
        if self.relay != energised {
            self.relay = energised;
            self.record(Output::Relay(energised));
        }
        Ok(())
    }

    fn set_led(&mut self, led: Led, on: bool) -> Result<()> {
        let slot = match led {
            Led::Red => &mut self.red,
            Led::Green => &mut self.green,
            Led::Activity => &mut self.activity,
        };
        if *slot != on {
            *slot = on;
            self.record(Output::Led(led, on));
        }
        Ok(())
    }

    fn set_peer_signal(&mut self, asserted: bool) -> Result<()> {
        if self.peer_signal != asserted {
            self.peer_signal = asserted;
            self.signal_since_ns = asserted.then_some(self.now_ns);
            self.record(Output::PeerSignal(asserted));
        }
        Ok(())
    }
}

impl DelayNs for SimBoard {
    fn delay_ns(&mut self, ns: u32) {
        self.now_ns += u64::from(ns);
    }
}

impl Timebase for SimBoard {
    fn uptime_ms(&self) -> u32 {
        (self.now_ns / 1_000_000) as u32
    }
}

impl WallClock for SimBoard {
    fn now(&self) -> DateTime {
        DateTime::from_unix(self.epoch_base + (self.now_ns / 1_000_000_000) as i64, 0)
    }
}

impl Watchdog for SimBoard {
    fn feed(&mut self) {
        self.feeds += 1;
    }
}

impl SleepPort for SimBoard {
    fn arm_button_wake(&mut self) -> Result<()> {
        self.arms += 1;
        Ok(())
    }

    /// Pops the next scripted wake; an empty script means shutdown.
    fn suspend(&mut self, max_ms: u32) -> WakeCause {
        self.suspends += 1;
        let cause = self.wakes.pop_front().unwrap_or(WakeCause::Shutdown);
        match cause {
            WakeCause::Timer => self.advance_ms(max_ms),
            WakeCause::Button => {
                self.advance_ms(1_000);
                self.button_held = true;
            }
            WakeCause::Other | WakeCause::Shutdown => {}
        }
        cause
    }

    fn restore_full_speed(&mut self) {}
}

impl ClockSync for SimBoard {
    fn sync(&mut self) -> core::result::Result<(), SyncError> {
        let now = self.now();
        self.syncs_at.push(now);
        self.sync_results.pop_front().unwrap_or(Ok(()))
    }
}

// ── Recording event sink ──────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
