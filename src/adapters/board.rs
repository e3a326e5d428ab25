//! The assembled controller board.
//!
//! [`Board`] owns every adapter and implements all hardware ports by
//! delegation, so the domain takes a single `&mut Board` and never holds
//! two mutable borrows at once.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::app::ports::{
    ClockSync, GateInputs, GateOutputs, Led, SleepPort, Timebase, WakeCause, WallClock, Watchdog,
};
use crate::clock::DateTime;
use crate::drivers::watchdog::TaskWatchdog;
use crate::error::{Result, SyncError};

use super::lines::GateLines;
use super::sleep::LightSleep;
use super::sntp::SntpClockSync;
use super::time::Esp32TimeAdapter;

pub struct Board<I, O> {
    pub lines: GateLines<I, O>,
    pub time: Esp32TimeAdapter,
    pub watchdog: TaskWatchdog,
    pub sleep: LightSleep,
    pub clock_sync: SntpClockSync,
}

impl<I: InputPin, O: OutputPin> GateInputs for Board<I, O> {
    fn button_pressed(&mut self) -> Result<bool> {
        self.lines.button_pressed()
    }

    fn peer_present(&mut self) -> Result<bool> {
        self.lines.peer_present()
    }

    fn peer_responded(&mut self) -> Result<bool> {
        self.lines.peer_responded()
    }
}

impl<I: InputPin, O: OutputPin> GateOutputs for Board<I, O> {
    fn set_relay(&mut self, energised: bool) -> Result<()> {
        self.lines.set_relay(energised)
    }

    fn set_led(&mut self, led: Led, on: bool) -> Result<()> {
        self.lines.set_led(led, on)
    }

    fn set_peer_signal(&mut self, asserted: bool) -> Result<()> {
        self.lines.set_peer_signal(asserted)
    }
}

impl<I, O> DelayNs for Board<I, O> {
    fn delay_ns(&mut self, ns: u32) {
        self.time.delay_ns(ns);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.time.delay_ms(ms);
    }
}

impl<I, O> Timebase for Board<I, O> {
    fn uptime_ms(&self) -> u32 {
        self.time.uptime_ms()
    }
}

impl<I, O> WallClock for Board<I, O> {
    fn now(&self) -> DateTime {
        self.time.now()
    }
}

impl<I, O> Watchdog for Board<I, O> {
    fn feed(&mut self) {
        self.watchdog.feed();
    }
}

impl<I, O> SleepPort for Board<I, O> {
    fn arm_button_wake(&mut self) -> Result<()> {
        self.sleep.arm_button_wake()
    }

    fn suspend(&mut self, max_ms: u32) -> WakeCause {
        self.sleep.suspend(max_ms)
    }

    fn restore_full_speed(&mut self) {
        self.sleep.restore_full_speed();
    }
}

impl<I, O> ClockSync for Board<I, O> {
    fn sync(&mut self) -> core::result::Result<(), SyncError> {
        self.clock_sync.sync()
    }
}
