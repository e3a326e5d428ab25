//! Actuation sequencer: relay pulse and LED blink feedback.
//!
//! The relay pulse and the blink share one tick loop. The pulse is an
//! explicit deadline ([`RelayPulse`]) polled after every sub-tick sleep, so
//! the relay drops at `unlock_pulse_ms` while the LED keeps blinking.

use log::{debug, info};

use crate::config::GateConfig;
use crate::error::Result;

use super::ports::{GateHardware, Led};
use super::state::{ControllerState, Flag};

// ───────────────────────────────────────────────────────────────
// LEDs
// ───────────────────────────────────────────────────────────────

/// Drive a status LED. Turning red or green on first turns the other off,
/// so both are never lit at the same time.
pub fn set_led_exclusive(hw: &mut impl GateHardware, led: Led, on: bool) -> Result<()> {
    if on {
        match led {
            Led::Red => hw.set_led(Led::Green, false)?,
            Led::Green => hw.set_led(Led::Red, false)?,
            Led::Activity => {}
        }
    }
    hw.set_led(led, on)
}

// ───────────────────────────────────────────────────────────────
// Relay pulse
// ───────────────────────────────────────────────────────────────

/// One relay assertion interval. Released exactly once.
#[derive(Debug)]
pub struct RelayPulse {
    started_ms: u32,
    width_ms: u32,
    released: bool,
}

impl RelayPulse {
    /// Energise the relay and start the pulse clock.
    pub fn start(hw: &mut impl GateHardware, width_ms: u32) -> Result<Self> {
        if let Err(e) = hw.set_relay(true) {
            // Level unknown after a fault; try to leave it released.
            let _ = hw.set_relay(false);
            return Err(e);
        }
        Ok(Self {
            started_ms: hw.uptime_ms(),
            width_ms,
            released: false,
        })
    }

    /// Release the relay once the pulse width has elapsed.
    /// Returns whether the relay is released.
    pub fn poll(&mut self, hw: &mut impl GateHardware) -> Result<bool> {
        if !self.released && self.elapsed_ms(hw.uptime_ms()) >= self.width_ms {
            self.release(hw)?;
        }
        Ok(self.released)
    }

    /// Release the relay now. Idempotent.
    pub fn release(&mut self, hw: &mut impl GateHardware) -> Result<()> {
        if self.released {
            return Ok(());
        }
        hw.set_relay(false)?;
        self.released = true;
        Ok(())
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    fn elapsed_ms(&self, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(self.started_ms)
    }

    fn remaining_ms(&self, now_ms: u32) -> u32 {
        self.width_ms.saturating_sub(self.elapsed_ms(now_ms))
    }
}

// ───────────────────────────────────────────────────────────────
// Blink
// ───────────────────────────────────────────────────────────────

/// Blink `led` (mirrored on the activity LED) for `blink_duration_ms`.
///
/// Returns `Ok(false)` without touching any line when a blink is already
/// running. `pulse`, if given, is polled after every sub-tick.
pub fn blink(
    state: &ControllerState,
    hw: &mut impl GateHardware,
    cfg: &GateConfig,
    led: Led,
    mut pulse: Option<&mut RelayPulse>,
) -> Result<bool> {
    let Some(_blinking) = state.claim(Flag::Blinking) else {
        debug!("blink {:?} skipped: already blinking", led);
        return Ok(false);
    };

    let result = blink_cycles(hw, cfg, led, &mut pulse);
    if result.is_err() {
        let _ = hw.set_led(led, false);
        let _ = hw.set_led(Led::Activity, false);
    }
    result.map(|()| true)
}

fn blink_cycles(
    hw: &mut impl GateHardware,
    cfg: &GateConfig,
    led: Led,
    pulse: &mut Option<&mut RelayPulse>,
) -> Result<()> {
    let half = (cfg.blink_interval_ms / 2).max(1);
    let start = hw.uptime_ms();

    while hw.uptime_ms().wrapping_sub(start) < cfg.blink_duration_ms {
        set_led_exclusive(hw, led, true)?;
        hw.set_led(Led::Activity, true)?;
        sleep_ticked(hw, cfg, half, pulse)?;

        hw.set_led(led, false)?;
        hw.set_led(Led::Activity, false)?;
        sleep_ticked(hw, cfg, half, pulse)?;
    }
    Ok(())
}

/// Sleep `ms` in slices of at most `blink_tick_ms`, feeding the watchdog
/// and polling the relay deadline after each slice.
fn sleep_ticked(
    hw: &mut impl GateHardware,
    cfg: &GateConfig,
    ms: u32,
    pulse: &mut Option<&mut RelayPulse>,
) -> Result<()> {
    let mut remaining = ms;
    while remaining > 0 {
        let step = remaining.min(cfg.blink_tick_ms);
        hw.delay_ms(step);
        hw.feed();
        if let Some(p) = pulse.as_deref_mut() {
            p.poll(hw)?;
        }
        remaining -= step;
    }
    Ok(())
}

/// Denial feedback: red blink, no relay.
pub fn blink_red(
    state: &ControllerState,
    hw: &mut impl GateHardware,
    cfg: &GateConfig,
) -> Result<bool> {
    blink(state, hw, cfg, Led::Red, None)
}

// ───────────────────────────────────────────────────────────────
// Unlock
// ───────────────────────────────────────────────────────────────

/// Pulse the relay for `unlock_pulse_ms` while blinking green.
///
/// Returns `Ok(false)` (no line touched) if an unlock is already in
/// progress. The relay is released before returning on every path.
pub fn unlock_gate(
    state: &ControllerState,
    hw: &mut impl GateHardware,
    cfg: &GateConfig,
) -> Result<bool> {
    let Some(_unlocking) = state.claim(Flag::Unlocking) else {
        info!("unlock already in progress");
        return Ok(false);
    };

    info!("unlocking gate");
    let mut pulse = RelayPulse::start(hw, cfg.unlock_pulse_ms)?;

    let result = match blink(state, hw, cfg, Led::Green, Some(&mut pulse)) {
        Ok(true) => Ok(()),
        // No blink to carry the pulse; wait it out on our own ticks.
        Ok(false) => wait_out(hw, cfg, &mut pulse),
        Err(e) => Err(e),
    };

    // Safety net: pulse and blink lengths are independent.
    let released = pulse.release(hw);
    result?;
    released?;
    info!("gate unlock complete");
    Ok(true)
}

fn wait_out(hw: &mut impl GateHardware, cfg: &GateConfig, pulse: &mut RelayPulse) -> Result<()> {
    while !pulse.poll(hw)? {
        let remaining = pulse.remaining_ms(hw.uptime_ms());
        hw.delay_ms(remaining.clamp(1, cfg.blink_tick_ms));
        hw.feed();
    }
    Ok(())
}
