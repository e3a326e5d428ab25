//! Gate controller configuration.
//!
//! All tunable timings and the unlock policy window. Defaults are the
//! production values; a stored copy in NVS (postcard blob) overrides them
//! at boot. The configuration is immutable once the controller starts.

use serde::{Deserialize, Serialize};

use crate::clock::{SyncWindow, TimeWindow};

/// Longest sleep slice inside blink/peer waits, so the watchdog and any
/// cooperative housekeeping are serviced at least this often.
pub const MAX_TICK_MS: u32 = 100;

/// Local-time offset baked in at build time (`GATELOCK_UTC_OFFSET_MINUTES`).
pub fn build_utc_offset_minutes() -> i16 {
    option_env!("GATELOCK_UTC_OFFSET_MINUTES")
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    // --- Policy ---
    /// Daily window in which a solo press unlocks.
    pub unlock_window: TimeWindow,

    // --- Actuation ---
    /// How long the relay is held energised.
    pub unlock_pulse_ms: u32,
    /// Full on+off period of the feedback blink.
    pub blink_interval_ms: u32,
    /// Total duration of the feedback blink.
    pub blink_duration_ms: u32,
    /// Longest single sleep inside a blink half-period.
    pub blink_tick_ms: u32,

    // --- Button ---
    /// Minimum spacing between two accepted presses.
    pub debounce_ms: u32,
    /// Delay before re-reading the button to confirm a deliberate hold.
    pub confirm_delay_ms: u32,
    /// Settle time before the handler releases its busy flag.
    pub release_settle_ms: u32,
    /// Stabilisation delay after restoring full CPU speed on wake.
    pub wake_settle_ms: u32,

    // --- Peer ---
    /// Upper bound on waiting for the paired device.
    pub peer_response_timeout_ms: u32,
    /// Polling period of the peer response line.
    pub peer_poll_interval_ms: u32,

    // --- Power / time ---
    /// Longest light-sleep period between wakes.
    pub max_sleep_ms: u32,
    /// Daily clock re-sync window.
    pub sync_window: SyncWindow,
    /// Local-time offset from UTC in minutes.
    pub utc_offset_minutes: i16,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            // 06:00 - 20:30
            unlock_window: TimeWindow {
                start_minutes: 6 * 60,
                end_minutes: 20 * 60 + 30,
            },

            unlock_pulse_ms: 500,
            blink_interval_ms: 250,
            blink_duration_ms: 3000,
            blink_tick_ms: MAX_TICK_MS,

            debounce_ms: 250,
            confirm_delay_ms: 50,
            release_settle_ms: 300,
            wake_settle_ms: 5,

            peer_response_timeout_ms: 5000,
            peer_poll_interval_ms: 10,

            max_sleep_ms: 60_000,
            // 02:00 - 02:09
            sync_window: SyncWindow {
                start_minutes: 2 * 60,
                length_minutes: 10,
            },
            utc_offset_minutes: build_utc_offset_minutes(),
        }
    }
}

impl GateConfig {
    /// Range-check every field. Called before a stored config is accepted
    /// and before one is persisted.
    pub fn validate(&self) -> Result<(), &'static str> {
        self.unlock_window.check()?;

        let durations = [
            (self.unlock_pulse_ms, "unlock_pulse_ms must be > 0"),
            (self.blink_interval_ms, "blink_interval_ms must be > 0"),
            (self.blink_duration_ms, "blink_duration_ms must be > 0"),
            (self.blink_tick_ms, "blink_tick_ms must be > 0"),
            (self.debounce_ms, "debounce_ms must be > 0"),
            (self.confirm_delay_ms, "confirm_delay_ms must be > 0"),
            (self.release_settle_ms, "release_settle_ms must be > 0"),
            (self.wake_settle_ms, "wake_settle_ms must be > 0"),
            (self.peer_response_timeout_ms, "peer_response_timeout_ms must be > 0"),
            (self.peer_poll_interval_ms, "peer_poll_interval_ms must be > 0"),
            (self.max_sleep_ms, "max_sleep_ms must be > 0"),
        ];
        if let Some((_, msg)) = durations.iter().find(|(v, _)| *v == 0) {
            return Err(*msg);
        }

        if self.blink_tick_ms > MAX_TICK_MS {
            return Err("blink_tick_ms must be <= 100");
        }
        if self.peer_poll_interval_ms > MAX_TICK_MS {
            return Err("peer_poll_interval_ms must be <= 100");
        }
        let sync_end =
            u32::from(self.sync_window.start_minutes) + u32::from(self.sync_window.length_minutes);
        let day_end = u32::from(crate::clock::MINUTES_PER_DAY);
        if self.sync_window.length_minutes == 0 || sync_end > day_end {
            return Err("sync_window must be non-empty and within one day");
        }
        if !(-14 * 60..=14 * 60).contains(&self.utc_offset_minutes) {
            return Err("utc_offset_minutes must be within +/-14h");
        }
        Ok(())
    }
}
