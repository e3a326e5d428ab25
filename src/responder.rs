//! Paired-device side of the two-device handshake.
//!
//! Runs on the peer controller: when the gate controller asserts its
//! signal line, answer with a short pulse on the response line. Written as
//! a non-blocking tick state machine so the peer's main loop can poll it
//! alongside its own work.

use log::info;

/// Timing for [`PeerResponder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponderConfig {
    /// Minimum spacing between two answered signals.
    pub debounce_ms: u32,
    /// How long the response line is held high.
    pub pulse_ms: u32,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 250,
            pulse_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Pulsing { since_ms: u32 },
}

pub struct PeerResponder {
    cfg: ResponderConfig,
    phase: Phase,
    last_trigger_ms: Option<u32>,
    answered: u32,
}

impl PeerResponder {
    pub fn new(cfg: ResponderConfig) -> Self {
        Self {
            cfg,
            phase: Phase::Idle,
            last_trigger_ms: None,
            answered: 0,
        }
    }

    /// Advance the state machine. `signal_high` is the sampled level of the
    /// incoming signal line; the return value is the level to drive on the
    /// response line.
    pub fn tick(&mut self, now_ms: u32, signal_high: bool) -> bool {
        if let Phase::Pulsing { since_ms } = self.phase {
            if now_ms.wrapping_sub(since_ms) < self.cfg.pulse_ms {
                return true;
            }
            self.phase = Phase::Idle;
        }

        let debounced = self
            .last_trigger_ms
            .is_none_or(|last| now_ms.wrapping_sub(last) >= self.cfg.debounce_ms);

        if signal_high && debounced {
            info!("peer signal detected, answering");
            self.last_trigger_ms = Some(now_ms);
            self.phase = Phase::Pulsing { since_ms: now_ms };
            self.answered += 1;
            return true;
        }
        false
    }

    /// Number of signals answered so far.
    pub fn answered(&self) -> u32 {
        self.answered
    }

    pub fn is_responding(&self) -> bool {
        matches!(self.phase, Phase::Pulsing { .. })
    }
}
