//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ GateService / PowerScheduler (domain)
//! ```
//!
//! Driven adapters (lines, clocks, sleep control, event sinks, storage)
//! implement these traits. The domain consumes them via generics, so the
//! press handler and the sleep loop never touch hardware directly.
//!
//! Electrical polarity lives in the adapters: every `bool` here is the
//! *logical* state ("button pressed", "relay energised"), never a pin level.

use embedded_hal::delay::DelayNs;

use crate::clock::DateTime;
use crate::config::GateConfig;
use crate::error::{Result, SyncError};

// ───────────────────────────────────────────────────────────────
// Line ports (driven adapter: pins ↔ domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the three input lines.
pub trait GateInputs {
    /// The push-button is currently held.
    fn button_pressed(&mut self) -> Result<bool>;

    /// The paired device is connected (detect line asserted).
    fn peer_present(&mut self) -> Result<bool>;

    /// The paired device is asserting its response line.
    fn peer_responded(&mut self) -> Result<bool>;
}

/// Status LEDs driven by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Led {
    Red,
    Green,
    /// On-board LED, mirrors blink feedback.
    Activity,
}

/// Write-side port for the output lines.
pub trait GateOutputs {
    /// Energise (`true`) or release (`false`) the unlock relay.
    fn set_relay(&mut self, energised: bool) -> Result<()>;

    /// Drive a single LED. Mutual exclusion of red/green is enforced by the
    /// domain, not by implementations.
    fn set_led(&mut self, led: Led, on: bool) -> Result<()>;

    /// Assert or deassert the signal line towards the paired device.
    fn set_peer_signal(&mut self, asserted: bool) -> Result<()>;
}

// ───────────────────────────────────────────────────────────────
// Time ports
// ───────────────────────────────────────────────────────────────

/// Monotonic time plus blocking delays.
///
/// `uptime_ms` wraps after ~49 days; every consumer compares timestamps
/// with `wrapping_sub`.
pub trait Timebase: DelayNs {
    fn uptime_ms(&self) -> u32;
}

/// Local wall-clock time (RTC, survives light sleep).
pub trait WallClock {
    fn now(&self) -> DateTime;
}

/// Best-effort network time synchronisation. Implementations must return
/// within a bounded time and never retry in a loop.
pub trait ClockSync {
    fn sync(&mut self) -> core::result::Result<(), SyncError>;
}

// ───────────────────────────────────────────────────────────────
// Power port
// ───────────────────────────────────────────────────────────────

/// Why a [`SleepPort::suspend`] call returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeCause {
    /// The button line woke the CPU.
    Button,
    /// The sleep timer expired.
    Timer,
    /// Any other wake source (UART, undefined after reset, ...).
    Other,
    /// An external stop request: force outputs safe and leave the loop.
    Shutdown,
}

/// Light-sleep control.
pub trait SleepPort {
    /// (Re-)register the button line as a level wake source.
    fn arm_button_wake(&mut self) -> Result<()>;

    /// Suspend for at most `max_ms`, returning early on a button wake.
    fn suspend(&mut self, max_ms: u32) -> WakeCause;

    /// Lift any reduced CPU frequency left behind by the wake path.
    fn restore_full_speed(&mut self);
}

/// Hardware watchdog; fed from every bounded wait.
pub trait Watchdog {
    fn feed(&mut self);
}

/// Everything the press handler needs from the board.
///
/// Taking one `&mut impl GateHardware` avoids a double mutable borrow
/// while keeping the port boundary explicit.
pub trait GateHardware: GateInputs + GateOutputs + Timebase + WallClock + Watchdog {}

impl<T> GateHardware for T where T: GateInputs + GateOutputs + Timebase + WallClock + Watchdog {}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the controller configuration.
///
/// Implementations MUST validate before persisting and reject invalid
/// ranges with [`ConfigError::ValidationFailed`] rather than clamping.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`ConfigError::NotFound`] on first boot.
    fn load(&self) -> core::result::Result<GateConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &GateConfig) -> core::result::Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
