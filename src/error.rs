//! Unified error types for the gate controller.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! press handler and the sleep loop uniform. All variants are `Copy` so
//! they can be reported through the event sink without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A digital line could not be read or driven.
    Gpio(Line),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
    /// Network time synchronisation failed.
    Sync(SyncError),
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpio(line) => write!(f, "gpio: {line} line fault"),
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Sync(e) => write!(f, "sync: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Lines
// ---------------------------------------------------------------------------

/// Identifies the physical line involved in a GPIO fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Button,
    PeerDetect,
    PeerResponse,
    Relay,
    RedLed,
    GreenLed,
    ActivityLed,
    PeerSignal,
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Button => "button",
            Self::PeerDetect => "peer-detect",
            Self::PeerResponse => "peer-response",
            Self::Relay => "relay",
            Self::RedLed => "red-led",
            Self::GreenLed => "green-led",
            Self::ActivityLed => "activity-led",
            Self::PeerSignal => "peer-signal",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Clock synchronisation errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncError {
    /// No WiFi credentials were compiled in.
    NoCredentials,
    /// Credentials failed validation (length / charset).
    InvalidCredentials,
    /// Station did not associate within the connect timeout.
    WifiConnectFailed,
    /// SNTP did not complete within the sync timeout.
    Timeout,
    /// The SNTP client could not be started.
    SntpUnavailable,
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi credentials configured"),
            Self::InvalidCredentials => write!(f, "WiFi credentials invalid"),
            Self::WifiConnectFailed => write!(f, "WiFi connection failed"),
            Self::Timeout => write!(f, "SNTP sync timed out"),
            Self::SntpUnavailable => write!(f, "SNTP client unavailable"),
        }
    }
}

impl From<SyncError> for Error {
    fn from(e: SyncError) -> Self {
        Self::Sync(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
