//! GPIO pin assignments for the gate controller board.
//!
//! Single source of truth: `main` picks the matching `esp_idf_hal` pins and
//! the light-sleep adapter registers the wake source by number. All lines
//! are RTC-capable GPIOs so they keep their level through light sleep.

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Momentary push-button, active LOW with internal pull-up. Wakes the CPU.
pub const BUTTON_GPIO: i32 = 25;

/// Paired-device detect line, active LOW (the peer pulls it to ground).
pub const PEER_DETECT_GPIO: i32 = 32;

/// Paired-device response line, active HIGH (peer asserts to confirm).
pub const PEER_RESPONSE_GPIO: i32 = 13;

// ---------------------------------------------------------------------------
// Outputs (all active HIGH)
// ---------------------------------------------------------------------------

/// Unlock relay driver.
pub const RELAY_GPIO: i32 = 27;

pub const RED_LED_GPIO: i32 = 33;
pub const GREEN_LED_GPIO: i32 = 14;

/// On-board LED, mirrors blink feedback.
pub const ACTIVITY_LED_GPIO: i32 = 2;

/// Signal to the paired device that the button was pressed.
pub const PEER_SIGNAL_GPIO: i32 = 26;

// ---------------------------------------------------------------------------
// Paired-device (responder) board, wired pin-for-pin opposite the controller
// ---------------------------------------------------------------------------

/// Incoming press signal from the controller.
pub const RESPONDER_SIGNAL_GPIO: i32 = 26;

/// Answer pulse back to the controller.
pub const RESPONDER_ANSWER_GPIO: i32 = 13;
