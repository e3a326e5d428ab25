//! Paired-device firmware: answers the gate controller's press signal.
//!
//! Polls the signal line every 10 ms and drives the answer line from
//! [`PeerResponder`]. The board also ties the controller's detect line to
//! ground, which is how the controller knows a peer is fitted.

use anyhow::{Context, Result};
use log::info;

use embedded_hal::delay::DelayNs;
use esp_idf_svc::hal::delay::Delay;
use esp_idf_svc::hal::gpio::{PinDriver, Pull};
use esp_idf_svc::hal::peripherals::Peripherals;

use gatelock::pins;
use gatelock::responder::{PeerResponder, ResponderConfig};

const POLL_MS: u32 = 10;

fn uptime_ms() -> u32 {
    (unsafe { esp_idf_svc::sys::esp_timer_get_time() } / 1000) as u32
}

fn main() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    info!("Gatelock peer responder v{}", env!("CARGO_PKG_VERSION"));

    let peripherals = Peripherals::take().context("peripherals already taken")?;
    let mut signal = PinDriver::input(peripherals.pins.gpio26)?;
    signal.set_pull(Pull::Down)?;
    let mut answer = PinDriver::output(peripherals.pins.gpio13)?;
    answer.set_low()?;
    info!(
        "signal=GPIO{} answer=GPIO{}",
        pins::RESPONDER_SIGNAL_GPIO,
        pins::RESPONDER_ANSWER_GPIO
    );

    let mut responder = PeerResponder::new(ResponderConfig::default());
    let mut delay = Delay::new_default();
    loop {
        let level = responder.tick(uptime_ms(), signal.is_high());
        if level {
            answer.set_high()?;
        } else {
            answer.set_low()?;
        }
        delay.delay_ms(POLL_MS);
    }
}
