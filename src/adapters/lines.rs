//! Digital line adapter.
//!
//! Implements [`GateInputs`] and [`GateOutputs`] over `embedded-hal` 1.0
//! pins and owns the electrical polarity of every line:
//!
//! | Line          | Direction | Active |
//! |---------------|-----------|--------|
//! | button        | in        | LOW (pull-up) |
//! | peer detect   | in        | LOW (pull-up) |
//! | peer response | in        | HIGH (pull-down) |
//! | relay, LEDs   | out       | HIGH |
//! | peer signal   | out       | HIGH |
//!
//! On the device every input is a `PinDriver<AnyIOPin, Input>` and every
//! output a `PinDriver<AnyOutputPin, Output>`, so one type parameter per
//! direction is enough.

use embedded_hal::digital::{InputPin, OutputPin, PinState};

use crate::app::ports::{GateInputs, GateOutputs, Led};
use crate::error::{Error, Line, Result};

pub struct GateLines<I, O> {
    pub button: I,
    pub peer_detect: I,
    pub peer_response: I,
    pub relay: O,
    pub red_led: O,
    pub green_led: O,
    pub activity_led: O,
    pub peer_signal: O,
}

fn drive<O: OutputPin>(pin: &mut O, high: bool, line: Line) -> Result<()> {
    pin.set_state(PinState::from(high)).map_err(|_| Error::Gpio(line))
}

impl<I: InputPin, O: OutputPin> GateInputs for GateLines<I, O> {
    fn button_pressed(&mut self) -> Result<bool> {
        self.button.is_low().map_err(|_| Error::Gpio(Line::Button))
    }

    fn peer_present(&mut self) -> Result<bool> {
        self.peer_detect.is_low().map_err(|_| Error::Gpio(Line::PeerDetect))
    }

    fn peer_responded(&mut self) -> Result<bool> {
        self.peer_response.is_high().map_err(|_| Error::Gpio(Line::PeerResponse))
    }
}

impl<I: InputPin, O: OutputPin> GateOutputs for GateLines<I, O> {
    fn set_relay(&mut self, energised: bool) -> Result<()> {
        drive(&mut self.relay, energised, Line::Relay)
    }

    fn set_led(&mut self, led: Led, on: bool) -> Result<()> {
        match led {
            Led::Red => drive(&mut self.red_led, on, Line::RedLed),
            Led::Green => drive(&mut self.green_led, on, Line::GreenLed),
            Led::Activity => drive(&mut self.activity_led, on, Line::ActivityLed),
        }
    }

    fn set_peer_signal(&mut self, asserted: bool) -> Result<()> {
        drive(&mut self.peer_signal, asserted, Line::PeerSignal)
    }
}
