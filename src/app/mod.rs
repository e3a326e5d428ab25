//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the rules for the gate controller: press screening,
//! the peer handshake, the unlock policy and the actuation sequence. All
//! interaction with hardware happens through **port traits** defined in
//! [`ports`], keeping this layer fully testable without real peripherals.

pub mod actuation;
pub mod events;
pub mod guard;
pub mod peer;
pub mod policy;
pub mod ports;
pub mod service;
pub mod state;
