//! Gatelock firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod clock;
pub mod config;
pub mod error;
pub mod pins;
pub mod power;
pub mod responder;

// Adapters compile on every target; the hardware-backed parts are guarded
// by cfg attributes inside.
pub mod adapters;
pub mod drivers;
