//! Peripheral drivers that sit below the adapters.

pub mod watchdog;
