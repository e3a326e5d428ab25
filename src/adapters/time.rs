//! ESP32 time adapter.
//!
//! Provides monotonic time, blocking delays and local wall-clock time.
//!
//! - **`target_os = "espidf"`**: `esp_timer_get_time()` for uptime (keeps
//!   counting through light sleep), `gettimeofday()` for the RTC-backed
//!   system clock that SNTP sets, and `esp_idf_hal::delay::Delay` (FreeRTOS
//!   delay for long waits, busy-wait for short ones).
//! - **`not(target_os = "espidf")`**: `std::time` for host-side simulation.

use embedded_hal::delay::DelayNs;

use crate::app::ports::{Timebase, WallClock};
use crate::clock::DateTime;

/// Time adapter for the ESP32 platform.
pub struct Esp32TimeAdapter {
    utc_offset_minutes: i16,
    #[cfg(target_os = "espidf")]
    delay: esp_idf_hal::delay::Delay,
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Esp32TimeAdapter {
    pub fn new(utc_offset_minutes: i16) -> Self {
        Self {
            utc_offset_minutes,
            #[cfg(target_os = "espidf")]
            delay: esp_idf_hal::delay::Delay::new_default(),
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since boot (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    /// Seconds since the Unix epoch (UTC) from the system clock.
    #[cfg(target_os = "espidf")]
    pub fn unix_seconds(&self) -> Option<i64> {
        let mut tv = esp_idf_svc::sys::timeval { tv_sec: 0, tv_usec: 0 };
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, core::ptr::null_mut()) } != 0 {
            return None;
        }
        Some(tv.tv_sec as i64)
    }

    /// Seconds since the Unix epoch (UTC) from the host clock.
    #[cfg(not(target_os = "espidf"))]
    pub fn unix_seconds(&self) -> Option<i64> {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .ok()
            .map(|d| d.as_secs() as i64)
    }
}

impl DelayNs for Esp32TimeAdapter {
    #[cfg(target_os = "espidf")]
    fn delay_ns(&mut self, ns: u32) {
        self.delay.delay_ns(ns);
    }

    #[cfg(not(target_os = "espidf"))]
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }

    #[cfg(target_os = "espidf")]
    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    #[cfg(not(target_os = "espidf"))]
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}

impl Timebase for Esp32TimeAdapter {
    fn uptime_ms(&self) -> u32 {
        // Truncation is the intended wrap; consumers use wrapping_sub.
        (self.uptime_us() / 1000) as u32
    }
}

impl WallClock for Esp32TimeAdapter {
    /// Local time. Before the first SNTP sync this is 1970 (or whatever
    /// the RTC held); the policy still evaluates against it.
    fn now(&self) -> DateTime {
        DateTime::from_unix(self.unix_seconds().unwrap_or(0), self.utc_offset_minutes)
    }
}
