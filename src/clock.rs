//! Wall-clock primitives: civil date/time, time-of-day windows.
//!
//! The device keeps UTC in the system clock (set by SNTP) and derives local
//! time by applying a fixed offset. All conversions here are pure so the
//! policy and the daily re-sync logic can be tested on the host.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Minutes in one day; time-of-day values are `0..MINUTES_PER_DAY`.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

const SECS_PER_DAY: i64 = 86_400;

// ───────────────────────────────────────────────────────────────
// Calendar date
// ───────────────────────────────────────────────────────────────

/// A calendar date, used as the daily re-sync marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CalendarDate {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

impl CalendarDate {
    /// Pack into `yyyymmdd` so the marker fits a single atomic word.
    /// Never returns 0 for a real date.
    pub const fn to_marker(self) -> u32 {
        self.year as u32 * 10_000 + self.month as u32 * 100 + self.day as u32
    }

    /// Inverse of [`to_marker`](Self::to_marker); 0 means "no date".
    pub const fn from_marker(marker: u32) -> Option<Self> {
        if marker == 0 {
            return None;
        }
        Some(Self {
            year: (marker / 10_000) as u16,
            month: ((marker / 100) % 100) as u8,
            day: (marker % 100) as u8,
        })
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

// ───────────────────────────────────────────────────────────────
// DateTime
// ───────────────────────────────────────────────────────────────

/// Local civil time as read from the RTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DateTime {
    pub const fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    /// Convert Unix seconds (UTC) to local time at a fixed offset.
    pub fn from_unix(secs: i64, utc_offset_minutes: i16) -> Self {
        let local = secs + i64::from(utc_offset_minutes) * 60;
        let days = local.div_euclid(SECS_PER_DAY);
        let rem = local.rem_euclid(SECS_PER_DAY);
        let (year, month, day) = civil_from_days(days);
        Self {
            year: year as u16,
            month: month as u8,
            day: day as u8,
            hour: (rem / 3600) as u8,
            minute: ((rem % 3600) / 60) as u8,
            second: (rem % 60) as u8,
        }
    }

    /// Seconds since the Unix epoch, treating `self` as UTC.
    pub fn unix_seconds(&self) -> i64 {
        let days =
            days_from_civil(i64::from(self.year), u32::from(self.month), u32::from(self.day));
        days * SECS_PER_DAY
            + i64::from(self.hour) * 3600
            + i64::from(self.minute) * 60
            + i64::from(self.second)
    }

    /// `hour * 60 + minute`.
    pub const fn minutes_of_day(&self) -> u16 {
        self.hour as u16 * 60 + self.minute as u16
    }

    pub const fn date(&self) -> CalendarDate {
        CalendarDate {
            year: self.year,
            month: self.month,
            day: self.day,
        }
    }

    /// Rough plausibility check: anything before 2020 means the RTC has
    /// never been set since power-on.
    pub const fn looks_synced(&self) -> bool {
        self.year >= 2020
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

// Days since 1970-01-01 for a proleptic Gregorian date (H. Hinnant's algorithm).
fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = (if y >= 0 { y } else { y - 399 }) / 400;
    let yoe = (y - era * 400) as u64;
    let mp = u64::from((month + 9) % 12);
    let doy = (153 * mp + 2) / 5 + u64::from(day) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe as i64 - 719_468
}

fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = (if z >= 0 { z } else { z - 146_096 }) / 146_097;
    let doe = (z - era * 146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe as i64 + era * 400 + i64::from(month <= 2);
    (year, month, day)
}

// ───────────────────────────────────────────────────────────────
// Time-of-day windows
// ───────────────────────────────────────────────────────────────

/// Half-open daily window `[start_minutes, end_minutes)`.
///
/// Windows crossing midnight are rejected: `start < end` must hold within
/// a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start_minutes: u16,
    pub end_minutes: u16,
}

impl TimeWindow {
    /// Build a window, rejecting empty, inverted and midnight-crossing ranges.
    pub const fn new(start_minutes: u16, end_minutes: u16) -> Result<Self, &'static str> {
        let window = Self {
            start_minutes,
            end_minutes,
        };
        match window.check() {
            Ok(()) => Ok(window),
            Err(e) => Err(e),
        }
    }

    /// Convenience constructor from `HH:MM` pairs.
    pub const fn from_hm(
        start_hour: u8,
        start_minute: u8,
        end_hour: u8,
        end_minute: u8,
    ) -> Result<Self, &'static str> {
        Self::new(
            start_hour as u16 * 60 + start_minute as u16,
            end_hour as u16 * 60 + end_minute as u16,
        )
    }

    /// Validate a window that may have come from storage.
    pub const fn check(&self) -> Result<(), &'static str> {
        if self.end_minutes > MINUTES_PER_DAY {
            return Err("time window end must be at or before 24:00");
        }
        if self.start_minutes >= self.end_minutes {
            return Err("time window must not be empty or cross midnight");
        }
        Ok(())
    }

    pub const fn contains(&self, minutes_of_day: u16) -> bool {
        self.start_minutes <= minutes_of_day && minutes_of_day < self.end_minutes
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}-{:02}:{:02}",
            self.start_minutes / 60,
            self.start_minutes % 60,
            self.end_minutes / 60,
            self.end_minutes % 60
        )
    }
}

/// Daily maintenance window in which the clock is re-synchronised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncWindow {
    pub start_minutes: u16,
    pub length_minutes: u16,
}

impl SyncWindow {
    pub const fn contains(&self, minutes_of_day: u16) -> bool {
        minutes_of_day >= self.start_minutes
            && minutes_of_day - self.start_minutes < self.length_minutes
    }
}
