//! Controller state shared between the button ISR and the main loop.
//!
//! One instance lives for the whole firmware lifetime (a `static` in
//! `main`). The ISR only ever touches it through [`ControllerState::on_edge`];
//! everything else runs on the main task. Xtensa has no 64-bit atomics, so
//! timestamps are `u32` milliseconds compared with `wrapping_sub`.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::clock::CalendarDate;

/// Busy flags that serialise press handling and actuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    /// A press is being processed.
    Handler,
    /// An LED blink sequence is running.
    Blinking,
    /// The relay pulse is in progress.
    Unlocking,
}

pub struct ControllerState {
    handler_active: AtomicBool,
    blinking: AtomicBool,
    unlocking: AtomicBool,

    last_press_ms: AtomicU32,
    has_pressed: AtomicBool,

    edge_pending: AtomicBool,
    pending_edge_ms: AtomicU32,

    /// `yyyymmdd` of the last daily re-sync, 0 = never.
    last_sync_date: AtomicU32,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerState {
    pub const fn new() -> Self {
        Self {
            handler_active: AtomicBool::new(false),
            blinking: AtomicBool::new(false),
            unlocking: AtomicBool::new(false),
            last_press_ms: AtomicU32::new(0),
            has_pressed: AtomicBool::new(false),
            edge_pending: AtomicBool::new(false),
            pending_edge_ms: AtomicU32::new(0),
            last_sync_date: AtomicU32::new(0),
        }
    }

    fn flag(&self, flag: Flag) -> &AtomicBool {
        match flag {
            Flag::Handler => &self.handler_active,
            Flag::Blinking => &self.blinking,
            Flag::Unlocking => &self.unlocking,
        }
    }

    // ── ISR side ──────────────────────────────────────────────

    /// Record a falling edge of the button line. ISR-safe.
    ///
    /// Returns `false` when the edge was dropped because a press is already
    /// being handled. A dropped edge leaves the state untouched.
    pub fn on_edge(&self, now_ms: u32) -> bool {
        if self.handler_active.load(Ordering::Acquire) {
            return false;
        }
        self.pending_edge_ms.store(now_ms, Ordering::Relaxed);
        self.edge_pending.store(true, Ordering::Release);
        true
    }

    /// Consume the pending edge, if any (main loop side).
    pub fn take_pending_edge(&self) -> Option<u32> {
        if self.edge_pending.swap(false, Ordering::Acquire) {
            Some(self.pending_edge_ms.load(Ordering::Relaxed))
        } else {
            None
        }
    }

    // ── Busy flags ────────────────────────────────────────────

    /// Non-blocking trylock on a busy flag. The flag is cleared when the
    /// returned guard is dropped, on every exit path.
    pub fn claim(&self, flag: Flag) -> Option<FlagGuard<'_>> {
        self.flag(flag)
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FlagGuard { state: self, flag })
    }

    pub fn is_set(&self, flag: Flag) -> bool {
        self.flag(flag).load(Ordering::Acquire)
    }

    pub fn handler_active(&self) -> bool {
        self.is_set(Flag::Handler)
    }

    pub fn is_blinking(&self) -> bool {
        self.is_set(Flag::Blinking)
    }

    pub fn is_unlocking(&self) -> bool {
        self.is_set(Flag::Unlocking)
    }

    // ── Debounce ──────────────────────────────────────────────

    /// Timestamp of the last accepted press, `None` before the first.
    pub fn last_press_ms(&self) -> Option<u32> {
        self.has_pressed
            .load(Ordering::Acquire)
            .then(|| self.last_press_ms.load(Ordering::Relaxed))
    }

    pub fn record_press(&self, at_ms: u32) {
        self.last_press_ms.store(at_ms, Ordering::Relaxed);
        self.has_pressed.store(true, Ordering::Release);
    }

    // ── Daily re-sync marker ──────────────────────────────────

    pub fn last_sync_date(&self) -> Option<CalendarDate> {
        CalendarDate::from_marker(self.last_sync_date.load(Ordering::Acquire))
    }

    pub fn record_sync_date(&self, date: CalendarDate) {
        self.last_sync_date.store(date.to_marker(), Ordering::Release);
    }
}

/// RAII token for a claimed [`Flag`].
#[must_use = "the flag is released as soon as the guard is dropped"]
pub struct FlagGuard<'a> {
    state: &'a ControllerState,
    flag: Flag,
}

impl FlagGuard<'_> {
    pub fn flag(&self) -> Flag {
        self.flag
    }
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        self.state.flag(self.flag).store(false, Ordering::Release);
    }
}

impl core::fmt::Debug for FlagGuard<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("FlagGuard").field(&self.flag).finish()
    }
}
