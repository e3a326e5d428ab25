//! Power scheduler: boot, wake cycles, daily clock sync, shutdown.

use gatelock::app::events::AppEvent;
use gatelock::app::ports::{GateOutputs, Led, Timebase, WakeCause};
use gatelock::app::service::GateService;
use gatelock::app::state::{ControllerState, Flag};
use gatelock::clock::{CalendarDate, DateTime};
use gatelock::config::GateConfig;
use gatelock::error::SyncError;
use gatelock::power::{CycleOutcome, PowerScheduler};

use crate::mock_hw::{RecordingSink, SimBoard};

fn scheduler(state: &ControllerState) -> PowerScheduler<'_> {
    PowerScheduler::new(GateService::new(state, GateConfig::default()))
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn boot_syncs_forces_safe_and_reports_status() {
    let state = ControllerState::new();
    let mut hw = SimBoard::at(19, 0);
    hw.relay = true;
    let mut sink = RecordingSink::new();

    scheduler(&state).boot(&mut hw, &mut sink).unwrap();

    assert_eq!(hw.syncs_at.len(), 1);
    assert!(!hw.relay);
    assert_eq!(hw.arms, 1);
    assert!(hw.green && !hw.red);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::Booted(r) if r.unlock_allowed && !r.peer_present)),
        1
    );
    // The boot sync is not the daily one.
    assert_eq!(state.last_sync_date(), None);
}

#[test]
fn failed_boot_sync_is_not_fatal() {
    let state = ControllerState::new();
    let mut hw = SimBoard::at(22, 0);
    hw.sync_results.push_back(Err(SyncError::NoCredentials));
    let mut sink = RecordingSink::new();

    assert!(scheduler(&state).boot(&mut hw, &mut sink).is_ok());
    assert!(sink.contains(&AppEvent::ClockSyncFailed(SyncError::NoCredentials)));
    assert!(hw.red && !hw.green);
}

#[test]
fn peer_presence_shows_green_outside_window() {
    let state = ControllerState::new();
    let mut hw = SimBoard::at(23, 30);
    hw.peer_present = true;
    let mut sink = RecordingSink::new();

    scheduler(&state).boot(&mut hw, &mut sink).unwrap();
    assert!(hw.green && !hw.red);
}

// ── Daily sync ────────────────────────────────────────────────

#[test]
fn clock_resyncs_once_per_day_inside_sync_window() {
    let state = ControllerState::new();
    let sched = scheduler(&state);
    let mut hw = SimBoard::new();
    let mut sink = RecordingSink::new();

    // Day D, 02:05 → wakes at 02:06: sync.
    hw.set_time(DateTime::new(2025, 6, 1, 2, 5, 0));
    hw.wakes.push_back(WakeCause::Timer);
    assert_eq!(sched.wake_cycle(&mut hw, &mut sink), CycleOutcome::Continue);
    assert_eq!(hw.syncs_at.len(), 1);
    assert_eq!(
        state.last_sync_date(),
        Some(CalendarDate {
            year: 2025,
            month: 6,
            day: 1
        })
    );

    // 02:07, same day: no second sync.
    hw.wakes.push_back(WakeCause::Timer);
    sched.wake_cycle(&mut hw, &mut sink);
    assert_eq!(hw.syncs_at.len(), 1);

    // Day D+1, 02:03 → 02:04: sync again.
    hw.set_time(DateTime::new(2025, 6, 2, 2, 3, 0));
    hw.wakes.push_back(WakeCause::Timer);
    sched.wake_cycle(&mut hw, &mut sink);
    assert_eq!(hw.syncs_at.len(), 2);
    assert_eq!(hw.syncs_at[1].minutes_of_day(), 2 * 60 + 4);
}

#[test]
fn same_day_of_month_in_the_next_month_still_resyncs() {
    let state = ControllerState::new();
    let sched = scheduler(&state);
    let mut hw = SimBoard::new();
    let mut sink = RecordingSink::new();

    hw.set_time(DateTime::new(2025, 6, 1, 2, 5, 0));
    hw.wakes.push_back(WakeCause::Timer);
    sched.wake_cycle(&mut hw, &mut sink);
    assert_eq!(hw.syncs_at.len(), 1);

    // Same day number one month later must not look like "already synced".
    hw.set_time(DateTime::new(2025, 7, 1, 2, 5, 0));
    hw.wakes.push_back(WakeCause::Timer);
    sched.wake_cycle(&mut hw, &mut sink);
    assert_eq!(hw.syncs_at.len(), 2);
    assert_eq!(
        state.last_sync_date(),
        Some(CalendarDate {
            year: 2025,
            month: 7,
            day: 1
        })
    );
}

#[test]
fn no_sync_outside_window() {
    let state = ControllerState::new();
    let sched = scheduler(&state);
    let mut hw = SimBoard::at(2, 10);
    let mut sink = RecordingSink::new();

    hw.wakes.push_back(WakeCause::Timer);
    sched.wake_cycle(&mut hw, &mut sink);
    assert!(hw.syncs_at.is_empty());
}

#[test]
fn failed_daily_sync_is_not_retried_the_same_day() {
    let state = ControllerState::new();
    let sched = scheduler(&state);
    let mut hw = SimBoard::at(2, 0);
    hw.sync_results.push_back(Err(SyncError::Timeout));
    let mut sink = RecordingSink::new();

    hw.wakes.push_back(WakeCause::Timer);
    hw.wakes.push_back(WakeCause::Timer);
    sched.wake_cycle(&mut hw, &mut sink);
    sched.wake_cycle(&mut hw, &mut sink);

    assert_eq!(hw.syncs_at.len(), 1);
    assert!(sink.contains(&AppEvent::ClockSyncFailed(SyncError::Timeout)));
}

// ── Wake handling ─────────────────────────────────────────────

#[test]
fn button_wake_runs_a_press() {
    let state = ControllerState::new();
    let sched = scheduler(&state);
    let mut hw = SimBoard::at(19, 0);
    let mut sink = RecordingSink::new();

    hw.wakes.push_back(WakeCause::Button);
    assert_eq!(sched.wake_cycle(&mut hw, &mut sink), CycleOutcome::Continue);

    assert_eq!(sink.count(|e| matches!(e, AppEvent::PressAccepted { .. })), 1);
    assert_eq!(hw.relay_edges(true).len(), 1);
    assert!(!hw.relay);
    // Status LED restored after the blink.
    assert!(hw.green);
}

#[test]
fn pending_edge_is_handled_without_sleeping() {
    let state = ControllerState::new();
    let sched = scheduler(&state);
    let mut hw = SimBoard::at(19, 0);
    hw.button_held = true;
    let mut sink = RecordingSink::new();

    assert!(state.on_edge(hw.uptime_ms()));
    // Empty wake script: sleeping would shut down.
    assert_eq!(sched.wake_cycle(&mut hw, &mut sink), CycleOutcome::Continue);
    assert_eq!(hw.suspends, 0);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::PressAccepted { .. })), 1);
}

#[test]
fn timer_wake_without_edge_only_refreshes_status() {
    let state = ControllerState::new();
    let sched = scheduler(&state);
    let mut hw = SimBoard::at(12, 0);
    hw.button_held = true;
    let mut sink = RecordingSink::new();

    hw.wakes.push_back(WakeCause::Timer);
    sched.wake_cycle(&mut hw, &mut sink);

    assert!(sink.events.iter().all(|e| !matches!(e, AppEvent::PressAccepted { .. })));
    assert!(hw.relay_edges(true).is_empty());
    assert!(hw.green);
    assert!(hw.feeds >= 1);
}

#[test]
fn status_leds_untouched_while_blinking() {
    let state = ControllerState::new();
    let sched = scheduler(&state);
    let mut hw = SimBoard::at(12, 0);
    let mut sink = RecordingSink::new();

    let blinking = state.claim(Flag::Blinking).unwrap();
    hw.wakes.push_back(WakeCause::Timer);
    sched.wake_cycle(&mut hw, &mut sink);
    assert!(!hw.green && !hw.red);

    drop(blinking);
    hw.wakes.push_back(WakeCause::Timer);
    sched.wake_cycle(&mut hw, &mut sink);
    assert!(hw.green);
}

// ── Shutdown ──────────────────────────────────────────────────

#[test]
fn shutdown_forces_every_output_safe() {
    let state = ControllerState::new();
    let sched = scheduler(&state);
    let mut hw = SimBoard::at(19, 0);
    hw.set_relay(true).unwrap();
    hw.set_led(Led::Green, true).unwrap();
    hw.set_peer_signal(true).unwrap();
    let mut sink = RecordingSink::new();

    assert_eq!(sched.wake_cycle(&mut hw, &mut sink), CycleOutcome::Stop);
    assert!(hw.all_outputs_safe());
    assert_eq!(sink.events.last(), Some(&AppEvent::Shutdown));
}

#[test]
fn run_loops_until_shutdown() {
    let state = ControllerState::new();
    let sched = scheduler(&state);
    let mut hw = SimBoard::at(12, 0);
    hw.wakes.extend([WakeCause::Timer, WakeCause::Other, WakeCause::Timer]);
    let mut sink = RecordingSink::new();

    sched.run(&mut hw, &mut sink).unwrap();

    assert_eq!(hw.suspends, 4);
    assert_eq!(hw.arms, 1 + 4);
    assert!(hw.all_outputs_safe());
    assert_eq!(sink.events.last(), Some(&AppEvent::Shutdown));
}
