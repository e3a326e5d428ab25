//! Press handling end to end: admission, handshake, policy, actuation.

use gatelock::app::actuation::{blink_red, unlock_gate};
use gatelock::app::events::AppEvent;
use gatelock::app::guard::DropReason;
use gatelock::app::peer::PeerOutcome;
use gatelock::app::policy::UnlockOutcome;
use gatelock::app::ports::{Led, Timebase};
use gatelock::app::service::{GateService, PressResult};
use gatelock::app::state::{ControllerState, Flag};
use gatelock::config::GateConfig;
use gatelock::error::{Error, Line};

use crate::mock_hw::{Output, RecordingSink, SimBoard};

fn press(
    state: &ControllerState,
    hw: &mut SimBoard,
    sink: &mut RecordingSink,
) -> gatelock::error::Result<PressResult> {
    hw.button_held = true;
    let edge = hw.uptime_ms();
    GateService::new(state, GateConfig::default()).handle_press(hw, sink, edge)
}

fn assert_idle(state: &ControllerState) {
    assert!(!state.handler_active());
    assert!(!state.is_blinking());
    assert!(!state.is_unlocking());
}

// ── Solo mode ─────────────────────────────────────────────────

#[test]
fn solo_press_inside_window_pulses_relay_for_exactly_500ms() {
    let state = ControllerState::new();
    let mut hw = SimBoard::at(19, 0);
    let mut sink = RecordingSink::new();

    let result = press(&state, &mut hw, &mut sink).unwrap();
    assert_eq!(result, PressResult::Handled(UnlockOutcome::Unlocked));

    let on = hw.relay_edges(true);
    let off = hw.relay_edges(false);
    assert_eq!(on, vec![50], "relay energised right after the confirm delay");
    assert_eq!(off, vec![550]);
    assert!(!hw.relay);

    // 3000 ms of green blinking at a 250 ms period.
    let green = hw.led_on_edges(Led::Green);
    assert_eq!(green.len(), 12);
    assert_eq!(green.first(), Some(&50));
    assert_eq!(green.last(), Some(&(50 + 11 * 250)));
    assert!(hw.led_on_edges(Led::Red).is_empty());
    assert!(!hw.green && !hw.activity);

    // Confirm delay + blink + release settle.
    assert_eq!(hw.uptime_ms(), 50 + 3000 + 300);
    assert_idle(&state);
    assert!(sink.contains(&AppEvent::Outcome(UnlockOutcome::Unlocked)));
    assert!(!hw.both_lit_seen);
}

#[test]
fn solo_press_outside_window_blinks_red_without_relay() {
    let state = ControllerState::new();
    let mut hw = SimBoard::at(22, 0);
    let mut sink = RecordingSink::new();

    let result = press(&state, &mut hw, &mut sink).unwrap();
    assert_eq!(result, PressResult::Handled(UnlockOutcome::DeniedOutsideWindow));

    assert!(hw.relay_edges(true).is_empty());
    assert_eq!(hw.led_on_edges(Led::Red).len(), 12);
    assert!(hw.led_on_edges(Led::Green).is_empty());
    assert_eq!(hw.led_on_edges(Led::Activity).len(), 12);
    assert_idle(&state);
}

#[test]
fn window_end_is_exclusive() {
    let state = ControllerState::new();
    let mut hw = SimBoard::at(20, 30);
    let mut sink = RecordingSink::new();

    let result = press(&state, &mut hw, &mut sink).unwrap();
    assert_eq!(result, PressResult::Handled(UnlockOutcome::DeniedOutsideWindow));
}

// ── Two-device mode ───────────────────────────────────────────

#[test]
fn peer_reply_after_1200ms_unlocks_even_at_night() {
    let state = ControllerState::new();
    let mut hw = SimBoard::at(23, 0);
    hw.peer_present = true;
    hw.peer_reply_after_ms = Some(1200);
    let mut sink = RecordingSink::new();

    let result = press(&state, &mut hw, &mut sink).unwrap();
    assert_eq!(result, PressResult::Handled(UnlockOutcome::Unlocked));
    assert!(sink.contains(&AppEvent::PeerHandshake(PeerOutcome::Responded { after_ms: 1200 })));

    let signal: Vec<_> = hw
        .trace
        .iter()
        .filter(|(_, o)| matches!(o, Output::PeerSignal(_)))
        .copied()
        .collect();
    assert_eq!(signal, vec![(50, Output::PeerSignal(true)), (1250, Output::PeerSignal(false))]);

    // Relay goes up only after the handshake finished.
    assert_eq!(hw.relay_edges(true), vec![1250]);
    assert_eq!(hw.relay_edges(false), vec![1750]);
}

#[test]
fn peer_silence_times_out_at_5000ms_and_still_unlocks() {
    let state = ControllerState::new();
    let mut hw = SimBoard::at(19, 0);
    hw.peer_present = true;
    let mut sink = RecordingSink::new();

    let result = press(&state, &mut hw, &mut sink).unwrap();
    assert_eq!(result, PressResult::Handled(UnlockOutcome::PeerTimeoutButUnlocked));
    assert!(sink.contains(&AppEvent::PeerHandshake(PeerOutcome::TimedOut { waited_ms: 5000 })));
    assert!(!hw.peer_signal);
    assert_eq!(hw.relay_edges(true), vec![5050]);
    assert_eq!(hw.relay_edges(false), vec![5550]);
}

// ── Admission ─────────────────────────────────────────────────

#[test]
fn press_while_busy_is_dropped_without_side_effects() {
    let state = ControllerState::new();
    let mut hw = SimBoard::at(19, 0);
    let mut sink = RecordingSink::new();

    let _busy = state.claim(Flag::Handler).unwrap();
    let result = press(&state, &mut hw, &mut sink).unwrap();

    assert_eq!(result, PressResult::Dropped(DropReason::Busy));
    assert_eq!(state.last_press_ms(), None);
    assert_eq!(hw.uptime_ms(), 0);
    assert!(hw.trace.is_empty());
}

#[test]
fn edge_inside_debounce_is_a_bounce() {
    let state = ControllerState::new();
    let mut hw = SimBoard::at(19, 0);
    let mut sink = RecordingSink::new();
    hw.button_held = true;

    state.record_press(1_000);
    let service = GateService::new(&state, GateConfig::default());
    let result = service.handle_press(&mut hw, &mut sink, 1_100).unwrap();

    assert_eq!(result, PressResult::Dropped(DropReason::Bounce { elapsed_ms: 100 }));
    assert_eq!(state.last_press_ms(), Some(1_000));
    assert!(sink.contains(&AppEvent::PressDropped(DropReason::Bounce { elapsed_ms: 100 })));
}

#[test]
fn edge_exactly_at_debounce_is_accepted() {
    let state = ControllerState::new();
    let mut hw = SimBoard::at(19, 0);
    let mut sink = RecordingSink::new();
    hw.button_held = true;

    state.record_press(1_000);
    let service = GateService::new(&state, GateConfig::default());
    let result = service.handle_press(&mut hw, &mut sink, 1_250).unwrap();
    assert_eq!(result, PressResult::Handled(UnlockOutcome::Unlocked));
    assert_eq!(state.last_press_ms(), Some(1_250));
}

#[test]
fn released_before_confirmation_is_dropped() {
    let state = ControllerState::new();
    let mut hw = SimBoard::at(19, 0);
    let mut sink = RecordingSink::new();

    let service = GateService::new(&state, GateConfig::default());
    let result = service.handle_press(&mut hw, &mut sink, 0).unwrap();

    assert_eq!(result, PressResult::Dropped(DropReason::Released));
    assert_eq!(hw.uptime_ms(), 50);
    assert_eq!(state.last_press_ms(), None);
    assert!(hw.trace.is_empty());
}

// ── Faults ────────────────────────────────────────────────────

#[test]
fn relay_fault_aborts_press_and_clears_flags() {
    let state = ControllerState::new();
    let mut hw = SimBoard::at(19, 0);
    hw.fail_relay = true;
    let mut sink = RecordingSink::new();

    let result = press(&state, &mut hw, &mut sink);
    assert_eq!(result, Err(Error::Gpio(Line::Relay)));
    assert_idle(&state);
    assert!(sink.contains(&AppEvent::HandlerFault(Error::Gpio(Line::Relay))));
}

#[test]
fn peer_line_fault_deasserts_signal_and_clears_flags() {
    let state = ControllerState::new();
    let mut hw = SimBoard::at(19, 0);
    hw.peer_present = true;
    hw.fail_peer_response = true;
    let mut sink = RecordingSink::new();

    let result = press(&state, &mut hw, &mut sink);
    assert_eq!(result, Err(Error::Gpio(Line::PeerResponse)));
    assert!(!hw.peer_signal);
    assert!(hw.relay_edges(true).is_empty());
    assert_idle(&state);

    // The next press works once the line recovers.
    hw.fail_peer_response = false;
    hw.peer_reply_after_ms = Some(10);
    hw.advance_ms(1_000);
    let result = press(&state, &mut hw, &mut sink).unwrap();
    assert_eq!(result, PressResult::Handled(UnlockOutcome::Unlocked));
}

// ── Actuation guards ──────────────────────────────────────────

#[test]
fn unlock_while_unlocking_is_a_no_op() {
    let state = ControllerState::new();
    let mut hw = SimBoard::at(19, 0);

    let _held = state.claim(Flag::Unlocking).unwrap();
    assert_eq!(unlock_gate(&state, &mut hw, &GateConfig::default()), Ok(false));
    assert!(hw.trace.is_empty());
    assert_eq!(hw.uptime_ms(), 0);
}

#[test]
fn unlock_during_blink_still_releases_relay_on_time() {
    let state = ControllerState::new();
    let mut hw = SimBoard::at(19, 0);

    let _blinking = state.claim(Flag::Blinking).unwrap();
    assert_eq!(unlock_gate(&state, &mut hw, &GateConfig::default()), Ok(true));
    assert_eq!(hw.relay_edges(true), vec![0]);
    assert_eq!(hw.relay_edges(false), vec![500]);
    assert!(hw.led_on_edges(Led::Green).is_empty());
    assert!(!state.is_unlocking());
}

#[test]
fn second_blink_is_skipped() {
    let state = ControllerState::new();
    let mut hw = SimBoard::at(19, 0);

    let _blinking = state.claim(Flag::Blinking).unwrap();
    assert_eq!(blink_red(&state, &mut hw, &GateConfig::default()), Ok(false));
    assert!(hw.trace.is_empty());
}

#[test]
fn long_waits_feed_the_watchdog() {
    let state = ControllerState::new();
    let mut hw = SimBoard::at(19, 0);
    hw.peer_present = true;
    let mut sink = RecordingSink::new();

    press(&state, &mut hw, &mut sink).unwrap();
    // 5000 ms handshake at 10 ms polls plus 3000 ms of ≤100 ms blink ticks.
    assert!(hw.feeds >= 500 + 30, "only {} feeds", hw.feeds);
}

#[test]
fn red_and_green_never_lit_together() {
    let state = ControllerState::new();
    let service = GateService::new(&state, GateConfig::default());
    let mut sink = RecordingSink::new();

    let mut hw = SimBoard::at(22, 0);
    service.display_status(&mut hw).unwrap();
    assert!(hw.red && !hw.green);

    hw.set_time(gatelock::clock::DateTime::new(2025, 6, 2, 19, 0, 0));
    hw.button_held = true;
    let edge = hw.uptime_ms();
    service.handle_press(&mut hw, &mut sink, edge).unwrap();
    service.display_status(&mut hw).unwrap();
    assert!(hw.green && !hw.red);

    assert!(!hw.both_lit_seen);
}
