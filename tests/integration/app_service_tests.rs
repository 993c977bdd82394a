//! Integration tests for the AppService → occupancy → outlet pipeline.
//!
//! These run on the host against mock adapters and a manual clock: every
//! tick is 100 ms of simulated time, with no real sleeping.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use chrono::NaiveDate;
use presence_plug::app::events::{AppEvent, CommandReason};
use presence_plug::app::ports::{SunTimes, TimePort};
use presence_plug::app::service::AppService;
use presence_plug::config::SystemConfig;
use presence_plug::error::{DaylightError, Error};
use presence_plug::occupancy::OutletState;

use crate::mock_hw::{MockHardware, ManualClock, Recorder, SECOND, ScriptedDaylight, at, hm};

const POLL_MS: u64 = 100;

/// 60 s grace, 120 s re-off interval, 100 ms poll.
fn config() -> SystemConfig {
    let mut c = SystemConfig::default();
    c.turn_off_after_secs = 60;
    c.periodic_off_interval_secs = 120;
    c.poll_interval_ms = POLL_MS as u32;
    c
}

/// Tick until monotonic time passes `until_ms`.
fn drive(
    app: &mut AppService,
    hw: &mut MockHardware,
    daylight: &mut ScriptedDaylight,
    clock: &mut ManualClock,
    sink: &mut Recorder,
    until_ms: u64,
) -> presence_plug::error::Result<()> {
    while clock.monotonic_ms() <= until_ms {
        app.tick(hw, daylight, &*clock, sink)?;
        clock.sleep(Duration::from_millis(POLL_MS));
    }
    Ok(())
}

/// Night-time start: the window is open from 18:45 until 06:00.
fn night() -> ManualClock {
    ManualClock::new(at(2024, 10, 10, 22, 0, 0))
}

// ── Startup ───────────────────────────────────────────────────

#[test]
fn active_at_startup_turns_on_once() {
    let mut clock = night();
    let mut hw = MockHardware::new(&clock, &[(0, true)]);
    let mut daylight = ScriptedDaylight::steady();
    let mut sink = Recorder::new();
    let mut app = AppService::new(&config());

    app.start(&mut hw, &mut daylight, &clock, &mut sink).unwrap();
    drive(&mut app, &mut hw, &mut daylight, &mut clock, &mut sink, 300 * SECOND).unwrap();

    assert_eq!(hw.calls, vec![(0, OutletState::On)]);
    assert!(sink.events.contains(&AppEvent::OutletCommanded {
        state: OutletState::On,
        reason: CommandReason::Startup,
    }));
}

#[test]
fn inactive_at_startup_reasserts_off_after_grace() {
    let mut clock = night();
    let mut hw = MockHardware::new(&clock, &[(0, false)]);
    let mut daylight = ScriptedDaylight::steady();
    let mut sink = Recorder::new();
    let mut app = AppService::new(&config());

    app.start(&mut hw, &mut daylight, &clock, &mut sink).unwrap();
    drive(&mut app, &mut hw, &mut daylight, &mut clock, &mut sink, 310 * SECOND).unwrap();

    assert!(hw.ons().is_empty());
    assert_eq!(hw.offs(), vec![60_100, 180_200, 300_300]);
}

#[test]
fn startup_without_daylight_window_is_fatal_and_silent() {
    let clock = night();
    let mut hw = MockHardware::new(&clock, &[(0, true)]);
    let mut daylight = ScriptedDaylight::failing();
    let mut sink = Recorder::new();
    let mut app = AppService::new(&config());

    let err = app.start(&mut hw, &mut daylight, &clock, &mut sink).unwrap_err();
    assert!(matches!(
        err,
        Error::NoDaylightWindow {
            source: DaylightError::Unavailable(_),
            ..
        }
    ));
    assert!(hw.calls.is_empty());
}

#[test]
fn run_without_daylight_window_issues_no_commands() {
    let mut clock = night();
    let mut hw = MockHardware::new(&clock, &[(0, true)]);
    let mut daylight = ScriptedDaylight::failing();
    let mut sink = Recorder::new();
    let mut app = AppService::new(&config());
    let flag = AtomicBool::new(false);

    let result = app.run(&mut hw, &mut daylight, &mut clock, &mut sink, &flag);
    assert!(matches!(result, Err(Error::NoDaylightWindow { .. })));
    assert!(hw.calls.is_empty());
    assert_eq!(app.tick_count(), 0);
}

// ── Grace period ──────────────────────────────────────────────

#[test]
fn presence_end_turns_off_after_grace_then_reasserts() {
    let mut clock = night();
    let mut hw = MockHardware::new(&clock, &[(0, true), (10 * SECOND, false)]);
    let mut daylight = ScriptedDaylight::steady();
    let mut sink = Recorder::new();
    let mut app = AppService::new(&config());

    app.start(&mut hw, &mut daylight, &clock, &mut sink).unwrap();
    drive(&mut app, &mut hw, &mut daylight, &mut clock, &mut sink, 200 * SECOND).unwrap();

    assert_eq!(hw.ons(), vec![0]);
    // Idle strictly longer than 60 s, then strictly longer than 120 s apart.
    assert_eq!(hw.offs(), vec![70_100, 190_200]);
    assert!(sink.events.contains(&AppEvent::OutletCommanded {
        state: OutletState::Off,
        reason: CommandReason::GraceExpired { idle_ms: 60_100 },
    }));
    assert!(sink.events.contains(&AppEvent::OutletCommanded {
        state: OutletState::Off,
        reason: CommandReason::Reassert { idle_ms: 180_200 },
    }));
}

#[test]
fn presence_before_grace_expires_cancels_off() {
    let mut clock = night();
    let mut hw = MockHardware::new(&clock, &[(0, false), (30 * SECOND, true)]);
    let mut daylight = ScriptedDaylight::steady();
    let mut sink = Recorder::new();
    let mut app = AppService::new(&config());

    app.start(&mut hw, &mut daylight, &clock, &mut sink).unwrap();
    drive(&mut app, &mut hw, &mut daylight, &mut clock, &mut sink, 200 * SECOND).unwrap();

    assert_eq!(hw.ons(), vec![30 * SECOND]);
    assert!(hw.offs().is_empty());
    assert!(app.occupancy().presence_ended_at.is_none());
}

#[test]
fn brief_absence_keeps_outlet_on() {
    let mut clock = night();
    let script = [(0, true), (5 * SECOND, false), (50 * SECOND, true)];
    let mut hw = MockHardware::new(&clock, &script);
    let mut daylight = ScriptedDaylight::steady();
    let mut sink = Recorder::new();
    let mut app = AppService::new(&config());

    app.start(&mut hw, &mut daylight, &clock, &mut sink).unwrap();
    drive(&mut app, &mut hw, &mut daylight, &mut clock, &mut sink, 200 * SECOND).unwrap();

    // The second rising edge is deduplicated: the outlet is still believed on.
    assert_eq!(hw.calls, vec![(0, OutletState::On)]);
    assert!(sink.events.contains(&AppEvent::PresenceStarted {
        source: Some("pir-23".try_into().unwrap()),
        absent_for_ms: Some(45 * SECOND),
    }));
}

// ── Daylight window ───────────────────────────────────────────

#[test]
fn presence_during_day_is_suppressed() {
    let mut clock = ManualClock::new(at(2024, 10, 10, 12, 0, 0));
    let mut hw = MockHardware::new(&clock, &[(SECOND, true), (5 * SECOND, false)]);
    let mut daylight = ScriptedDaylight::steady();
    let mut sink = Recorder::new();
    let mut app = AppService::new(&config());

    app.start(&mut hw, &mut daylight, &clock, &mut sink).unwrap();
    drive(&mut app, &mut hw, &mut daylight, &mut clock, &mut sink, 70 * SECOND).unwrap();

    assert!(hw.ons().is_empty());
    assert_eq!(sink.count(|e| matches!(e, AppEvent::OnSuppressed { .. })), 1);
    // Believed off, idle past grace: a forced off goes out anyway.
    assert_eq!(hw.offs(), vec![65_100]);
}

#[test]
fn evening_boundary_is_inclusive() {
    // Sunset 19:00 padded by -15 min: allowed from 18:45:00.
    let mut clock = ManualClock::new(at(2024, 10, 10, 18, 44, 59));
    let mut hw = MockHardware::new(&clock, &[(SECOND, true)]);
    let mut daylight = ScriptedDaylight::steady();
    let mut sink = Recorder::new();
    let mut app = AppService::new(&config());

    app.start(&mut hw, &mut daylight, &clock, &mut sink).unwrap();
    drive(&mut app, &mut hw, &mut daylight, &mut clock, &mut sink, 2 * SECOND).unwrap();

    assert_eq!(hw.ons(), vec![SECOND]);
}

#[test]
fn morning_boundary_is_inclusive() {
    // Sunrise 07:00 padded by 60 min: allowed until 06:00:00.
    let clock = ManualClock::new(at(2024, 10, 10, 6, 0, 0));
    let mut hw = MockHardware::new(&clock, &[(0, true)]);
    let mut daylight = ScriptedDaylight::steady();
    let mut sink = Recorder::new();
    let mut app = AppService::new(&config());

    app.start(&mut hw, &mut daylight, &clock, &mut sink).unwrap();
    assert_eq!(hw.ons(), vec![0]);
}

#[test]
fn just_after_morning_boundary_is_closed() {
    let mut clock = ManualClock::new(at(2024, 10, 10, 6, 0, 0));
    let mut hw = MockHardware::new(&clock, &[(POLL_MS, true)]);
    let mut daylight = ScriptedDaylight::steady();
    let mut sink = Recorder::new();
    let mut app = AppService::new(&config());

    app.start(&mut hw, &mut daylight, &clock, &mut sink).unwrap();
    drive(&mut app, &mut hw, &mut daylight, &mut clock, &mut sink, SECOND).unwrap();

    assert!(hw.ons().is_empty());
}

#[test]
fn failed_refresh_keeps_previous_window() {
    let d10 = NaiveDate::from_ymd_opt(2024, 10, 10).unwrap();
    let d11 = NaiveDate::from_ymd_opt(2024, 10, 11).unwrap();
    let mut clock = ManualClock::new(at(2024, 10, 10, 23, 59, 0));
    let script = [(90 * SECOND, true), (100 * SECOND, false), (200 * SECOND, true)];
    let mut hw = MockHardware::new(&clock, &script);
    let mut daylight = ScriptedDaylight::steady()
        .then(Ok(SunTimes {
            sunrise: hm(7, 0),
            sunset: hm(19, 0),
        }))
        .then(Err(DaylightError::Unavailable("timeout".into())));
    let mut sink = Recorder::new();
    let mut app = AppService::new(&config());

    app.start(&mut hw, &mut daylight, &clock, &mut sink).unwrap();
    drive(&mut app, &mut hw, &mut daylight, &mut clock, &mut sink, 210 * SECOND).unwrap();

    // 00:00:30 on the 11th is inside the cached window from the 10th.
    assert_eq!(hw.ons(), vec![90 * SECOND, 200 * SECOND]);
    // Idle since startup, then the grace period after the first visit.
    assert_eq!(hw.offs(), vec![60_100, 160_100]);
    // One attempt per date, even though the second failed.
    assert_eq!(daylight.requested, vec![d10, d11]);
    assert_eq!(app.gate().current().map(|w| w.for_date), Some(d10));
    assert!(sink.events.iter().any(|e| matches!(
        e,
        AppEvent::WindowStale { date, .. } if *date == d11
    )));
}

#[test]
fn new_date_uses_new_window() {
    let d11 = NaiveDate::from_ymd_opt(2024, 10, 11).unwrap();
    let mut clock = ManualClock::new(at(2024, 10, 10, 23, 59, 0));
    // Rising edge at 00:45 on the 11th.
    let mut hw = MockHardware::new(&clock, &[(46 * 60 * SECOND, true)]);
    let mut daylight = ScriptedDaylight::steady()
        .then(Ok(SunTimes {
            sunrise: hm(7, 0),
            sunset: hm(19, 0),
        }))
        // Padded by 60 min the 11th only allows until 00:30.
        .then(Ok(SunTimes {
            sunrise: hm(1, 30),
            sunset: hm(19, 0),
        }));
    let mut sink = Recorder::new();
    let mut app = AppService::new(&config());

    app.start(&mut hw, &mut daylight, &clock, &mut sink).unwrap();
    drive(&mut app, &mut hw, &mut daylight, &mut clock, &mut sink, 47 * 60 * SECOND).unwrap();

    assert!(hw.ons().is_empty());
    assert_eq!(sink.count(|e| matches!(e, AppEvent::OnSuppressed { .. })), 1);
    let window = app.gate().current().unwrap();
    assert_eq!(window.for_date, d11);
    assert_eq!(window.not_after, hm(0, 30));
}

#[test]
fn window_is_not_fetched_without_rising_edge() {
    let mut clock = ManualClock::new(at(2024, 10, 10, 23, 59, 0));
    let mut hw = MockHardware::new(&clock, &[(0, false)]);
    let mut daylight = ScriptedDaylight::steady();
    let mut sink = Recorder::new();
    let mut app = AppService::new(&config());

    app.start(&mut hw, &mut daylight, &clock, &mut sink).unwrap();
    drive(&mut app, &mut hw, &mut daylight, &mut clock, &mut sink, 120 * SECOND).unwrap();

    assert_eq!(daylight.requested.len(), 1);
}

// ── Shutdown ──────────────────────────────────────────────────

#[test]
fn shutdown_request_sends_final_off() {
    let mut clock = night();
    let flag = Arc::new(AtomicBool::new(false));
    clock.shutdown_at(5 * SECOND, flag.clone());
    let mut hw = MockHardware::new(&clock, &[(0, true)]);
    let mut daylight = ScriptedDaylight::steady();
    let mut sink = Recorder::new();
    let mut app = AppService::new(&config());

    app.run(&mut hw, &mut daylight, &mut clock, &mut sink, &flag)
        .unwrap();

    assert_eq!(hw.calls, vec![(0, OutletState::On), (5 * SECOND, OutletState::Off)]);
    assert!(hw.released);
    assert_eq!(sink.events.last(), Some(&AppEvent::Stopped));
    assert_eq!(app.tick_count(), 50);
}

#[test]
fn shutdown_sends_off_even_when_believed_off() {
    let mut clock = ManualClock::new(at(2024, 10, 10, 12, 0, 0));
    let flag = Arc::new(AtomicBool::new(false));
    clock.shutdown_at(SECOND, flag.clone());
    let mut hw = MockHardware::new(&clock, &[(0, true)]);
    let mut daylight = ScriptedDaylight::steady();
    let mut sink = Recorder::new();
    let mut app = AppService::new(&config());

    app.run(&mut hw, &mut daylight, &mut clock, &mut sink, &flag)
        .unwrap();

    assert_eq!(hw.calls, vec![(SECOND, OutletState::Off)]);
}

#[test]
fn sensor_failure_stops_with_final_off() {
    let mut clock = night();
    let mut hw = MockHardware::new(&clock, &[(0, true)]).fail_from(2 * SECOND);
    let mut daylight = ScriptedDaylight::steady();
    let mut sink = Recorder::new();
    let mut app = AppService::new(&config());
    let flag = AtomicBool::new(false);

    let result = app.run(&mut hw, &mut daylight, &mut clock, &mut sink, &flag);

    assert!(matches!(result, Err(Error::Sensor(_))));
    assert_eq!(hw.calls, vec![(0, OutletState::On), (2 * SECOND, OutletState::Off)]);
    assert!(hw.released);
    assert_eq!(sink.events.last(), Some(&AppEvent::Stopped));
}

#[test]
fn failed_first_sample_still_sends_final_off() {
    let mut clock = night();
    let mut hw = MockHardware::new(&clock, &[(0, true)]).fail_from(0);
    let mut daylight = ScriptedDaylight::steady();
    let mut sink = Recorder::new();
    let mut app = AppService::new(&config());
    let flag = AtomicBool::new(false);

    let result = app.run(&mut hw, &mut daylight, &mut clock, &mut sink, &flag);

    assert!(matches!(result, Err(Error::Sensor(_))));
    // A plug left on by a previous run is switched off regardless.
    assert_eq!(hw.calls, vec![(0, OutletState::Off)]);
    assert!(hw.released);
    assert_eq!(app.tick_count(), 0);
    assert_eq!(sink.events.last(), Some(&AppEvent::Stopped));
}
