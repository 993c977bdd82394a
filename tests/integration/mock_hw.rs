//! Mock adapters for integration tests.
//!
//! All mocks share one manual clock, so outlet calls are recorded with the
//! monotonic time they were issued at and the sensor script is evaluated
//! against the same time base.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use presence_plug::app::events::AppEvent;
use presence_plug::app::ports::{
    DaylightPort, EventSink, OutletPort, SensorPort, SunTimes, TimePort,
};
use presence_plug::error::{DaylightError, SensorError};
use presence_plug::occupancy::{OutletState, PresenceSample, SensorId};

pub const SECOND: u64 = 1_000;

pub fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, s)
        .unwrap()
}

pub fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

// ── ManualClock ───────────────────────────────────────────────

/// `sleep` advances time instantly.  Local time is `epoch + monotonic`.
pub struct ManualClock {
    now: Rc<Cell<u64>>,
    epoch: NaiveDateTime,
    /// Raise `flag` once monotonic time reaches `at_ms`.
    shutdown_at: Option<(u64, Arc<AtomicBool>)>,
}

#[allow(dead_code)]
impl ManualClock {
    pub fn new(epoch: NaiveDateTime) -> Self {
        Self {
            now: Rc::new(Cell::new(0)),
            epoch,
            shutdown_at: None,
        }
    }

    pub fn handle(&self) -> Rc<Cell<u64>> {
        self.now.clone()
    }

    pub fn shutdown_at(&mut self, at_ms: u64, flag: Arc<AtomicBool>) {
        self.shutdown_at = Some((at_ms, flag));
    }
}

impl TimePort for ManualClock {
    fn monotonic_ms(&self) -> u64 {
        self.now.get()
    }

    fn local_now(&self) -> NaiveDateTime {
        self.epoch + TimeDelta::milliseconds(self.now.get() as i64)
    }

    fn sleep(&mut self, duration: Duration) {
        self.now.set(self.now.get() + duration.as_millis() as u64);
        if let Some((at_ms, flag)) = &self.shutdown_at {
            if self.now.get() >= *at_ms {
                flag.store(true, Ordering::Release);
            }
        }
    }
}

// ── MockHardware ──────────────────────────────────────────────

/// Scripted sensor plus a recording outlet.
///
/// The script is a list of `(from_ms, active)` steps; the level at time
/// `t` is that of the last step with `from_ms <= t` (inactive before the
/// first step).
pub struct MockHardware {
    now: Rc<Cell<u64>>,
    script: Vec<(u64, bool)>,
    fail_from: Option<u64>,
    pub calls: Vec<(u64, OutletState)>,
    pub released: bool,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new(clock: &ManualClock, script: &[(u64, bool)]) -> Self {
        Self {
            now: clock.handle(),
            script: script.to_vec(),
            fail_from: None,
            calls: Vec::new(),
            released: false,
        }
    }

    /// Every read from `at_ms` on fails.
    pub fn fail_from(mut self, at_ms: u64) -> Self {
        self.fail_from = Some(at_ms);
        self
    }

    pub fn ons(&self) -> Vec<u64> {
        self.times_of(OutletState::On)
    }

    pub fn offs(&self) -> Vec<u64> {
        self.times_of(OutletState::Off)
    }

    fn times_of(&self, state: OutletState) -> Vec<u64> {
        self.calls
            .iter()
            .filter(|(_, s)| *s == state)
            .map(|(t, _)| *t)
            .collect()
    }

    fn level_at(&self, t: u64) -> bool {
        self.script
            .iter()
            .take_while(|(from, _)| *from <= t)
            .last()
            .is_some_and(|(_, active)| *active)
    }
}

impl SensorPort for MockHardware {
    fn sample(&mut self) -> Result<PresenceSample, SensorError> {
        let t = self.now.get();
        if self.fail_from.is_some_and(|f| t >= f) {
            return Err(SensorError::GpioReadFailed {
                pin: 23,
                reason: "mock read failure".into(),
            });
        }
        if self.level_at(t) {
            Ok(PresenceSample::active_from(SensorId::try_from("pir-23").unwrap()))
        } else {
            Ok(PresenceSample::inactive())
        }
    }

    fn release(&mut self) {
        self.released = true;
    }
}

impl OutletPort for MockHardware {
    fn set_state(&mut self, state: OutletState) {
        self.calls.push((self.now.get(), state));
    }
}

// ── ScriptedDaylight ──────────────────────────────────────────

/// Answers from a queue of results, then from `fallback`.  Records dates.
pub struct ScriptedDaylight {
    queue: VecDeque<Result<SunTimes, DaylightError>>,
    fallback: Result<SunTimes, DaylightError>,
    pub requested: Vec<NaiveDate>,
}

#[allow(dead_code)]
impl ScriptedDaylight {
    /// Sunrise 07:00, sunset 19:00 every day.
    pub fn steady() -> Self {
        Self {
            queue: VecDeque::new(),
            fallback: Ok(SunTimes {
                sunrise: hm(7, 0),
                sunset: hm(19, 0),
            }),
            requested: Vec::new(),
        }
    }

    pub fn failing() -> Self {
        Self {
            queue: VecDeque::new(),
            fallback: Err(DaylightError::Unavailable("mock outage".into())),
            requested: Vec::new(),
        }
    }

    pub fn then(mut self, result: Result<SunTimes, DaylightError>) -> Self {
        self.queue.push_back(result);
        self
    }
}

impl DaylightPort for ScriptedDaylight {
    fn sun_times(&mut self, date: NaiveDate) -> Result<SunTimes, DaylightError> {
        self.requested.push(date);
        self.queue
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

// ── Recorder ──────────────────────────────────────────────────

pub struct Recorder {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl Recorder {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for Recorder {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
