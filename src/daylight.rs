//! Daylight window gate.
//!
//! The outlet may only be switched on between the padded sunset of a day
//! and the padded sunrise, wrapping across midnight:
//!
//! ```text
//!  00:00 ───── not_after ░░░░░░░ closed ░░░░░░░ not_before ───── 24:00
//!        allowed                                          allowed
//! ```
//!
//! Both boundaries are inclusive.  The window is computed at most once per
//! calendar date.  When acquisition fails the previous window stays in use
//! and the next attempt happens on the next date.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::{DaylightPort, EventSink, SunTimes};
use crate::config::DaylightConfig;
use crate::error::{DaylightError, Error, Result};

// ═══════════════════════════════════════════════════════════════
//  Window
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaylightWindow {
    /// Evening boundary: allowed from here until midnight.
    pub not_before: NaiveTime,
    /// Morning boundary: allowed from midnight until here.
    pub not_after: NaiveTime,
    pub for_date: NaiveDate,
}

/// Asymmetric padding around sunrise and sunset, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Padding {
    /// Window closes this long before sunrise.
    pub sunrise_minutes: i32,
    /// Window opens this long after sunset (negative = before).
    pub sunset_minutes: i32,
}

impl Padding {
    pub fn from_config(config: &DaylightConfig) -> Self {
        Self {
            sunrise_minutes: config.sunrise_pad_minutes,
            sunset_minutes: config.sunset_pad_minutes,
        }
    }
}

impl DaylightWindow {
    /// Pad the day's sun times.  A boundary pushed past midnight is rejected.
    pub fn from_sun_times(
        date: NaiveDate,
        sun: SunTimes,
        pad: Padding,
    ) -> core::result::Result<Self, DaylightError> {
        let (not_after, wrap_rise) = sun
            .sunrise
            .overflowing_sub_signed(TimeDelta::minutes(i64::from(pad.sunrise_minutes)));
        let (not_before, wrap_set) = sun
            .sunset
            .overflowing_add_signed(TimeDelta::minutes(i64::from(pad.sunset_minutes)));
        if wrap_rise != 0 || wrap_set != 0 {
            return Err(DaylightError::OutOfDay(date));
        }
        Ok(Self {
            not_before,
            not_after,
            for_date: date,
        })
    }

    /// `time <= not_after || time >= not_before`.
    pub fn contains(&self, time: NaiveTime) -> bool {
        time <= self.not_after || time >= self.not_before
    }
}

// ═══════════════════════════════════════════════════════════════
//  Gate
// ═══════════════════════════════════════════════════════════════

/// Caches one window per date and answers the allowed-window question.
pub struct DaylightGate {
    padding: Padding,
    current: Option<DaylightWindow>,
    /// Date of the last acquisition attempt, successful or not.
    attempted: Option<NaiveDate>,
}

impl DaylightGate {
    pub fn new(padding: Padding) -> Self {
        Self {
            padding,
            current: None,
            attempted: None,
        }
    }

    /// Acquire the window for `date` at startup.  Fatal if nothing is cached.
    pub fn ensure_initial(
        &mut self,
        date: NaiveDate,
        port: &mut impl DaylightPort,
        sink: &mut impl EventSink,
    ) -> Result<DaylightWindow> {
        if let Err(source) = self.refresh(date, port, sink) {
            if self.current.is_none() {
                return Err(Error::NoDaylightWindow { date, source });
            }
        }
        self.current.ok_or(Error::NoDaylightWindow {
            date,
            source: DaylightError::Unavailable("no window cached".into()),
        })
    }

    /// Whether the outlet may be switched on at `now`.
    ///
    /// Refreshes lazily on the first call of a new date.  With no window at
    /// all the answer is `false`.
    pub fn is_within_allowed_window(
        &mut self,
        now: NaiveDateTime,
        port: &mut impl DaylightPort,
        sink: &mut impl EventSink,
    ) -> bool {
        // Failure is already reported as WindowStale; the cached window answers.
        let _ = self.refresh(now.date(), port, sink);
        self.current.is_some_and(|w| w.contains(now.time()))
    }

    /// Try to compute the window for `date`, once per date.
    ///
    /// Returns `Ok` without calling the port when `date` was already attempted.
    pub fn refresh(
        &mut self,
        date: NaiveDate,
        port: &mut impl DaylightPort,
        sink: &mut impl EventSink,
    ) -> core::result::Result<(), DaylightError> {
        if self.attempted == Some(date) {
            return Ok(());
        }
        self.attempted = Some(date);

        let result = port
            .sun_times(date)
            .and_then(|sun| DaylightWindow::from_sun_times(date, sun, self.padding));
        match result {
            Ok(window) => {
                info!(
                    "daylight window for {}: allowed until {} and from {}",
                    date, window.not_after, window.not_before
                );
                self.current = Some(window);
                sink.emit(&AppEvent::WindowRefreshed(window));
                Ok(())
            }
            Err(error) => {
                match self.current {
                    Some(stale) => warn!(
                        "daylight window for {} unavailable ({}), keeping window from {}",
                        date, error, stale.for_date
                    ),
                    None => warn!("daylight window for {} unavailable ({})", date, error),
                }
                sink.emit(&AppEvent::WindowStale {
                    date,
                    error: error.clone(),
                });
                Err(error)
            }
        }
    }

    pub fn current(&self) -> Option<DaylightWindow> {
        self.current
    }
}
