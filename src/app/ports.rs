//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (sensor pins, the outlet command, sun-time sources,
//! the clock, event sinks) implement these traits.  The
//! [`AppService`](super::service::AppService) consumes them via generics,
//! so the occupancy core never touches hardware or the system clock directly.

use core::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{DaylightError, SensorError};
use crate::occupancy::{OutletState, PresenceSample};

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: one OR-ed reading of every configured presence sensor.
pub trait SensorPort {
    /// Read every sensor once.  Errors are fatal to the poll loop.
    fn sample(&mut self) -> Result<PresenceSample, SensorError>;

    /// Give the pins back to the system.  Called after the final off command.
    fn release(&mut self) {}
}

// ───────────────────────────────────────────────────────────────
// Outlet port (driven adapter: domain → smart plug)
// ───────────────────────────────────────────────────────────────

/// Write-side port: fire-and-forget outlet command.
///
/// Implementations report delivery problems through the log only; the
/// domain never assumes a command arrived.
pub trait OutletPort {
    fn set_state(&mut self, state: OutletState);
}

// ───────────────────────────────────────────────────────────────
// Daylight port (driven adapter: sun-time source → domain)
// ───────────────────────────────────────────────────────────────

/// Local sunrise and sunset for one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SunTimes {
    pub sunrise: NaiveTime,
    pub sunset: NaiveTime,
}

/// Supplies sunrise/sunset.  Called at most once per calendar date.
pub trait DaylightPort {
    fn sun_times(&mut self, date: NaiveDate) -> Result<SunTimes, DaylightError>;
}

impl<T: DaylightPort + ?Sized> DaylightPort for Box<T> {
    fn sun_times(&mut self, date: NaiveDate) -> Result<SunTimes, DaylightError> {
        (**self).sun_times(date)
    }
}

// ───────────────────────────────────────────────────────────────
// Time port (driven adapter: clock + sleep → domain)
// ───────────────────────────────────────────────────────────────

/// Clock and sleep, injectable so tests can advance time without waiting.
pub trait TimePort {
    /// Monotonic milliseconds since an arbitrary start.  Drives grace timers.
    fn monotonic_ms(&self) -> u64;

    /// Local wall-clock time.  Drives the daylight window.
    fn local_now(&self) -> NaiveDateTime;

    /// Block until the next poll tick.
    fn sleep(&mut self, duration: Duration);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
