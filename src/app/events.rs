//! Outbound application events.
//!
//! The occupancy core emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them; the binary logs them.

use chrono::NaiveDate;

use crate::daylight::DaylightWindow;
use crate::error::DaylightError;
use crate::occupancy::{OutletState, PresenceSample, SensorId};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Controller seeded from the first sample.
    Started { presence: PresenceSample },

    /// Presence began.  `absent_for_ms` is set when it resumed after an absence.
    PresenceStarted {
        source: Option<SensorId>,
        absent_for_ms: Option<u64>,
    },

    /// Presence ended; the grace timer is now running.
    PresenceEnded {
        source: Option<SensorId>,
        present_for_ms: Option<u64>,
    },

    /// Presence began outside the allowed window, outlet left alone.
    OnSuppressed { source: Option<SensorId> },

    /// A command was forwarded to the outlet.
    OutletCommanded {
        state: OutletState,
        reason: CommandReason,
    },

    /// A new daylight window was computed.
    WindowRefreshed(DaylightWindow),

    /// Acquisition failed; the previous window stays in use.
    WindowStale { date: NaiveDate, error: DaylightError },

    /// Poll loop left, final off already sent.
    Stopped,
}

/// Why an outlet command went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandReason {
    /// Sensor already active when the controller came up.
    Startup,
    /// Rising edge inside the allowed window.
    Presence,
    /// Grace period ran out while the outlet was believed on.
    GraceExpired { idle_ms: u64 },
    /// Periodic re-assertion while believed off.
    Reassert { idle_ms: u64 },
    /// Unconditional off on the way out.
    Shutdown,
}
