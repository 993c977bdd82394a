//! Occupancy core: presence samples, edge detection and the timing state.
//!
//! ```text
//!  sample ──▶ Edge::classify ──[Rising]──▶ start presence ──[window open]──▶ ON
//!                              ──[Falling]─▶ end presence (arm grace timer)
//!                              ──[None]────▶ ·
//!
//!  every tick ──▶ grace evaluator ──[idle > grace, believed on]──▶ OFF
//!                                 ──[idle > grace, believed off,
//!                                    last off > re-off interval]──▶ OFF (forced)
//! ```
//!
//! All timestamps here are monotonic milliseconds since process start.

pub mod controller;
pub mod outlet;

pub use controller::{OccupancyController, Timing};
pub use outlet::{OutletGate, OutletState};

/// Short sensor label carried for diagnostics only.
pub type SensorId = heapless::String<16>;

// ---------------------------------------------------------------------------
// Presence sample
// ---------------------------------------------------------------------------

/// One poll of the sensor bank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceSample {
    /// True if any sensor currently reports presence.
    pub active: bool,
    /// The sensor that reported it.  Never used for control decisions.
    pub source: Option<SensorId>,
}

impl PresenceSample {
    pub fn inactive() -> Self {
        Self::default()
    }

    pub fn active_from(source: SensorId) -> Self {
        Self {
            active: true,
            source: Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Edge detection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
    None,
}

impl Edge {
    /// Compare two consecutive samples on `active` only.
    pub fn classify(previous: &PresenceSample, current: &PresenceSample) -> Self {
        match (previous.active, current.active) {
            (false, true) => Self::Rising,
            (true, false) => Self::Falling,
            _ => Self::None,
        }
    }
}

// ---------------------------------------------------------------------------
// Occupancy state
// ---------------------------------------------------------------------------

/// Process-wide occupancy bookkeeping, owned by [`OccupancyController`].
///
/// After the first observation exactly one of `presence_started_at` and
/// `presence_ended_at` is set.
#[derive(Debug, Clone, Default)]
pub struct OccupancyState {
    pub presence_started_at: Option<u64>,
    pub presence_ended_at: Option<u64>,
    pub last_off_sent_at: Option<u64>,
    pub previous_sample: PresenceSample,
    /// Dedup layer holding the believed outlet state.
    pub outlet: OutletGate,
}

impl OccupancyState {
    pub fn outlet_commanded_on(&self) -> bool {
        self.outlet.is_on()
    }
}
