//! Occupancy controller: edge handling and the grace-period evaluator.
//!
//! The controller is pure logic.  It never reads sensors or the clock
//! itself; the caller hands in each sample with its timestamp and, on a
//! rising edge, whether the daylight window is open at that instant.

use log::{debug, info};

use super::{Edge, OccupancyState, PresenceSample};
use crate::app::events::{AppEvent, CommandReason};
use crate::app::ports::{EventSink, OutletPort};
use crate::config::SystemConfig;
use crate::occupancy::OutletState;

/// Grace and re-assertion timing, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Idle time after the last presence before the outlet is turned off.
    pub turn_off_after_ms: u64,
    /// Minimum spacing of forced off commands while idle.
    pub periodic_off_interval_ms: u64,
}

impl Timing {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            turn_off_after_ms: config.turn_off_after_ms(),
            periodic_off_interval_ms: config.periodic_off_interval_ms(),
        }
    }
}

pub struct OccupancyController {
    state: OccupancyState,
    timing: Timing,
}

impl OccupancyController {
    pub fn new(timing: Timing) -> Self {
        Self {
            state: OccupancyState::default(),
            timing,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Seed the state from the first sample without synthesising an edge.
    ///
    /// An active first sample counts as presence that started now and asks
    /// for `on` if the window is open.  An inactive one arms the grace timer,
    /// so an outlet left on by a previous run is switched off eventually.
    pub fn start(
        &mut self,
        sample: PresenceSample,
        now_ms: u64,
        window_open: bool,
        outlet: &mut impl OutletPort,
        sink: &mut impl EventSink,
    ) {
        if sample.active {
            self.state.presence_started_at = Some(now_ms);
            self.state.presence_ended_at = None;
        } else {
            self.state.presence_started_at = None;
            self.state.presence_ended_at = Some(now_ms);
        }
        sink.emit(&AppEvent::Started {
            presence: sample.clone(),
        });

        if sample.active {
            if window_open {
                if self.state.outlet.request_on(outlet) {
                    sink.emit(&AppEvent::OutletCommanded {
                        state: OutletState::On,
                        reason: CommandReason::Startup,
                    });
                }
            } else {
                sink.emit(&AppEvent::OnSuppressed {
                    source: sample.source.clone(),
                });
            }
        }
        self.state.previous_sample = sample;
    }

    /// Unconditional final `off`, whatever the occupancy.
    pub fn shutdown(&mut self, outlet: &mut impl OutletPort, sink: &mut impl EventSink) {
        self.state.outlet.force_off(outlet);
        self.state.last_off_sent_at = None;
        sink.emit(&AppEvent::OutletCommanded {
            state: OutletState::Off,
            reason: CommandReason::Shutdown,
        });
    }

    // ── Per-tick ──────────────────────────────────────────────

    /// Edge between the last observed sample and `sample`.
    pub fn classify(&self, sample: &PresenceSample) -> Edge {
        Edge::classify(&self.state.previous_sample, sample)
    }

    /// Apply one poll: handle `edge` (from [`classify`](Self::classify)),
    /// remember the sample, then run the grace evaluator.
    ///
    /// `window_open` is only consulted on a rising edge.
    pub fn observe(
        &mut self,
        sample: PresenceSample,
        edge: Edge,
        now_ms: u64,
        window_open: bool,
        outlet: &mut impl OutletPort,
        sink: &mut impl EventSink,
    ) {
        match edge {
            Edge::Rising => self.on_rising(&sample, now_ms, window_open, outlet, sink),
            Edge::Falling => {
                let source = self.state.previous_sample.source.clone();
                self.on_falling(source, now_ms, sink);
            }
            Edge::None => {}
        }
        self.state.previous_sample = sample;
        self.evaluate_grace(now_ms, outlet, sink);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> &OccupancyState {
        &self.state
    }

    // ── Internal ──────────────────────────────────────────────

    fn on_rising(
        &mut self,
        sample: &PresenceSample,
        now_ms: u64,
        window_open: bool,
        outlet: &mut impl OutletPort,
        sink: &mut impl EventSink,
    ) {
        // Resuming before the grace period ran out cancels the pending off.
        let absent_for_ms = self
            .state
            .presence_ended_at
            .take()
            .map(|ended| now_ms.saturating_sub(ended));
        self.state.presence_started_at = Some(now_ms);
        sink.emit(&AppEvent::PresenceStarted {
            source: sample.source.clone(),
            absent_for_ms,
        });

        if !window_open {
            debug!("rising edge outside allowed window, outlet untouched");
            sink.emit(&AppEvent::OnSuppressed {
                source: sample.source.clone(),
            });
            return;
        }
        if self.state.outlet.request_on(outlet) {
            sink.emit(&AppEvent::OutletCommanded {
                state: OutletState::On,
                reason: CommandReason::Presence,
            });
        }
    }

    fn on_falling(&mut self, source: Option<super::SensorId>, now_ms: u64, sink: &mut impl EventSink) {
        let present_for_ms = self
            .state
            .presence_started_at
            .take()
            .map(|started| now_ms.saturating_sub(started));
        self.state.presence_ended_at = Some(now_ms);
        sink.emit(&AppEvent::PresenceEnded {
            source,
            present_for_ms,
        });
    }

    /// Turn-off trigger and periodic re-assertion, both keyed off the end
    /// of the last presence.
    fn evaluate_grace(&mut self, now_ms: u64, outlet: &mut impl OutletPort, sink: &mut impl EventSink) {
        if self.state.previous_sample.active {
            return;
        }
        let Some(ended) = self.state.presence_ended_at else {
            return;
        };
        let idle_ms = now_ms.saturating_sub(ended);
        if idle_ms <= self.timing.turn_off_after_ms {
            return;
        }

        if self.state.outlet.is_on() {
            if self.state.outlet.request_off(outlet) {
                info!("grace period elapsed, turning outlet off");
                self.state.last_off_sent_at = Some(now_ms);
                sink.emit(&AppEvent::OutletCommanded {
                    state: OutletState::Off,
                    reason: CommandReason::GraceExpired { idle_ms },
                });
            }
            return;
        }

        let due = self
            .state
            .last_off_sent_at
            .is_none_or(|sent| now_ms.saturating_sub(sent) > self.timing.periodic_off_interval_ms);
        if due {
            self.state.outlet.force_off(outlet);
            self.state.last_off_sent_at = Some(now_ms);
            sink.emit(&AppEvent::OutletCommanded {
                state: OutletState::Off,
                reason: CommandReason::Reassert { idle_ms },
            });
        }
    }
}
