//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the occupancy controller and the daylight gate and
//! runs the poll loop.  All I/O flows through port traits injected at call
//! sites, making the entire service testable with mock adapters and a
//! manual clock.
//!
//! ```text
//!  SensorPort ──▶ ┌─────────────────────────┐ ──▶ EventSink
//!                 │       AppService         │
//!  OutletPort ◀── │ Occupancy · DaylightGate │ ◀── DaylightPort
//!                 └─────────────────────────┘
//!                          ▲ TimePort
//! ```

use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;

use log::{error, info};

use crate::config::SystemConfig;
use crate::daylight::{DaylightGate, Padding};
use crate::error::Result;
use crate::occupancy::{Edge, OccupancyController, OccupancyState, Timing};

use super::events::AppEvent;
use super::ports::{DaylightPort, EventSink, OutletPort, SensorPort, TimePort};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

pub struct AppService {
    controller: OccupancyController,
    gate: DaylightGate,
    poll_interval: Duration,
    tick_count: u64,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Does **not** sample anything; call [`start`](Self::start) or
    /// [`run`](Self::run) next.
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            controller: OccupancyController::new(Timing::from_config(config)),
            gate: DaylightGate::new(Padding::from_config(&config.daylight)),
            poll_interval: Duration::from_millis(u64::from(config.poll_interval_ms)),
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Acquire today's window, then seed the controller from one sample.
    ///
    /// No outlet command can be issued before the window is known, so a
    /// failed first acquisition leaves the outlet untouched.
    pub fn start(
        &mut self,
        hw: &mut (impl SensorPort + OutletPort),
        daylight: &mut impl DaylightPort,
        time: &impl TimePort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        self.gate.ensure_initial(time.local_now().date(), daylight, sink)?;
        self.seed(hw, daylight, time, sink)
    }

    /// First sample after the window is known.
    fn seed(
        &mut self,
        hw: &mut (impl SensorPort + OutletPort),
        daylight: &mut impl DaylightPort,
        time: &impl TimePort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        let sample = hw.sample()?;
        let now_ms = time.monotonic_ms();
        let window_open = sample.active
            && self
                .gate
                .is_within_allowed_window(time.local_now(), daylight, sink);
        match &sample.source {
            Some(source) => info!("startup: presence on {}", source),
            None => info!("startup: no presence"),
        }
        self.controller.start(sample, now_ms, window_open, hw, sink);
        Ok(())
    }

    /// Run one poll: sample → edge → (window) → controller.
    pub fn tick(
        &mut self,
        hw: &mut (impl SensorPort + OutletPort),
        daylight: &mut impl DaylightPort,
        time: &impl TimePort,
        sink: &mut impl EventSink,
    ) -> Result<()> {
        self.tick_count += 1;

        let sample = hw.sample()?;
        let now_ms = time.monotonic_ms();
        let edge = self.controller.classify(&sample);

        // The window is only needed (and only refreshed) on a rising edge.
        let window_open = edge == Edge::Rising
            && self
                .gate
                .is_within_allowed_window(time.local_now(), daylight, sink);

        self.controller
            .observe(sample, edge, now_ms, window_open, hw, sink);
        Ok(())
    }

    /// Final off, then release the sensors.
    pub fn stop(&mut self, hw: &mut (impl SensorPort + OutletPort), sink: &mut impl EventSink) {
        self.controller.shutdown(hw, sink);
        hw.release();
        sink.emit(&AppEvent::Stopped);
    }

    /// Start, poll until `shutdown` is raised or a sensor fails, then stop.
    ///
    /// Once the daylight window is known, every exit path goes through
    /// [`stop`](Self::stop), including a failed first sample, so the outlet
    /// is never left powered.
    pub fn run(
        &mut self,
        hw: &mut (impl SensorPort + OutletPort),
        daylight: &mut impl DaylightPort,
        time: &mut impl TimePort,
        sink: &mut impl EventSink,
        shutdown: &AtomicBool,
    ) -> Result<()> {
        self.gate
            .ensure_initial(time.local_now().date(), daylight, sink)?;

        let result = match self.seed(hw, daylight, &*time, sink) {
            Ok(()) => self.poll(hw, daylight, time, sink, shutdown),
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            error!("poll loop aborted: {}", e);
        }

        self.stop(hw, sink);
        result
    }

    fn poll(
        &mut self,
        hw: &mut (impl SensorPort + OutletPort),
        daylight: &mut impl DaylightPort,
        time: &mut impl TimePort,
        sink: &mut impl EventSink,
        shutdown: &AtomicBool,
    ) -> Result<()> {
        info!(
            "entering poll loop ({} ms interval)",
            self.poll_interval.as_millis()
        );
        loop {
            if shutdown.load(Ordering::Acquire) {
                info!("shutdown requested after {} ticks", self.tick_count);
                return Ok(());
            }
            self.tick(hw, daylight, &*time, sink)?;
            time.sleep(self.poll_interval);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn occupancy(&self) -> &OccupancyState {
        self.controller.state()
    }

    pub fn gate(&self) -> &DaylightGate {
        &self.gate
    }

    /// Poll ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
