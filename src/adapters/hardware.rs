//! Hardware adapter: bridges the sensor pins and the outlet to the ports.
//!
//! Owns the [`SensorBank`] and the outlet, exposing them through
//! [`SensorPort`] and [`OutletPort`] so the service can take a single
//! `&mut` for both.

use embedded_hal::digital::InputPin;

use super::gpio::SensorBank;
use crate::app::ports::{OutletPort, SensorPort};
use crate::error::SensorError;
use crate::occupancy::{OutletState, PresenceSample};

/// Concrete adapter combining the sensors and the outlet.
pub struct HardwareAdapter<P, O> {
    sensors: SensorBank<P>,
    outlet: O,
}

impl<P: InputPin, O: OutletPort> HardwareAdapter<P, O> {
    pub fn new(sensors: SensorBank<P>, outlet: O) -> Self {
        Self { sensors, outlet }
    }

    pub fn outlet(&self) -> &O {
        &self.outlet
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<P: InputPin, O: OutletPort> SensorPort for HardwareAdapter<P, O> {
    fn sample(&mut self) -> Result<PresenceSample, SensorError> {
        self.sensors.sample()
    }

    fn release(&mut self) {
        self.sensors.release();
    }
}

// ── OutletPort implementation ─────────────────────────────────

impl<P: InputPin, O: OutletPort> OutletPort for HardwareAdapter<P, O> {
    fn set_state(&mut self, state: OutletState) {
        self.outlet.set_state(state);
    }
}
