//! Application core: the poll loop and its port boundary.
//!
//! This module wires the occupancy controller and the daylight gate into a
//! single-threaded loop.  All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals or real time.

pub mod events;
pub mod ports;
pub mod service;
