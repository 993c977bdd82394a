//! Presence-triggered smart plug controller.
//!
//! Polls one or more PIR sensors, switches an outlet on when someone
//! arrives outside the configured daylight hours, and switches it off
//! after a grace period of absence, re-asserting `off` periodically while
//! the room stays empty.  The pure logic (occupancy, daylight gate) is
//! exposed for integration testing; hardware lives behind the port traits
//! in [`app::ports`].

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod daylight;
pub mod error;
pub mod occupancy;
pub mod shutdown;
pub mod solar;
