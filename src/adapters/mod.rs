//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements           | Connects to                  |
//! |------------|----------------------|------------------------------|
//! | `gpio`     | SensorPort           | sysfs GPIO (PIR modules)     |
//! | `hardware` | SensorPort           | sensor bank                  |
//! |            | OutletPort           | outlet command               |
//! | `log_sink` | EventSink            | `log` / env_logger           |
//! | `outlet`   | OutletPort           | external switch program      |
//! | `time`     | TimePort             | `Instant`, local clock       |
//!
//! Sun-time sources live in [`crate::solar`].

pub mod gpio;
pub mod hardware;
pub mod log_sink;
pub mod outlet;
pub mod time;
pub(super) mod utils;
