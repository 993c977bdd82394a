//! Unified error types for the presence controller.
//!
//! A single [`Error`] enum that every subsystem converts into, keeping the
//! poll loop's error handling uniform.  Outlet commands are fire-and-forget
//! and never surface as errors.

use thiserror::Error as ThisError;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the controller funnels into this type.
#[derive(ThisError, Debug)]
pub enum Error {
    /// A presence sensor could not be read.  Fatal: a silent misread would
    /// leave the outlet in the wrong state.
    #[error("sensor: {0}")]
    Sensor(#[from] SensorError),

    /// No daylight window could be acquired and none is cached.
    #[error("no daylight window available for {date}: {source}")]
    NoDaylightWindow {
        date: chrono::NaiveDate,
        #[source]
        source: DaylightError,
    },

    /// Configuration is invalid or could not be loaded.
    #[error("config: {0}")]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(ThisError, Debug)]
pub enum SensorError {
    /// GPIO read returned an error.
    #[error("GPIO {pin} read failed: {reason}")]
    GpioReadFailed { pin: u32, reason: String },

    /// The pin could not be exported or configured as an input.
    #[error("GPIO {pin} setup failed: {reason}")]
    GpioSetupFailed { pin: u32, reason: String },

    /// More sensors configured than the bank can hold.
    #[error("too many sensors (max {0})")]
    TooMany(usize),
}

// ---------------------------------------------------------------------------
// Daylight errors
// ---------------------------------------------------------------------------

/// Transient failures acquiring sunrise/sunset for a date.
#[derive(ThisError, Debug, Clone, PartialEq, Eq)]
pub enum DaylightError {
    /// The sun does not rise or does not set on this date (polar day/night).
    #[error("no sunrise/sunset on {0}")]
    NoSunEvent(chrono::NaiveDate),

    /// Padding pushed a boundary outside the calendar day.
    #[error("padded window leaves the day on {0}")]
    OutOfDay(chrono::NaiveDate),

    /// The upstream source could not be reached.
    #[error("daylight source unavailable: {0}")]
    Unavailable(String),
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

#[derive(ThisError, Debug)]
pub enum ConfigError {
    /// A config field failed range validation.
    #[error("validation failed: {0}")]
    ValidationFailed(&'static str),

    /// The config file could not be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The config file is not valid JSON for [`SystemConfig`](crate::config::SystemConfig).
    #[error(transparent)]
    Parse(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
