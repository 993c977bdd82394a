//! System configuration parameters
//!
//! All tunable parameters for the presence controller.
//! Values come from a JSON file (every field optional) and are then
//! overridden by command-line flags in `main`.

use std::path::Path;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::occupancy::SensorId;

/// Maximum number of presence sensors in one bank.
pub const MAX_SENSORS: usize = 8;

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Sensors ---
    /// Presence sensors, scanned in order each tick.
    pub sensors: Vec<SensorConfig>,

    // --- Outlet ---
    pub outlet: OutletConfig,

    // --- Daylight window ---
    pub daylight: DaylightConfig,

    // --- Timing ---
    /// Grace period after presence ends before the outlet is turned off (seconds)
    pub turn_off_after_secs: u32,
    /// Minimum spacing of repeated off commands while the room stays empty (seconds)
    pub periodic_off_interval_secs: u32,
    /// Poll loop interval (milliseconds)
    pub poll_interval_ms: u32,

    // --- Logging ---
    /// Set to `false` to silence all log output.
    pub logging: bool,
}

/// One binary presence sensor wired to a GPIO line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    /// Name used in log lines.
    pub id: SensorId,
    /// BCM / sysfs GPIO number.
    pub pin: u32,
    /// Sensor pulls the line low on detection.
    #[serde(default)]
    pub active_low: bool,
}

/// How outlet commands leave the process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutletConfig {
    /// Program and leading arguments; `on` or `off` is appended.
    /// Empty means dry-run (commands are only logged).
    pub command: Vec<String>,
}

/// Where sunrise/sunset come from and how the window is padded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaylightConfig {
    pub source: DaylightSource,
    /// Minutes before sunrise at which the window closes.
    pub sunrise_pad_minutes: i32,
    /// Minutes after sunset at which the window opens (negative = before sunset).
    pub sunset_pad_minutes: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DaylightSource {
    /// Computed from the site's coordinates.
    Solar {
        latitude: f64,
        longitude: f64,
        /// Offset of local time from UTC; system local offset when absent.
        #[serde(default)]
        utc_offset_minutes: Option<i32>,
    },
    /// Constant sunrise/sunset every day.
    Fixed { sunrise: NaiveTime, sunset: NaiveTime },
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Two PIR sensors, one per hallway entrance
            sensors: vec![
                SensorConfig {
                    id: SensorId::try_from("pir-23").unwrap_or_default(),
                    pin: 23,
                    active_low: false,
                },
                SensorConfig {
                    id: SensorId::try_from("pir-24").unwrap_or_default(),
                    pin: 24,
                    active_low: false,
                },
            ],

            outlet: OutletConfig::default(),
            daylight: DaylightConfig::default(),

            // Timing
            turn_off_after_secs: 15 * 60,
            periodic_off_interval_secs: 15 * 60,
            poll_interval_ms: 100, // 10 Hz

            logging: true,
        }
    }
}

impl Default for DaylightConfig {
    fn default() -> Self {
        Self {
            source: DaylightSource::Fixed {
                sunrise: NaiveTime::from_hms_opt(7, 0, 0).unwrap_or(NaiveTime::MIN),
                sunset: NaiveTime::from_hms_opt(19, 0, 0).unwrap_or(NaiveTime::MIN),
            },
            sunrise_pad_minutes: 60,
            sunset_pad_minutes: -15,
        }
    }
}

impl SystemConfig {
    /// Load from a JSON file and validate.  Missing fields take defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sensors.is_empty() {
            return Err(ConfigError::ValidationFailed("at least one sensor is required"));
        }
        if self.sensors.len() > MAX_SENSORS {
            return Err(ConfigError::ValidationFailed("too many sensors"));
        }
        for (i, s) in self.sensors.iter().enumerate() {
            if self.sensors[..i].iter().any(|o| o.pin == s.pin) {
                return Err(ConfigError::ValidationFailed("duplicate sensor pin"));
            }
        }
        if self.turn_off_after_secs == 0 {
            return Err(ConfigError::ValidationFailed("turn_off_after_secs must be > 0"));
        }
        if self.periodic_off_interval_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "periodic_off_interval_secs must be > 0",
            ));
        }
        if !(10..=10_000).contains(&self.poll_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "poll_interval_ms must be within 10..=10000",
            ));
        }
        if u64::from(self.poll_interval_ms) >= self.turn_off_after_ms() {
            return Err(ConfigError::ValidationFailed(
                "poll interval must be shorter than the grace period",
            ));
        }
        let pad_range = -720..=720;
        if !pad_range.contains(&self.daylight.sunrise_pad_minutes)
            || !pad_range.contains(&self.daylight.sunset_pad_minutes)
        {
            return Err(ConfigError::ValidationFailed("daylight pads must be within ±720 min"));
        }
        if let DaylightSource::Solar {
            latitude,
            longitude,
            utc_offset_minutes,
        } = self.daylight.source
        {
            if !(-90.0..=90.0).contains(&latitude) {
                return Err(ConfigError::ValidationFailed("latitude out of range"));
            }
            if !(-180.0..=180.0).contains(&longitude) {
                return Err(ConfigError::ValidationFailed("longitude out of range"));
            }
            if utc_offset_minutes.is_some_and(|m| !(-14 * 60..=14 * 60).contains(&m)) {
                return Err(ConfigError::ValidationFailed("utc_offset_minutes out of range"));
            }
        }
        if self.outlet.command.first().is_some_and(String::is_empty) {
            return Err(ConfigError::ValidationFailed("outlet command program is empty"));
        }
        Ok(())
    }

    pub fn turn_off_after_ms(&self) -> u64 {
        u64::from(self.turn_off_after_secs) * 1000
    }

    pub fn periodic_off_interval_ms(&self) -> u64 {
        u64::from(self.periodic_off_interval_secs) * 1000
    }
}
