//! GPIO presence sensors.
//!
//! PIR modules drive a digital line while they see motion.  Each line is
//! read through `embedded_hal::digital::InputPin`, so the bank works with
//! any HAL; [`SysfsPin`] is the Linux sysfs implementation used by the
//! binary.
//!
//! | Item               | Role                                         |
//! |--------------------|----------------------------------------------|
//! | `SysfsPin`         | `InputPin` over `/sys/class/gpio/gpioN/value` |
//! | `PresenceSensor`   | one pin + label + polarity                   |
//! | `SensorBank`       | ORs up to `MAX_SENSORS`, implements SensorPort |

use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use embedded_hal::digital::{ErrorKind, ErrorType, InputPin};
use log::{debug, info};
use thiserror::Error as ThisError;

use crate::app::ports::SensorPort;
use crate::config::{MAX_SENSORS, SensorConfig};
use crate::error::SensorError;
use crate::occupancy::{PresenceSample, SensorId};

pub const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

/// udev may still be fixing permissions on a freshly exported line.
const DIRECTION_ATTEMPTS: u32 = 10;
const DIRECTION_RETRY_DELAY: Duration = Duration::from_millis(50);

// ═══════════════════════════════════════════════════════════════
//  Sysfs pin
// ═══════════════════════════════════════════════════════════════

#[derive(ThisError, Debug)]
pub enum GpioError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("unexpected level {0:?}")]
    BadValue(String),
}

impl embedded_hal::digital::Error for GpioError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Input pin backed by the sysfs GPIO interface.
///
/// Exports the line on open if needed and unexports it on drop, but only
/// when this process did the export.
pub struct SysfsPin {
    pin: u32,
    root: PathBuf,
    exported: bool,
}

impl SysfsPin {
    pub fn open(pin: u32) -> Result<Self, SensorError> {
        Self::open_at(Path::new(SYSFS_GPIO_ROOT), pin)
    }

    /// Open under an alternative sysfs root.
    ///
    /// A line exported here is unexported again if it cannot be configured.
    pub fn open_at(root: &Path, pin: u32) -> Result<Self, SensorError> {
        let setup_err = |e: std::io::Error| SensorError::GpioSetupFailed {
            pin,
            reason: e.to_string(),
        };

        let dir = root.join(format!("gpio{pin}"));
        let mut exported = false;
        if !dir.exists() {
            fs::write(root.join("export"), pin.to_string()).map_err(setup_err)?;
            exported = true;
        }
        if let Err(e) = write_direction(&dir.join("direction")) {
            if exported {
                if let Err(ue) = fs::write(root.join("unexport"), pin.to_string()) {
                    debug!("GPIO {} unexport failed: {}", pin, ue);
                }
            }
            return Err(setup_err(e));
        }
        debug!("GPIO {} configured as input", pin);

        Ok(Self {
            pin,
            root: root.to_path_buf(),
            exported,
        })
    }

    fn value_path(&self) -> PathBuf {
        self.root.join(format!("gpio{}", self.pin)).join("value")
    }
}

/// Set the line to input, retrying while access is denied.
fn write_direction(path: &Path) -> std::io::Result<()> {
    let mut attempt = 1;
    loop {
        match fs::write(path, "in") {
            Err(e) if e.kind() == IoErrorKind::PermissionDenied && attempt < DIRECTION_ATTEMPTS => {
                attempt += 1;
                std::thread::sleep(DIRECTION_RETRY_DELAY);
            }
            other => return other,
        }
    }
}

impl Drop for SysfsPin {
    fn drop(&mut self) {
        if self.exported {
            if let Err(e) = fs::write(self.root.join("unexport"), self.pin.to_string()) {
                debug!("GPIO {} unexport failed: {}", self.pin, e);
            }
        }
    }
}

impl ErrorType for SysfsPin {
    type Error = GpioError;
}

impl InputPin for SysfsPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let raw = fs::read_to_string(self.value_path())?;
        match raw.trim() {
            "1" => Ok(true),
            "0" => Ok(false),
            other => Err(GpioError::BadValue(other.to_string())),
        }
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Sensors
// ═══════════════════════════════════════════════════════════════

/// One binary presence sensor.
pub struct PresenceSensor<P> {
    id: SensorId,
    pin_number: u32,
    pin: P,
    active_low: bool,
}

impl<P: InputPin> PresenceSensor<P> {
    pub fn new(id: SensorId, pin_number: u32, pin: P, active_low: bool) -> Self {
        Self {
            id,
            pin_number,
            pin,
            active_low,
        }
    }

    /// Current level, polarity applied.
    pub fn is_active(&mut self) -> Result<bool, SensorError> {
        let high = self
            .pin
            .is_high()
            .map_err(|e| SensorError::GpioReadFailed {
                pin: self.pin_number,
                reason: format!("{e:?}"),
            })?;
        Ok(high != self.active_low)
    }
}

/// Fixed-capacity set of sensors read together each tick.
pub struct SensorBank<P> {
    sensors: heapless::Vec<PresenceSensor<P>, MAX_SENSORS>,
}

impl<P: InputPin> Default for SensorBank<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: InputPin> SensorBank<P> {
    pub fn new() -> Self {
        Self {
            sensors: heapless::Vec::new(),
        }
    }

    pub fn add(&mut self, sensor: PresenceSensor<P>) -> Result<(), SensorError> {
        self.sensors
            .push(sensor)
            .map_err(|_| SensorError::TooMany(MAX_SENSORS))
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }
}

impl SensorBank<SysfsPin> {
    /// Open every configured sensor through sysfs.
    pub fn open(configs: &[SensorConfig]) -> Result<Self, SensorError> {
        let mut bank = Self::new();
        for c in configs {
            let pin = SysfsPin::open(c.pin)?;
            bank.add(PresenceSensor::new(c.id.clone(), c.pin, pin, c.active_low))?;
            info!("sensor {} on GPIO {}", c.id, c.pin);
        }
        Ok(bank)
    }
}

impl<P: InputPin> SensorPort for SensorBank<P> {
    /// Read every sensor; the first active one in configuration order
    /// becomes the sample's source.
    fn sample(&mut self) -> Result<PresenceSample, SensorError> {
        let mut sample = PresenceSample::inactive();
        for sensor in &mut self.sensors {
            if sensor.is_active()? && !sample.active {
                sample = PresenceSample::active_from(sensor.id.clone());
            }
        }
        Ok(sample)
    }

    fn release(&mut self) {
        let count = self.sensors.len();
        self.sensors.clear();
        info!("released {} sensor(s)", count);
    }
}
