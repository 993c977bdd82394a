//! Sun-time sources implementing [`DaylightPort`].
//!
//! [`SolarDaylight`] computes sunrise and sunset locally from the site's
//! coordinates with the standard sunrise equation (NOAA approximation,
//! refraction-corrected −0.833° horizon, good to a minute or two at
//! mid latitudes).  [`FixedDaylight`] returns the same pair every day.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

use crate::app::ports::{DaylightPort, SunTimes};
use crate::config::DaylightSource;
use crate::error::DaylightError;

/// Julian day of 1970-01-01T00:00Z.
const JD_UNIX_EPOCH: f64 = 2_440_587.5;
/// Julian day of 2000-01-01T12:00Z.
const JD_J2000: f64 = 2_451_545.0;
/// Earth's axial tilt (degrees).
const OBLIQUITY_DEG: f64 = 23.4397;
/// Apparent horizon including refraction and the solar disc (degrees).
const HORIZON_DEG: f64 = -0.833;

/// Build the configured source.
pub fn from_config(source: &DaylightSource) -> Box<dyn DaylightPort> {
    match *source {
        DaylightSource::Solar {
            latitude,
            longitude,
            utc_offset_minutes,
        } => Box::new(SolarDaylight::new(
            latitude,
            longitude,
            utc_offset_minutes.and_then(|m| FixedOffset::east_opt(m * 60)),
        )),
        DaylightSource::Fixed { sunrise, sunset } => Box::new(FixedDaylight { sunrise, sunset }),
    }
}

// ═══════════════════════════════════════════════════════════════
//  Solar calculation
// ═══════════════════════════════════════════════════════════════

/// Sunrise and sunset for `date` in UTC, or `None` during polar day/night.
///
/// `longitude` is degrees east.
pub fn sun_times_utc(
    date: NaiveDate,
    latitude: f64,
    longitude: f64,
) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let days_since_epoch = (date - NaiveDate::from_ymd_opt(1970, 1, 1)?).num_days() as f64;
    // Days since J2000 at local noon of `date`.
    let n = days_since_epoch + JD_UNIX_EPOCH + 0.5 - JD_J2000;
    let mean_solar_noon = n - longitude / 360.0;

    let mean_anomaly = (357.5291 + 0.985_600_28 * mean_solar_noon).rem_euclid(360.0);
    let m = mean_anomaly.to_radians();
    let center = 1.9148 * m.sin() + 0.0200 * (2.0 * m).sin() + 0.0003 * (3.0 * m).sin();
    let ecliptic_longitude = (mean_anomaly + center + 180.0 + 102.9372).rem_euclid(360.0);
    let lambda = ecliptic_longitude.to_radians();

    let transit = JD_J2000 + mean_solar_noon + 0.0053 * m.sin() - 0.0069 * (2.0 * lambda).sin();

    let sin_decl = lambda.sin() * OBLIQUITY_DEG.to_radians().sin();
    let cos_decl = sin_decl.asin().cos();
    let phi = latitude.to_radians();
    let cos_hour_angle =
        (HORIZON_DEG.to_radians().sin() - phi.sin() * sin_decl) / (phi.cos() * cos_decl);
    if !(-1.0..=1.0).contains(&cos_hour_angle) {
        return None;
    }
    let hour_angle = cos_hour_angle.acos().to_degrees();

    let rise = julian_to_utc(transit - hour_angle / 360.0)?;
    let set = julian_to_utc(transit + hour_angle / 360.0)?;
    Some((rise, set))
}

fn julian_to_utc(jd: f64) -> Option<NaiveDateTime> {
    let millis = ((jd - JD_UNIX_EPOCH) * 86_400_000.0).round() as i64;
    DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
}

/// Sunrise/sunset from coordinates, shifted to local time.
pub struct SolarDaylight {
    latitude: f64,
    longitude: f64,
    /// Fixed offset, or the system's local offset for each date when `None`.
    offset: Option<FixedOffset>,
}

impl SolarDaylight {
    pub fn new(latitude: f64, longitude: f64, offset: Option<FixedOffset>) -> Self {
        Self {
            latitude,
            longitude,
            offset,
        }
    }

    fn to_local(&self, utc: NaiveDateTime) -> NaiveTime {
        let offset = self
            .offset
            .unwrap_or_else(|| Local.offset_from_utc_datetime(&utc));
        offset.from_utc_datetime(&utc).time()
    }
}

impl DaylightPort for SolarDaylight {
    fn sun_times(&mut self, date: NaiveDate) -> Result<SunTimes, DaylightError> {
        let (rise, set) = sun_times_utc(date, self.latitude, self.longitude)
            .ok_or(DaylightError::NoSunEvent(date))?;
        Ok(SunTimes {
            sunrise: self.to_local(rise),
            sunset: self.to_local(set),
        })
    }
}

// ═══════════════════════════════════════════════════════════════
//  Fixed times
// ═══════════════════════════════════════════════════════════════

/// Same sunrise/sunset every day.
pub struct FixedDaylight {
    pub sunrise: NaiveTime,
    pub sunset: NaiveTime,
}

impl DaylightPort for FixedDaylight {
    fn sun_times(&mut self, _date: NaiveDate) -> Result<SunTimes, DaylightError> {
        Ok(SunTimes {
            sunrise: self.sunrise,
            sunset: self.sunset,
        })
    }
}
