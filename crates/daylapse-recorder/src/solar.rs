//! Approximate daylight window from latitude, longitude and date.
//!
//! Day length is estimated from the Earth's axial tilt and the number of
//! days since the spring equinox. This is an approximation, not an
//! ephemeris model.

use std::f64::consts::PI;
use std::sync::OnceLock;

use chrono::{DateTime, Datelike, NaiveDate, Offset, TimeZone};
use daylapse_models::DaylightWindow;

/// Ecliptic inclination (23°26'21.45") in radians.
pub const ECLIPTIC_INCLINATION: f64 = 28127.0 / 216000.0 * PI;

/// Period used by the declination phase away from the poles.
const DECLINATION_PERIOD_DAYS: f64 = 356.0;
/// Period used for the polar day/night decision.
const POLAR_PERIOD_DAYS: f64 = 365.0;

fn ecliptic_factor() -> f64 {
    static FACTOR: OnceLock<f64> = OnceLock::new();
    *FACTOR.get_or_init(|| ECLIPTIC_INCLINATION.tan())
}

/// Whole days since the most recent March 20.
pub fn equinox_offset_days(date: NaiveDate) -> i64 {
    let equinox = |year| NaiveDate::from_ymd_opt(year, 3, 20);
    let most_recent = match equinox(date.year()) {
        Some(this_year) if this_year <= date => this_year,
        _ => equinox(date.year() - 1).unwrap_or(date),
    };
    (date - most_recent).num_days()
}

/// Day length in hours for a latitude and equinox offset.
pub fn day_length_hours(latitude: f64, equinox_offset_days: i64) -> f64 {
    let offset = equinox_offset_days as f64;

    if latitude.abs() < 90.0 {
        let phase = (offset / DECLINATION_PERIOD_DAYS * 2.0 * PI).sin();
        let cos_arg = -phase * latitude.to_radians().tan() * ecliptic_factor();
        if cos_arg > 1.0 {
            0.0
        } else if cos_arg < -1.0 {
            24.0
        } else {
            24.0 * cos_arg.acos() / PI
        }
    } else if (offset / POLAR_PERIOD_DAYS * 2.0 * PI).sin() * latitude > 0.0 {
        24.0
    } else {
        0.0
    }
}

/// Compute the daylight window for a location on the reference date.
///
/// The reference's UTC offset stands in for the local timezone; solar midday
/// is shifted by the longitude so the window follows the sun, not the
/// political timezone.
pub fn compute_daylight_window<Tz: TimeZone>(
    latitude: f64,
    longitude: f64,
    reference: &DateTime<Tz>,
) -> DaylightWindow {
    let timezone_hours = reference.offset().fix().local_minus_utc() as f64 / 3600.0;
    let midday_offset = timezone_hours - longitude / 15.0;

    let day_length = day_length_hours(latitude, equinox_offset_days(reference.date_naive()));

    if day_length >= 24.0 {
        return DaylightWindow::new(0.0, 24.0);
    }

    let start = 12.0 + midday_offset - day_length / 2.0;
    DaylightWindow::new(start, start + day_length)
}
