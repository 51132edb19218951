//! Low-precision solar ephemeris, twilight buckets and a cylindrical Earth-shadow test.
//!
//! Accuracy is amateur grade (a fraction of a degree for the sun, tens of seconds
//! for shadow entry), which is what naked-eye pass planning needs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::geometry::ObserverLocation;

pub const EARTH_RADIUS_KM: f64 = 6378.137;
pub const AU_KM: f64 = 149_597_870.7;
/// Beyond this geocentric distance a satellite is never considered shadowed.
pub const SHADOW_CUTOFF_KM: f64 = EARTH_RADIUS_KM + 2000.0;
pub const CIVIL_TWILIGHT_DEG: f64 = -6.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct SunPosition {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Twilight {
    Day,
    Civil,
    Nautical,
    Astronomical,
    Night,
}

impl Twilight {
    pub fn from_sun_elevation(elevation_deg: f64) -> Self {
        if elevation_deg > 0.0 {
            Twilight::Day
        } else if elevation_deg > -6.0 {
            Twilight::Civil
        } else if elevation_deg > -12.0 {
            Twilight::Nautical
        } else if elevation_deg > -18.0 {
            Twilight::Astronomical
        } else {
            Twilight::Night
        }
    }
}

struct SolarCoordinates {
    /// Days since J2000.0.
    days: f64,
    ecliptic_longitude: f64,
    right_ascension: f64,
    declination: f64,
}

pub fn julian_date(time: DateTime<Utc>) -> f64 {
    let seconds = time.timestamp() as f64 + time.timestamp_subsec_nanos() as f64 * 1e-9;
    2_440_587.5 + seconds / 86_400.0
}

fn solar_coordinates(time: DateTime<Utc>) -> SolarCoordinates {
    let n = julian_date(time) - 2_451_545.0;

    let mean_longitude = (280.460 + 0.985_647_4 * n).rem_euclid(360.0);
    let mean_anomaly = (357.528 + 0.985_600_3 * n).rem_euclid(360.0).to_radians();

    // equation of centre
    let lambda = (mean_longitude
        + 1.915 * mean_anomaly.sin()
        + 0.020 * (2.0 * mean_anomaly).sin())
    .rem_euclid(360.0)
    .to_radians();

    let obliquity = (23.439 - 0.000_000_4 * n).to_radians();

    SolarCoordinates {
        days: n,
        ecliptic_longitude: lambda,
        right_ascension: (lambda.sin() * obliquity.cos()).atan2(lambda.cos()),
        declination: (lambda.sin() * obliquity.sin()).asin(),
    }
}

/// Greenwich mean sidereal time, degrees.
fn gmst_deg(days: f64) -> f64 {
    let t = days / 36_525.0;
    (280.460_618_37 + 360.985_647_366_29 * days + 0.000_387_933 * t * t
        - t * t * t / 38_710_000.0)
        .rem_euclid(360.0)
}

/// Topocentric sun azimuth/elevation in degrees (refraction ignored).
pub fn sun_position(observer: &ObserverLocation, time: DateTime<Utc>) -> SunPosition {
    let sun = solar_coordinates(time);
    let local_sidereal = (gmst_deg(sun.days) + observer.longitude_deg).to_radians();
    let hour_angle = local_sidereal - sun.right_ascension;

    let lat = observer.lat_rad();
    let dec = sun.declination;

    let sin_elevation = dec.sin() * lat.sin() + dec.cos() * lat.cos() * hour_angle.cos();
    let elevation = sin_elevation.clamp(-1.0, 1.0).asin();

    let azimuth = (-hour_angle.sin() * dec.cos())
        .atan2(dec.sin() * lat.cos() - dec.cos() * lat.sin() * hour_angle.cos());

    SunPosition {
        azimuth_deg: azimuth.to_degrees().rem_euclid(360.0),
        elevation_deg: elevation.to_degrees(),
    }
}

/// Sun position in the inertial frame, first-order: 1 AU along the ecliptic
/// longitude, z = 0.
pub fn sun_eci_km(time: DateTime<Utc>) -> [f64; 3] {
    let lambda = solar_coordinates(time).ecliptic_longitude;
    [AU_KM * lambda.cos(), AU_KM * lambda.sin(), 0.0]
}

/// Cylindrical shadow heuristic: shadowed when the satellite faces away from the
/// sun (negative dot product of its position with the satellite-to-sun vector)
/// and is below `SHADOW_CUTOFF_KM`.
pub fn is_satellite_sunlit(sat_eci_km: [f64; 3], time: DateTime<Utc>) -> bool {
    let sun = sun_eci_km(time);
    let to_sun = [
        sun[0] - sat_eci_km[0],
        sun[1] - sat_eci_km[1],
        sun[2] - sat_eci_km[2],
    ];
    let dot = sat_eci_km[0] * to_sun[0] + sat_eci_km[1] * to_sun[1] + sat_eci_km[2] * to_sun[2];
    let distance =
        (sat_eci_km[0].powi(2) + sat_eci_km[1].powi(2) + sat_eci_km[2].powi(2)).sqrt();

    !(dot < 0.0 && distance < SHADOW_CUTOFF_KM)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn equinox(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 20, hour, 0, 0).unwrap()
    }

    #[test]
    fn equatorial_noon_and_midnight() {
        let observer = ObserverLocation::new(0.0, 0.0);
        assert!(sun_position(&observer, equinox(12)).elevation_deg > 80.0);
        assert!(sun_position(&observer, equinox(0)).elevation_deg < -80.0);
    }

    #[test]
    fn sun_rises_east_and_sets_west() {
        let observer = ObserverLocation::new(0.0, 0.0);

        let morning = sun_position(&observer, equinox(6));
        assert!(morning.elevation_deg.abs() < 3.0, "{:?}", morning);
        assert!((morning.azimuth_deg - 90.0).abs() < 3.0, "{:?}", morning);

        let evening = sun_position(&observer, equinox(18));
        assert!(evening.elevation_deg.abs() < 3.0, "{:?}", evening);
        assert!((evening.azimuth_deg - 270.0).abs() < 3.0, "{:?}", evening);
    }

    #[test]
    fn summer_noon_height_in_lisbon() {
        let observer = ObserverLocation::new(38.72, -9.14);
        let peak = (0..24 * 60)
            .map(|m| {
                let t = Utc.with_ymd_and_hms(2024, 6, 20, 0, 0, 0).unwrap()
                    + chrono::Duration::minutes(m);
                sun_position(&observer, t).elevation_deg
            })
            .fold(f64::MIN, f64::max);
        // 90 - latitude + obliquity
        assert!((peak - 74.7).abs() < 0.5, "peak {}", peak);
    }

    #[test]
    fn twilight_buckets() {
        assert_eq!(Twilight::from_sun_elevation(10.0), Twilight::Day);
        assert_eq!(Twilight::from_sun_elevation(0.0), Twilight::Civil);
        assert_eq!(Twilight::from_sun_elevation(-6.0), Twilight::Nautical);
        assert_eq!(Twilight::from_sun_elevation(-11.9), Twilight::Nautical);
        assert_eq!(Twilight::from_sun_elevation(-12.0), Twilight::Astronomical);
        assert_eq!(Twilight::from_sun_elevation(-18.0), Twilight::Night);
        assert_eq!(Twilight::Astronomical.to_string(), "astronomical");
    }

    #[test]
    fn shadow_test() {
        let t = equinox(12);
        let sun = sun_eci_km(t);
        assert!(sun[0] > 0.99 * AU_KM);

        let leo = EARTH_RADIUS_KM + 400.0;
        assert!(is_satellite_sunlit([leo, 0.0, 0.0], t));
        assert!(!is_satellite_sunlit([-leo, 0.0, 0.0], t));
        // geostationary distance is past the cutoff
        assert!(is_satellite_sunlit([-42_164.0, 0.0, 0.0], t));
    }
}
