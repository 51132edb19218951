use chrono::{DateTime, Utc};
use sgp4::{Constants, Elements};

use super::observer::{EARTH_ROTATION_RAD_S, WGS84_A_KM, WGS84_E2};
use super::{Geometry, GeometryError, LookAngles, Observation, ObserverLocation, SatellitePosition};
use crate::elements::OrbitalElements;

/// SGP4 propagation of one element set.
pub struct Sgp4Geometry {
    elements: Elements,
    constants: Constants,
}

impl Sgp4Geometry {
    pub fn new(tle: &OrbitalElements) -> Result<Self, GeometryError> {
        let elements =
            Elements::from_tle(tle.name.clone(), tle.line1.as_bytes(), tle.line2.as_bytes())?;
        let constants = Constants::from_elements(&elements)?;
        Ok(Self {
            elements,
            constants,
        })
    }

    /// TEME position and velocity, km and km/s.
    pub fn propagate(&self, timestamp: DateTime<Utc>) -> Option<([f64; 3], [f64; 3])> {
        let minutes = self
            .elements
            .datetime_to_minutes_since_epoch(&timestamp.naive_utc())
            .ok()?;
        match self.constants.propagate(minutes) {
            Ok(prediction) => Some((prediction.position, prediction.velocity)),
            Err(e) => {
                log::debug!("Propagation failed at {}: {}", timestamp, e);
                None
            }
        }
    }
}

impl Geometry for Sgp4Geometry {
    fn observe(&self, observer: &ObserverLocation, time: DateTime<Utc>) -> Option<Observation> {
        let (position, velocity) = self.propagate(time)?;

        let sidereal =
            sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&time.naive_utc()));

        let sat_ecef = teme_to_ecef_position(position, sidereal);
        let sat_vel_ecef = teme_to_ecef_velocity(position, velocity, sidereal);

        let sta_ecef = observer.position_ecef_km();
        let sta_vel = observer.velocity_ecef_km_s();

        let dr = [
            sat_ecef[0] - sta_ecef[0],
            sat_ecef[1] - sta_ecef[1],
            sat_ecef[2] - sta_ecef[2],
        ];
        let range_km = norm(dr);

        let (east, north, up) = ecef_to_enu(dr, observer.lat_rad(), observer.lon_rad());
        let azimuth = east.atan2(north).to_degrees().rem_euclid(360.0);
        let elevation = if range_km > 0.0 {
            (up / range_km).asin().to_degrees()
        } else {
            0.0
        };

        let range_rate_km_s = if range_km > 0.0 {
            let rel_vel = [
                sat_vel_ecef[0] - sta_vel[0],
                sat_vel_ecef[1] - sta_vel[1],
                sat_vel_ecef[2] - sta_vel[2],
            ];
            Some((rel_vel[0] * dr[0] + rel_vel[1] * dr[1] + rel_vel[2] * dr[2]) / range_km)
        } else {
            None
        };

        let (latitude_deg, longitude_deg, altitude_km) = ecef_to_geodetic(sat_ecef);

        Some(Observation {
            look: LookAngles {
                azimuth_deg: azimuth,
                elevation_deg: elevation,
                range_km,
                range_rate_km_s,
            },
            position: SatellitePosition {
                latitude_deg,
                longitude_deg,
                altitude_km,
                velocity_km_s: norm(velocity),
            },
            eci_km: position,
        })
    }
}

fn norm(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

pub fn teme_to_ecef_position(pos_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    [
        pos_teme[0] * cos_gmst + pos_teme[1] * sin_gmst,
        -pos_teme[0] * sin_gmst + pos_teme[1] * cos_gmst,
        pos_teme[2],
    ]
}

fn teme_to_ecef_velocity(pos_teme: [f64; 3], vel_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let pos = teme_to_ecef_position(pos_teme, gmst);
    let rotated = teme_to_ecef_position(vel_teme, gmst);
    [
        rotated[0] + EARTH_ROTATION_RAD_S * pos[1],
        rotated[1] - EARTH_ROTATION_RAD_S * pos[0],
        rotated[2],
    ]
}

pub fn ecef_to_enu(dr: [f64; 3], lat_rad: f64, lon_rad: f64) -> (f64, f64, f64) {
    let sin_lat = lat_rad.sin();
    let cos_lat = lat_rad.cos();
    let sin_lon = lon_rad.sin();
    let cos_lon = lon_rad.cos();

    let east = -sin_lon * dr[0] + cos_lon * dr[1];
    let north = -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2];
    let up = cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2];
    (east, north, up)
}

/// WGS-84 geodetic latitude/longitude (degrees) and height (km), by fixed-point iteration.
pub fn ecef_to_geodetic(ecef: [f64; 3]) -> (f64, f64, f64) {
    let [x, y, z] = ecef;
    let lon = y.atan2(x);
    let p = (x * x + y * y).sqrt();

    let mut lat = z.atan2(p * (1.0 - WGS84_E2));
    let mut height = 0.0;
    for _ in 0..5 {
        let sin_lat = lat.sin();
        let n = WGS84_A_KM / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        height = p / lat.cos() - n;
        lat = z.atan2(p * (1.0 - WGS84_E2 * n / (n + height)));
    }

    (lat.to_degrees(), lon.to_degrees(), height)
}
