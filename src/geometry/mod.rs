//! Geometry provider: where a satellite is and how an observer sees it.

mod error;
mod observer;
mod propagation;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use propagation::{ecef_to_enu, ecef_to_geodetic, teme_to_ecef_position, Sgp4Geometry};
pub use error::GeometryError;
pub use observer::{ObserverLocation, EARTH_ROTATION_RAD_S, WGS84_A_KM};

/// Antenna pointing from the observer. Azimuth clockwise from north.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LookAngles {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_km: f64,
    pub range_rate_km_s: Option<f64>,
}

/// Sub-satellite point and speed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SatellitePosition {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km: f64,
    pub velocity_km_s: f64,
}

/// Everything computed for one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub look: LookAngles,
    pub position: SatellitePosition,
    /// Earth-centered inertial position, km.
    pub eci_km: [f64; 3],
}

pub trait Geometry: Sync {
    /// `None` when propagation fails at `time`; callers treat it as a data gap.
    fn observe(&self, observer: &ObserverLocation, time: DateTime<Utc>) -> Option<Observation>;
}
