use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const EARTH_ROTATION_RAD_S: f64 = 7.292_115e-5;
pub const WGS84_A_KM: f64 = 6378.137;
pub const WGS84_E2: f64 = 0.00669437999014;

/// Where the observer stands. Supplied per request; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ObserverLocation {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: Option<f64>,
    pub name: Option<String>,
}

impl ObserverLocation {
    pub fn new(latitude_deg: f64, longitude_deg: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            altitude_m: None,
            name: None,
        }
    }

    /// Parse `"lat,lon"`.
    pub fn from_coordinates(coordinates: &str) -> Option<Self> {
        let parts: Vec<_> = coordinates.split(',').map(|s| s.trim()).collect();
        if parts.len() < 2 {
            return None;
        }
        let lat: f64 = parts[0].parse().ok()?;
        let lon: f64 = parts[1].parse().ok()?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return None;
        }
        Some(Self::new(lat, lon))
    }

    pub fn lat_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }

    pub fn lon_rad(&self) -> f64 {
        self.longitude_deg.to_radians()
    }

    pub fn position_ecef_km(&self) -> [f64; 3] {
        let lat = self.lat_rad();
        let lon = self.lon_rad();
        let sin_lat = lat.sin();
        let cos_lat = lat.cos();
        let n = WGS84_A_KM / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        let alt_km = self.altitude_m.unwrap_or(0.0) / 1000.0;
        [
            (n + alt_km) * cos_lat * lon.cos(),
            (n + alt_km) * cos_lat * lon.sin(),
            (n * (1.0 - WGS84_E2) + alt_km) * sin_lat,
        ]
    }

    pub fn velocity_ecef_km_s(&self) -> [f64; 3] {
        let pos = self.position_ecef_km();
        [
            -EARTH_ROTATION_RAD_S * pos[1],
            EARTH_ROTATION_RAD_S * pos[0],
            0.0,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_coordinates() {
        let observer = ObserverLocation::from_coordinates("38.72, -9.14").unwrap();
        assert_eq!(observer.latitude_deg, 38.72);
        assert_eq!(observer.longitude_deg, -9.14);
        assert!(ObserverLocation::from_coordinates("38.72").is_none());
        assert!(ObserverLocation::from_coordinates("91,0").is_none());
    }

    #[test]
    fn equator_sits_on_semi_major_axis() {
        let pos = ObserverLocation::new(0.0, 0.0).position_ecef_km();
        assert!((pos[0] - WGS84_A_KM).abs() < 1e-9);
        assert!(pos[1].abs() < 1e-9 && pos[2].abs() < 1e-9);
    }
}
