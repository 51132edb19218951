pub mod error;
pub mod passes;
pub mod satellites;
pub mod weather;

use crate::geometry::ObserverLocation;
use crate::web::state::AppState;

use error::{ApiError, ApiResult};

/// Observer from explicit coordinates, or the configured station when both are omitted.
pub(crate) fn resolve_observer(
    state: &AppState,
    lat: Option<f64>,
    lon: Option<f64>,
) -> ApiResult<ObserverLocation> {
    match (lat, lon) {
        (Some(lat), Some(lon)) => {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                return Err(ApiError::Validation(format!(
                    "coordinates out of range: {}, {}",
                    lat, lon
                )));
            }
            Ok(ObserverLocation::new(lat, lon))
        }
        (None, None) => state
            .services
            .default_observer()
            .ok_or_else(|| ApiError::Validation("No station configured; pass lat and lon".into())),
        _ => Err(ApiError::Validation("lat and lon must be given together".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::services::Services;

    fn state(coordinates: &str) -> AppState {
        let mut config = Config::default();
        config.station.coordinates = coordinates.to_string();
        AppState::new(Services::from_config(config).unwrap())
    }

    #[test]
    fn explicit_coordinates_win() {
        let observer = resolve_observer(&state("38.72,-9.14"), Some(51.5), Some(-0.1)).unwrap();
        assert_eq!(observer.latitude_deg, 51.5);
        assert_eq!(observer.longitude_deg, -0.1);
    }

    #[test]
    fn falls_back_to_station() {
        let observer = resolve_observer(&state("38.72,-9.14"), None, None).unwrap();
        assert_eq!(observer.latitude_deg, 38.72);
        assert!(resolve_observer(&state("nowhere"), None, None).is_err());
    }

    #[test]
    fn rejects_partial_or_out_of_range() {
        let state = state("38.72,-9.14");
        assert!(resolve_observer(&state, Some(10.0), None).is_err());
        assert!(resolve_observer(&state, Some(91.0), Some(0.0)).is_err());
        assert!(resolve_observer(&state, Some(0.0), Some(-181.0)).is_err());
    }
}
