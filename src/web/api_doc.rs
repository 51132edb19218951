use utoipa::OpenApi;

use super::api::error::ErrorResponse;
use super::api::passes::{NextPassResponse, PassesQuery, SatelliteAtQuery};
use super::api::satellites::{SatelliteListQuery, SatelliteListResponse};
use super::api::weather::{WeatherQuery, WeatherResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::passes::list_passes,
        super::api::passes::next_pass,
        super::api::passes::overhead,
        super::api::satellites::list_satellites,
        super::api::satellites::get_satellite,
        super::api::weather::get_weather,
    ),
    components(
        schemas(
            ErrorResponse,
            PassesQuery,
            SatelliteAtQuery,
            NextPassResponse,
            SatelliteListQuery,
            SatelliteListResponse,
            WeatherQuery,
            WeatherResponse,
            crate::services::PassReport,
            crate::services::OverheadStatus,
            crate::predict::Pass,
            crate::predict::PassMoment,
            crate::visibility::VisibilityWindow,
            crate::geometry::LookAngles,
            crate::geometry::SatellitePosition,
            crate::catalog::Satellite,
            crate::catalog::Category,
            crate::catalog::SatelliteStatus,
            crate::catalog::Transmitter,
            crate::elements::OrbitalElements,
            crate::weather::HourlyWeather,
            crate::weather::WeatherReport,
        )
    ),
    info(
        title = "Overhead API",
        description = "Satellite pass prediction, visibility and viewing conditions",
        version = "0.1.0"
    ),
    tags(
        (name = "passes", description = "Pass prediction"),
        (name = "satellites", description = "Satellite catalog"),
        (name = "weather", description = "Viewing weather")
    )
)]
pub struct ApiDoc;
