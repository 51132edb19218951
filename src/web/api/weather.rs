use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::weather::{weather_at_time, HourlyWeather, WeatherReport};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::api::resolve_observer;
use crate::web::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct WeatherQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// RFC3339 viewing time to evaluate, defaults to now.
    pub time: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WeatherResponse {
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    /// Nearest forecast hour to the requested time, if within an hour.
    pub at: Option<WeatherReport>,
    pub hours: Vec<HourlyWeather>,
}

#[utoipa::path(
    get,
    path = "/api/weather",
    tag = "weather",
    params(
        ("lat" = Option<f64>, Query, description = "Latitude (degrees), defaults to the station"),
        ("lon" = Option<f64>, Query, description = "Longitude (degrees), defaults to the station"),
        ("time" = Option<String>, Query, description = "Viewing time (RFC3339), defaults to now")
    ),
    responses(
        (status = 200, description = "Hourly forecast and the verdict for the viewing time", body = WeatherResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 503, description = "Forecast unavailable", body = ErrorResponse)
    )
)]
pub async fn get_weather(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> ApiResult<Json<WeatherResponse>> {
    let location = resolve_observer(&state, query.lat, query.lon)?;
    let outcome = state.services.weather.fetch_forecast(&location).await;

    let cached = outcome.is_cached();
    let warning = outcome.error().map(String::from);
    let forecast = outcome
        .into_data()
        .ok_or_else(|| ApiError::Unavailable(warning.clone().unwrap_or_default()))?;

    let time = query.time.unwrap_or_else(Utc::now);
    Ok(Json(WeatherResponse {
        cached,
        warning,
        at: weather_at_time(&forecast, time),
        hours: forecast.hours,
    }))
}
