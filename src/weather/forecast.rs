use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::error::WeatherError;

/// Forecast hours are requested in UTC and come back without an offset.
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

pub const MAX_CLOUD_COVER_PCT: f64 = 30.0;
pub const MAX_PRECIPITATION_MM: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HourlyWeather {
    pub time: DateTime<Utc>,
    pub cloud_cover_pct: f64,
    pub precipitation_mm: f64,
    pub visibility_m: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Forecast {
    pub latitude: f64,
    pub longitude: f64,
    pub hours: Vec<HourlyWeather>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct WeatherReport {
    pub time: DateTime<Utc>,
    pub cloud_cover_pct: f64,
    pub precipitation_mm: f64,
    pub visibility_m: Option<f64>,
    pub is_good_weather: bool,
}

impl From<&HourlyWeather> for WeatherReport {
    fn from(hour: &HourlyWeather) -> Self {
        Self {
            time: hour.time,
            cloud_cover_pct: hour.cloud_cover_pct,
            precipitation_mm: hour.precipitation_mm,
            visibility_m: hour.visibility_m,
            is_good_weather: is_good_weather(hour.cloud_cover_pct, hour.precipitation_mm),
        }
    }
}

#[derive(Deserialize)]
struct ProviderResponse {
    hourly: ProviderHourly,
}

#[derive(Deserialize)]
struct ProviderHourly {
    time: Vec<String>,
    cloud_cover: Vec<Option<f64>>,
    precipitation: Vec<Option<f64>>,
    #[serde(default)]
    visibility: Vec<Option<f64>>,
}

/// Parse the provider's column-oriented hourly JSON. Hours missing cloud cover or
/// precipitation are dropped.
pub fn parse_forecast(body: &str, latitude: f64, longitude: f64) -> Result<Forecast, WeatherError> {
    let response: ProviderResponse = serde_json::from_str(body)?;
    let hourly = response.hourly;

    if hourly.cloud_cover.len() != hourly.time.len()
        || hourly.precipitation.len() != hourly.time.len()
    {
        return Err(WeatherError::Malformed(format!(
            "{} times, {} cloud cover values, {} precipitation values",
            hourly.time.len(),
            hourly.cloud_cover.len(),
            hourly.precipitation.len()
        )));
    }

    let mut hours = Vec::with_capacity(hourly.time.len());
    for (i, stamp) in hourly.time.iter().enumerate() {
        let time = NaiveDateTime::parse_from_str(stamp, TIME_FORMAT)
            .map_err(|e| WeatherError::Malformed(format!("time {:?}: {}", stamp, e)))?
            .and_utc();
        let (Some(cloud_cover_pct), Some(precipitation_mm)) =
            (hourly.cloud_cover[i], hourly.precipitation[i])
        else {
            continue;
        };
        hours.push(HourlyWeather {
            time,
            cloud_cover_pct,
            precipitation_mm,
            visibility_m: hourly.visibility.get(i).copied().flatten(),
        });
    }

    Ok(Forecast {
        latitude,
        longitude,
        hours,
    })
}

/// Clear enough to look up: little cloud and essentially dry.
pub fn is_good_weather(cloud_cover_pct: f64, precipitation_mm: f64) -> bool {
    cloud_cover_pct <= MAX_CLOUD_COVER_PCT && precipitation_mm <= MAX_PRECIPITATION_MM
}

/// The forecast hour closest to `target`, or `None` if none is within an hour.
pub fn weather_at_time(forecast: &Forecast, target: DateTime<Utc>) -> Option<WeatherReport> {
    let nearest = forecast
        .hours
        .iter()
        .min_by_key(|hour| (hour.time - target).num_seconds().abs())?;

    if (nearest.time - target).num_seconds().abs() > 3_600 {
        return None;
    }
    Some(WeatherReport::from(nearest))
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn hour(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, 0, 0).unwrap()
    }

    #[test]
    fn parses_hourly_columns() {
        let forecast = parse_forecast(fixtures::TWO_HOURS, 38.72, -9.14).unwrap();
        assert_eq!(forecast.hours.len(), 2);
        assert_eq!(forecast.hours[1].time, hour(1));
        assert_eq!(forecast.hours[1].cloud_cover_pct, 90.0);
        assert_eq!(forecast.hours[0].visibility_m, Some(24140.0));
    }

    #[test]
    fn good_weather_needs_both_conditions() {
        let forecast = parse_forecast(fixtures::TWO_HOURS, 38.72, -9.14).unwrap();
        assert!(weather_at_time(&forecast, hour(0)).unwrap().is_good_weather);
        assert!(!weather_at_time(&forecast, hour(1)).unwrap().is_good_weather);

        assert!(is_good_weather(30.0, 0.1));
        assert!(!is_good_weather(31.0, 0.0));
        assert!(!is_good_weather(0.0, 0.2));
    }

    #[test]
    fn nearest_hour_within_an_hour_only() {
        let forecast = parse_forecast(fixtures::TWO_HOURS, 38.72, -9.14).unwrap();

        let report = weather_at_time(&forecast, hour(0) + Duration::minutes(20)).unwrap();
        assert_eq!(report.time, hour(0));
        let report = weather_at_time(&forecast, hour(0) + Duration::minutes(40)).unwrap();
        assert_eq!(report.time, hour(1));

        assert!(weather_at_time(&forecast, hour(2)).is_some());
        assert!(weather_at_time(&forecast, hour(2) + Duration::minutes(1)).is_none());
        assert!(weather_at_time(&forecast, hour(0) - Duration::hours(3)).is_none());
    }

    #[test]
    fn drops_incomplete_hours_and_rejects_ragged_columns() {
        let partial = r#"{"hourly": {"time": ["2024-05-01T00:00", "2024-05-01T01:00"],
            "cloud_cover": [null, 20], "precipitation": [0.0, 0.0]}}"#;
        let forecast = parse_forecast(partial, 0.0, 0.0).unwrap();
        assert_eq!(forecast.hours.len(), 1);
        assert_eq!(forecast.hours[0].visibility_m, None);

        let ragged = r#"{"hourly": {"time": ["2024-05-01T00:00"], "cloud_cover": [], "precipitation": [0.0]}}"#;
        assert!(matches!(
            parse_forecast(ragged, 0.0, 0.0),
            Err(WeatherError::Malformed(_))
        ));
    }
}
