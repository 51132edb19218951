//! Hourly cloud and precipitation forecasts, and a go/no-go call for a viewing time.

mod error;
mod forecast;
mod service;

pub use error::WeatherError;
pub use forecast::{
    is_good_weather, parse_forecast, weather_at_time, Forecast, HourlyWeather, WeatherReport,
    MAX_CLOUD_COVER_PCT, MAX_PRECIPITATION_MM,
};
pub use service::{weather_for_pass, WeatherService, FORECAST_DAYS};
