use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::cache::{Cache, CacheEntry, CacheKey, Namespace};
use crate::fetch::Fetcher;
use crate::geometry::ObserverLocation;
use crate::outcome::Outcome;
use crate::predict::Pass;

use super::error::WeatherError;
use super::forecast::{parse_forecast, weather_at_time, Forecast, WeatherReport};

pub const FORECAST_DAYS: u32 = 7;

/// Hourly forecasts cached per location bucket (coordinates rounded to 0.01 degree).
pub struct WeatherService<F> {
    fetcher: Arc<F>,
    cache: Arc<Cache>,
    base_url: String,
    ttl: Duration,
}

impl<F: Fetcher> WeatherService<F> {
    pub fn new(fetcher: Arc<F>, cache: Arc<Cache>, base_url: String, ttl: Duration) -> Self {
        Self {
            fetcher,
            cache,
            base_url,
            ttl,
        }
    }

    pub fn cache_key(location: &ObserverLocation) -> CacheKey {
        let (latitude, longitude) = bucket(location);
        CacheKey::new(
            Namespace::Weather,
            format!("{:.2},{:.2}", latitude, longitude),
        )
    }

    pub async fn fetch_forecast(&self, location: &ObserverLocation) -> Outcome<Forecast> {
        let key = Self::cache_key(location);
        let _guard = self.cache.lock(&key).await;

        if let Some(entry) = self.cache.get_fresh(&key, self.ttl, Utc::now()) {
            log::debug!("Forecast for {} served from cache", key);
            return Outcome::Cached(entry.data);
        }

        match self.download(location).await {
            Ok(forecast) => {
                if let Err(e) = self.cache.put(&key, &CacheEntry::new(forecast.clone(), Utc::now())) {
                    log::warn!("Could not cache forecast for {}: {}", key, e);
                }
                Outcome::Fresh(forecast)
            }
            Err(e) => {
                log::warn!("Forecast fetch for {} failed: {}", key, e);
                match self.cache.get::<Forecast>(&key) {
                    Some(entry) => Outcome::Stale {
                        data: entry.data,
                        error: e.to_string(),
                    },
                    None => Outcome::Failed(e.to_string()),
                }
            }
        }
    }

    async fn download(&self, location: &ObserverLocation) -> Result<Forecast, WeatherError> {
        let (latitude, longitude) = bucket(location);
        let url = format!(
            "{}?latitude={:.2}&longitude={:.2}&hourly=cloud_cover,precipitation,visibility&forecast_days={}&timezone=UTC",
            self.base_url, latitude, longitude, FORECAST_DAYS
        );
        let body = self.fetcher.get_text(&url).await?;
        parse_forecast(&body, latitude, longitude)
    }
}

fn bucket(location: &ObserverLocation) -> (f64, f64) {
    let round = |v: f64| (v * 100.0).round() / 100.0;
    (round(location.latitude_deg), round(location.longitude_deg))
}

/// Weather at the pass's highest point.
pub fn weather_for_pass(forecast: &Forecast, pass: &Pass) -> Option<WeatherReport> {
    weather_at_time(forecast, pass.max_elevation_time)
}
