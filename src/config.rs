use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::geometry::ObserverLocation;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub station: StationConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub ttl: TtlConfig,
    #[serde(default)]
    pub prediction: PredictionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationConfig {
    pub name: Option<String>,
    #[serde(default = "default_coordinates")]
    pub coordinates: String,
    #[serde(default)]
    pub altitude_m: f64,
}

impl Default for StationConfig {
    fn default() -> Self {
        Self {
            name: None,
            coordinates: default_coordinates(),
            altitude_m: 0.0,
        }
    }
}

fn default_coordinates() -> String {
    "38.72,-9.14".to_string()
}

impl StationConfig {
    pub fn observer(&self) -> Option<ObserverLocation> {
        let mut observer = ObserverLocation::from_coordinates(&self.coordinates)?;
        observer.altitude_m = Some(self.altitude_m);
        observer.name = self.name.clone();
        Some(observer)
    }
}

/// Where cache entries live. Without a directory the cache is process-local memory.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourcesConfig {
    /// `{norad_id}` is substituted with the catalog number.
    #[serde(default = "default_elements_url")]
    pub elements_url: String,
    #[serde(default = "default_bulk_url")]
    pub bulk_url: String,
    #[serde(default = "default_transmitters_url")]
    pub transmitters_url: String,
    #[serde(default = "default_weather_url")]
    pub weather_url: String,
    #[serde(default = "default_timeout", deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            elements_url: default_elements_url(),
            bulk_url: default_bulk_url(),
            transmitters_url: default_transmitters_url(),
            weather_url: default_weather_url(),
            timeout: default_timeout(),
        }
    }
}

fn default_elements_url() -> String {
    "https://celestrak.org/NORAD/elements/gp.php?CATNR={norad_id}&FORMAT=tle".to_string()
}

fn default_bulk_url() -> String {
    "https://celestrak.org/NORAD/elements/gp.php?GROUP=amateur&FORMAT=tle".to_string()
}

fn default_transmitters_url() -> String {
    "https://db.satnogs.org/api/transmitters/?format=json".to_string()
}

fn default_weather_url() -> String {
    "https://api.open-meteo.com/v1/forecast".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

#[derive(Debug, Clone, Deserialize)]
pub struct TtlConfig {
    #[serde(default = "default_elements_ttl", deserialize_with = "deserialize_duration")]
    pub elements: Duration,
    #[serde(default = "default_bulk_ttl", deserialize_with = "deserialize_duration")]
    pub bulk: Duration,
    #[serde(default = "default_weather_ttl", deserialize_with = "deserialize_duration")]
    pub weather: Duration,
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self {
            elements: default_elements_ttl(),
            bulk: default_bulk_ttl(),
            weather: default_weather_ttl(),
        }
    }
}

fn default_elements_ttl() -> Duration {
    Duration::from_secs(24 * 3600)
}

fn default_bulk_ttl() -> Duration {
    Duration::from_secs(12 * 3600)
}

fn default_weather_ttl() -> Duration {
    Duration::from_secs(30 * 60)
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictionConfig {
    #[serde(default = "default_coarse_step", deserialize_with = "deserialize_duration")]
    pub coarse_step: Duration,
    #[serde(default = "default_refine_step", deserialize_with = "deserialize_duration")]
    pub refine_step: Duration,
    #[serde(default = "default_days")]
    pub default_days: f64,
    #[serde(default)]
    pub min_elevation: f64,
    /// Worker threads for the chunked scan; 1 keeps the scan sequential.
    #[serde(default = "default_threads")]
    pub threads: usize,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            coarse_step: default_coarse_step(),
            refine_step: default_refine_step(),
            default_days: default_days(),
            min_elevation: 0.0,
            threads: default_threads(),
        }
    }
}

fn default_coarse_step() -> Duration {
    Duration::from_secs(60)
}

fn default_refine_step() -> Duration {
    Duration::from_secs(10)
}

fn default_days() -> f64 {
    7.0
}

fn default_threads() -> usize {
    1
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Config::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.ttl.elements, Duration::from_secs(86_400));
        assert_eq!(config.ttl.bulk, Duration::from_secs(43_200));
        assert_eq!(config.ttl.weather, Duration::from_secs(1_800));
        assert_eq!(config.prediction.coarse_step, Duration::from_secs(60));
        assert_eq!(config.web.bind, "0.0.0.0:8080");
    }

    #[test]
    fn parses_humantime_durations() {
        let yaml = r#"
station:
  name: Lisbon
  coordinates: "38.72, -9.14"
  altitude_m: 80
ttl:
  weather: 15m
prediction:
  coarse_step: 30s
  threads: 4
"#;
        let config = Config::from_str(yaml).unwrap();
        assert_eq!(config.ttl.weather, Duration::from_secs(900));
        assert_eq!(config.ttl.bulk, Duration::from_secs(43_200));
        assert_eq!(config.prediction.coarse_step, Duration::from_secs(30));
        assert_eq!(config.prediction.threads, 4);

        let observer = config.station.observer().unwrap();
        assert_eq!(observer.latitude_deg, 38.72);
        assert_eq!(observer.longitude_deg, -9.14);
        assert_eq!(observer.altitude_m, Some(80.0));
        assert_eq!(observer.name.as_deref(), Some("Lisbon"));
    }
}
