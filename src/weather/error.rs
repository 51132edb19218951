use thiserror::Error;

use crate::fetch::FetchError;

#[derive(Debug, Error)]
pub enum WeatherError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("forecast JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed forecast: {0}")]
    Malformed(String),
}
