use thiserror::Error;

use crate::fetch::FetchError;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("transmitter registry: {0}")]
    Fetch(#[from] FetchError),
    #[error("transmitter registry JSON: {0}")]
    Json(#[from] serde_json::Error),
}
