use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::elements::OrbitalElements;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, strum_macros::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    FmVoice,
    Linear,
    Digital,
    Weather,
    Other,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SatelliteStatus {
    Active,
    Inactive,
    Unknown,
}

/// One record from the transmitter registry. Frequencies are in Hz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Transmitter {
    pub uuid: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub alive: bool,
    pub uplink_low: Option<u64>,
    pub uplink_high: Option<u64>,
    pub downlink_low: Option<u64>,
    pub downlink_high: Option<u64>,
    pub mode: Option<String>,
    pub norad_cat_id: Option<u32>,
    pub status: Option<String>,
}

/// A catalog entry: metadata merged from the curated table, the transmitter
/// registry and the bulk element feed.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Satellite {
    /// Curated slug, or the catalog number.
    pub id: String,
    pub name: String,
    pub norad_id: u32,
    pub category: Category,
    pub uplink: Option<String>,
    pub downlink: Option<String>,
    pub mode: Option<String>,
    pub description: Option<String>,
    pub status: SatelliteStatus,
    pub elements: Option<OrbitalElements>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transmitters: Vec<Transmitter>,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct CatalogBuild {
    pub satellites: Vec<Satellite>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
