//! Satellite catalog: bulk elements enriched with transmitter and curated metadata.

mod builder;
mod curated;
mod error;
mod transmitters;
mod types;

pub use builder::{
    merge_entry, satellite_by_id, satellite_by_norad_id, search_satellites, sort_catalog,
    CatalogBuilder,
};
pub use curated::{curated, CuratedSatellite, CURATED, FEATURED};
pub use error::CatalogError;
pub use transmitters::{format_frequency, parse_transmitters, primary, TransmitterIndex};
pub use types::{CatalogBuild, Category, Satellite, SatelliteStatus, Transmitter};
