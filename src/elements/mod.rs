mod bulk;
mod error;
mod store;
mod tle;

pub use bulk::BulkTleStore;
pub use error::{ElementsError, TleError};
pub use store::TleStore;
pub use tle::{
    checksum, parse_bulk, parse_tle_response, validate_checksum, BulkElements, OrbitalElements,
    TLE_LINE_LENGTH,
};

#[cfg(test)]
pub(crate) use tle::fixtures;
