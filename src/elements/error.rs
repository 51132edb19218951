use thiserror::Error;

use crate::fetch::FetchError;

/// Structural problems with a two-line element set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TleError {
    #[error("expected 2 or 3 lines, got {0}")]
    LineCount(usize),
    #[error("line {line} is {len} characters long, expected 69")]
    Length { line: u8, len: usize },
    #[error("line {line} does not start with \"{line} \"")]
    Prefix { line: u8 },
    #[error("line {line} checksum mismatch: computed {computed}, found {found}")]
    Checksum { line: u8, computed: u32, found: char },
    #[error("invalid catalog number {0:?}")]
    CatalogNumber(String),
}

#[derive(Debug, Error)]
pub enum ElementsError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("invalid elements: {0}")]
    Parse(#[from] TleError),
    #[error("requested catalog number {requested}, provider returned {returned}")]
    CatalogMismatch { requested: u32, returned: u32 },
    #[error("bulk feed contained no valid element sets")]
    EmptyFeed,
}
