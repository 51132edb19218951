//! Pass prediction: horizon-crossing scan, trajectory refinement and "what's next" helpers.

mod error;
mod pass_finder;
mod refine;
mod types;
mod upcoming;

pub use error::PredictError;
pub use pass_finder::{predict_passes, predict_passes_chunked, ScanOptions, COARSE_STEP_SECONDS};
pub use refine::{refine_pass, REFINE_STEP_SECONDS};
pub use types::{Pass, PassFilter, PassMoment};
pub use upcoming::{is_currently_overhead, next_pass, time_until_next_pass, NEXT_PASS_SEARCH_DAYS};

#[cfg(test)]
pub(crate) use pass_finder::testing;
