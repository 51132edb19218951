use chrono::{DateTime, Duration, Utc};

use crate::geometry::{Geometry, ObserverLocation};
use crate::predict::error::PredictError;
use crate::predict::pass_finder::{predict_passes, ScanOptions};
use crate::predict::types::{Pass, PassFilter};

/// How far ahead `next_pass` looks.
pub const NEXT_PASS_SEARCH_DAYS: f64 = 2.0;

/// The first pass starting from `now` within the next two days.
pub fn next_pass<G: Geometry + ?Sized>(
    geometry: &G,
    observer: &ObserverLocation,
    now: DateTime<Utc>,
    min_elevation_deg: Option<f64>,
    options: &ScanOptions,
) -> Result<Option<Pass>, PredictError> {
    let filter = PassFilter {
        min_elevation_deg,
        max_results: Some(1),
    };
    let passes = predict_passes(geometry, observer, now, NEXT_PASS_SEARCH_DAYS, &filter, options)?;
    Ok(passes.into_iter().next())
}

pub fn is_currently_overhead<G: Geometry + ?Sized>(
    geometry: &G,
    observer: &ObserverLocation,
    now: DateTime<Utc>,
) -> bool {
    geometry
        .observe(observer, now)
        .is_some_and(|obs| obs.look.elevation_deg > 0.0)
}

/// Zero while the satellite is up; `None` if nothing rises within the search horizon.
pub fn time_until_next_pass<G: Geometry + ?Sized>(
    geometry: &G,
    observer: &ObserverLocation,
    now: DateTime<Utc>,
    options: &ScanOptions,
) -> Result<Option<Duration>, PredictError> {
    if is_currently_overhead(geometry, observer, now) {
        return Ok(Some(Duration::zero()));
    }
    let next = next_pass(geometry, observer, now, None, options)?;
    Ok(next.map(|pass| pass.start_time - now))
}
