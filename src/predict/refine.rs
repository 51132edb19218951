use chrono::Duration;

use crate::geometry::{Geometry, ObserverLocation};
use crate::predict::types::{Pass, PassMoment};

pub const REFINE_STEP_SECONDS: i64 = 10;

/// Resample a pass's trajectory at `step` across `[start_time, end_time]`.
/// The last sample always lands on or after `end_time`. Summary fields are kept.
pub fn refine_pass<G: Geometry + ?Sized>(
    geometry: &G,
    observer: &ObserverLocation,
    pass: &Pass,
    step: Duration,
) -> Pass {
    let step = if step > Duration::zero() {
        step
    } else {
        Duration::seconds(REFINE_STEP_SECONDS)
    };

    let mut trajectory = Vec::new();
    let mut cursor = pass.start_time;
    while cursor <= pass.end_time {
        if let Some(observation) = geometry.observe(observer, cursor) {
            trajectory.push(PassMoment::new(cursor, &observation));
        }
        cursor += step;
    }

    let undershoots = trajectory
        .last()
        .map_or(true, |last| last.timestamp < pass.end_time);
    if undershoots {
        if let Some(observation) = geometry.observe(observer, pass.end_time) {
            trajectory.push(PassMoment::new(pass.end_time, &observation));
        }
    }

    let mut refined = pass.clone();
    if trajectory.is_empty() {
        log::warn!(
            "No samples for pass starting {}, keeping coarse trajectory",
            pass.start_time
        );
    } else {
        refined.trajectory = trajectory;
    }
    refined
}
