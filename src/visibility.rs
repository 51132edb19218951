//! Naked-eye visibility: observer in darkness, satellite sunlit and above the horizon.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::geometry::{Geometry, ObserverLocation};
use crate::predict::{Pass, PassMoment};
use crate::solar::{is_satellite_sunlit, sun_position, CIVIL_TWILIGHT_DEG};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct VisibilityConditions {
    pub observer_in_darkness: bool,
    pub satellite_sunlit: bool,
    pub satellite_above_horizon: bool,
    pub is_visible: bool,
}

/// A contiguous stretch of a pass during which the satellite can be seen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct VisibilityWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_seconds: i64,
}

impl VisibilityWindow {
    fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            duration_seconds: (end - start).num_seconds(),
        }
    }
}

/// A satellite the geometry cannot place at `time` counts as not sunlit.
pub fn calculate_visibility<G: Geometry + ?Sized>(
    geometry: &G,
    observer: &ObserverLocation,
    time: DateTime<Utc>,
    satellite_elevation_deg: f64,
) -> VisibilityConditions {
    let observer_in_darkness = sun_position(observer, time).elevation_deg < CIVIL_TWILIGHT_DEG;
    let satellite_sunlit = geometry
        .observe(observer, time)
        .is_some_and(|obs| is_satellite_sunlit(obs.eci_km, time));
    let satellite_above_horizon = satellite_elevation_deg > 0.0;

    VisibilityConditions {
        observer_in_darkness,
        satellite_sunlit,
        satellite_above_horizon,
        is_visible: observer_in_darkness && satellite_sunlit && satellite_above_horizon,
    }
}

fn moment_visible<G: Geometry + ?Sized>(
    geometry: &G,
    observer: &ObserverLocation,
    moment: &PassMoment,
) -> bool {
    calculate_visibility(geometry, observer, moment.timestamp, moment.look.elevation_deg).is_visible
}

/// Quick check on a handful of instants: start, peak, end and, for longer
/// trajectories, the middle sample.
pub fn is_pass_visible<G: Geometry + ?Sized>(
    geometry: &G,
    observer: &ObserverLocation,
    pass: &Pass,
) -> bool {
    let trajectory = &pass.trajectory;
    let (Some(first), Some(last)) = (trajectory.first(), trajectory.last()) else {
        return false;
    };

    let mut samples = vec![
        (first.timestamp, first.look.elevation_deg),
        (pass.max_elevation_time, pass.max_elevation_deg),
        (last.timestamp, last.look.elevation_deg),
    ];
    if trajectory.len() > 6 {
        let mid = &trajectory[trajectory.len() / 2];
        samples.push((mid.timestamp, mid.look.elevation_deg));
    }

    samples.into_iter().any(|(time, elevation)| {
        calculate_visibility(geometry, observer, time, elevation).is_visible
    })
}

/// Scan the full trajectory for visible stretches. A window ends at the first
/// sample that is no longer visible, or at the last sample.
pub fn visibility_windows<G: Geometry + ?Sized>(
    geometry: &G,
    observer: &ObserverLocation,
    pass: &Pass,
) -> Vec<VisibilityWindow> {
    let mut windows = Vec::new();
    let mut open: Option<DateTime<Utc>> = None;

    for moment in &pass.trajectory {
        let visible = moment_visible(geometry, observer, moment);
        match (visible, open) {
            (true, None) => open = Some(moment.timestamp),
            (false, Some(start)) => {
                windows.push(VisibilityWindow::new(start, moment.timestamp));
                open = None;
            }
            _ => {}
        }
    }

    if let (Some(start), Some(last)) = (open, pass.trajectory.last()) {
        windows.push(VisibilityWindow::new(start, last.timestamp));
    }
    windows
}

/// Highest visible sample, earliest on ties.
pub fn best_viewing_time<G: Geometry + ?Sized>(
    geometry: &G,
    observer: &ObserverLocation,
    pass: &Pass,
) -> Option<DateTime<Utc>> {
    let mut best: Option<&PassMoment> = None;
    for moment in &pass.trajectory {
        if !moment_visible(geometry, observer, moment) {
            continue;
        }
        if best.map_or(true, |b| moment.look.elevation_deg > b.look.elevation_deg) {
            best = Some(moment);
        }
    }
    best.map(|m| m.timestamp)
}

pub fn visible_duration(windows: &[VisibilityWindow]) -> i64 {
    windows.iter().map(|w| w.duration_seconds).sum()
}

/// Fill in the visibility fields of a pass.
pub fn annotate_pass<G: Geometry + ?Sized>(
    geometry: &G,
    observer: &ObserverLocation,
    mut pass: Pass,
) -> Pass {
    let windows = visibility_windows(geometry, observer, &pass);
    pass.is_visible = is_pass_visible(geometry, observer, &pass);
    pass.visible_duration_seconds = Some(visible_duration(&windows));
    pass.best_viewing_time = best_viewing_time(geometry, observer, &pass);
    pass.visibility_windows = windows;
    pass
}
