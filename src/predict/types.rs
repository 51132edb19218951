use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::geometry::{LookAngles, Observation, SatellitePosition};
use crate::predict::error::PredictError;
use crate::visibility::VisibilityWindow;

/// One trajectory sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PassMoment {
    pub timestamp: DateTime<Utc>,
    pub position: SatellitePosition,
    pub look: LookAngles,
}

impl PassMoment {
    pub fn new(timestamp: DateTime<Utc>, observation: &Observation) -> Self {
        Self {
            timestamp,
            position: observation.position,
            look: observation.look,
        }
    }
}

/// A predicted pass from AOS to LOS.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Pass {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub max_elevation_deg: f64,
    pub max_elevation_time: DateTime<Utc>,
    pub start_azimuth_deg: f64,
    pub max_azimuth_deg: f64,
    pub end_azimuth_deg: f64,
    pub duration_seconds: i64,
    pub is_visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible_duration_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_viewing_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub visibility_windows: Vec<VisibilityWindow>,
    pub trajectory: Vec<PassMoment>,
}

impl Pass {
    /// Summarise a collected trajectory. The maximum is the first sample reaching it.
    pub fn from_trajectory(
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        trajectory: Vec<PassMoment>,
    ) -> Result<Self, PredictError> {
        let first = trajectory.first().ok_or(PredictError::EmptyTrajectory)?;
        let last = trajectory.last().ok_or(PredictError::EmptyTrajectory)?;

        let mut peak = first;
        for moment in &trajectory {
            if moment.look.elevation_deg > peak.look.elevation_deg {
                peak = moment;
            }
        }

        Ok(Pass {
            start_time,
            end_time,
            max_elevation_deg: peak.look.elevation_deg,
            max_elevation_time: peak.timestamp,
            start_azimuth_deg: first.look.azimuth_deg,
            max_azimuth_deg: peak.look.azimuth_deg,
            end_azimuth_deg: last.look.azimuth_deg,
            duration_seconds: (end_time - start_time).num_seconds(),
            is_visible: false,
            visible_duration_seconds: None,
            best_viewing_time: None,
            visibility_windows: Vec::new(),
            trajectory,
        })
    }

    pub fn overlaps(&self, other: &Pass) -> bool {
        self.start_time < other.end_time && other.start_time < self.end_time
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
pub struct PassFilter {
    pub min_elevation_deg: Option<f64>,
    pub max_results: Option<usize>,
}

impl PassFilter {
    pub fn accepts(&self, pass: &Pass) -> bool {
        self.min_elevation_deg
            .map_or(true, |min| pass.max_elevation_deg >= min)
    }

    pub fn is_full(&self, count: usize) -> bool {
        self.max_results.is_some_and(|max| count >= max)
    }
}
