use chrono::{DateTime, Duration, Utc};

use crate::abort::AbortFlag;
use crate::geometry::{Geometry, Observation, ObserverLocation};
use crate::predict::error::PredictError;
use crate::predict::types::{Pass, PassFilter, PassMoment};

pub const COARSE_STEP_SECONDS: i64 = 60;
const HORIZON_ELEVATION: f64 = 0.0;

#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Passes shorter than this can fall between two samples and go unseen.
    pub coarse_step: Duration,
    pub abort: Option<AbortFlag>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            coarse_step: Duration::seconds(COARSE_STEP_SECONDS),
            abort: None,
        }
    }
}

impl ScanOptions {
    fn check_abort(&self) -> Result<(), PredictError> {
        match &self.abort {
            Some(flag) if flag.is_aborted() => Err(PredictError::Aborted),
            _ => Ok(()),
        }
    }
}

/// Horizon-crossing state carried from one sample to the next.
struct PassTracker {
    was_above: bool,
    pass_start: Option<DateTime<Utc>>,
    trajectory: Vec<PassMoment>,
}

impl PassTracker {
    fn new(was_above: bool) -> Self {
        Self {
            was_above,
            pass_start: None,
            trajectory: Vec::new(),
        }
    }

    fn in_progress(&self) -> bool {
        self.pass_start.is_some()
    }

    /// Feed one sample; returns a pass when a falling edge closes one.
    fn step(
        &mut self,
        time: DateTime<Utc>,
        observation: &Observation,
    ) -> Result<Option<Pass>, PredictError> {
        let above = observation.look.elevation_deg > HORIZON_ELEVATION;
        let mut closed = None;

        if above && !self.was_above {
            self.pass_start = Some(time);
            self.trajectory.clear();
        }

        if above && self.in_progress() {
            self.trajectory.push(PassMoment::new(time, observation));
        }

        if !above && self.was_above {
            if let Some(start) = self.pass_start.take() {
                if !self.trajectory.is_empty() {
                    let trajectory = std::mem::take(&mut self.trajectory);
                    closed = Some(Pass::from_trajectory(start, time, trajectory)?);
                }
            }
        }

        self.was_above = above;
        Ok(closed)
    }

    /// Close a pass still above the horizon when the window runs out.
    fn finish(&mut self) -> Result<Option<Pass>, PredictError> {
        let Some(start) = self.pass_start.take() else {
            return Ok(None);
        };
        let Some(last) = self.trajectory.last() else {
            return Ok(None);
        };
        let end = last.timestamp;
        let trajectory = std::mem::take(&mut self.trajectory);
        Pass::from_trajectory(start, end, trajectory).map(Some)
    }
}

fn window_end(start: DateTime<Utc>, duration_days: f64) -> Result<DateTime<Utc>, PredictError> {
    if !duration_days.is_finite() || duration_days <= 0.0 {
        return Err(PredictError::InvalidWindow(format!(
            "duration must be positive, got {} days",
            duration_days
        )));
    }
    // the cast saturates, so huge spans fail the checked add below
    let span_ms = (duration_days * 86_400_000.0).round() as i64;
    Duration::try_milliseconds(span_ms)
        .and_then(|span| start.checked_add_signed(span))
        .ok_or_else(|| {
            PredictError::InvalidWindow(format!(
                "duration of {} days is out of range",
                duration_days
            ))
        })
}

fn validate_step(step: Duration) -> Result<(), PredictError> {
    if step <= Duration::zero() {
        return Err(PredictError::InvalidWindow(format!(
            "step must be positive, got {}",
            step
        )));
    }
    Ok(())
}

/// Find passes by stepping through `[start, start + duration_days)` and watching
/// for horizon crossings. Steps where propagation fails are skipped.
pub fn predict_passes<G: Geometry + ?Sized>(
    geometry: &G,
    observer: &ObserverLocation,
    start: DateTime<Utc>,
    duration_days: f64,
    filter: &PassFilter,
    options: &ScanOptions,
) -> Result<Vec<Pass>, PredictError> {
    let end = window_end(start, duration_days)?;
    validate_step(options.coarse_step)?;

    let mut passes = Vec::new();
    if filter.is_full(0) {
        return Ok(passes);
    }

    let mut tracker = PassTracker::new(false);
    let mut cursor = start;

    while cursor < end && !filter.is_full(passes.len()) {
        options.check_abort()?;

        if let Some(observation) = geometry.observe(observer, cursor) {
            if let Some(pass) = tracker.step(cursor, &observation)? {
                if filter.accepts(&pass) {
                    passes.push(pass);
                }
            }
        }

        cursor += options.coarse_step;
    }

    if !filter.is_full(passes.len()) {
        if let Some(pass) = tracker.finish()? {
            if filter.accepts(&pass) {
                passes.push(pass);
            }
        }
    }

    if let Some(max) = filter.max_results {
        passes.truncate(max);
    }
    Ok(passes)
}

/// Same result as `predict_passes`, with the window split into grid-aligned chunks
/// scanned on `threads` scoped threads. A chunk seeds its horizon state from the
/// last sample before it and follows an unfinished pass past its own end.
pub fn predict_passes_chunked<G: Geometry + ?Sized>(
    geometry: &G,
    observer: &ObserverLocation,
    start: DateTime<Utc>,
    duration_days: f64,
    filter: &PassFilter,
    options: &ScanOptions,
    threads: usize,
) -> Result<Vec<Pass>, PredictError> {
    if threads <= 1 {
        return predict_passes(geometry, observer, start, duration_days, filter, options);
    }

    let end = window_end(start, duration_days)?;
    validate_step(options.coarse_step)?;
    if filter.is_full(0) {
        return Ok(Vec::new());
    }

    let step_ms = options.coarse_step.num_milliseconds().max(1);
    let span_ms = (end - start).num_milliseconds();
    let total_steps = ((span_ms + step_ms - 1) / step_ms) as usize;
    let per_chunk = total_steps.div_ceil(threads).max(1);

    let scan = ChunkScan {
        geometry,
        observer,
        start,
        step: options.coarse_step,
        total_steps,
        filter,
        options,
    };

    let chunks: Vec<Result<Vec<Pass>, PredictError>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..total_steps)
            .step_by(per_chunk)
            .map(|first| {
                let last = (first + per_chunk).min(total_steps);
                let scan = &scan;
                scope.spawn(move || scan.run(first, last))
            })
            .collect();

        handles
            .into_iter()
            .map(|handle| match handle.join() {
                Ok(result) => result,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });

    let mut passes = Vec::new();
    for chunk in chunks {
        passes.extend(chunk?);
    }
    if let Some(max) = filter.max_results {
        passes.truncate(max);
    }
    log::debug!(
        "Chunked scan over {} steps on {} threads found {} passes",
        total_steps,
        threads,
        passes.len()
    );
    Ok(passes)
}

struct ChunkScan<'a, G: ?Sized> {
    geometry: &'a G,
    observer: &'a ObserverLocation,
    start: DateTime<Utc>,
    step: Duration,
    total_steps: usize,
    filter: &'a PassFilter,
    options: &'a ScanOptions,
}

impl<G: Geometry + ?Sized> ChunkScan<'_, G> {
    fn time_at(&self, index: usize) -> DateTime<Utc> {
        self.start + self.step * index as i32
    }

    fn observe(&self, index: usize) -> Option<Observation> {
        self.geometry.observe(self.observer, self.time_at(index))
    }

    /// Horizon state the sequential scan would hold entering step `index`.
    fn seed(&self, index: usize) -> bool {
        (0..index)
            .rev()
            .find_map(|i| self.observe(i))
            .is_some_and(|obs| obs.look.elevation_deg > HORIZON_ELEVATION)
    }

    fn run(&self, first: usize, last: usize) -> Result<Vec<Pass>, PredictError> {
        let mut tracker = PassTracker::new(self.seed(first));
        let mut passes = Vec::new();

        let mut index = first;
        while index < self.total_steps && (index < last || tracker.in_progress()) {
            self.options.check_abort()?;

            if let Some(observation) = self.observe(index) {
                if let Some(pass) = tracker.step(self.time_at(index), &observation)? {
                    if self.filter.accepts(&pass) {
                        passes.push(pass);
                    }
                }
            }
            index += 1;
        }

        if index >= self.total_steps {
            if let Some(pass) = tracker.finish()? {
                if self.filter.accepts(&pass) {
                    passes.push(pass);
                }
            }
        }
        Ok(passes)
    }
}
