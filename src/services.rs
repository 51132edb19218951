//! Stores and services wired together from one `Config`, shared by the CLI and the web API.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::abort::AbortFlag;
use crate::cache::Cache;
use crate::catalog::CatalogBuilder;
use crate::config::Config;
use crate::elements::{BulkTleStore, OrbitalElements, TleStore};
use crate::fetch::{FetchError, Fetcher, HttpFetcher};
use crate::geometry::{
    Geometry, GeometryError, LookAngles, ObserverLocation, SatellitePosition, Sgp4Geometry,
};
use crate::outcome::Outcome;
use crate::predict::{
    is_currently_overhead, next_pass, predict_passes_chunked, refine_pass, time_until_next_pass,
    Pass, PassFilter, PredictError, ScanOptions,
};
use crate::visibility::annotate_pass;
use crate::weather::WeatherService;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("no orbital elements for {norad_id}: {reason}")]
    NoElements { norad_id: u32, reason: String },
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Predict(#[from] PredictError),
    #[error("prediction task failed: {0}")]
    Task(String),
}

/// Predicted passes plus where the elements behind them came from.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PassReport {
    pub norad_id: u32,
    pub name: String,
    pub elements_epoch: Option<DateTime<Utc>>,
    pub elements_age_days: Option<f64>,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    pub passes: Vec<Pass>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OverheadStatus {
    pub norad_id: u32,
    pub time: DateTime<Utc>,
    pub overhead: bool,
    pub look: Option<LookAngles>,
    pub position: Option<SatellitePosition>,
    /// Zero while overhead; absent when nothing rises within the search horizon.
    pub seconds_until_next_pass: Option<i64>,
}

pub struct Services<F = HttpFetcher> {
    pub config: Config,
    pub cache: Arc<Cache>,
    pub elements: TleStore<F>,
    pub bulk: Arc<BulkTleStore<F>>,
    pub catalog: CatalogBuilder<F>,
    pub weather: WeatherService<F>,
}

impl Services<HttpFetcher> {
    pub fn from_config(config: Config) -> Result<Self, FetchError> {
        let fetcher = Arc::new(HttpFetcher::new(config.sources.timeout)?);
        let cache = Arc::new(Cache::from_config(&config.cache));
        Ok(Self::with_fetcher(config, fetcher, cache))
    }
}

impl<F: Fetcher + 'static> Services<F> {
    pub fn with_fetcher(config: Config, fetcher: Arc<F>, cache: Arc<Cache>) -> Self {
        let sources = &config.sources;
        let elements = TleStore::new(
            fetcher.clone(),
            cache.clone(),
            sources.elements_url.clone(),
            config.ttl.elements,
        );
        let bulk = Arc::new(BulkTleStore::new(
            fetcher.clone(),
            cache.clone(),
            sources.bulk_url.clone(),
            config.ttl.bulk,
        ));
        let catalog =
            CatalogBuilder::new(bulk.clone(), fetcher.clone(), sources.transmitters_url.clone());
        let weather = WeatherService::new(
            fetcher,
            cache.clone(),
            sources.weather_url.clone(),
            config.ttl.weather,
        );

        Self {
            config,
            cache,
            elements,
            bulk,
            catalog,
            weather,
        }
    }

    /// The configured station, if its coordinates parse.
    pub fn default_observer(&self) -> Option<ObserverLocation> {
        self.config.station.observer()
    }

    pub fn scan_options(&self, abort: Option<AbortFlag>) -> ScanOptions {
        let coarse_step = chrono::Duration::from_std(self.config.prediction.coarse_step)
            .unwrap_or_else(|_| ScanOptions::default().coarse_step);
        ScanOptions { coarse_step, abort }
    }

    /// Single-satellite elements, falling back to whatever bulk payload is cached.
    pub async fn elements_for(&self, norad_id: u32) -> Outcome<OrbitalElements> {
        match self.elements.fetch(norad_id, false).await {
            Outcome::Failed(error) => match self.bulk.lookup(norad_id) {
                Some(elements) => {
                    log::info!("Using bulk elements for {} ({})", norad_id, error);
                    Outcome::Stale {
                        data: elements,
                        error,
                    }
                }
                None => Outcome::Failed(error),
            },
            outcome => outcome,
        }
    }

    async fn geometry_for(
        &self,
        norad_id: u32,
    ) -> Result<(Outcome<OrbitalElements>, Sgp4Geometry), ServiceError> {
        let outcome = self.elements_for(norad_id).await;
        let geometry = match outcome.data() {
            Some(elements) => Sgp4Geometry::new(elements)?,
            None => {
                return Err(ServiceError::NoElements {
                    norad_id,
                    reason: outcome.error().unwrap_or_default().to_string(),
                })
            }
        };
        Ok((outcome, geometry))
    }

    /// Run a scan on the blocking pool with a fresh abort flag. Dropping the returned
    /// future raises the flag, so an abandoned request stops at the next step.
    async fn scan_blocking<T, S>(&self, scan: S) -> Result<T, ServiceError>
    where
        T: Send + 'static,
        S: FnOnce(ScanOptions) -> Result<T, PredictError> + Send + 'static,
    {
        let abort = AbortFlag::new();
        let _guard = abort.abort_on_drop();
        let options = self.scan_options(Some(abort));
        let result = tokio::task::spawn_blocking(move || scan(options))
            .await
            .map_err(|e| ServiceError::Task(e.to_string()))?;
        Ok(result?)
    }

    pub async fn next_pass(
        &self,
        norad_id: u32,
        observer: ObserverLocation,
        now: DateTime<Utc>,
        min_elevation_deg: Option<f64>,
    ) -> Result<Option<Pass>, ServiceError> {
        let (_, geometry) = self.geometry_for(norad_id).await?;
        self.scan_blocking(move |options| {
            let pass = next_pass(&geometry, &observer, now, min_elevation_deg, &options)?;
            Ok(pass.map(|p| annotate_pass(&geometry, &observer, p)))
        })
        .await
    }

    pub async fn overhead(
        &self,
        norad_id: u32,
        observer: ObserverLocation,
        now: DateTime<Utc>,
    ) -> Result<OverheadStatus, ServiceError> {
        let (_, geometry) = self.geometry_for(norad_id).await?;
        self.scan_blocking(move |options| {
            let observation = geometry.observe(&observer, now);
            let wait = time_until_next_pass(&geometry, &observer, now, &options)?;
            Ok(OverheadStatus {
                norad_id,
                time: now,
                overhead: is_currently_overhead(&geometry, &observer, now),
                look: observation.map(|o| o.look),
                position: observation.map(|o| o.position),
                seconds_until_next_pass: wait.map(|d| d.num_seconds()),
            })
        })
        .await
    }

    /// Predict, refine and annotate passes over `days` from `start`. The scan runs
    /// on the blocking pool.
    pub async fn passes(
        &self,
        norad_id: u32,
        observer: ObserverLocation,
        start: DateTime<Utc>,
        days: f64,
        filter: PassFilter,
    ) -> Result<PassReport, ServiceError> {
        let (outcome, geometry) = self.geometry_for(norad_id).await?;
        let cached = outcome.is_cached();
        let warning = outcome.error().map(String::from);
        let Some(elements) = outcome.into_data() else {
            return Err(ServiceError::NoElements {
                norad_id,
                reason: warning.unwrap_or_default(),
            });
        };

        let threads = self.config.prediction.threads;
        let refine_step = chrono::Duration::from_std(self.config.prediction.refine_step)
            .unwrap_or_else(|_| chrono::Duration::seconds(crate::predict::REFINE_STEP_SECONDS));

        let passes = self
            .scan_blocking(move |options| {
                let passes = predict_passes_chunked(
                    &geometry, &observer, start, days, &filter, &options, threads,
                )?;
                let mut annotated = Vec::with_capacity(passes.len());
                for pass in &passes {
                    if options.abort.as_ref().is_some_and(|flag| flag.is_aborted()) {
                        return Err(PredictError::Aborted);
                    }
                    let refined = refine_pass(&geometry, &observer, pass, refine_step);
                    annotated.push(annotate_pass(&geometry, &observer, refined));
                }
                Ok(annotated)
            })
            .await?;

        log::info!(
            "{} passes of {} over the next {} days",
            passes.len(),
            norad_id,
            days
        );

        Ok(PassReport {
            norad_id,
            name: elements.display_name(),
            elements_epoch: elements.epoch(),
            elements_age_days: elements.age_days(Utc::now()),
            cached,
            warning,
            passes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::fixtures::{iss_response, lines_for};
    use crate::fetch::mock::MockFetcher;
    use crate::predict::predict_passes;
    use crate::predict::testing::ArcGeometry;
    use chrono::TimeZone;

    fn services(fetcher: &Arc<MockFetcher>) -> Services<MockFetcher> {
        Services::with_fetcher(Config::default(), fetcher.clone(), Arc::new(Cache::memory()))
    }

    fn lisbon() -> ObserverLocation {
        ObserverLocation::new(38.72, -9.14)
    }

    #[tokio::test]
    async fn predicts_refined_annotated_passes() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond("CATNR=25544", &iss_response());
        let services = services(&fetcher);
        let start = Utc.with_ymd_and_hms(2008, 9, 20, 12, 0, 0).unwrap();

        let report = services
            .passes(25544, lisbon(), start, 1.0, PassFilter::default())
            .await
            .unwrap();

        assert_eq!(report.name, "ISS (ZARYA)");
        assert!(!report.cached);
        assert!(!report.passes.is_empty());
        for pass in &report.passes {
            assert!(pass.visible_duration_seconds.is_some());
            let last = pass.trajectory.last().unwrap();
            assert!(last.timestamp >= pass.end_time);
            for pair in pass.trajectory.windows(2) {
                assert!(pair[1].timestamp - pair[0].timestamp <= chrono::Duration::seconds(10));
            }
        }
    }

    #[tokio::test]
    async fn falls_back_to_cached_bulk_elements() {
        let fetcher = Arc::new(MockFetcher::new());
        let (l1, l2) = lines_for(43017);
        fetcher.respond("GROUP=amateur", &format!("FOX-1B\n{}\n{}\n", l1, l2));
        let services = services(&fetcher);
        services.bulk.fetch(false).await;

        let outcome = services.elements_for(43017).await;
        assert!(matches!(outcome, Outcome::Stale { ref data, .. } if data.norad_id() == 43017));

        let missing = services.elements_for(99999).await;
        assert!(matches!(missing, Outcome::Failed(_)));
    }

    #[tokio::test]
    async fn no_elements_is_an_error() {
        let fetcher = Arc::new(MockFetcher::new());
        let result = services(&fetcher)
            .passes(25544, lisbon(), Utc::now(), 1.0, PassFilter::default())
            .await;
        assert!(matches!(result, Err(ServiceError::NoElements { norad_id: 25544, .. })));
    }

    #[tokio::test]
    async fn dropped_scan_is_aborted() {
        let fetcher = Arc::new(MockFetcher::new());
        let services = services(&fetcher);
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let geometry = ArcGeometry::single(
            start,
            chrono::Duration::hours(1),
            chrono::Duration::minutes(10),
            40.0,
        );
        let (started_tx, started_rx) = tokio::sync::oneshot::channel();
        let (done_tx, done_rx) = std::sync::mpsc::channel();

        let scan = services.scan_blocking(move |options| {
            let _ = started_tx.send(());
            // far too many steps to finish unless the flag stops it
            let options = ScanOptions {
                coarse_step: chrono::Duration::milliseconds(1),
                ..options
            };
            let result = predict_passes(
                &geometry,
                &lisbon(),
                start,
                3650.0,
                &PassFilter::default(),
                &options,
            );
            let _ = done_tx.send(matches!(result, Err(PredictError::Aborted)));
            result
        });

        tokio::select! {
            _ = scan => panic!("scan finished while still awaited"),
            _ = started_rx => {}
        }

        let aborted = done_rx
            .recv_timeout(std::time::Duration::from_secs(30))
            .unwrap();
        assert!(aborted);
    }

    #[tokio::test]
    async fn overhead_and_next_pass_agree() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond("CATNR=25544", &iss_response());
        let services = services(&fetcher);
        let now = Utc.with_ymd_and_hms(2008, 9, 20, 12, 0, 0).unwrap();

        let next = services
            .next_pass(25544, lisbon(), now, None)
            .await
            .unwrap()
            .unwrap();
        let status = services.overhead(25544, lisbon(), now).await.unwrap();

        assert!(status.look.is_some());
        if status.overhead {
            assert_eq!(status.seconds_until_next_pass, Some(0));
        } else {
            assert_eq!(
                status.seconds_until_next_pass,
                Some((next.start_time - now).num_seconds())
            );
        }
    }
}
