use std::cmp::Ordering;
use std::sync::Arc;

use crate::elements::{BulkTleStore, OrbitalElements};
use crate::fetch::Fetcher;

use super::curated::{curated, featured_rank, CuratedSatellite};
use super::error::CatalogError;
use super::transmitters::{parse_transmitters, primary, TransmitterIndex};
use super::types::{CatalogBuild, Category, Satellite, SatelliteStatus, Transmitter};

/// Merges the bulk element feed, the transmitter registry and curated metadata.
pub struct CatalogBuilder<F> {
    elements: Arc<BulkTleStore<F>>,
    fetcher: Arc<F>,
    transmitters_url: String,
}

impl<F: Fetcher> CatalogBuilder<F> {
    pub fn new(elements: Arc<BulkTleStore<F>>, fetcher: Arc<F>, transmitters_url: String) -> Self {
        Self {
            elements,
            fetcher,
            transmitters_url,
        }
    }

    /// Without elements there is no catalog; without transmitters the catalog
    /// falls back to curated metadata and defaults.
    pub async fn build(&self, force_refresh: bool) -> CatalogBuild {
        let outcome = self.elements.fetch(force_refresh).await;
        let warning = outcome.error().map(String::from);
        let Some(bulk) = outcome.into_data() else {
            log::error!("Catalog unavailable, no element sets: {:?}", warning);
            return CatalogBuild {
                satellites: Vec::new(),
                error: warning,
            };
        };

        let mut transmitters = match self.fetch_transmitters().await {
            Ok(index) => index,
            Err(e) => {
                log::warn!("Building catalog without transmitter data: {}", e);
                TransmitterIndex::new()
            }
        };

        let mut satellites: Vec<Satellite> = bulk
            .iter()
            .map(|(norad_id, elements)| {
                let records = transmitters.remove(norad_id).unwrap_or_default();
                merge_entry(*norad_id, elements.clone(), records)
            })
            .collect();
        sort_catalog(&mut satellites);

        log::info!("Catalog built with {} satellites", satellites.len());
        CatalogBuild {
            satellites,
            error: warning,
        }
    }

    async fn fetch_transmitters(&self) -> Result<TransmitterIndex, CatalogError> {
        let body = self.fetcher.get_text(&self.transmitters_url).await?;
        parse_transmitters(&body)
    }
}

/// Field by field: curated metadata first, then the primary transmitter, then defaults.
pub fn merge_entry(
    norad_id: u32,
    elements: OrbitalElements,
    transmitters: Vec<Transmitter>,
) -> Satellite {
    let primary = primary(&transmitters);
    let curated = curated(norad_id);
    let field = |pick: fn(&CuratedSatellite) -> Option<&'static str>,
                 fallback: fn(&Transmitter) -> Option<String>| {
        curated
            .and_then(pick)
            .map(String::from)
            .or_else(|| primary.and_then(fallback))
    };

    Satellite {
        id: curated.map_or_else(|| norad_id.to_string(), |c| c.slug.to_string()),
        name: curated.map_or_else(|| elements.display_name(), |c| c.name.to_string()),
        norad_id,
        category: curated
            .map(|c| c.category)
            .or_else(|| primary.map(Transmitter::category))
            .unwrap_or(Category::Other),
        uplink: field(|c| c.uplink, Transmitter::uplink),
        downlink: field(|c| c.downlink, Transmitter::downlink),
        mode: field(|c| c.mode, |t| t.mode.clone()),
        description: curated.and_then(|c| c.description).map(String::from),
        status: primary.map_or(SatelliteStatus::Unknown, Transmitter::satellite_status),
        elements: Some(elements),
        transmitters,
    }
}

/// Featured satellites first in their listed order, the rest by name.
pub fn sort_catalog(satellites: &mut [Satellite]) {
    satellites.sort_by(|a, b| {
        match (featured_rank(a.norad_id), featured_rank(b.norad_id)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.name.cmp(&b.name),
        }
    });
}

/// Case-insensitive match on name, id or catalog number. An empty query matches everything.
pub fn search_satellites<'a>(satellites: &'a [Satellite], query: &str) -> Vec<&'a Satellite> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return satellites.iter().collect();
    }
    satellites
        .iter()
        .filter(|s| {
            s.name.to_lowercase().contains(&query)
                || s.id.to_lowercase().contains(&query)
                || s.norad_id.to_string().contains(&query)
        })
        .collect()
}

pub fn satellite_by_norad_id(satellites: &[Satellite], norad_id: u32) -> Option<&Satellite> {
    satellites.iter().find(|s| s.norad_id == norad_id)
}

pub fn satellite_by_id<'a>(satellites: &'a [Satellite], id: &str) -> Option<&'a Satellite> {
    satellites.iter().find(|s| s.id.eq_ignore_ascii_case(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Cache;
    use crate::catalog::transmitters::fixtures::REGISTRY;
    use crate::elements::fixtures::lines_for;
    use crate::fetch::mock::MockFetcher;
    use std::time::Duration;

    const BULK_URL: &str = "https://tle.test/gp?GROUP=amateur";
    const TX_URL: &str = "https://registry.test/api/transmitters/";

    fn feed(entries: &[(u32, &str)]) -> String {
        entries
            .iter()
            .map(|(id, name)| {
                let (l1, l2) = lines_for(*id);
                format!("{}\n{}\n{}\n", name, l1, l2)
            })
            .collect()
    }

    fn builder(fetcher: &Arc<MockFetcher>) -> CatalogBuilder<MockFetcher> {
        let cache = Arc::new(Cache::memory());
        let store = BulkTleStore::new(
            fetcher.clone(),
            cache,
            BULK_URL.to_string(),
            Duration::from_secs(12 * 3600),
        );
        CatalogBuilder::new(Arc::new(store), fetcher.clone(), TX_URL.to_string())
    }

    fn standard_feed() -> String {
        feed(&[
            (40001, "ZEBRASAT"),
            (25544, "ISS (ZARYA)"),
            (40002, "ALPHASAT"),
            (43017, "FOX-1B"),
        ])
    }

    #[tokio::test]
    async fn curated_metadata_wins_over_transmitters() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher
            .respond("GROUP=amateur", &standard_feed())
            .respond("transmitters", REGISTRY);

        let build = builder(&fetcher).build(false).await;
        assert!(build.error.is_none());
        let iss = satellite_by_norad_id(&build.satellites, 25544).unwrap();

        assert_eq!(iss.id, "iss");
        assert_eq!(iss.category, Category::FmVoice);
        assert_eq!(iss.downlink.as_deref(), Some("145.800 MHz"));
        assert_eq!(iss.status, SatelliteStatus::Active);
        assert_eq!(iss.transmitters.len(), 1);
        assert_eq!(iss.elements.as_ref().unwrap().norad_id(), 25544);
    }

    #[test]
    fn unset_curated_fields_fall_back_to_the_transmitter() {
        let (l1, l2) = lines_for(25338);
        let elements = OrbitalElements::new(
            Some("NOAA 15".to_string()),
            &l1,
            &l2,
            chrono::Utc::now(),
        )
        .unwrap();
        let transmitter = Transmitter {
            uuid: "n15".to_string(),
            description: "APT".to_string(),
            alive: true,
            uplink_low: Some(435_100_000),
            uplink_high: None,
            downlink_low: Some(137_500_000),
            downlink_high: None,
            mode: Some("FM".to_string()),
            norad_cat_id: Some(25338),
            status: Some("active".to_string()),
        };

        let noaa = merge_entry(25338, elements, vec![transmitter]);

        assert_eq!(noaa.id, "noaa-15");
        assert_eq!(noaa.category, Category::Weather);
        assert_eq!(noaa.downlink.as_deref(), Some("137.620 MHz"));
        assert_eq!(noaa.mode.as_deref(), Some("APT"));
        // no curated uplink, so the transmitter's fills in
        assert_eq!(noaa.uplink.as_deref(), Some("435.100 MHz"));
        assert_eq!(noaa.status, SatelliteStatus::Active);
    }

    #[tokio::test]
    async fn uncurated_entries_fall_back_to_transmitter_then_defaults() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher
            .respond("GROUP=amateur", &standard_feed())
            .respond("transmitters", REGISTRY);

        let build = builder(&fetcher).build(false).await;

        let zebra = satellite_by_id(&build.satellites, "40001").unwrap();
        assert_eq!(zebra.name, "ZEBRASAT");
        assert_eq!(zebra.category, Category::FmVoice);
        assert_eq!(zebra.downlink.as_deref(), Some("145.900 MHz"));
        assert_eq!(zebra.mode.as_deref(), Some("FM"));

        let alpha = satellite_by_norad_id(&build.satellites, 40002).unwrap();
        assert_eq!(alpha.category, Category::Other);
        assert_eq!(alpha.status, SatelliteStatus::Unknown);
        assert!(alpha.downlink.is_none());
    }

    #[tokio::test]
    async fn featured_first_then_alphabetical() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher
            .respond("GROUP=amateur", &standard_feed())
            .respond("transmitters", REGISTRY);

        let build = builder(&fetcher).build(false).await;
        let order: Vec<u32> = build.satellites.iter().map(|s| s.norad_id).collect();
        assert_eq!(order, vec![25544, 43017, 40002, 40001]);
    }

    #[tokio::test]
    async fn registry_failure_is_not_fatal() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher
            .respond("GROUP=amateur", &standard_feed())
            .fail("transmitters", 502);

        let build = builder(&fetcher).build(false).await;
        assert_eq!(build.satellites.len(), 4);
        assert!(build.error.is_none());
        let iss = satellite_by_id(&build.satellites, "ISS").unwrap();
        assert_eq!(iss.category, Category::FmVoice);
        assert!(iss.transmitters.is_empty());
    }

    #[tokio::test]
    async fn no_elements_means_no_catalog() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond("transmitters", REGISTRY);

        let build = builder(&fetcher).build(false).await;
        assert!(build.satellites.is_empty());
        assert!(build.error.is_some());
    }

    #[tokio::test]
    async fn curated_satellite_missing_from_feed_is_absent() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher
            .respond("GROUP=amateur", &feed(&[(40002, "ALPHASAT")]))
            .respond("transmitters", REGISTRY);

        let build = builder(&fetcher).build(false).await;
        assert_eq!(build.satellites.len(), 1);
        assert!(satellite_by_id(&build.satellites, "iss").is_none());
    }

    #[tokio::test]
    async fn search_matches_name_slug_and_number() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher
            .respond("GROUP=amateur", &standard_feed())
            .respond("transmitters", REGISTRY);
        let build = builder(&fetcher).build(false).await;

        let ids = |q: &str| -> Vec<u32> {
            search_satellites(&build.satellites, q)
                .iter()
                .map(|s| s.norad_id)
                .collect()
        };
        assert_eq!(ids("iss"), vec![25544]);
        assert_eq!(ids("AO-91"), vec![43017]);
        assert_eq!(ids("4000"), vec![40002, 40001]);
        assert_eq!(ids("sat"), vec![40002, 40001]);
        assert_eq!(ids("  ").len(), 4);
        assert!(ids("voyager").is_empty());
    }
}
