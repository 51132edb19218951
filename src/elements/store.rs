use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::cache::{Cache, CacheEntry, CacheKey, Namespace};
use crate::fetch::Fetcher;
use crate::outcome::Outcome;

use super::error::ElementsError;
use super::tle::{parse_tle_response, OrbitalElements};

/// Orbital elements for one satellite at a time, cached per catalog number.
pub struct TleStore<F> {
    fetcher: Arc<F>,
    cache: Arc<Cache>,
    url_template: String,
    ttl: Duration,
}

impl<F: Fetcher> TleStore<F> {
    /// `url_template` contains `{norad_id}`.
    pub fn new(fetcher: Arc<F>, cache: Arc<Cache>, url_template: String, ttl: Duration) -> Self {
        Self {
            fetcher,
            cache,
            url_template,
            ttl,
        }
    }

    pub fn cache_key(norad_id: u32) -> CacheKey {
        CacheKey::new(Namespace::Elements, norad_id.to_string())
    }

    pub async fn fetch(&self, norad_id: u32, force_refresh: bool) -> Outcome<OrbitalElements> {
        let key = Self::cache_key(norad_id);
        let _guard = self.cache.lock(&key).await;

        if !force_refresh {
            if let Some(entry) = self.cache.get_fresh(&key, self.ttl, Utc::now()) {
                log::debug!("Elements for {} served from cache", norad_id);
                return Outcome::Cached(entry.data);
            }
        }

        match self.download(norad_id).await {
            Ok(elements) => {
                let entry = CacheEntry::new(elements.clone(), elements.fetched_at);
                if let Err(e) = self.cache.put(&key, &entry) {
                    log::warn!("Could not cache elements for {}: {}", norad_id, e);
                }
                Outcome::Fresh(elements)
            }
            Err(e) => {
                log::warn!("Elements fetch for {} failed: {}", norad_id, e);
                match self.cache.get::<OrbitalElements>(&key) {
                    Some(entry) => Outcome::Stale {
                        data: entry.data,
                        error: e.to_string(),
                    },
                    None => Outcome::Failed(e.to_string()),
                }
            }
        }
    }

    async fn download(&self, norad_id: u32) -> Result<OrbitalElements, ElementsError> {
        let url = self
            .url_template
            .replace("{norad_id}", &norad_id.to_string());
        let body = self.fetcher.get_text(&url).await?;
        let elements = parse_tle_response(&body, Utc::now())?;

        let returned = elements.norad_id();
        if returned != norad_id {
            return Err(ElementsError::CatalogMismatch {
                requested: norad_id,
                returned,
            });
        }
        Ok(elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::tle::fixtures::*;
    use crate::fetch::mock::MockFetcher;

    const URL: &str = "https://tle.test/gp?CATNR={norad_id}";
    const DAY: Duration = Duration::from_secs(86_400);

    fn store(fetcher: &Arc<MockFetcher>, cache: &Arc<Cache>) -> TleStore<MockFetcher> {
        TleStore::new(fetcher.clone(), cache.clone(), URL.to_string(), DAY)
    }

    fn seed(cache: &Cache, age: chrono::Duration) -> OrbitalElements {
        let fetched_at = Utc::now() - age;
        let elements = parse_tle_response(&iss_response(), fetched_at).unwrap();
        cache
            .put(
                &TleStore::<MockFetcher>::cache_key(25544),
                &CacheEntry::new(elements.clone(), fetched_at),
            )
            .unwrap();
        elements
    }

    #[tokio::test]
    async fn miss_fetches_and_caches() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond("CATNR=25544", &iss_response());
        let cache = Arc::new(Cache::memory());
        let store = store(&fetcher, &cache);

        let first = store.fetch(25544, false).await;
        assert!(matches!(first, Outcome::Fresh(_)));
        let second = store.fetch(25544, false).await;
        assert!(matches!(second, Outcome::Cached(_)));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn force_refresh_bypasses_valid_cache() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond("CATNR=25544", &iss_response());
        let cache = Arc::new(Cache::memory());
        let old = seed(&cache, chrono::Duration::hours(1));

        let outcome = store(&fetcher, &cache).fetch(25544, true).await;
        let fresh = outcome.into_data().unwrap();
        assert_eq!(fetcher.calls(), 1);
        assert!(fresh.fetched_at > old.fetched_at);

        let cached = cache
            .get::<OrbitalElements>(&TleStore::<MockFetcher>::cache_key(25544))
            .unwrap();
        assert_eq!(cached.data.fetched_at, fresh.fetched_at);
    }

    #[tokio::test]
    async fn network_failure_falls_back_to_expired_cache() {
        let fetcher = Arc::new(MockFetcher::new());
        let cache = Arc::new(Cache::memory());
        let old = seed(&cache, chrono::Duration::days(3));

        let outcome = store(&fetcher, &cache).fetch(25544, false).await;
        assert!(outcome.is_cached());
        assert!(!outcome.error().unwrap().is_empty());
        assert_eq!(outcome.data(), Some(&old));
    }

    #[tokio::test]
    async fn network_failure_without_cache_returns_no_data() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.fail("CATNR", 503);
        let cache = Arc::new(Cache::memory());

        let outcome = store(&fetcher, &cache).fetch(25544, false).await;
        assert!(outcome.data().is_none());
        assert!(outcome.error().unwrap().contains("503"));
    }

    #[tokio::test]
    async fn checksum_failure_keeps_existing_cache() {
        let fetcher = Arc::new(MockFetcher::new());
        let corrupt = format!("ISS\n{}\n{}0\n", ISS_LINE1, &ISS_LINE2[..68]);
        fetcher.respond("CATNR=25544", &corrupt);
        let cache = Arc::new(Cache::memory());
        let old = seed(&cache, chrono::Duration::days(2));

        let outcome = store(&fetcher, &cache).fetch(25544, false).await;
        assert!(outcome.error().unwrap().contains("checksum"));
        assert_eq!(outcome.data(), Some(&old));

        let cached = cache
            .get::<OrbitalElements>(&TleStore::<MockFetcher>::cache_key(25544))
            .unwrap();
        assert_eq!(cached.data, old);
    }

    #[tokio::test]
    async fn rejects_elements_for_a_different_object() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond("CATNR=43017", &iss_response());
        let cache = Arc::new(Cache::memory());

        let outcome = store(&fetcher, &cache).fetch(43017, false).await;
        assert!(matches!(outcome, Outcome::Failed(ref e) if e.contains("25544")));
    }
}
