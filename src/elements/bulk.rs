use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::cache::{Cache, CacheEntry, CacheKey, Namespace};
use crate::fetch::Fetcher;
use crate::outcome::Outcome;

use super::error::ElementsError;
use super::tle::{parse_bulk, BulkElements, OrbitalElements};

const BULK_ID: &str = "bulk";

/// Element sets for a whole group feed, fetched in one round trip.
pub struct BulkTleStore<F> {
    fetcher: Arc<F>,
    cache: Arc<Cache>,
    url: String,
    ttl: Duration,
}

impl<F: Fetcher> BulkTleStore<F> {
    pub fn new(fetcher: Arc<F>, cache: Arc<Cache>, url: String, ttl: Duration) -> Self {
        Self {
            fetcher,
            cache,
            url,
            ttl,
        }
    }

    pub fn cache_key() -> CacheKey {
        CacheKey::new(Namespace::Catalog, BULK_ID)
    }

    pub async fn fetch(&self, force_refresh: bool) -> Outcome<BulkElements> {
        let key = Self::cache_key();
        let _guard = self.cache.lock(&key).await;

        if !force_refresh {
            if let Some(entry) = self.cache.get_fresh(&key, self.ttl, Utc::now()) {
                return Outcome::Cached(entry.data);
            }
        }

        match self.download().await {
            Ok(bulk) => {
                log::info!("Fetched {} element sets from bulk feed", bulk.len());
                self.store(&key, &bulk);
                Outcome::Fresh(bulk)
            }
            Err(e) => {
                log::warn!("Bulk element fetch failed: {}", e);
                match self.cache.get::<BulkElements>(&key) {
                    Some(entry) => Outcome::Stale {
                        data: entry.data,
                        error: e.to_string(),
                    },
                    None => Outcome::Failed(e.to_string()),
                }
            }
        }
    }

    /// Look up one satellite in whatever bulk payload is cached, fresh or not.
    pub fn lookup(&self, norad_id: u32) -> Option<OrbitalElements> {
        self.cache
            .get::<BulkElements>(&Self::cache_key())
            .and_then(|entry| entry.data.get(norad_id).cloned())
    }

    async fn download(&self) -> Result<BulkElements, ElementsError> {
        let body = self.fetcher.get_text(&self.url).await?;
        let bulk = parse_bulk(&body, Utc::now());
        if bulk.is_empty() {
            return Err(ElementsError::EmptyFeed);
        }
        Ok(bulk)
    }

    // Storage exhaustion: drop single-satellite entries, retry once, then carry on uncached.
    fn store(&self, key: &CacheKey, bulk: &BulkElements) {
        let entry = CacheEntry::new(bulk, Utc::now());
        let Err(first) = self.cache.put(key, &entry) else {
            return;
        };

        let evicted = self.cache.evict(Namespace::Elements);
        log::warn!(
            "Bulk cache write failed ({}); evicted {} single-satellite entries and retrying",
            first,
            evicted
        );
        if let Err(e) = self.cache.put(key, &entry) {
            log::warn!("Bulk elements left uncached: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryBackend;
    use crate::elements::tle::fixtures::*;
    use crate::fetch::mock::MockFetcher;

    const URL: &str = "https://tle.test/gp?GROUP=amateur";
    const TTL: Duration = Duration::from_secs(12 * 3600);

    fn feed(ids: &[u32]) -> String {
        ids.iter()
            .map(|id| {
                let (l1, l2) = lines_for(*id);
                format!("SAT {}\n{}\n{}\n", id, l1, l2)
            })
            .collect()
    }

    fn store(fetcher: &Arc<MockFetcher>, cache: &Arc<Cache>) -> BulkTleStore<MockFetcher> {
        BulkTleStore::new(fetcher.clone(), cache.clone(), URL.to_string(), TTL)
    }

    #[tokio::test]
    async fn second_fetch_hits_cache() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond("GROUP=amateur", &feed(&[25544, 43017]));
        let cache = Arc::new(Cache::memory());
        let store = store(&fetcher, &cache);

        store.fetch(false).await;
        let second = store.fetch(false).await;
        assert!(matches!(second, Outcome::Cached(ref b) if b.len() == 2));
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn lookup_reads_stale_payload() {
        let fetcher = Arc::new(MockFetcher::new());
        let cache = Arc::new(Cache::memory());
        let old = Utc::now() - chrono::Duration::days(5);
        let bulk = parse_bulk(&feed(&[43017]), old);
        cache
            .put(&BulkTleStore::<MockFetcher>::cache_key(), &CacheEntry::new(bulk, old))
            .unwrap();

        let store = store(&fetcher, &cache);
        assert_eq!(store.lookup(43017).unwrap().norad_id(), 43017);
        assert!(store.lookup(25544).is_none());
        assert_eq!(fetcher.calls(), 0);

        let outcome = store.fetch(false).await;
        assert!(matches!(outcome, Outcome::Stale { .. }));
    }

    #[tokio::test]
    async fn empty_feed_is_a_failure() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond("GROUP=amateur", "<html>maintenance</html>");
        let cache = Arc::new(Cache::memory());

        let outcome = store(&fetcher, &cache).fetch(false).await;
        assert!(matches!(outcome, Outcome::Failed(ref e) if e.contains("no valid")));
    }

    #[tokio::test]
    async fn full_storage_evicts_single_entries_then_retries() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond("GROUP=amateur", &feed(&[25544, 43017, 27607]));

        let single = CacheEntry::new(
            crate::elements::parse_tle_response(&iss_response(), Utc::now()).unwrap(),
            Utc::now(),
        );
        let single_size = serde_json::to_string(&single).unwrap().len();
        let cache = Arc::new(Cache::new(MemoryBackend::with_capacity(single_size * 5)));
        for id in 0..4 {
            cache
                .put(&CacheKey::new(Namespace::Elements, id.to_string()), &single)
                .unwrap();
        }

        let outcome = store(&fetcher, &cache).fetch(false).await;
        assert!(matches!(outcome, Outcome::Fresh(_)));
        assert!(cache.keys(Namespace::Elements).is_empty());
        assert!(cache
            .get::<BulkElements>(&BulkTleStore::<MockFetcher>::cache_key())
            .is_some());
    }

    #[tokio::test]
    async fn unwritable_cache_is_not_fatal() {
        let fetcher = Arc::new(MockFetcher::new());
        fetcher.respond("GROUP=amateur", &feed(&[25544]));
        let cache = Arc::new(Cache::new(MemoryBackend::with_capacity(16)));

        let outcome = store(&fetcher, &cache).fetch(false).await;
        assert!(matches!(outcome, Outcome::Fresh(ref b) if b.len() == 1));
        assert!(cache.keys(Namespace::Catalog).is_empty());
    }
}
