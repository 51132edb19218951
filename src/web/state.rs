use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::catalog::CatalogBuild;
use crate::services::Services;

struct CatalogSnapshot {
    built_at: DateTime<Utc>,
    build: CatalogBuild,
}

#[derive(Clone)]
pub struct AppState {
    pub services: Arc<Services>,
    catalog: Arc<RwLock<Option<CatalogSnapshot>>>,
}

impl AppState {
    pub fn new(services: Services) -> Self {
        Self {
            services: Arc::new(services),
            catalog: Arc::new(RwLock::new(None)),
        }
    }

    /// The merged catalog, rebuilt once the bulk TTL has passed. Empty builds are
    /// not kept so the next request tries again.
    pub async fn catalog(&self) -> CatalogBuild {
        let ttl = self.services.config.ttl.bulk;
        {
            let snapshot = self.catalog.read().await;
            if let Some(snapshot) = snapshot.as_ref() {
                let fresh = (Utc::now() - snapshot.built_at)
                    .to_std()
                    .map_or(true, |age| age < ttl);
                if fresh {
                    return snapshot.build.clone();
                }
            }
        }

        let mut snapshot = self.catalog.write().await;
        let build = self.services.catalog.build(false).await;
        if !build.satellites.is_empty() {
            *snapshot = Some(CatalogSnapshot {
                built_at: Utc::now(),
                build: build.clone(),
            });
        }
        build
    }
}
