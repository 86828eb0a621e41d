//! Game data: champion catalog, current events and meta lists.
//!
//! [`SharedData`] owns the [`DataCache`] behind an async `RwLock` and is the
//! service's [`ContextProvider`]. Refreshing goes through a [`DataSource`].

pub mod cache;
pub mod catalog;
pub mod source;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

pub use cache::DataCache;
pub use catalog::{Champion, ChampionQuery};
pub use source::{CuratedSource, DataSource, FetchedData};

use crate::chat::{ContextSnapshot, Event};

/// Supplies the snapshot the classifier renders against.
#[async_trait]
pub trait ContextProvider: Send + Sync {
    async fn snapshot(&self) -> Arc<ContextSnapshot>;
}

/// Cache freshness as reported by `/api/data`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub last_refreshed: Option<DateTime<Utc>>,
    pub fresh: bool,
    pub age_secs: Option<i64>,
    pub ttl_secs: i64,
}

/// Cloneable handle to the shared data cache.
#[derive(Clone)]
pub struct SharedData {
    cache: Arc<RwLock<DataCache>>,
    source: Arc<dyn DataSource>,
}

impl SharedData {
    pub fn new(source: Arc<dyn DataSource>, ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(DataCache::new(ttl))),
            source,
        }
    }

    /// A handle over the curated placeholder source.
    pub fn curated(ttl: Duration) -> Self {
        Self::new(Arc::new(CuratedSource), ttl)
    }

    /// Fetch from the source and replace the cache.
    ///
    /// On a fetch error the cache keeps its previous (possibly stale) data.
    pub async fn refresh(&self, now: DateTime<Utc>) -> anyhow::Result<()> {
        let fetched = match self.source.fetch(now).await {
            Ok(data) => data,
            Err(e) => {
                warn!(source = self.source.name(), error = %e, "Data refresh failed, keeping cached data");
                return Err(e);
            }
        };

        let events = fetched.events.len();
        let champions = fetched.champions.len();
        self.cache.write().await.refresh(fetched, now);

        info!(source = self.source.name(), events, champions, "Game data refreshed");
        Ok(())
    }

    /// Refresh only when the cache is stale. Returns whether a refresh ran.
    pub async fn refresh_if_stale(&self, now: DateTime<Utc>) -> bool {
        if !self.cache.read().await.needs_refresh(now) {
            return false;
        }
        self.refresh(now).await.is_ok()
    }

    pub async fn champions(&self, query: &ChampionQuery) -> Vec<Champion> {
        let all = self.cache.read().await.champions();
        catalog::filter(&all, query)
    }

    /// Champions the message mentions by role, faction or name. Empty when
    /// it mentions none.
    pub async fn relevant_champions(&self, message: &str) -> Vec<Champion> {
        let all = self.cache.read().await.champions();
        match catalog::query_for_message(&all, message) {
            Some(query) => catalog::filter(&all, &query),
            None => Vec::new(),
        }
    }

    /// Events that are still running at `now`.
    pub async fn current_events(&self, now: DateTime<Utc>) -> Vec<Event> {
        let snapshot = self.cache.read().await.snapshot();
        snapshot.active_events(now).cloned().collect()
    }

    pub async fn status(&self, now: DateTime<Utc>) -> CacheStatus {
        let cache = self.cache.read().await;
        CacheStatus {
            last_refreshed: cache.last_refreshed(),
            fresh: !cache.needs_refresh(now),
            age_secs: cache.age(now).map(|age| age.num_seconds()),
            ttl_secs: cache.ttl().num_seconds(),
        }
    }
}

#[async_trait]
impl ContextProvider for SharedData {
    async fn snapshot(&self) -> Arc<ContextSnapshot> {
        self.cache.read().await.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    #[async_trait]
    impl DataSource for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        async fn fetch(&self, _now: DateTime<Utc>) -> anyhow::Result<FetchedData> {
            anyhow::bail!("upstream unavailable")
        }
    }

    #[tokio::test]
    async fn test_refresh_if_stale_runs_once() {
        let data = SharedData::curated(Duration::hours(6));
        let now = Utc::now();

        assert!(data.refresh_if_stale(now).await);
        assert!(!data.refresh_if_stale(now + Duration::hours(1)).await);
        assert!(data.refresh_if_stale(now + Duration::hours(7)).await);
    }

    #[tokio::test]
    async fn test_snapshot_and_queries_after_refresh() {
        let data = SharedData::curated(Duration::hours(6));
        let now = Utc::now();
        data.refresh(now).await.unwrap();

        assert_eq!(data.snapshot().await.events.len(), 2);
        assert_eq!(data.current_events(now).await.len(), 2);
        assert!(data.current_events(now + Duration::days(6)).await.len() == 1);

        let query = ChampionQuery {
            faction: Some("Dark Elves".into()),
            ..ChampionQuery::default()
        };
        assert_eq!(data.champions(&query).await.len(), 2);

        let status = data.status(now + Duration::minutes(2)).await;
        assert!(status.fresh);
        assert_eq!(status.age_secs, Some(120));
    }

    #[tokio::test]
    async fn test_relevant_champions() {
        let data = SharedData::curated(Duration::hours(6));
        data.refresh(Utc::now()).await.unwrap();

        let names: Vec<String> = data
            .relevant_champions("best dark elves?")
            .await
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["Coldheart", "Kael"]);

        assert!(data.relevant_champions("hello there").await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_cache_stale() {
        let data = SharedData::new(Arc::new(Broken), Duration::hours(6));
        let now = Utc::now();

        assert!(data.refresh(now).await.is_err());
        assert!(!data.refresh_if_stale(now).await);
        assert!(data.snapshot().await.is_empty());
        assert!(!data.status(now).await.fresh);
    }
}
