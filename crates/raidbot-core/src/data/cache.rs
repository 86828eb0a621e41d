//! Time-bounded cache of the data the chatbot talks about.
//!
//! The refresh decision is a pure function of `now`, `last_refreshed` and
//! `ttl`, so callers decide when to fetch and tests need no clock tricks.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use super::catalog::Champion;
use super::source::FetchedData;
use crate::chat::ContextSnapshot;

#[derive(Debug, Clone)]
pub struct DataCache {
    snapshot: Arc<ContextSnapshot>,
    champions: Arc<Vec<Champion>>,
    last_refreshed: Option<DateTime<Utc>>,
    ttl: Duration,
}

impl DataCache {
    /// An empty cache that reports stale until first refreshed.
    pub fn new(ttl: Duration) -> Self {
        Self {
            snapshot: Arc::new(ContextSnapshot::default()),
            champions: Arc::new(Vec::new()),
            last_refreshed: None,
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.last_refreshed
    }

    pub fn snapshot(&self) -> Arc<ContextSnapshot> {
        Arc::clone(&self.snapshot)
    }

    pub fn champions(&self) -> Arc<Vec<Champion>> {
        Arc::clone(&self.champions)
    }

    /// True when the cache was never filled or is older than its TTL.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.age(now).map_or(true, |age| age > self.ttl)
    }

    /// How long ago the cache was filled.
    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.last_refreshed.map(|at| now - at)
    }

    /// Replace the cached data.
    ///
    /// Empty collections in `fetched` keep the previous values so a source
    /// that comes back with nothing does not wipe known-good data.
    pub fn refresh(&mut self, fetched: FetchedData, now: DateTime<Utc>) {
        let FetchedData {
            events,
            meta_champions,
            champions,
        } = fetched;

        let events = if events.is_empty() {
            self.snapshot.events.clone()
        } else {
            events
        };
        let meta_champions = if meta_champions.is_empty() {
            self.snapshot.meta_champions.clone()
        } else {
            meta_champions
        };

        self.snapshot = Arc::new(ContextSnapshot::new(events, meta_champions));
        if !champions.is_empty() {
            self.champions = Arc::new(champions);
        }
        self.last_refreshed = Some(now);
    }
}
