//! Periodic eviction of idle conversations.
//!
//! A `Sweeper` wakes up at a fixed interval and calls
//! [`ConversationStore::evict_expired`] on the shared store. The first sweep
//! fires after one interval, not immediately.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio::sync::RwLock;
//! use tokio_util::sync::CancellationToken;
//! use raidbot_core::session::ConversationStore;
//! use raidbot_core::sweeper::Sweeper;
//!
//! # async fn example() {
//! let store = Arc::new(RwLock::new(ConversationStore::default()));
//! let cancel = CancellationToken::new();
//! let sweeper = Sweeper::builder()
//!     .interval(Duration::from_secs(300))
//!     .store(store)
//!     .build();
//!
//! tokio::spawn(sweeper.run(cancel.clone()));
//! # }
//! ```

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::session::ConversationStore;

pub struct Sweeper {
    interval: Duration,
    store: Arc<RwLock<ConversationStore>>,
}

impl Sweeper {
    /// Start building a sweeper with [`SweeperBuilder`].
    pub fn builder() -> SweeperBuilder {
        SweeperBuilder::default()
    }

    /// Evict once. Returns the number of conversations dropped.
    pub async fn sweep(&self) -> usize {
        self.store.write().await.evict_expired(Utc::now())
    }

    /// Run the sweep loop until `cancel` is triggered.
    pub async fn run(self, cancel: CancellationToken) {
        info!(interval_secs = self.interval.as_secs(), "Conversation sweeper started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Conversation sweeper cancelled");
                    return;
                }
                _ = tokio::time::sleep(self.interval) => {
                    let evicted = self.sweep().await;
                    if evicted > 0 {
                        info!(evicted, "Swept idle conversations");
                    }
                }
            }
        }
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct SweeperBuilder {
    interval: Option<Duration>,
    store: Option<Arc<RwLock<ConversationStore>>>,
}

impl SweeperBuilder {
    /// Set the interval between sweeps (defaults to five minutes).
    pub fn interval(mut self, d: Duration) -> Self {
        self.interval = Some(d);
        self
    }

    /// Set the store to sweep (required).
    pub fn store(mut self, store: Arc<RwLock<ConversationStore>>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the [`Sweeper`].
    ///
    /// # Panics
    /// Panics if `store` was not set.
    pub fn build(self) -> Sweeper {
        Sweeper {
            interval: self.interval.unwrap_or(Duration::from_secs(300)),
            store: self.store.expect("Sweeper::builder: store is required"),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
