//! Cache abstractions and the time-boxed holdings cache.

use crate::core::holdings::HoldingsSnapshot;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// A value read back from a collection, with the time it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredValue {
    pub value: Vec<u8>,
    pub written_at: SystemTime,
}

/// A named key-value collection. Each `put` replaces the previous value of
/// the key in a single step, so readers see either the old or the new value.
#[async_trait]
pub trait KeyValueCollection: Send + Sync {
    async fn get(&self, key: &[u8]) -> Option<StoredValue>;
    async fn put(&self, key: &[u8], value: &[u8]);
    async fn clear(&self);
}

/// Per-fund holdings snapshots, valid for `max_age` after they were written.
pub struct HoldingsCache {
    collection: Arc<dyn KeyValueCollection>,
    max_age: Duration,
}

impl HoldingsCache {
    pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

    pub fn new(collection: Arc<dyn KeyValueCollection>) -> Self {
        Self::with_max_age(collection, Self::DEFAULT_MAX_AGE)
    }

    pub fn with_max_age(collection: Arc<dyn KeyValueCollection>, max_age: Duration) -> Self {
        Self {
            collection,
            max_age,
        }
    }

    fn key(ticker: &str) -> Vec<u8> {
        ticker.trim().to_uppercase().into_bytes()
    }

    /// Returns the cached snapshot if it is still fresh.
    ///
    /// Stale entries are left in place; the next successful fetch overwrites
    /// them. Unreadable entries are reported as a miss.
    pub async fn get(&self, ticker: &str) -> Option<HoldingsSnapshot> {
        let Some(stored) = self.collection.get(&Self::key(ticker)).await else {
            debug!("Holdings cache MISS for {}", ticker);
            return None;
        };

        // A timestamp in the future (clock adjustment) counts as fresh.
        let age = SystemTime::now()
            .duration_since(stored.written_at)
            .unwrap_or_default();
        if age >= self.max_age {
            debug!(
                "Holdings cache entry for {} is stale ({}s old)",
                ticker,
                age.as_secs()
            );
            return None;
        }

        match serde_json::from_slice::<HoldingsSnapshot>(&stored.value) {
            Ok(snapshot) => {
                debug!("Holdings cache HIT for {}", ticker);
                Some(snapshot)
            }
            Err(e) => {
                warn!("Failed to load cached holdings for {}: {}", ticker, e);
                None
            }
        }
    }

    pub async fn put(&self, snapshot: &HoldingsSnapshot) {
        match serde_json::to_vec(snapshot) {
            Ok(bytes) => {
                self.collection
                    .put(&Self::key(&snapshot.ticker), &bytes)
                    .await;
                debug!(
                    "Cached {} holdings for {}",
                    snapshot.holdings.len(),
                    snapshot.ticker
                );
            }
            Err(e) => warn!("Failed to serialize holdings for {}: {}", snapshot.ticker, e),
        }
    }

    pub async fn clear(&self) {
        self.collection.clear().await;
    }
}
