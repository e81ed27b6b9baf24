use crate::core::cache::{KeyValueCollection, StoredValue};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::SystemTime;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory collection, used in tests and when the on-disk store is unavailable.
#[derive(Default)]
pub struct MemoryCollection {
    inner: Mutex<HashMap<Vec<u8>, StoredValue>>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueCollection for MemoryCollection {
    async fn get(&self, key: &[u8]) -> Option<StoredValue> {
        let cache = self.inner.lock().await;
        let value = cache.get(key).cloned();
        if value.is_some() {
            debug!("Cache HIT for key: {}", String::from_utf8_lossy(key));
        } else {
            debug!("Cache MISS for key: {}", String::from_utf8_lossy(key));
        }
        value
    }

    async fn put(&self, key: &[u8], value: &[u8]) {
        let stored = StoredValue {
            value: value.to_vec(),
            written_at: SystemTime::now(),
        };
        let mut cache = self.inner.lock().await;
        debug!("Cache PUT for key: {}", String::from_utf8_lossy(key));
        cache.insert(key.to_vec(), stored);
    }

    async fn clear(&self) {
        let mut cache = self.inner.lock().await;
        cache.clear();
        debug!("Cache CLEAR");
    }
}
