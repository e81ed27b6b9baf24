pub mod disk;
pub mod memory;

use crate::core::cache::KeyValueCollection;
use disk::DiskCollection;
use fjall::{Keyspace, PartitionCreateOptions};
use memory::MemoryCollection;
use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex, PoisonError},
};
use tracing::warn;

/// A key-value store holding named collections.
///
/// Persistent collections live in a `fjall` keyspace. If the keyspace could
/// not be opened, persistent collections fall back to memory so the
/// application still works, just without a cache across runs.
pub struct KeyValueStore {
    collections: Mutex<HashMap<String, Arc<dyn KeyValueCollection>>>,
    keyspace: Option<Arc<Keyspace>>,
}

impl KeyValueStore {
    pub fn open(path: &Path) -> Self {
        let keyspace = match fjall::Config::new(path).open() {
            Ok(keyspace) => Some(Arc::new(keyspace)),
            Err(e) => {
                warn!("Failed to open cache at {}: {}", path.display(), e);
                None
            }
        };

        Self {
            collections: Mutex::new(HashMap::new()),
            keyspace,
        }
    }

    #[cfg(test)]
    pub(crate) fn in_memory() -> Self {
        Self {
            collections: Mutex::new(HashMap::new()),
            keyspace: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_persistent(&self) -> bool {
        self.keyspace.is_some()
    }

    /// Returns the collection `name`, creating it on first use.
    pub fn get_collection(&self, name: &str, persist: bool) -> Arc<dyn KeyValueCollection> {
        let mut collections = self
            .collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        collections
            .entry(name.to_string())
            .or_insert_with(|| self.create_collection(name, persist))
            .clone()
    }

    fn create_collection(&self, name: &str, persist: bool) -> Arc<dyn KeyValueCollection> {
        if persist {
            if let Some(keyspace) = &self.keyspace {
                match keyspace.open_partition(name, PartitionCreateOptions::default()) {
                    Ok(partition) => {
                        return Arc::new(DiskCollection::new(Arc::clone(keyspace), partition));
                    }
                    Err(e) => warn!("Failed to open cache partition {}: {}", name, e),
                }
            }
        }
        Arc::new(MemoryCollection::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_collections_are_shared_by_name() {
        let dir = tempdir().unwrap();
        let store = KeyValueStore::open(dir.path());
        assert!(store.is_persistent());

        let first = store.get_collection("holdings", true);
        first.put(b"SPY", b"data").await;

        let second = store.get_collection("holdings", true);
        assert_eq!(second.get(b"SPY").await.unwrap().value, b"data");

        let other = store.get_collection("other", true);
        assert!(other.get(b"SPY").await.is_none());
    }

    #[tokio::test]
    async fn test_in_memory_store_still_serves_persistent_collections() {
        let store = KeyValueStore::in_memory();
        assert!(!store.is_persistent());

        let collection = store.get_collection("holdings", true);
        collection.put(b"QQQ", b"data").await;

        assert!(collection.get(b"QQQ").await.is_some());
    }
}
