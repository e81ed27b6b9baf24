use crate::core::cache::{KeyValueCollection, StoredValue};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use fjall::{Keyspace, PartitionHandle, PersistMode};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Width of the write-time header stored in front of every value.
const HEADER_LEN: usize = 8;

/// A collection persisted in a `fjall` partition.
///
/// Values are stored as `[written_at millis, big endian u64][payload]` so the
/// write time can be checked without decoding the payload. Each value is a
/// single insert, which fjall applies atomically per key.
pub struct DiskCollection {
    keyspace: Arc<Keyspace>,
    partition: PartitionHandle,
}

impl DiskCollection {
    pub fn new(keyspace: Arc<Keyspace>, partition: PartitionHandle) -> Self {
        Self {
            keyspace,
            partition,
        }
    }

    fn encode(value: &[u8], written_at: SystemTime) -> Vec<u8> {
        let millis = written_at
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        let mut bytes = Vec::with_capacity(HEADER_LEN + value.len());
        bytes.extend_from_slice(&millis.to_be_bytes());
        bytes.extend_from_slice(value);
        bytes
    }

    fn decode(bytes: &[u8]) -> Result<StoredValue> {
        if bytes.len() < HEADER_LEN {
            return Err(anyhow!("stored value shorter than its header"));
        }
        let (header, value) = bytes.split_at(HEADER_LEN);
        let mut millis = [0u8; HEADER_LEN];
        millis.copy_from_slice(header);
        Ok(StoredValue {
            value: value.to_vec(),
            written_at: UNIX_EPOCH + Duration::from_millis(u64::from_be_bytes(millis)),
        })
    }
}

#[async_trait]
impl KeyValueCollection for DiskCollection {
    async fn get(&self, key: &[u8]) -> Option<StoredValue> {
        let res: Result<Option<StoredValue>> = (|| match self.partition.get(key)? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        })();

        match res {
            Ok(Some(value)) => {
                debug!("Cache HIT for key: {}", String::from_utf8_lossy(key));
                Some(value)
            }
            Ok(None) => {
                debug!("Cache MISS for key: {}", String::from_utf8_lossy(key));
                None
            }
            Err(e) => {
                warn!("DiskCollection get error: {}", e);
                None
            }
        }
    }

    async fn put(&self, key: &[u8], value: &[u8]) {
        let res: Result<()> = (|| {
            self.partition
                .insert(key, Self::encode(value, SystemTime::now()))?;
            self.keyspace.persist(PersistMode::SyncAll)?;
            Ok(())
        })();
        match res {
            Ok(()) => debug!("Cache PUT for key: {}", String::from_utf8_lossy(key)),
            Err(e) => debug!("DiskCollection put error: {}", e),
        }
    }

    async fn clear(&self) {
        let res: Result<()> = (|| {
            for key in self.partition.keys() {
                self.partition.remove(key?)?;
            }
            self.keyspace.persist(PersistMode::SyncAll)?;
            Ok(())
        })();
        match res {
            Ok(()) => debug!("Cache CLEAR"),
            Err(e) => debug!("DiskCollection clear error: {}", e),
        }
    }
}
