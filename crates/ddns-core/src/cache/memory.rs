// # Memory Record Cache
//
// In-memory implementation of RecordCache.
//
// Nothing survives the process, so every run starts with a cache miss and
// asks the provider. Useful for tests and for embedding the reconciler in a
// long-running program.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::record::{Record, RecordKey};
use crate::traits::record_cache::RecordCache;

/// In-memory record cache
///
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordCache {
    inner: Arc<RwLock<HashMap<RecordKey, Record>>>,
}

impl MemoryRecordCache {
    /// Create a new empty memory cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of cached records
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl RecordCache for MemoryRecordCache {
    async fn load(&self, key: &RecordKey) -> Option<Record> {
        self.inner.read().await.get(key).cloned()
    }

    async fn store(&self, record: &Record) -> Result<(), Error> {
        self.inner
            .write()
            .await
            .insert(record.key(), record.clone());
        Ok(())
    }
}
