// # Record Cache Trait
//
// Defines the interface for the local record cache.
//
// ## Purpose
//
// The cache remembers the provider's record state as of the last successful
// read or write, so that an unchanged address costs no network call.
// It is a consistency optimization, never a source of truth: the provider is.
//
// ## Implementations
//
// - File-based: JSON file with locked, atomic replacement (`FileRecordCache`)
// - In-memory: `MemoryRecordCache`
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::{RecordCache, RecordKey, RecordType};
//
// if let Some(record) = cache.load(&RecordKey::new("home", RecordType::A)).await {
//     // compare record.value with the current address
// }
//
// // Only after the provider confirmed the write
// cache.store(&confirmed).await?;
// ```

use async_trait::async_trait;

use crate::record::{Record, RecordKey};

/// Trait for record cache implementations
///
/// # Trust Level: Trusted (Core Component)
///
/// ## Allowed Capabilities
/// - ✅ Perform local I/O for persistence
/// - ✅ Lock the backing store for the duration of one store cycle
///
/// ## Forbidden Capabilities
/// - ❌ Hold a lock across a provider call
/// - ❌ Perform DNS updates (owned by `DnsProvider`)
/// - ❌ Decide when to update (owned by `Reconciler`)
#[async_trait]
pub trait RecordCache: Send + Sync {
    /// Get the last known record for a key
    ///
    /// Absence and corruption are both reported as `None`: the caller then
    /// asks the provider. Implementations log corruption instead of failing.
    async fn load(&self, key: &RecordKey) -> Option<Record>;

    /// Overwrite the entry for `record.key()`
    ///
    /// Must never leave a half-written cache behind, even if another run of
    /// the same job stores concurrently or the process crashes.
    async fn store(&self, record: &Record) -> Result<(), crate::Error>;
}
