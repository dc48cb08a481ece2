// # DNS Provider Trait
//
// Defines the capability interface for reading and writing DNS records via a
// provider API.
//
// ## Implementations
//
// - dynv6: `ddns-provider-dynv6` crate
// - Tests: counting fakes in `ddns-core/tests/common`
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::{DnsProvider, Record, RecordType};
//
// let current = provider.find("123", "home", RecordType::Aaaa).await?;
// let wanted = Record { value: "2001:db8::1".into(), ..current };
// let written = provider.upsert("123", &wanted).await?;
// ```

use async_trait::async_trait;

use crate::record::{Record, RecordType};

/// Trait for DNS provider clients
///
/// Every call is a real network request against a rate-limited third-party
/// service. The `Reconciler` only calls a provider when the cache cannot
/// prove that no update is needed.
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Parse provider-specific responses
/// - ✅ Return success or failure
///
/// ## Forbidden Capabilities
/// - ❌ Implement retry logic or backoff (the scheduler re-invokes the run)
/// - ❌ Access the record cache (owned by `Reconciler`)
/// - ❌ Decide whether an update is needed (owned by `Reconciler`)
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Query the current state of a record
    ///
    /// # Returns
    ///
    /// - `Ok(Record)`: The record as the provider stores it, with its `id`
    /// - `Err(Error::NotFound)`: No record with this name and type exists
    /// - `Err(Error::Provider { status, body, .. })`: Non-success HTTP status
    /// - `Err(Error::Network)`: Transport failure
    async fn find(
        &self,
        zone_id: &str,
        hostname: &str,
        record_type: RecordType,
    ) -> Result<Record, crate::Error>;

    /// Create or update a record
    ///
    /// Creates the record when `record.id` is `None`, otherwise updates it
    /// by id.
    ///
    /// # Idempotency
    ///
    /// Sending the same value twice must neither create a duplicate record
    /// nor be reported as an error.
    ///
    /// # Returns
    ///
    /// The record as confirmed by the provider (including its `id`).
    async fn upsert(&self, zone_id: &str, record: &Record) -> Result<Record, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
