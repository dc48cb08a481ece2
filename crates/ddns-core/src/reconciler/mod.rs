//! Cache-aware DNS reconciler
//!
//! The Reconciler is responsible for:
//! - Resolving the current address of every configured family
//! - Deciding, from the record cache, whether the provider must be asked
//! - Writing to the provider only when the known state differs
//! - Updating the cache only after the provider confirmed the state
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐
//! │ AddressSource │── current address ──┐
//! └───────────────┘                     │
//!                                       ▼
//!                               ┌──────────────┐
//!                               │  Reconciler  │
//!                               └──────────────┘
//!                                  │         │
//!                    ┌─────────────┘         └─────────────┐
//!                    ▼                                     ▼
//!           ┌──────────────┐                      ┌──────────────┐
//!           │ RecordCache  │                      │ DnsProvider  │
//!           │ (load/store) │                      │ (find/upsert)│
//!           └──────────────┘                      └──────────────┘
//! ```
//!
//! ## Decision Flow (per record type)
//!
//! 1. Resolve the current address
//! 2. `CACHE_HIT`: the cached value equals the address → done, no network call
//! 3. `CACHE_MISS_OR_STALE`: no usable entry → `find`, cache what was fetched
//! 4. `MISMATCH`: known value differs → `upsert`, cache the confirmed record
//!
//! A failed `upsert` leaves the cache untouched, so the next scheduled run
//! repeats the same comparison. Record types are reconciled independently:
//! a failure for one never skips another.

use chrono::Utc;
use std::net::IpAddr;
use tracing::{debug, error, info, warn};

use crate::config::{IpVersion, ReconcileConfig};
use crate::credentials::Credentials;
use crate::error::{Error, Result};
use crate::record::{Record, RecordKey, RecordType};
use crate::traits::{AddressSource, DnsProvider, RecordCache};

/// Where the "no change needed" conclusion came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateSource {
    /// The local cache proved the record current (no network call)
    Cache,
    /// A provider read proved the record current
    Provider,
}

/// Result of reconciling one record type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Record already had the current address
    Unchanged {
        /// The record as known
        record: Record,
        /// What proved it current
        verified_by: StateSource,
    },

    /// Existing record was updated
    Updated {
        /// The value before the update
        previous: String,
        /// The record as confirmed by the provider
        record: Record,
    },

    /// Record did not exist and was created
    Created {
        /// The record as confirmed by the provider
        record: Record,
    },

    /// Dry-run: an update would have been sent
    WouldUpdate {
        /// The currently known value, if any
        previous: Option<String>,
        /// The address that would have been written
        desired: IpAddr,
    },
}

impl ReconcileOutcome {
    /// Whether the provider was written to
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            ReconcileOutcome::Updated { .. } | ReconcileOutcome::Created { .. }
        )
    }
}

/// Result for one record type of a run
#[derive(Debug)]
pub struct RecordReport {
    /// The record type that was reconciled
    pub record_type: RecordType,
    /// What happened
    pub result: Result<ReconcileOutcome>,
}

/// Results of one reconciliation pass
#[derive(Debug, Default)]
pub struct RunReport {
    /// One entry per configured record type, in configuration order
    pub records: Vec<RecordReport>,
}

impl RunReport {
    /// Whether every record type reconciled successfully
    pub fn is_success(&self) -> bool {
        self.records.iter().all(|r| r.result.is_ok())
    }

    /// Number of provider writes performed
    pub fn write_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(&r.result, Ok(outcome) if outcome.is_write()))
            .count()
    }

    /// Outcome for a record type, if it succeeded
    pub fn outcome(&self, record_type: RecordType) -> Option<&ReconcileOutcome> {
        self.records
            .iter()
            .find(|r| r.record_type == record_type)
            .and_then(|r| r.result.as_ref().ok())
    }

    /// Collapse into the first error, or all outcomes
    pub fn into_result(self) -> Result<Vec<(RecordType, ReconcileOutcome)>> {
        self.records
            .into_iter()
            .map(|r| r.result.map(|outcome| (r.record_type, outcome)))
            .collect()
    }
}

/// Cache-aware reconciler
///
/// Holds everything one run needs as explicit values: the credentials, the
/// address source, the provider client and the cache. Tests substitute
/// fakes for any of them.
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`]
/// 2. Call [`Reconciler::run()`] once per scheduled invocation
pub struct Reconciler {
    /// Hostname, zone and token
    credentials: Credentials,

    /// Source of the current address
    source: Box<dyn AddressSource>,

    /// Remote record state (truth)
    provider: Box<dyn DnsProvider>,

    /// Local record state (optimization)
    cache: Box<dyn RecordCache>,

    /// Record types to reconcile
    record_types: Vec<RecordType>,

    /// Cache entries older than this are re-verified
    cache_max_age: Option<chrono::Duration>,

    /// Skip provider writes and cache updates
    dry_run: bool,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `credentials`: Loaded credentials
    /// - `source`: Address source implementation
    /// - `provider`: DNS provider implementation
    /// - `cache`: Record cache implementation
    /// - `config`: Reconciliation settings
    pub fn new(
        credentials: Credentials,
        source: Box<dyn AddressSource>,
        provider: Box<dyn DnsProvider>,
        cache: Box<dyn RecordCache>,
        config: &ReconcileConfig,
    ) -> Self {
        Self {
            credentials,
            source,
            provider,
            cache,
            record_types: config.ip_version.record_types(),
            cache_max_age: config.cache_max_age(),
            dry_run: config.dry_run,
        }
    }

    /// Run one reconciliation pass over every configured record type
    ///
    /// Never stops early: each record type gets its own result.
    pub async fn run(&self) -> RunReport {
        info!(
            "Reconciling {} in zone {} via {} [mode: {}]",
            self.credentials.hostname(),
            self.credentials.zone_id(),
            self.provider.provider_name(),
            if self.dry_run { "DRY-RUN" } else { "LIVE" }
        );

        let mut report = RunReport::default();
        for &record_type in &self.record_types {
            let result = self.reconcile_record(record_type).await;
            match &result {
                Ok(outcome) => self.log_outcome(record_type, outcome),
                Err(e) => error!(
                    "Failed to reconcile {} ({}): {}",
                    self.credentials.hostname(),
                    record_type,
                    e
                ),
            }
            report.records.push(RecordReport {
                record_type,
                result,
            });
        }
        report
    }

    /// Reconcile a single record type
    pub async fn reconcile_record(&self, record_type: RecordType) -> Result<ReconcileOutcome> {
        let address = self.resolve(record_type.version()).await?;
        let key = RecordKey::new(self.credentials.hostname(), record_type);

        let known = match self.cached_state(&key).await {
            Some(cached) if cached.matches(&address) => {
                debug!("Cache hit: {} already has {}", key, address);
                return Ok(ReconcileOutcome::Unchanged {
                    record: cached,
                    verified_by: StateSource::Cache,
                });
            }
            Some(cached) => {
                debug!(
                    "Cache mismatch: {} cached as {}, current address {}",
                    key, cached.value, address
                );
                Some(cached)
            }
            None => {
                debug!("Cache miss for {}, asking provider", key);
                let remote = self.remote_state(record_type).await?;

                if let Some(record) = &remote {
                    // Provider truth is cached whatever the comparison says
                    if let Err(e) = self.cache.store(record).await {
                        warn!("Failed to cache fetched record {}: {}", key, e);
                    }

                    if record.matches(&address) {
                        debug!("Provider confirms {} already has {}", key, address);
                        return Ok(ReconcileOutcome::Unchanged {
                            record: record.clone(),
                            verified_by: StateSource::Provider,
                        });
                    }
                }
                remote
            }
        };

        self.write(key, known, address).await
    }

    /// Resolve and sanity-check the current address of one family
    async fn resolve(&self, version: IpVersion) -> Result<IpAddr> {
        let address = self.source.current(version).await.map_err(|e| match e {
            Error::Resolution(_) => e,
            other => Error::resolution(format!(
                "{} source failed for {}: {}",
                self.source.source_name(),
                version,
                other
            )),
        })?;

        if !version.accepts(&address) {
            return Err(Error::resolution(format!(
                "{} source returned {} for {}",
                self.source.source_name(),
                address,
                version
            )));
        }

        if address.is_unspecified() || address.is_loopback() {
            return Err(Error::resolution(format!(
                "{} source returned unusable address {}",
                self.source.source_name(),
                address
            )));
        }

        debug!("Current {} address: {}", version, address);
        Ok(address)
    }

    /// Cached entry for `key`, if present and trustworthy
    async fn cached_state(&self, key: &RecordKey) -> Option<Record> {
        let cached = self.cache.load(key).await?;

        if cached.zone_id != self.credentials.zone_id() {
            debug!(
                "Cached {} belongs to zone {}, ignoring",
                key, cached.zone_id
            );
            return None;
        }

        if let Some(max_age) = self.cache_max_age {
            if cached.is_stale(max_age) {
                debug!(
                    "Cached {} is stale (confirmed {}), re-verifying",
                    key, cached.updated_at
                );
                return None;
            }
        }

        Some(cached)
    }

    /// Remote record state, `None` if the record does not exist
    async fn remote_state(&self, record_type: RecordType) -> Result<Option<Record>> {
        match self
            .provider
            .find(
                self.credentials.zone_id(),
                self.credentials.hostname(),
                record_type,
            )
            .await
        {
            Ok(record) => Ok(Some(record)),
            Err(e) if e.is_not_found() => {
                debug!("{}", e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Push the current address to the provider, then cache the result
    async fn write(
        &self,
        key: RecordKey,
        known: Option<Record>,
        address: IpAddr,
    ) -> Result<ReconcileOutcome> {
        let previous = known.as_ref().map(|r| r.value.clone());

        if self.dry_run {
            info!(
                "[DRY-RUN] Would upsert {} -> {} (was: {})",
                key,
                address,
                previous.as_deref().unwrap_or("absent")
            );
            return Ok(ReconcileOutcome::WouldUpdate {
                previous,
                desired: address,
            });
        }

        let desired = Record {
            name: key.name.clone(),
            record_type: key.record_type,
            value: address.to_string(),
            id: known.and_then(|r| r.id),
            zone_id: self.credentials.zone_id().to_string(),
            updated_at: Utc::now(),
        };

        // On failure the cache keeps its previous content
        let confirmed = self
            .provider
            .upsert(self.credentials.zone_id(), &desired)
            .await?;

        self.cache.store(&confirmed).await?;

        Ok(match previous {
            Some(previous) => ReconcileOutcome::Updated {
                previous,
                record: confirmed,
            },
            None => ReconcileOutcome::Created { record: confirmed },
        })
    }

    fn log_outcome(&self, record_type: RecordType, outcome: &ReconcileOutcome) {
        let hostname = self.credentials.hostname();
        match outcome {
            ReconcileOutcome::Unchanged {
                record,
                verified_by,
            } => info!(
                "Address unchanged: {} ({}) = {} [verified by {:?}]",
                hostname, record_type, record.value, verified_by
            ),
            ReconcileOutcome::Updated { previous, record } => info!(
                "Updated {} ({}) -> {} (previous: {})",
                hostname, record_type, record.value, previous
            ),
            ReconcileOutcome::Created { record } => info!(
                "Created {} ({}) -> {}",
                hostname, record_type, record.value
            ),
            ReconcileOutcome::WouldUpdate { desired, .. } => info!(
                "Would update {} ({}) -> {}",
                hostname, record_type, desired
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_provider_writes_count_as_writes() {
        let record = Record::new("1", "home", RecordType::A, "1.2.3.4");
        assert!(ReconcileOutcome::Created { record: record.clone() }.is_write());
        assert!(
            ReconcileOutcome::Updated {
                previous: "1.2.3.3".to_string(),
                record: record.clone(),
            }
            .is_write()
        );
        assert!(
            !ReconcileOutcome::Unchanged {
                record,
                verified_by: StateSource::Cache,
            }
            .is_write()
        );
        assert!(
            !ReconcileOutcome::WouldUpdate {
                previous: None,
                desired: "1.2.3.4".parse().unwrap(),
            }
            .is_write()
        );
    }

    #[test]
    fn report_into_result_surfaces_first_error() {
        let report = RunReport {
            records: vec![
                RecordReport {
                    record_type: RecordType::A,
                    result: Err(Error::provider(500, "boom")),
                },
                RecordReport {
                    record_type: RecordType::Aaaa,
                    result: Err(Error::resolution("no route")),
                },
            ],
        };
        assert!(!report.is_success());
        assert!(matches!(
            report.into_result(),
            Err(Error::Provider { status: 500, .. })
        ));
    }
}
