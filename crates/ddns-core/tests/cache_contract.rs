//! Contract Test: Record Cache Semantics
//!
//! The cache is an optimization, never a source of truth.
//!
//! Constraints verified:
//! - After a successful upsert the cache holds exactly the written value
//! - A failed upsert leaves the cache untouched
//! - A cache miss costs one find; the following run costs nothing
//! - A cached mismatch goes straight to upsert without a find
//! - Stale entries and entries of another zone are re-verified

mod common;

use common::*;
use ddns_core::traits::RecordCache;
use ddns_core::{
    Error, IpVersion, MemoryRecordCache, ReconcileConfig, ReconcileOutcome, Reconciler, Record,
    RecordKey, RecordType,
};

fn reconciler_with(
    source: &FixedAddressSource,
    provider: &FakeProvider,
    cache: &MemoryRecordCache,
    config: ReconcileConfig,
) -> Reconciler {
    Reconciler::new(
        credentials(),
        Box::new(FixedAddressSource::sharing_state_with(source)),
        Box::new(FakeProvider::sharing_state_with(provider)),
        Box::new(cache.clone()),
        &config,
    )
}

fn key(record_type: RecordType) -> RecordKey {
    RecordKey::new(HOSTNAME, record_type)
}

#[tokio::test]
async fn successful_upsert_is_reflected_in_cache() {
    let source = FixedAddressSource::new().with("203.0.113.20");
    let provider = FakeProvider::new().with_record(RecordType::A, "203.0.113.10");
    let cache = MemoryRecordCache::new();
    let updater = reconciler_with(&source, &provider, &cache, reconcile_config(IpVersion::V4));

    let outcome = updater.reconcile_record(RecordType::A).await.unwrap();

    let ReconcileOutcome::Updated { previous, record } = outcome else {
        panic!("expected an update");
    };
    assert_eq!(previous, "203.0.113.10");

    let cached = cache.load(&key(RecordType::A)).await.unwrap();
    assert_eq!(cached.value, "203.0.113.20");
    assert_eq!(cached, record);
    assert!(cached.id.is_some());
}

#[tokio::test]
async fn failed_upsert_leaves_cache_untouched() {
    let source = FixedAddressSource::new().with("203.0.113.20");
    let provider = FakeProvider::new();
    let cache = MemoryRecordCache::new();

    let seeded = Record::new(ZONE_ID, HOSTNAME, RecordType::A, "203.0.113.10").with_id("5");
    cache.store(&seeded).await.unwrap();

    provider.fail_upsert(RecordType::A, 503);
    let updater = reconciler_with(&source, &provider, &cache, reconcile_config(IpVersion::V4));

    let err = updater.reconcile_record(RecordType::A).await.unwrap_err();
    assert!(matches!(err, Error::Provider { status: 503, .. }));
    assert_eq!(cache.load(&key(RecordType::A)).await, Some(seeded));

    // The next run retries the same comparison and succeeds
    provider.heal();
    let outcome = updater.reconcile_record(RecordType::A).await.unwrap();
    assert!(outcome.is_write());
    assert_eq!(
        cache.load(&key(RecordType::A)).await.unwrap().value,
        "203.0.113.20"
    );
}

#[tokio::test]
async fn miss_costs_one_find_then_hits() {
    let source = FixedAddressSource::new().with("2001:db8::1");
    let provider = FakeProvider::new().with_record(RecordType::Aaaa, "2001:db8::1");
    let cache = MemoryRecordCache::new();
    let updater = reconciler_with(&source, &provider, &cache, reconcile_config(IpVersion::V6));

    updater.reconcile_record(RecordType::Aaaa).await.unwrap();
    assert_eq!(provider.find_call_count(), 1);
    assert_eq!(provider.upsert_call_count(), 0);

    updater.reconcile_record(RecordType::Aaaa).await.unwrap();
    assert_eq!(provider.find_call_count(), 1);
    assert_eq!(provider.network_call_count(), 1);
}

#[tokio::test]
async fn cached_mismatch_upserts_without_find() {
    let source = FixedAddressSource::new().with("203.0.113.30");
    let provider = FakeProvider::new().with_record(RecordType::A, "203.0.113.10");
    let cache = MemoryRecordCache::new();
    cache
        .store(&Record::new(ZONE_ID, HOSTNAME, RecordType::A, "203.0.113.10").with_id("100"))
        .await
        .unwrap();

    let updater = reconciler_with(&source, &provider, &cache, reconcile_config(IpVersion::V4));
    updater.reconcile_record(RecordType::A).await.unwrap();

    assert_eq!(provider.find_call_count(), 0);
    assert_eq!(provider.upsert_call_count(), 1);
    assert_eq!(provider.remote_record_count(), 1, "no duplicate record");
    assert_eq!(
        provider.remote_value(RecordType::A).as_deref(),
        Some("203.0.113.30")
    );
}

#[tokio::test]
async fn fetched_record_is_cached_even_when_it_differs() {
    let source = FixedAddressSource::new().with("203.0.113.30");
    let provider = FakeProvider::new().with_record(RecordType::A, "203.0.113.10");
    provider.fail_upsert(RecordType::A, 500);
    let cache = MemoryRecordCache::new();
    let updater = reconciler_with(&source, &provider, &cache, reconcile_config(IpVersion::V4));

    assert!(updater.reconcile_record(RecordType::A).await.is_err());

    // The provider's value was confirmed by find, so it is cached
    let cached = cache.load(&key(RecordType::A)).await.unwrap();
    assert_eq!(cached.value, "203.0.113.10");
    assert_eq!(cached.id.as_deref(), Some("100"));
}

#[tokio::test]
async fn stale_entry_is_reverified() {
    let source = FixedAddressSource::new().with("203.0.113.10");
    let provider = FakeProvider::new().with_record(RecordType::A, "203.0.113.10");
    let cache = MemoryRecordCache::new();

    let mut old = Record::new(ZONE_ID, HOSTNAME, RecordType::A, "203.0.113.10").with_id("100");
    old.updated_at = chrono::Utc::now() - chrono::Duration::hours(2);
    cache.store(&old).await.unwrap();

    let config = ReconcileConfig {
        cache_max_age_secs: 3600,
        ..reconcile_config(IpVersion::V4)
    };
    let updater = reconciler_with(&source, &provider, &cache, config);
    updater.reconcile_record(RecordType::A).await.unwrap();

    assert_eq!(provider.find_call_count(), 1);
    assert_eq!(provider.upsert_call_count(), 0);
    let refreshed = cache.load(&key(RecordType::A)).await.unwrap();
    assert!(!refreshed.is_stale(chrono::Duration::hours(1)));
}

#[tokio::test]
async fn zero_max_age_trusts_cache_indefinitely() {
    let source = FixedAddressSource::new().with("203.0.113.10");
    let provider = FakeProvider::new();
    let cache = MemoryRecordCache::new();

    let mut old = Record::new(ZONE_ID, HOSTNAME, RecordType::A, "203.0.113.10").with_id("100");
    old.updated_at = chrono::Utc::now() - chrono::Duration::days(365);
    cache.store(&old).await.unwrap();

    let config = ReconcileConfig {
        cache_max_age_secs: 0,
        ..reconcile_config(IpVersion::V4)
    };
    let updater = reconciler_with(&source, &provider, &cache, config);
    updater.reconcile_record(RecordType::A).await.unwrap();

    assert_eq!(provider.network_call_count(), 0);
}

#[tokio::test]
async fn entry_from_other_zone_is_ignored() {
    let source = FixedAddressSource::new().with("203.0.113.10");
    let provider = FakeProvider::new();
    let cache = MemoryRecordCache::new();
    cache
        .store(&Record::new("other-zone", HOSTNAME, RecordType::A, "203.0.113.10").with_id("9"))
        .await
        .unwrap();

    let updater = reconciler_with(&source, &provider, &cache, reconcile_config(IpVersion::V4));
    let outcome = updater.reconcile_record(RecordType::A).await.unwrap();

    assert_eq!(provider.find_call_count(), 1);
    assert!(matches!(outcome, ReconcileOutcome::Created { .. }));
    assert_eq!(cache.load(&key(RecordType::A)).await.unwrap().zone_id, ZONE_ID);
}
