//! Contract Test: Dry-Run Mode
//!
//! Constraints verified:
//! - Dry-run never calls upsert
//! - Dry-run never writes a planned value to the cache
//! - Dry-run still reads the provider on a cache miss

mod common;

use common::*;
use ddns_core::traits::RecordCache;
use ddns_core::{
    IpVersion, MemoryRecordCache, ReconcileConfig, ReconcileOutcome, Reconciler, RecordKey,
    RecordType,
};

#[tokio::test]
async fn dry_run_reports_but_never_writes() {
    let source = FixedAddressSource::new().with("203.0.113.99");
    let provider = FakeProvider::new().with_record(RecordType::A, "203.0.113.1");
    let cache = MemoryRecordCache::new();

    let updater = Reconciler::new(
        credentials(),
        Box::new(FixedAddressSource::sharing_state_with(&source)),
        Box::new(FakeProvider::sharing_state_with(&provider)),
        Box::new(cache.clone()),
        &ReconcileConfig {
            dry_run: true,
            ..reconcile_config(IpVersion::V4)
        },
    );

    let report = updater.run().await;

    assert!(report.is_success());
    assert_eq!(provider.find_call_count(), 1);
    assert_eq!(provider.upsert_call_count(), 0);
    assert_eq!(provider.remote_value(RecordType::A).as_deref(), Some("203.0.113.1"));
    assert!(matches!(
        report.outcome(RecordType::A),
        Some(ReconcileOutcome::WouldUpdate { previous: Some(p), .. }) if p == "203.0.113.1"
    ));

    // Only the provider-confirmed value is cached
    let cached = cache
        .load(&RecordKey::new(HOSTNAME, RecordType::A))
        .await
        .unwrap();
    assert_eq!(cached.value, "203.0.113.1");
}

#[tokio::test]
async fn dry_run_for_absent_record() {
    let source = FixedAddressSource::new().with("2001:db8::5");
    let provider = FakeProvider::new();
    let cache = MemoryRecordCache::new();

    let updater = Reconciler::new(
        credentials(),
        Box::new(FixedAddressSource::sharing_state_with(&source)),
        Box::new(FakeProvider::sharing_state_with(&provider)),
        Box::new(cache.clone()),
        &ReconcileConfig {
            dry_run: true,
            ..reconcile_config(IpVersion::V6)
        },
    );

    let outcome = updater.reconcile_record(RecordType::Aaaa).await.unwrap();

    assert!(matches!(
        outcome,
        ReconcileOutcome::WouldUpdate { previous: None, .. }
    ));
    assert_eq!(provider.remote_record_count(), 0);
    assert!(cache.is_empty().await);
}
