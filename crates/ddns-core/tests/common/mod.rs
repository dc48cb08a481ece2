//! Test doubles and common utilities for reconciler contract tests
//!
//! The fakes count every call so tests can assert on network traffic.

#![allow(dead_code)]

use ddns_core::config::{IpVersion, ReconcileConfig};
use ddns_core::error::{Error, Result};
use ddns_core::traits::{AddressSource, DnsProvider};
use ddns_core::{Credentials, Record, RecordKey, RecordType};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const HOSTNAME: &str = "home";
pub const ZONE_ID: &str = "zone-1";

/// An address source returning fixed per-family addresses
pub struct FixedAddressSource {
    addresses: Arc<Mutex<HashMap<IpVersion, IpAddr>>>,
    call_count: Arc<AtomicUsize>,
}

impl FixedAddressSource {
    pub fn new() -> Self {
        Self {
            addresses: Arc::new(Mutex::new(HashMap::new())),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Set (or change) the address returned for its family
    pub fn with(self, addr: &str) -> Self {
        self.set(addr);
        self
    }

    pub fn set(&self, addr: &str) {
        let addr: IpAddr = addr.parse().unwrap();
        let version = RecordType::for_addr(&addr).version();
        self.addresses.lock().unwrap().insert(version, addr);
    }

    /// Get the number of times current() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Create a new source that shares addresses and counters with an existing one
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            addresses: Arc::clone(&other.addresses),
            call_count: Arc::clone(&other.call_count),
        }
    }
}

#[async_trait::async_trait]
impl AddressSource for FixedAddressSource {
    async fn current(&self, version: IpVersion) -> Result<IpAddr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.addresses
            .lock()
            .unwrap()
            .get(&version)
            .copied()
            .ok_or_else(|| Error::resolution(format!("no {} address configured", version)))
    }

    fn source_name(&self) -> &'static str {
        "fixed"
    }
}

/// An in-memory provider that tracks calls
pub struct FakeProvider {
    /// Remote records by key
    records: Arc<Mutex<HashMap<RecordKey, Record>>>,
    /// Call counter for find()
    find_call_count: Arc<AtomicUsize>,
    /// Call counter for upsert()
    upsert_call_count: Arc<AtomicUsize>,
    /// Record types whose find() fails with the given HTTP status
    failing_finds: Arc<Mutex<HashMap<RecordType, u16>>>,
    /// Record types whose upsert() fails with the given HTTP status
    failing_upserts: Arc<Mutex<HashMap<RecordType, u16>>>,
    next_id: Arc<AtomicUsize>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(HashMap::new())),
            find_call_count: Arc::new(AtomicUsize::new(0)),
            upsert_call_count: Arc::new(AtomicUsize::new(0)),
            failing_finds: Arc::new(Mutex::new(HashMap::new())),
            failing_upserts: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicUsize::new(100)),
        }
    }

    /// Seed a remote record
    pub fn with_record(self, record_type: RecordType, value: &str) -> Self {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        let record = Record::new(ZONE_ID, HOSTNAME, record_type, value).with_id(id);
        self.records.lock().unwrap().insert(record.key(), record);
        self
    }

    pub fn fail_find(&self, record_type: RecordType, status: u16) {
        self.failing_finds.lock().unwrap().insert(record_type, status);
    }

    pub fn fail_upsert(&self, record_type: RecordType, status: u16) {
        self.failing_upserts.lock().unwrap().insert(record_type, status);
    }

    pub fn heal(&self) {
        self.failing_finds.lock().unwrap().clear();
        self.failing_upserts.lock().unwrap().clear();
    }

    /// Get the number of times find() was called
    pub fn find_call_count(&self) -> usize {
        self.find_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of times upsert() was called
    pub fn upsert_call_count(&self) -> usize {
        self.upsert_call_count.load(Ordering::SeqCst)
    }

    /// Total provider round-trips
    pub fn network_call_count(&self) -> usize {
        self.find_call_count() + self.upsert_call_count()
    }

    /// Remote value of a record, if it exists
    pub fn remote_value(&self, record_type: RecordType) -> Option<String> {
        self.records
            .lock()
            .unwrap()
            .get(&RecordKey::new(HOSTNAME, record_type))
            .map(|r| r.value.clone())
    }

    pub fn remote_record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Create a new FakeProvider that shares records and counters with an existing one
    pub fn sharing_state_with(other: &Self) -> Self {
        Self {
            records: Arc::clone(&other.records),
            find_call_count: Arc::clone(&other.find_call_count),
            upsert_call_count: Arc::clone(&other.upsert_call_count),
            failing_finds: Arc::clone(&other.failing_finds),
            failing_upserts: Arc::clone(&other.failing_upserts),
            next_id: Arc::clone(&other.next_id),
        }
    }
}

#[async_trait::async_trait]
impl DnsProvider for FakeProvider {
    async fn find(&self, zone_id: &str, hostname: &str, record_type: RecordType) -> Result<Record> {
        self.find_call_count.fetch_add(1, Ordering::SeqCst);
        assert_eq!(zone_id, ZONE_ID);

        if let Some(status) = self.failing_finds.lock().unwrap().get(&record_type) {
            return Err(Error::provider(*status, "injected find failure"));
        }

        self.records
            .lock()
            .unwrap()
            .get(&RecordKey::new(hostname, record_type))
            .cloned()
            .ok_or_else(|| Error::not_found(format!("{} ({})", hostname, record_type)))
    }

    async fn upsert(&self, zone_id: &str, record: &Record) -> Result<Record> {
        self.upsert_call_count.fetch_add(1, Ordering::SeqCst);
        assert_eq!(zone_id, ZONE_ID);

        if let Some(status) = self.failing_upserts.lock().unwrap().get(&record.record_type) {
            return Err(Error::provider(*status, "injected upsert failure"));
        }

        let mut records = self.records.lock().unwrap();
        let id = match records.get(&record.key()) {
            Some(existing) => existing.id.clone(),
            None => Some(self.next_id.fetch_add(1, Ordering::SeqCst).to_string()),
        };

        let mut confirmed = record.clone();
        confirmed.id = id;
        confirmed.updated_at = chrono::Utc::now();
        records.insert(confirmed.key(), confirmed.clone());
        Ok(confirmed)
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

pub fn credentials() -> Credentials {
    Credentials::new(HOSTNAME, ZONE_ID, "test-token").unwrap()
}

pub fn reconcile_config(ip_version: IpVersion) -> ReconcileConfig {
    ReconcileConfig {
        ip_version,
        ..ReconcileConfig::default()
    }
}
