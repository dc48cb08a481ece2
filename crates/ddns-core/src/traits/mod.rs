//! Core traits for the DDNS updater
//!
//! This module defines the capability seams the reconciler is built on.

pub mod address_source;
pub mod dns_provider;
pub mod record_cache;

pub use address_source::AddressSource;
pub use dns_provider::DnsProvider;
pub use record_cache::RecordCache;
