// # ddns-core
//
// Core library for the cached dynamic-DNS reconciler.
//
// ## Architecture Overview
//
// One run brings the address records of a single hostname in line with the
// host's current public addresses:
// - **AddressSource**: Trait for resolving the current address of a family
// - **DnsProvider**: Trait for reading and writing records via a provider API
// - **RecordCache**: Trait for the local record cache (an optimization only)
// - **Credentials**: Hostname, zone id and API token loaded from files
// - **Reconciler**: Decides, per record type, whether a provider write is needed
//
// ## Design Principles
//
// 1. **Provider is truth**: The cache only ever holds provider-confirmed state
// 2. **Minimal API traffic**: An unchanged address costs no network call
// 3. **Per-family isolation**: A failing A record never blocks AAAA
// 4. **Library-First**: All core functionality can be used as a library

pub mod cache;
pub mod config;
pub mod credentials;
pub mod error;
pub mod reconciler;
pub mod record;
pub mod traits;

// Re-export core types for convenience
pub use cache::{FileRecordCache, MemoryRecordCache};
pub use config::{
    CredentialPaths, IpSourceConfig, IpVersion, ProviderConfig, ReconcileConfig, UpdaterConfig,
};
pub use credentials::Credentials;
pub use error::{Error, Result};
pub use reconciler::{ReconcileOutcome, Reconciler, RecordReport, RunReport, StateSource};
pub use record::{Record, RecordKey, RecordType, ZONE_APEX};
pub use traits::{AddressSource, DnsProvider, RecordCache};
