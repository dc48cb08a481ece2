// # Address Source Trait
//
// Defines the interface for determining the address(es) to publish.
//
// ## Implementations
//
// - HTTP lookup service: `ddns-ip-http` crate
// - UDP route probe: `ddns-ip-socket` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::{AddressSource, config::IpVersion};
//
// let v6 = source.current(IpVersion::V6).await?;
// ```

use async_trait::async_trait;
use std::net::IpAddr;

use crate::config::IpVersion;

/// Trait for address source implementations
///
/// Sources are observers: they report what the address is and never decide
/// whether DNS should change.
#[async_trait]
pub trait AddressSource: Send + Sync {
    /// Get the current address of the given family
    ///
    /// `version` is always `IpVersion::V4` or `IpVersion::V6`.
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: An address of the requested family
    /// - `Err(Error::Resolution)`: If no usable address could be determined
    async fn current(&self, version: IpVersion) -> Result<IpAddr, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
