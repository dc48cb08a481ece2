// # Socket Address Source
//
// This crate provides a route-probe address source for the DDNS updater.
//
// ## How It Works
//
// A UDP socket is "connected" to a well-known public host. Connecting a
// datagram socket sends nothing; it only makes the kernel pick a route and
// a source address. That source address is the one the host would use to
// reach the Internet, which on an IPv6 network is normally globally routable.
//
// ## Limitations
//
// Behind NAT the IPv4 source address is private. Use the HTTP source
// (ddns-ip-http) when the public IPv4 address is needed.

use async_trait::async_trait;
use ddns_core::config::{IpSourceConfig, IpVersion};
use ddns_core::traits::AddressSource;
use ddns_core::{Error, Result};

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::UdpSocket;

/// Port used for the probe (nothing is ever sent to it)
const PROBE_PORT: u16 = 1;

/// Route-probe address source
#[derive(Debug, Clone)]
pub struct SocketAddressSource {
    /// Public IPv4 host to probe the route to
    ipv4_probe: IpAddr,

    /// Public IPv6 host to probe the route to
    ipv6_probe: IpAddr,
}

impl SocketAddressSource {
    /// Create a new socket address source
    ///
    /// Fails with `Error::Config` if a probe has the wrong family.
    pub fn new(ipv4_probe: IpAddr, ipv6_probe: IpAddr) -> Result<Self> {
        if !ipv4_probe.is_ipv4() {
            return Err(Error::config(format!(
                "IPv4 probe address must be IPv4, got {}",
                ipv4_probe
            )));
        }
        if !ipv6_probe.is_ipv6() {
            return Err(Error::config(format!(
                "IPv6 probe address must be IPv6, got {}",
                ipv6_probe
            )));
        }

        Ok(Self {
            ipv4_probe,
            ipv6_probe,
        })
    }

    /// Create from an `IpSourceConfig::Socket`
    pub fn from_config(config: &IpSourceConfig) -> Result<Self> {
        match config {
            IpSourceConfig::Socket {
                ipv4_probe,
                ipv6_probe,
            } => Self::new(*ipv4_probe, *ipv6_probe),
            other => Err(Error::config(format!(
                "Invalid config for socket address source: {}",
                other.type_name()
            ))),
        }
    }

    /// Local address the kernel selects to reach `probe`
    async fn route_source(probe: IpAddr) -> Result<IpAddr> {
        let bind: SocketAddr = match probe {
            IpAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            IpAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };

        let socket = UdpSocket::bind(bind)
            .await
            .map_err(|e| Error::resolution(format!("Failed to open probe socket: {}", e)))?;

        socket
            .connect((probe, PROBE_PORT))
            .await
            .map_err(|e| Error::resolution(format!("No route to {}: {}", probe, e)))?;

        let local = socket
            .local_addr()
            .map_err(|e| Error::resolution(format!("Failed to read probe socket address: {}", e)))?;

        Ok(local.ip())
    }
}

/// Whether `addr` can be published in a DNS record
fn is_publishable(addr: &IpAddr) -> bool {
    if addr.is_unspecified() || addr.is_loopback() || addr.is_multicast() {
        return false;
    }
    match addr {
        IpAddr::V4(v4) => !v4.is_link_local(),
        IpAddr::V6(v6) => !v6.is_unicast_link_local(),
    }
}

#[async_trait]
impl AddressSource for SocketAddressSource {
    async fn current(&self, version: IpVersion) -> Result<IpAddr> {
        let probe = match version {
            IpVersion::V4 => self.ipv4_probe,
            IpVersion::V6 => self.ipv6_probe,
            IpVersion::Both => {
                return Err(Error::resolution(
                    "Socket address source resolves one family at a time",
                ));
            }
        };

        tracing::debug!("Probing route to {} for the {} source address", probe, version);
        let ip = Self::route_source(probe).await?;

        if !is_publishable(&ip) {
            return Err(Error::resolution(format!(
                "Route to {} uses non-public source address {}",
                probe, ip
            )));
        }

        tracing::debug!("Current {} address: {}", version, ip);
        Ok(ip)
    }

    fn source_name(&self) -> &'static str {
        "socket"
    }
}
