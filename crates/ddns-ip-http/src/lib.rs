// # HTTP Address Source
//
// This crate provides an HTTP-based address source for the DDNS updater.
//
// ## Purpose
//
// Asks a "what is my IP" service (e.g. ipify) for the public address the
// host is seen with. This is the right source behind NAT, where the local
// interface address is private.
//
// ## Architecture
//
// One plain-text GET per family, against a family-specific URL (the IPv6
// URL must only be reachable over IPv6, like `api6.ipify.org`). The body is
// trimmed and parsed; an address of the wrong family is rejected.

use async_trait::async_trait;
use ddns_core::config::{IpSourceConfig, IpVersion};
use ddns_core::traits::AddressSource;
use ddns_core::{Error, Result};

use std::net::IpAddr;
use std::time::Duration;

/// HTTP-based address source
#[derive(Debug)]
pub struct HttpAddressSource {
    /// Service returning the IPv4 address as plain text
    ipv4_url: String,

    /// Service returning the IPv6 address as plain text
    ipv6_url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpAddressSource {
    /// Create a new HTTP address source
    ///
    /// # Parameters
    ///
    /// - `ipv4_url`: URL answering with the caller's IPv4 address
    /// - `ipv6_url`: URL answering with the caller's IPv6 address
    /// - `timeout`: Per-request timeout
    pub fn new(
        ipv4_url: impl Into<String>,
        ipv6_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            ipv4_url: ipv4_url.into(),
            ipv6_url: ipv6_url.into(),
            client,
        })
    }

    /// Create from an `IpSourceConfig::Http`
    pub fn from_config(config: &IpSourceConfig) -> Result<Self> {
        match config {
            IpSourceConfig::Http {
                ipv4_url,
                ipv6_url,
                timeout_secs,
            } => Self::new(
                ipv4_url.clone(),
                ipv6_url.clone(),
                Duration::from_secs(*timeout_secs),
            ),
            other => Err(Error::config(format!(
                "Invalid config for HTTP address source: {}",
                other.type_name()
            ))),
        }
    }

    fn url(&self, version: IpVersion) -> Result<&str> {
        match version {
            IpVersion::V4 => Ok(&self.ipv4_url),
            IpVersion::V6 => Ok(&self.ipv6_url),
            IpVersion::Both => Err(Error::resolution(
                "HTTP address source resolves one family at a time",
            )),
        }
    }

    /// Fetch the current address from the lookup service
    async fn fetch(&self, url: &str) -> Result<IpAddr> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::resolution(format!("Request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::resolution(format!(
                "{} answered with HTTP {}",
                url,
                response.status()
            )));
        }

        let ip_text = response.text().await.map_err(|e| {
            Error::resolution(format!("Failed to read response from {}: {}", url, e))
        })?;

        let ip_text = ip_text.trim();
        ip_text.parse().map_err(|_| {
            Error::resolution(format!("{} returned an invalid IP address: {:?}", url, ip_text))
        })
    }
}

#[async_trait]
impl AddressSource for HttpAddressSource {
    async fn current(&self, version: IpVersion) -> Result<IpAddr> {
        let url = self.url(version)?;
        tracing::debug!("Fetching current {} address from {}", version, url);

        let ip = self.fetch(url).await?;
        if !version.accepts(&ip) {
            return Err(Error::resolution(format!(
                "Expected {} address from {}, got: {}",
                version, url, ip
            )));
        }

        tracing::debug!("Fetched IP: {}", ip);
        Ok(ip)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}
