//! Configuration types for the DDNS updater
//!
//! This module defines all configuration structures used throughout the crate.
//! Secrets never live here: the configuration only names the files the
//! credentials are read from (see [`crate::credentials`]).

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::record::RecordType;

/// Default location of the hostname file
pub const DEFAULT_HOSTNAME_FILE: &str = "/etc/ddns/hostname";
/// Default location of the zone identifier file
pub const DEFAULT_ZONE_FILE: &str = "/etc/ddns/zone";
/// Default location of the API token file
pub const DEFAULT_TOKEN_FILE: &str = "/etc/ddns/token";
/// Default location of the record cache
pub const DEFAULT_CACHE_FILE: &str = "/var/lib/ddns/records.json";

/// dynv6 REST API base URL
pub const DEFAULT_API_BASE: &str = "https://dynv6.com/api/v2";
/// Default public-IPv4 lookup service
pub const DEFAULT_IPV4_URL: &str = "https://api.ipify.org";
/// Default public-IPv6 lookup service
pub const DEFAULT_IPV6_URL: &str = "https://api6.ipify.org";
/// Default route-probe target for IPv4 (Google public DNS)
pub const DEFAULT_IPV4_PROBE: &str = "8.8.8.8";
/// Default route-probe target for IPv6 (Google public DNS)
pub const DEFAULT_IPV6_PROBE: &str = "2001:4860:4860::8888";

/// Longest accepted cache max age (ten years)
pub const MAX_CACHE_MAX_AGE_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Main updater configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Where the credentials are read from
    pub credentials: CredentialPaths,

    /// Path to the record cache file
    pub cache_path: PathBuf,

    /// How the current address is determined
    pub ip_source: IpSourceConfig,

    /// DNS provider client settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Reconciliation settings
    #[serde(default)]
    pub reconcile: ReconcileConfig,
}

impl UpdaterConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            credentials: CredentialPaths::default(),
            cache_path: PathBuf::from(DEFAULT_CACHE_FILE),
            ip_source: IpSourceConfig::default(),
            provider: ProviderConfig::default(),
            reconcile: ReconcileConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.credentials.validate()?;

        if self.cache_path.as_os_str().is_empty() {
            return Err(crate::Error::config("Cache file path cannot be empty"));
        }

        self.ip_source.validate()?;
        self.provider.validate()?;
        self.reconcile.validate()?;

        Ok(())
    }
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Paths of the three externally provisioned credential files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialPaths {
    /// File holding the hostname (record name, `@` for the zone apex)
    pub hostname: PathBuf,
    /// File holding the provider zone identifier
    pub zone: PathBuf,
    /// File holding the bearer token
    pub token: PathBuf,
}

impl CredentialPaths {
    pub fn new(
        hostname: impl Into<PathBuf>,
        zone: impl Into<PathBuf>,
        token: impl Into<PathBuf>,
    ) -> Self {
        Self {
            hostname: hostname.into(),
            zone: zone.into(),
            token: token.into(),
        }
    }

    fn validate(&self) -> Result<(), crate::Error> {
        for (what, path) in [
            ("hostname", &self.hostname),
            ("zone", &self.zone),
            ("token", &self.token),
        ] {
            if path.as_os_str().is_empty() {
                return Err(crate::Error::config(format!(
                    "{} file path cannot be empty",
                    what
                )));
            }
        }
        Ok(())
    }
}

impl Default for CredentialPaths {
    fn default() -> Self {
        Self::new(DEFAULT_HOSTNAME_FILE, DEFAULT_ZONE_FILE, DEFAULT_TOKEN_FILE)
    }
}

/// IP address families to publish
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpVersion {
    /// IPv4 only (A record)
    V4,
    /// IPv6 only (AAAA record)
    V6,
    /// Both IPv4 and IPv6
    Both,
}

impl IpVersion {
    /// Record types to reconcile, in a stable order
    pub fn record_types(&self) -> Vec<RecordType> {
        match self {
            IpVersion::V4 => vec![RecordType::A],
            IpVersion::V6 => vec![RecordType::Aaaa],
            IpVersion::Both => vec![RecordType::A, RecordType::Aaaa],
        }
    }

    /// Whether `addr` belongs to this family
    pub fn accepts(&self, addr: &IpAddr) -> bool {
        match self {
            IpVersion::V4 => addr.is_ipv4(),
            IpVersion::V6 => addr.is_ipv6(),
            IpVersion::Both => true,
        }
    }
}

impl std::str::FromStr for IpVersion {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "v4" | "4" | "ipv4" => Ok(IpVersion::V4),
            "v6" | "6" | "ipv6" => Ok(IpVersion::V6),
            "both" | "dual" => Ok(IpVersion::Both),
            other => Err(crate::Error::config(format!(
                "Unknown IP version '{}'. Valid values: v4, v6, both",
                other
            ))),
        }
    }
}

impl std::fmt::Display for IpVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            IpVersion::V4 => "v4",
            IpVersion::V6 => "v6",
            IpVersion::Both => "both",
        })
    }
}

/// Address source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IpSourceConfig {
    /// Ask a "what is my IP" HTTP service
    Http {
        /// Service returning the caller's IPv4 address as plain text
        ipv4_url: String,
        /// Service returning the caller's IPv6 address as plain text
        ipv6_url: String,
        /// Request timeout in seconds
        timeout_secs: u64,
    },

    /// Read the local address the kernel routes towards a public host
    Socket {
        /// IPv4 host to probe the route to
        ipv4_probe: IpAddr,
        /// IPv6 host to probe the route to
        ipv6_probe: IpAddr,
    },
}

impl IpSourceConfig {
    /// Validate the address source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            IpSourceConfig::Http {
                ipv4_url,
                ipv6_url,
                timeout_secs,
            } => {
                for url in [ipv4_url, ipv6_url] {
                    validate_http_url("IP lookup URL", url)?;
                }
                validate_timeout(*timeout_secs)
            }
            IpSourceConfig::Socket {
                ipv4_probe,
                ipv6_probe,
            } => {
                if !ipv4_probe.is_ipv4() {
                    return Err(crate::Error::config(format!(
                        "IPv4 probe address must be IPv4, got {}",
                        ipv4_probe
                    )));
                }
                if !ipv6_probe.is_ipv6() {
                    return Err(crate::Error::config(format!(
                        "IPv6 probe address must be IPv6, got {}",
                        ipv6_probe
                    )));
                }
                Ok(())
            }
        }
    }

    /// Source type name (for logging)
    pub fn type_name(&self) -> &'static str {
        match self {
            IpSourceConfig::Http { .. } => "http",
            IpSourceConfig::Socket { .. } => "socket",
        }
    }
}

impl Default for IpSourceConfig {
    fn default() -> Self {
        IpSourceConfig::Http {
            ipv4_url: DEFAULT_IPV4_URL.to_string(),
            ipv6_url: DEFAULT_IPV6_URL.to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// DNS provider client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API base URL (without trailing slash)
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_http_url("Provider API base", &self.api_base)?;
        validate_timeout(self.timeout_secs)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Reconciliation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Address families to publish
    #[serde(default = "default_ip_version")]
    pub ip_version: IpVersion,

    /// Cache entries older than this are re-verified against the provider
    ///
    /// Set to 0 to trust the cache until the next write.
    #[serde(default = "default_cache_max_age_secs")]
    pub cache_max_age_secs: u64,

    /// Perform all reads but skip provider writes and cache updates
    #[serde(default)]
    pub dry_run: bool,
}

impl ReconcileConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.cache_max_age_secs > MAX_CACHE_MAX_AGE_SECS {
            return Err(crate::Error::config(format!(
                "Cache max age must be at most {} seconds. Got: {}",
                MAX_CACHE_MAX_AGE_SECS, self.cache_max_age_secs
            )));
        }
        Ok(())
    }

    /// Maximum cache age, `None` when staleness checks are disabled
    ///
    /// Values above the accepted range are clamped, never treated as
    /// disabled.
    pub fn cache_max_age(&self) -> Option<chrono::Duration> {
        if self.cache_max_age_secs == 0 {
            return None;
        }
        let secs = self.cache_max_age_secs.min(MAX_CACHE_MAX_AGE_SECS);
        i64::try_from(secs).ok().and_then(chrono::Duration::try_seconds)
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            ip_version: default_ip_version(),
            cache_max_age_secs: default_cache_max_age_secs(),
            dry_run: false,
        }
    }
}

fn validate_http_url(what: &str, url: &str) -> Result<(), crate::Error> {
    if url.is_empty() {
        return Err(crate::Error::config(format!("{} cannot be empty", what)));
    }
    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(crate::Error::config(format!(
            "{} must use HTTP or HTTPS scheme. Got: {}",
            what, url
        )));
    }
    Ok(())
}

fn validate_timeout(timeout_secs: u64) -> Result<(), crate::Error> {
    if !(1..=300).contains(&timeout_secs) {
        return Err(crate::Error::config(format!(
            "Timeout must be between 1 and 300 seconds. Got: {}",
            timeout_secs
        )));
    }
    Ok(())
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_ip_version() -> IpVersion {
    IpVersion::Both
}

fn default_cache_max_age_secs() -> u64 {
    24 * 60 * 60
}
