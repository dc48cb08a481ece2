//! Command-line interface.
//!
//! Every flag can also be set through its `DDNS_*` environment variable,
//! which is how schedulers (cron, systemd timers) usually configure it.

use clap::{Parser, ValueEnum};
use ddns_core::config::{
    CredentialPaths, DEFAULT_API_BASE, DEFAULT_CACHE_FILE, DEFAULT_HOSTNAME_FILE,
    DEFAULT_IPV4_PROBE, DEFAULT_IPV4_URL, DEFAULT_IPV6_PROBE, DEFAULT_IPV6_URL,
    DEFAULT_TOKEN_FILE, DEFAULT_ZONE_FILE, IpSourceConfig, IpVersion, ProviderConfig,
    ReconcileConfig, UpdaterConfig,
};
use std::net::IpAddr;
use std::path::PathBuf;

/// Keep the A/AAAA records of one dynv6 hostname in line with the current
/// addresses of this machine.
///
/// Meant to be run periodically; an unchanged address costs no API call.
#[derive(Debug, Parser)]
#[command(author, name = "ddns-update", version)]
pub struct Cli {
    /// File holding the record name (`@` for the zone apex)
    #[arg(long, env = "DDNS_HOSTNAME_FILE", default_value = DEFAULT_HOSTNAME_FILE)]
    pub hostname_file: PathBuf,

    /// File holding the dynv6 zone id
    #[arg(long, env = "DDNS_ZONE_FILE", default_value = DEFAULT_ZONE_FILE)]
    pub zone_file: PathBuf,

    /// File holding the dynv6 HTTP token
    #[arg(long, env = "DDNS_TOKEN_FILE", default_value = DEFAULT_TOKEN_FILE)]
    pub token_file: PathBuf,

    /// Record cache file
    #[arg(long, env = "DDNS_CACHE_FILE", default_value = DEFAULT_CACHE_FILE)]
    pub cache_file: PathBuf,

    /// Address families to publish: v4, v6 or both
    #[arg(long, env = "DDNS_IP_VERSION", default_value = "both")]
    pub ip_version: IpVersion,

    /// How the current address is determined
    #[arg(long, env = "DDNS_IP_SOURCE", value_enum, default_value_t = SourceKind::Http)]
    pub ip_source: SourceKind,

    /// Lookup service answering with the public IPv4 address (http source)
    #[arg(long, env = "DDNS_IPV4_URL", default_value = DEFAULT_IPV4_URL)]
    pub ipv4_url: String,

    /// Lookup service answering with the public IPv6 address (http source)
    #[arg(long, env = "DDNS_IPV6_URL", default_value = DEFAULT_IPV6_URL)]
    pub ipv6_url: String,

    /// Public IPv4 host whose route selects the address (socket source)
    #[arg(long, env = "DDNS_IPV4_PROBE", default_value = DEFAULT_IPV4_PROBE)]
    pub ipv4_probe: IpAddr,

    /// Public IPv6 host whose route selects the address (socket source)
    #[arg(long, env = "DDNS_IPV6_PROBE", default_value = DEFAULT_IPV6_PROBE)]
    pub ipv6_probe: IpAddr,

    /// dynv6 REST API base URL
    #[arg(long, env = "DDNS_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Per-request HTTP timeout in seconds
    #[arg(long, env = "DDNS_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Re-verify cached records older than this many seconds (0: never)
    #[arg(long, env = "DDNS_CACHE_MAX_AGE_SECS", default_value_t = 86400)]
    pub cache_max_age_secs: u64,

    /// Read everything, change nothing
    #[arg(long, env = "DDNS_DRY_RUN")]
    pub dry_run: bool,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, env = "DDNS_LOG_LEVEL", default_value = "info")]
    pub log_level: tracing::Level,
}

/// Supported address sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// Ask a "what is my IP" HTTP service
    Http,
    /// Read the source address of the route to a public host
    Socket,
}

impl Cli {
    /// Build the updater configuration (not yet validated)
    pub fn to_config(&self) -> UpdaterConfig {
        let ip_source = match self.ip_source {
            SourceKind::Http => IpSourceConfig::Http {
                ipv4_url: self.ipv4_url.clone(),
                ipv6_url: self.ipv6_url.clone(),
                timeout_secs: self.timeout_secs,
            },
            SourceKind::Socket => IpSourceConfig::Socket {
                ipv4_probe: self.ipv4_probe,
                ipv6_probe: self.ipv6_probe,
            },
        };

        UpdaterConfig {
            credentials: CredentialPaths::new(
                &self.hostname_file,
                &self.zone_file,
                &self.token_file,
            ),
            cache_path: self.cache_file.clone(),
            ip_source,
            provider: ProviderConfig {
                api_base: self.api_base.clone(),
                timeout_secs: self.timeout_secs,
            },
            reconcile: ReconcileConfig {
                ip_version: self.ip_version,
                cache_max_age_secs: self.cache_max_age_secs,
                dry_run: self.dry_run,
            },
        }
    }
}
