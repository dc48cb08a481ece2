// # ddns-update - One-shot DDNS updater
//
// This binary is a THIN integration layer:
// 1. Parse flags / `DDNS_*` environment variables
// 2. Initialize logging
// 3. Load credentials
// 4. Wire the address source, the dynv6 provider and the file cache
// 5. Run one reconciliation pass and exit
//
// All DDNS logic lives in ddns-core. Scheduling (cron, systemd timer) is
// external; overlapping runs are safe because cache writes are locked.
//
// ## Example
//
// ```bash
// echo home        > /etc/ddns/hostname
// echo 123456      > /etc/ddns/zone
// echo <token>     > /etc/ddns/token
//
// ddns-update --ip-version both --ip-source http
// ```

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use ddns_core::config::{IpSourceConfig, UpdaterConfig};
use ddns_core::traits::AddressSource;
use ddns_core::{Credentials, FileRecordCache, Reconciler};
use ddns_provider_dynv6::Dynv6Provider;
use std::io::IsTerminal;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

use crate::cli::Cli;

/// Exit codes for different termination scenarios
///
/// - 0: Every record is up to date (or was updated)
/// - 1: Configuration error (flags, credential files)
/// - 2: Runtime error (resolution, provider, network, cache write)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// All record types reconciled
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (at least one record type failed)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_ansi(std::io::stdout().is_terminal())
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let config = cli.to_config();
    if let Err(e) = config.validate() {
        error!("{}", e);
        return DdnsExitCode::ConfigError.into();
    }

    // Single sequential run
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run(config)).into()
}

/// Run one reconciliation pass
async fn run(config: UpdaterConfig) -> DdnsExitCode {
    // Credentials come first: a missing file must fail before any network call
    let credentials = match Credentials::load(&config.credentials).await {
        Ok(credentials) => credentials,
        Err(e) => {
            error!("{}", e);
            return DdnsExitCode::ConfigError;
        }
    };

    let reconciler = match build_reconciler(&config, credentials) {
        Ok(reconciler) => reconciler,
        Err(e) => {
            error!("{:#}", e);
            return DdnsExitCode::ConfigError;
        }
    };

    let report = reconciler.run().await;
    if report.is_success() {
        info!(
            "Run complete: {} record(s) checked, {} written",
            report.records.len(),
            report.write_count()
        );
        DdnsExitCode::Success
    } else {
        let failed = report.records.iter().filter(|r| r.result.is_err()).count();
        error!(
            "Run failed: {} of {} record(s) could not be reconciled",
            failed,
            report.records.len()
        );
        DdnsExitCode::RuntimeError
    }
}

/// Wire the components named by the configuration
fn build_reconciler(config: &UpdaterConfig, credentials: Credentials) -> Result<Reconciler> {
    let source = build_source(&config.ip_source)?;

    let provider = Dynv6Provider::new(credentials.token(), &config.provider)
        .context("Failed to create dynv6 provider")?;

    let cache = FileRecordCache::new(&config.cache_path);

    info!(
        "Using {} address source, dynv6 at {}, cache {}",
        source.source_name(),
        provider.api_base(),
        cache.path().display()
    );

    Ok(Reconciler::new(
        credentials,
        source,
        Box::new(provider),
        Box::new(cache),
        &config.reconcile,
    ))
}

fn build_source(config: &IpSourceConfig) -> Result<Box<dyn AddressSource>> {
    match config {
        #[cfg(feature = "http")]
        IpSourceConfig::Http { .. } => Ok(Box::new(
            ddns_ip_http::HttpAddressSource::from_config(config)
                .context("Failed to create HTTP address source")?,
        )),

        #[cfg(feature = "socket")]
        IpSourceConfig::Socket { .. } => Ok(Box::new(
            ddns_ip_socket::SocketAddressSource::from_config(config)
                .context("Failed to create socket address source")?,
        )),

        #[allow(unreachable_patterns)]
        other => anyhow::bail!(
            "Address source '{}' is not available in this build",
            other.type_name()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(DdnsExitCode::Success as u8, 0);
        assert_eq!(DdnsExitCode::ConfigError as u8, 1);
        assert_eq!(DdnsExitCode::RuntimeError as u8, 2);
    }

    #[tokio::test]
    async fn test_missing_credentials_is_a_config_error() {
        let dir = std::env::temp_dir().join(format!("ddns-update-test-{}", std::process::id()));
        let mut config = UpdaterConfig::default();
        config.credentials = ddns_core::CredentialPaths::new(
            dir.join("hostname"),
            dir.join("zone"),
            dir.join("token"),
        );
        // TEST-NET address, never contacted
        config.provider.api_base = "http://192.0.2.1".to_string();

        assert_eq!(run(config).await, DdnsExitCode::ConfigError);
    }
}
