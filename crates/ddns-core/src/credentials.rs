// # Credential Loader
//
// Reads the three externally provisioned values the updater needs:
//
// - hostname: record name inside the zone (`@` for the zone apex)
// - zone identifier: opaque provider zone id
// - token: bearer token for the provider API
//
// Each lives in its own plain-text file holding a single token. Missing,
// unreadable or blank files are operator errors: loading fails with
// `Error::Config` and nothing is retried.
//
// ## Security
//
// The token NEVER appears in logs, `Debug` output or error messages.

use std::path::Path;
use tokio::fs;

use crate::config::CredentialPaths;
use crate::record::ZONE_APEX;
use crate::{Error, Result};

/// Credentials for one reconciliation run
///
/// Immutable once loaded.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    hostname: String,
    zone_id: String,
    token: String,
}

// Custom Debug implementation that hides the token
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("hostname", &self.hostname)
            .field("zone_id", &self.zone_id)
            .field("token", &"<REDACTED>")
            .finish()
    }
}

impl Credentials {
    /// Build credentials from in-memory values, applying the same
    /// validation as [`Credentials::load`]
    pub fn new(
        hostname: impl Into<String>,
        zone_id: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self> {
        // DNS names are case-insensitive; one spelling keeps cache keys stable
        let hostname = hostname.into().trim().to_ascii_lowercase();
        let zone_id = zone_id.into().trim().to_string();
        let token = token.into().trim().to_string();

        if hostname.is_empty() {
            return Err(Error::config("Hostname cannot be empty"));
        }
        if hostname != ZONE_APEX {
            validate_hostname(&hostname)?;
        }
        validate_single_token("Zone identifier", &zone_id)?;
        // Message never includes the token value
        validate_single_token("API token", &token)?;

        Ok(Self {
            hostname,
            zone_id,
            token,
        })
    }

    /// Load credentials from the configured files
    ///
    /// Fails with `Error::Config` naming the offending file if any is absent,
    /// unreadable, or empty after trimming whitespace.
    pub async fn load(paths: &CredentialPaths) -> Result<Self> {
        let hostname = read_value("hostname", &paths.hostname).await?;
        let zone_id = read_value("zone", &paths.zone).await?;
        let token = read_value("token", &paths.token).await?;

        let credentials = Self::new(hostname, zone_id, token)?;
        tracing::debug!(
            "Loaded credentials for {} in zone {}",
            credentials.hostname,
            credentials.zone_id
        );
        Ok(credentials)
    }

    /// Record name to maintain
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Provider zone identifier
    pub fn zone_id(&self) -> &str {
        &self.zone_id
    }

    /// Bearer token
    /// ⚠️ NEVER log this value
    pub fn token(&self) -> &str {
        &self.token
    }
}

/// Read a single trimmed value from `path`
async fn read_value(what: &str, path: &Path) -> Result<String> {
    let content = fs::read_to_string(path).await.map_err(|e| {
        Error::config(format!(
            "Failed to read {} file {}: {}",
            what,
            path.display(),
            e
        ))
    })?;

    let value = content.trim();
    if value.is_empty() {
        return Err(Error::config(format!(
            "{} file {} is empty",
            what,
            path.display()
        )));
    }

    Ok(value.to_string())
}

fn validate_single_token(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::config(format!("{} cannot be empty", what)));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(Error::config(format!(
            "{} must be a single token without whitespace",
            what
        )));
    }
    Ok(())
}

/// Basic DNS name validation (RFC 1035 label rules)
fn validate_hostname(hostname: &str) -> Result<()> {
    if hostname.len() > 253 {
        return Err(Error::config(format!(
            "Hostname too long: {} chars (max 253). Got: {}",
            hostname.len(),
            hostname
        )));
    }

    for label in hostname.trim_end_matches('.').split('.') {
        if label.is_empty() {
            return Err(Error::config(format!(
                "Hostname has empty label: '{}'",
                hostname
            )));
        }

        if label.len() > 63 {
            return Err(Error::config(format!(
                "Hostname label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(Error::config(format!(
                "Hostname label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::config(format!(
                "Hostname label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}
