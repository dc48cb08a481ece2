// # dynv6 DNS Provider
//
// This crate provides a dynv6 DNS provider implementation for the DDNS updater.
//
// ## Implementation Status
//
// - ✅ One HTTP request per read, at most three per write
// - ✅ Full error propagation to the reconciler (no retries here)
// - ✅ HTTP timeout configured (default 30 seconds)
// - ✅ Specific error handling for HTTP status codes (401/403, 404, 409, 429, 5xx)
// - ✅ Both A and AAAA record support
// - ✅ Zone apex (`@`) support via the zone's own addresses
// - ✅ Idempotent upsert (never creates a duplicate record)
// - ❌ NO retry or backoff logic (a failed run is repeated by the scheduler)
// - ❌ NO caching (owned by the RecordCache)
// - ❌ NO zone discovery (the zone id is provisioned as a credential)
//
// ## Trust Level: Untrusted (DNS Provider)
//
// **Allowed Capabilities**:
// - ✅ Perform HTTP/HTTPS API calls to the configured API base only
// - ✅ Parse provider-specific responses
//
// **Forbidden Capabilities**:
// - ❌ Spawn tasks or threads
// - ❌ Access the record cache
// - ❌ Make scheduling decisions
//
// ## Security Requirements
//
// - API token NEVER appears in logs, `Debug` output or error messages
// - Provider MUST fail fast if the token is empty
//
// ## API Reference
//
// - dynv6 REST API v2: https://dynv6.github.io/api-spec/
// - Get Zone: GET `/zones/:zone_id`
// - Update Zone: PATCH `/zones/:zone_id` `{"ipv4address": .., "ipv6prefix": ..}`
// - List Records: GET `/zones/:zone_id/records`
// - Add Record: POST `/zones/:zone_id/records` `{"name", "type", "data"}`
// - Update Record: PATCH `/zones/:zone_id/records/:record_id` `{"name", "type", "data"}`

use async_trait::async_trait;
use chrono::Utc;
use ddns_core::config::ProviderConfig;
use ddns_core::traits::DnsProvider;
use ddns_core::{Error, Record, RecordType, Result, ZONE_APEX};
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Record or zone identifier as returned by the API
///
/// dynv6 uses integers; strings are accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
enum ApiId {
    Number(u64),
    Text(String),
}

impl fmt::Display for ApiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiId::Number(n) => write!(f, "{}", n),
            ApiId::Text(s) => f.write_str(s),
        }
    }
}

/// A record as returned by `/zones/:zone_id/records`
#[derive(Debug, Clone, Deserialize)]
struct ApiRecord {
    id: ApiId,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    #[serde(default)]
    data: String,
}

impl ApiRecord {
    fn is(&self, name: &str, record_type: RecordType) -> bool {
        self.name.eq_ignore_ascii_case(name)
            && self.record_type.eq_ignore_ascii_case(record_type.as_str())
    }

    /// Convert into a `Record` named as the caller asked for it
    ///
    /// Names match case-insensitively, so the provider's spelling may differ
    /// from the hostname used for the cache key.
    fn into_record(self, zone_id: &str, name: &str, record_type: RecordType) -> Record {
        Record {
            name: name.to_string(),
            record_type,
            value: self.data,
            id: Some(self.id.to_string()),
            zone_id: zone_id.to_string(),
            updated_at: Utc::now(),
        }
    }
}

/// A zone as returned by `/zones/:zone_id`
#[derive(Debug, Clone, Deserialize)]
struct ApiZone {
    id: ApiId,
    #[serde(default)]
    ipv4address: Option<String>,
    #[serde(default)]
    ipv6prefix: Option<String>,
}

impl ApiZone {
    /// The zone's own address of the given type, if set
    fn address(&self, record_type: RecordType) -> Option<&str> {
        let value = match record_type {
            RecordType::A => self.ipv4address.as_deref(),
            RecordType::Aaaa => self.ipv6prefix.as_deref(),
        };
        value.map(str::trim).filter(|v| !v.is_empty())
    }
}

/// Request body for record create / update
#[derive(Debug, Serialize)]
struct RecordBody<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    record_type: &'a str,
    data: &'a str,
}

/// dynv6 DNS provider
///
/// # Trust Level: Untrusted
///
/// Stateless and single-shot. Whether a write is needed at all is decided
/// by the `Reconciler` before this provider is called.
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the API token.
pub struct Dynv6Provider {
    /// dynv6 HTTP token
    /// ⚠️ NEVER log this value
    token: String,

    /// API base URL without trailing slash
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl fmt::Debug for Dynv6Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dynv6Provider")
            .field("token", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl Dynv6Provider {
    /// Create a new dynv6 provider
    ///
    /// # Parameters
    ///
    /// - `token`: dynv6 HTTP token (https://dynv6.com/keys)
    /// - `config`: API base URL and request timeout
    ///
    /// # Errors
    ///
    /// `Error::Config` if the token is empty or the HTTP client cannot be built.
    pub fn new(token: impl Into<String>, config: &ProviderConfig) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(Error::config("dynv6 API token cannot be empty"));
        }

        // Build HTTP client with timeout
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            token,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// API base URL in use
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn zone_url(&self, zone_id: &str) -> String {
        format!("{}/zones/{}", self.api_base, zone_id)
    }

    fn records_url(&self, zone_id: &str) -> String {
        format!("{}/zones/{}/records", self.api_base, zone_id)
    }

    fn record_url(&self, zone_id: &str, record_id: &str) -> String {
        format!("{}/zones/{}/records/{}", self.api_base, zone_id, record_id)
    }

    /// Send an authenticated request and map failures
    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<reqwest::Response> {
        let response = request
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| transport_error(context, &e))?;

        check_status(response, context).await
    }

    /// Get a zone
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id
    /// Authorization: Bearer <token>
    /// ```
    async fn get_zone(&self, zone_id: &str) -> Result<ApiZone> {
        tracing::debug!("Fetching zone {}", zone_id);
        let response = self
            .send(self.client.get(self.zone_url(zone_id)), "Zone lookup")
            .await?;
        decode(response, "zone").await
    }

    /// List all records of a zone
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id/records
    /// Authorization: Bearer <token>
    /// ```
    async fn list_records(&self, zone_id: &str) -> Result<Vec<ApiRecord>> {
        tracing::debug!("Listing records of zone {}", zone_id);
        let response = self
            .send(self.client.get(self.records_url(zone_id)), "Record lookup")
            .await?;
        decode(response, "record list").await
    }

    /// Look up a record by name and type
    async fn find_record(
        &self,
        zone_id: &str,
        hostname: &str,
        record_type: RecordType,
    ) -> Result<Option<ApiRecord>> {
        let records = self.list_records(zone_id).await?;
        Ok(records.into_iter().find(|r| r.is(hostname, record_type)))
    }

    /// Create a record
    ///
    /// # API Call
    ///
    /// ```http
    /// POST /zones/:zone_id/records
    /// {"name": "home", "type": "AAAA", "data": "2001:db8::1"}
    /// ```
    async fn create_record(&self, zone_id: &str, record: &Record) -> Result<Record> {
        tracing::info!(
            "Creating dynv6 record: {} ({}) -> {}",
            record.name,
            record.record_type,
            record.value
        );
        let body = RecordBody {
            name: &record.name,
            record_type: record.record_type.as_str(),
            data: &record.value,
        };
        let response = self
            .send(
                self.client.post(self.records_url(zone_id)).json(&body),
                "Record creation",
            )
            .await?;
        let created: ApiRecord = decode(response, "created record").await?;
        Ok(created.into_record(zone_id, &record.name, record.record_type))
    }

    /// Update a record by id
    ///
    /// # API Call
    ///
    /// ```http
    /// PATCH /zones/:zone_id/records/:record_id
    /// {"name": "home", "type": "AAAA", "data": "2001:db8::1"}
    /// ```
    async fn patch_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record: &Record,
    ) -> Result<Record> {
        tracing::info!(
            "Updating dynv6 record {}: {} ({}) -> {}",
            record_id,
            record.name,
            record.record_type,
            record.value
        );
        let body = RecordBody {
            name: &record.name,
            record_type: record.record_type.as_str(),
            data: &record.value,
        };
        let response = self
            .send(
                self.client
                    .patch(self.record_url(zone_id, record_id))
                    .json(&body),
                "Record update",
            )
            .await?;
        let updated: ApiRecord = decode(response, "updated record").await?;

        if updated.id.to_string() != record_id {
            return Err(Error::invalid_response(format!(
                "Attempted to update record {} but the API answered for record {}",
                record_id, updated.id
            )));
        }
        Ok(updated.into_record(zone_id, &record.name, record.record_type))
    }

    /// Update the zone's own address (zone apex)
    ///
    /// # API Call
    ///
    /// ```http
    /// PATCH /zones/:zone_id
    /// {"ipv6prefix": "2001:db8::1"}
    /// ```
    async fn patch_zone(&self, zone_id: &str, record: &Record) -> Result<Record> {
        let field = match record.record_type {
            RecordType::A => "ipv4address",
            RecordType::Aaaa => "ipv6prefix",
        };
        tracing::info!(
            "Updating dynv6 zone {}: {} -> {}",
            zone_id,
            field,
            record.value
        );
        let mut body = serde_json::Map::new();
        body.insert(
            field.to_string(),
            serde_json::Value::String(record.value.clone()),
        );
        let response = self
            .send(
                self.client.patch(self.zone_url(zone_id)).json(&body),
                "Zone update",
            )
            .await?;
        let zone: ApiZone = decode(response, "updated zone").await?;

        // The zone may store a normalized prefix; the written address is the
        // value future runs compare against.
        Ok(Record {
            name: ZONE_APEX.to_string(),
            record_type: record.record_type,
            value: record.value.clone(),
            id: Some(zone.id.to_string()),
            zone_id: zone_id.to_string(),
            updated_at: Utc::now(),
        })
    }
}

#[async_trait]
impl DnsProvider for Dynv6Provider {
    /// Query a record
    ///
    /// For the zone apex the zone's `ipv4address` / `ipv6prefix` is the
    /// record value and the zone id is the record id.
    async fn find(&self, zone_id: &str, hostname: &str, record_type: RecordType) -> Result<Record> {
        if hostname == ZONE_APEX {
            let zone = self.get_zone(zone_id).await?;
            let value = zone.address(record_type).ok_or_else(|| {
                Error::not_found(format!(
                    "Zone {} has no {} address",
                    zone_id, record_type
                ))
            })?;

            return Ok(Record {
                name: ZONE_APEX.to_string(),
                record_type,
                value: value.to_string(),
                id: Some(zone.id.to_string()),
                zone_id: zone_id.to_string(),
                updated_at: Utc::now(),
            });
        }

        match self.find_record(zone_id, hostname, record_type).await? {
            Some(record) => {
                tracing::debug!("Found record ID: {}", record.id);
                Ok(record.into_record(zone_id, hostname, record_type))
            }
            None => Err(Error::not_found(format!(
                "DNS record not found: {} (type: {}) in zone {}",
                hostname, record_type, zone_id
            ))),
        }
    }

    /// Create or update a record
    ///
    /// - zone apex → PATCH the zone
    /// - known id → PATCH the record; a 404 (deleted remotely) falls back to create
    /// - no id → look for an existing `(name, type)` match first, so a lost
    ///   cache never produces a duplicate record
    async fn upsert(&self, zone_id: &str, record: &Record) -> Result<Record> {
        if record.is_apex() {
            return self.patch_zone(zone_id, record).await;
        }

        let record_id = match &record.id {
            Some(id) => Some(id.clone()),
            None => self
                .find_record(zone_id, &record.name, record.record_type)
                .await?
                .map(|existing| existing.id.to_string()),
        };

        let Some(record_id) = record_id else {
            return self.create_record(zone_id, record).await;
        };

        match self.patch_record(zone_id, &record_id, record).await {
            Err(Error::Provider { status: 404, .. }) => {
                tracing::warn!(
                    "Record {} no longer exists in zone {}, creating it",
                    record_id,
                    zone_id
                );
                self.create_record(zone_id, record).await
            }
            result => result,
        }
    }

    fn provider_name(&self) -> &'static str {
        "dynv6"
    }
}

/// Map a transport failure to `Error::Network`
fn transport_error(context: &str, e: &reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::network(format!("{}: request timed out", context))
    } else if e.is_connect() {
        Error::network(format!("{}: connection failed: {}", context, e))
    } else {
        Error::network(format!("{}: HTTP request failed: {}", context, e))
    }
}

/// Map non-success HTTP statuses to `Error::Provider`
async fn check_status(response: reqwest::Response, context: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());

    let description = match status.as_u16() {
        401 | 403 => format!(
            "{}: authentication failed, invalid token or insufficient permissions",
            context
        ),
        404 => format!("{}: not found", context),
        409 => format!("{}: conflict, record is being modified concurrently", context),
        429 => format!("{}: rate limit exceeded, retry later", context),
        500..=599 => format!("{}: dynv6 server error (transient)", context),
        _ => format!("{} failed", context),
    };

    Err(Error::provider_with_context(status.as_u16(), description, error_text))
}

/// Decode a JSON success body
async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    what: &str,
) -> Result<T> {
    response
        .json()
        .await
        .map_err(|e| Error::invalid_response(format!("Failed to parse {}: {}", what, e)))
}
