//! DNS record model shared by the cache, the provider and the reconciler

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

use crate::config::IpVersion;

/// Hostname that designates the zone apex rather than a named record
pub const ZONE_APEX: &str = "@";

/// DNS record type managed by the updater
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordType {
    /// IPv4 address record
    A,
    /// IPv6 address record
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// Wire name of the type ("A" / "AAAA")
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }

    /// The record type that carries this address
    pub fn for_addr(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => RecordType::A,
            IpAddr::V6(_) => RecordType::Aaaa,
        }
    }

    /// Address family of this record type
    pub fn version(&self) -> IpVersion {
        match self {
            RecordType::A => IpVersion::V4,
            RecordType::Aaaa => IpVersion::V6,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Natural key of a record within a zone
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    /// Record name (`@` for the zone apex)
    pub name: String,
    /// Record type
    pub record_type: RecordType,
}

impl RecordKey {
    pub fn new(name: impl Into<String>, record_type: RecordType) -> Self {
        Self {
            name: name.into(),
            record_type,
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.record_type)
    }
}

/// A single DNS entry as known to the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Record name (`@` for the zone apex)
    pub name: String,
    /// Record type
    #[serde(rename = "type")]
    pub record_type: RecordType,
    /// Record data, exactly as the provider stores it
    pub value: String,
    /// Provider-side identifier, absent until the record exists remotely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Zone the record belongs to
    pub zone_id: String,
    /// When this state was last confirmed against the provider
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// Create a record that has not been written to the provider yet
    pub fn new(
        zone_id: impl Into<String>,
        name: impl Into<String>,
        record_type: RecordType,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            record_type,
            value: value.into(),
            id: None,
            zone_id: zone_id.into(),
            updated_at: Utc::now(),
        }
    }

    /// Attach a provider identifier
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// The natural key of this record
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.name.clone(), self.record_type)
    }

    /// Whether this record is the zone apex
    pub fn is_apex(&self) -> bool {
        self.name == ZONE_APEX
    }

    /// Parse the stored value as an address
    ///
    /// Zone IPv6 data may carry a prefix length (`2001:db8::/64`); it is
    /// ignored here.
    pub fn ip(&self) -> Option<IpAddr> {
        let raw = self.value.trim();
        let raw = raw.split_once('/').map_or(raw, |(addr, _)| addr);
        raw.parse().ok()
    }

    /// Whether the stored value denotes `addr`
    pub fn matches(&self, addr: &IpAddr) -> bool {
        self.ip().is_some_and(|ip| ip == *addr)
    }

    /// Whether this entry is older than `max_age`
    pub fn is_stale(&self, max_age: chrono::Duration) -> bool {
        Utc::now().signed_duration_since(self.updated_at) > max_age
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv6_textual_variants_match() {
        let record = Record::new("1", "home", RecordType::Aaaa, "2001:DB8:0:0::1");
        assert!(record.matches(&"2001:db8::1".parse().unwrap()));
        assert!(!record.matches(&"2001:db8::2".parse().unwrap()));
    }

    #[test]
    fn prefix_length_is_ignored() {
        let record = Record::new("1", ZONE_APEX, RecordType::Aaaa, "2001:db8:1::/64");
        assert_eq!(record.ip(), Some("2001:db8:1::".parse().unwrap()));
        assert!(record.is_apex());
    }

    #[test]
    fn garbage_value_never_matches() {
        let record = Record::new("1", "home", RecordType::A, "not-an-ip");
        assert_eq!(record.ip(), None);
        assert!(!record.matches(&"1.2.3.4".parse().unwrap()));
    }

    #[test]
    fn record_type_serializes_as_wire_name() {
        let record = Record::new("1", "home", RecordType::Aaaa, "::1").with_id("42");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "AAAA");
        assert_eq!(json["id"], "42");

        let back: Record = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn staleness() {
        let mut record = Record::new("1", "home", RecordType::A, "1.2.3.4");
        assert!(!record.is_stale(chrono::Duration::hours(1)));
        record.updated_at = Utc::now() - chrono::Duration::hours(2);
        assert!(record.is_stale(chrono::Duration::hours(1)));
    }
}
