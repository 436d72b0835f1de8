//! Asset types stored in the discovery graph.
//!
//! These mirror the Open Asset Model categories written by the discovery
//! engine. The analysis tools consume them read-only: every record and
//! relation is owned by the store.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use chrono::{DateTime, Utc};
use ipnet::IpNet;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Identifiers ───────────────────────────────────────────────────

/// Store-assigned identifier of an asset record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct AssetId(pub String);

impl AssetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Store-assigned identifier of a relation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct RelationId(pub String);

impl RelationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for RelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Asset Kinds ───────────────────────────────────────────────────

/// The category of an asset. Serialized with the Open Asset Model type tags.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetKind {
    #[serde(rename = "FQDN")]
    Fqdn,
    #[serde(rename = "IPAddress")]
    IpAddress,
    Netblock,
    AutonomousSystem,
    #[serde(rename = "RIROrganization")]
    RirOrganization,
    AutnumRecord,
    ContactRecord,
    Location,
    DomainRecord,
    #[serde(rename = "TLSCertificate")]
    TlsCertificate,
    NetworkEndpoint,
    SocketAddress,
    EmailAddress,
    Phone,
    Organization,
    Person,
    #[serde(rename = "URL")]
    Url,
    Fingerprint,
    Service,
    Source,
}

impl AssetKind {
    pub const ALL: [AssetKind; 20] = [
        AssetKind::Fqdn,
        AssetKind::IpAddress,
        AssetKind::Netblock,
        AssetKind::AutonomousSystem,
        AssetKind::RirOrganization,
        AssetKind::AutnumRecord,
        AssetKind::ContactRecord,
        AssetKind::Location,
        AssetKind::DomainRecord,
        AssetKind::TlsCertificate,
        AssetKind::NetworkEndpoint,
        AssetKind::SocketAddress,
        AssetKind::EmailAddress,
        AssetKind::Phone,
        AssetKind::Organization,
        AssetKind::Person,
        AssetKind::Url,
        AssetKind::Fingerprint,
        AssetKind::Service,
        AssetKind::Source,
    ];

    /// The type tag used in titles and serialized output.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Fqdn => "FQDN",
            AssetKind::IpAddress => "IPAddress",
            AssetKind::Netblock => "Netblock",
            AssetKind::AutonomousSystem => "AutonomousSystem",
            AssetKind::RirOrganization => "RIROrganization",
            AssetKind::AutnumRecord => "AutnumRecord",
            AssetKind::ContactRecord => "ContactRecord",
            AssetKind::Location => "Location",
            AssetKind::DomainRecord => "DomainRecord",
            AssetKind::TlsCertificate => "TLSCertificate",
            AssetKind::NetworkEndpoint => "NetworkEndpoint",
            AssetKind::SocketAddress => "SocketAddress",
            AssetKind::EmailAddress => "EmailAddress",
            AssetKind::Phone => "Phone",
            AssetKind::Organization => "Organization",
            AssetKind::Person => "Person",
            AssetKind::Url => "URL",
            AssetKind::Fingerprint => "Fingerprint",
            AssetKind::Service => "Service",
            AssetKind::Source => "Source",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Assets ────────────────────────────────────────────────────────

/// The typed content of an asset record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "asset_type")]
pub enum Asset {
    #[serde(rename = "FQDN")]
    Fqdn { name: String },
    #[serde(rename = "IPAddress")]
    IpAddress { address: IpAddr },
    Netblock { cidr: IpNet },
    AutonomousSystem { number: u32 },
    #[serde(rename = "RIROrganization")]
    RirOrganization {
        name: String,
        #[serde(default)]
        rir_id: String,
        #[serde(default)]
        rir: String,
    },
    AutnumRecord {
        number: u32,
        handle: String,
        name: String,
    },
    ContactRecord { discovered_at: String },
    Location {
        address: String,
        #[serde(default)]
        building_number: String,
        #[serde(default)]
        street_name: String,
        #[serde(default)]
        city: String,
        #[serde(default)]
        province: String,
        #[serde(default)]
        postal_code: String,
        #[serde(default)]
        country: String,
    },
    DomainRecord {
        domain: String,
        #[serde(default)]
        registrar: Option<String>,
    },
    #[serde(rename = "TLSCertificate")]
    TlsCertificate {
        serial_number: String,
        #[serde(default)]
        subject_common_name: String,
    },
    NetworkEndpoint { address: String },
    SocketAddress { address: SocketAddr },
    EmailAddress { address: String },
    Phone { raw: String },
    Organization { name: String },
    Person { full_name: String },
    #[serde(rename = "URL")]
    Url { raw: String },
    Fingerprint { value: String },
    Service { identifier: String },
    Source {
        name: String,
        #[serde(default)]
        confidence: u8,
    },
}

impl Asset {
    pub fn fqdn(name: impl Into<String>) -> Self {
        Asset::Fqdn { name: name.into() }
    }

    pub fn ip(address: IpAddr) -> Self {
        Asset::IpAddress { address }
    }

    pub fn netblock(cidr: IpNet) -> Self {
        Asset::Netblock { cidr }
    }

    pub fn autonomous_system(number: u32) -> Self {
        Asset::AutonomousSystem { number }
    }

    pub fn rir_organization(name: impl Into<String>) -> Self {
        Asset::RirOrganization {
            name: name.into(),
            rir_id: String::new(),
            rir: String::new(),
        }
    }

    pub fn kind(&self) -> AssetKind {
        match self {
            Asset::Fqdn { .. } => AssetKind::Fqdn,
            Asset::IpAddress { .. } => AssetKind::IpAddress,
            Asset::Netblock { .. } => AssetKind::Netblock,
            Asset::AutonomousSystem { .. } => AssetKind::AutonomousSystem,
            Asset::RirOrganization { .. } => AssetKind::RirOrganization,
            Asset::AutnumRecord { .. } => AssetKind::AutnumRecord,
            Asset::ContactRecord { .. } => AssetKind::ContactRecord,
            Asset::Location { .. } => AssetKind::Location,
            Asset::DomainRecord { .. } => AssetKind::DomainRecord,
            Asset::TlsCertificate { .. } => AssetKind::TlsCertificate,
            Asset::NetworkEndpoint { .. } => AssetKind::NetworkEndpoint,
            Asset::SocketAddress { .. } => AssetKind::SocketAddress,
            Asset::EmailAddress { .. } => AssetKind::EmailAddress,
            Asset::Phone { .. } => AssetKind::Phone,
            Asset::Organization { .. } => AssetKind::Organization,
            Asset::Person { .. } => AssetKind::Person,
            Asset::Url { .. } => AssetKind::Url,
            Asset::Fingerprint { .. } => AssetKind::Fingerprint,
            Asset::Service { .. } => AssetKind::Service,
            Asset::Source { .. } => AssetKind::Source,
        }
    }

    /// Canonical content key: the value the store uses to identify this asset
    /// by content. May be empty for partially populated records.
    pub fn key(&self) -> String {
        match self {
            Asset::Fqdn { name } => name.clone(),
            Asset::IpAddress { address } => address.to_string(),
            Asset::Netblock { cidr } => cidr.to_string(),
            Asset::AutonomousSystem { number } => number.to_string(),
            Asset::RirOrganization { name, .. } => name.clone(),
            Asset::AutnumRecord { name, .. } => name.clone(),
            Asset::ContactRecord { discovered_at } => discovered_at.clone(),
            Asset::Location { address, .. } => address.clone(),
            Asset::DomainRecord { domain, .. } => domain.clone(),
            Asset::TlsCertificate { serial_number, .. } => serial_number.clone(),
            Asset::NetworkEndpoint { address } => address.clone(),
            Asset::SocketAddress { address } => address.to_string(),
            Asset::EmailAddress { address } => address.clone(),
            Asset::Phone { raw } => raw.clone(),
            Asset::Organization { name } => name.clone(),
            Asset::Person { full_name } => full_name.clone(),
            Asset::Url { raw } => raw.clone(),
            Asset::Fingerprint { value } => value.clone(),
            Asset::Service { identifier } => identifier.clone(),
            Asset::Source { name, .. } => name.clone(),
        }
    }

    /// Whether two assets have the same kind and content key.
    pub fn same_content(&self, other: &Asset) -> bool {
        self.kind() == other.kind() && self.key() == other.key()
    }
}

// ── Records ───────────────────────────────────────────────────────

/// An asset as persisted by the store, with identity and observation times.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssetRecord {
    pub id: AssetId,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub asset: Asset,
}

impl AssetRecord {
    pub fn new(asset: Asset, created_at: DateTime<Utc>, last_seen: DateTime<Utc>) -> Self {
        Self {
            id: AssetId::new(),
            created_at,
            last_seen,
            asset,
        }
    }

    pub fn kind(&self) -> AssetKind {
        self.asset.kind()
    }

    /// Visible under "as of" semantics: last seen on or after the cutoff.
    pub fn visible_at(&self, cutoff: Option<DateTime<Utc>>) -> bool {
        seen_since(self.last_seen, cutoff)
    }
}

/// A directed, labeled edge between two asset records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Relation {
    pub id: RelationId,
    #[serde(rename = "type")]
    pub relation_type: String,
    pub from: AssetId,
    pub to: AssetId,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl Relation {
    pub fn visible_at(&self, cutoff: Option<DateTime<Utc>>) -> bool {
        seen_since(self.last_seen, cutoff)
    }

    /// Label filter used by relation queries. An empty filter matches every label.
    pub fn matches_labels(&self, labels: &[&str]) -> bool {
        labels.is_empty() || labels.iter().any(|l| *l == self.relation_type)
    }
}

fn seen_since(last_seen: DateTime<Utc>, cutoff: Option<DateTime<Utc>>) -> bool {
    cutoff.map_or(true, |c| last_seen >= c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn asset_record_serialization_roundtrip() {
        let seen = Utc.with_ymd_and_hms(2024, 1, 5, 3, 0, 0).unwrap();
        let record = AssetRecord::new(
            Asset::netblock("93.184.216.0/24".parse().unwrap()),
            seen,
            seen,
        );

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"asset_type\":\"Netblock\""));
        assert!(json.contains("\"cidr\":\"93.184.216.0/24\""));

        let deserialized: AssetRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, deserialized);
    }

    #[test]
    fn asset_kind_serializes_with_type_tags() {
        let json = serde_json::to_string(&AssetKind::Fqdn).unwrap();
        assert_eq!(json, "\"FQDN\"");

        let json = serde_json::to_string(&AssetKind::TlsCertificate).unwrap();
        assert_eq!(json, "\"TLSCertificate\"");

        for kind in AssetKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn content_keys() {
        assert_eq!(Asset::fqdn("www.example.com").key(), "www.example.com");
        assert_eq!(Asset::ip("93.184.216.34".parse().unwrap()).key(), "93.184.216.34");
        assert_eq!(Asset::autonomous_system(15133).key(), "15133");
        assert_eq!(
            Asset::SocketAddress {
                address: "10.0.0.1:443".parse().unwrap()
            }
            .key(),
            "10.0.0.1:443"
        );
    }

    #[test]
    fn location_defaults_missing_fields() {
        let json = r#"{"asset_type":"Location","address":"1 Main St","city":"Springfield"}"#;
        let asset: Asset = serde_json::from_str(json).unwrap();
        match asset {
            Asset::Location {
                city, street_name, ..
            } => {
                assert_eq!(city, "Springfield");
                assert!(street_name.is_empty());
            }
            other => panic!("unexpected asset: {other:?}"),
        }
    }

    #[test]
    fn cutoff_visibility() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap();
        let record = AssetRecord::new(Asset::fqdn("example.com"), t0, t0);

        assert!(record.visible_at(None));
        assert!(record.visible_at(Some(t0)));
        assert!(!record.visible_at(Some(t0 + chrono::Duration::seconds(1))));
    }

    #[test]
    fn relation_label_filter() {
        let now = Utc::now();
        let rel = Relation {
            id: RelationId::new(),
            relation_type: "contains".to_string(),
            from: AssetId::from("a"),
            to: AssetId::from("b"),
            created_at: now,
            last_seen: now,
        };

        assert!(rel.matches_labels(&[]));
        assert!(rel.matches_labels(&["announces", "contains"]));
        assert!(!rel.matches_labels(&["announces"]));
    }
}
