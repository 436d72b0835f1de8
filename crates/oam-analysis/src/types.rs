//! Output types produced by the analysis engines.

use std::collections::BTreeMap;
use std::net::IpAddr;

use ipnet::IpNet;
use serde::{Deserialize, Serialize};

use oam_core::AssetKind;

// ── Visualization Projection ─────────────────────────────────────

/// A deduplicated visualization node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Sequential index assigned on first appearance.
    pub id: usize,
    #[serde(rename = "type")]
    pub node_type: AssetKind,
    /// Deduplication key and display text.
    pub label: String,
    /// `"<type>: <label>"`.
    pub title: String,
}

/// A relation between two projected nodes, by index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub label: String,
    pub title: String,
}

/// Nodes in first-assignment order and edges in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VizData {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl VizData {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

// ── ASN Summary ──────────────────────────────────────────────────

/// Routing metadata accumulated for one autonomous system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsnInfo {
    /// Name of the managing RIR organization. Last one resolved wins.
    pub rir_name: String,
    /// Announced CIDR → number of resolved addresses attributed to it.
    pub cidrs: BTreeMap<IpNet, usize>,
}

/// ASN number → accumulated info.
pub type AsnSummary = BTreeMap<u32, AsnInfo>;

// ── Name Listing ─────────────────────────────────────────────────

/// Which address families the name resolver keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddressFilter {
    pub ipv4: bool,
    pub ipv6: bool,
}

impl AddressFilter {
    pub fn both() -> Self {
        Self {
            ipv4: true,
            ipv6: true,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        !self.ipv4 && !self.ipv6
    }

    pub fn accepts(&self, ip: &IpAddr) -> bool {
        match ip {
            IpAddr::V4(_) => self.ipv4,
            IpAddr::V6(_) => self.ipv6,
        }
    }
}

/// One resolved address with its routing attribution, when known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInfo {
    pub ip: IpAddr,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asn: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub netblock: Option<IpNet>,
    /// Managing RIR organization of the attributed ASN.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AddressInfo {
    pub fn unattributed(ip: IpAddr) -> Self {
        Self {
            ip,
            asn: None,
            cidr: None,
            netblock: None,
            description: None,
        }
    }
}

/// A discovered name and the addresses it resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRecord {
    pub name: String,
    pub addresses: Vec<AddressInfo>,
}

/// Result of the name listing use case.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameListing {
    pub names: Vec<NameRecord>,
    pub summary: AsnSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_filter_families() {
        let v4: IpAddr = "10.0.0.1".parse().unwrap();
        let v6: IpAddr = "2001:db8::1".parse().unwrap();

        assert!(AddressFilter::none().is_empty());
        assert!(AddressFilter::both().accepts(&v4));
        assert!(AddressFilter::both().accepts(&v6));

        let only_v6 = AddressFilter {
            ipv4: false,
            ipv6: true,
        };
        assert!(!only_v6.accepts(&v4));
        assert!(only_v6.accepts(&v6));
    }

    #[test]
    fn test_node_serializes_type_tag() {
        let node = Node {
            id: 0,
            node_type: AssetKind::Fqdn,
            label: "example.com".to_string(),
            title: "FQDN: example.com".to_string(),
        };
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "FQDN");
        assert_eq!(json["title"], "FQDN: example.com");
    }

    #[test]
    fn test_unattributed_address_omits_optionals() {
        let info = AddressInfo::unattributed("10.0.0.1".parse().unwrap());
        let json = serde_json::to_string(&info).unwrap();
        assert_eq!(json, r#"{"ip":"10.0.0.1"}"#);
    }
}
