//! Per-kind expansion policy for the traversal engine.
//!
//! The traversal loop itself is kind-agnostic; which relations it follows
//! from a node is looked up here.

use oam_core::AssetKind;

/// When incoming relations of a node are followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Incoming {
    Never,
    Always,
    /// Only when the node's label is a scope domain or below one.
    WhenInScope,
}

/// Relations the traversal follows from a node of one kind.
///
/// An empty label list means every label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionPolicy {
    pub follow_outgoing: bool,
    pub outgoing_labels: &'static [&'static str],
    pub incoming: Incoming,
    pub incoming_labels: &'static [&'static str],
}

impl ExpansionPolicy {
    const NONE: Self = Self {
        follow_outgoing: false,
        outgoing_labels: &[],
        incoming: Incoming::Never,
        incoming_labels: &[],
    };

    const OUTGOING_ALL: Self = Self {
        follow_outgoing: true,
        ..Self::NONE
    };

    /// Whether incoming relations are followed, given the scope decision.
    pub fn follows_incoming(&self, in_scope: bool) -> bool {
        match self.incoming {
            Incoming::Never => false,
            Incoming::Always => true,
            Incoming::WhenInScope => in_scope,
        }
    }
}

pub fn policy_for(kind: AssetKind) -> ExpansionPolicy {
    match kind {
        AssetKind::Fqdn => ExpansionPolicy {
            incoming: Incoming::WhenInScope,
            ..ExpansionPolicy::OUTGOING_ALL
        },
        AssetKind::IpAddress => ExpansionPolicy {
            incoming: Incoming::Always,
            incoming_labels: &["contains"],
            ..ExpansionPolicy::OUTGOING_ALL
        },
        AssetKind::Netblock => ExpansionPolicy {
            incoming: Incoming::Always,
            incoming_labels: &["announces"],
            ..ExpansionPolicy::NONE
        },
        AssetKind::AutonomousSystem => ExpansionPolicy {
            outgoing_labels: &["registration"],
            ..ExpansionPolicy::OUTGOING_ALL
        },
        AssetKind::SocketAddress
        | AssetKind::NetworkEndpoint
        | AssetKind::EmailAddress
        | AssetKind::Url
        | AssetKind::Location
        | AssetKind::Phone
        | AssetKind::Organization
        | AssetKind::Person
        | AssetKind::TlsCertificate
        | AssetKind::DomainRecord
        | AssetKind::Service
        | AssetKind::AutnumRecord
        | AssetKind::ContactRecord => ExpansionPolicy::OUTGOING_ALL,
        AssetKind::Fingerprint | AssetKind::Source | AssetKind::RirOrganization => {
            ExpansionPolicy::NONE
        }
    }
}
