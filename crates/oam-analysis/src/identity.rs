//! Node identity and display labels.
//!
//! Every asset record maps to at most one visualization node. The label is
//! both the display text and the deduplication key, so two distinct store
//! records rendering to the same label become one node.

use chrono::{DateTime, Utc};

use oam_core::{Asset, AssetKind, AssetRecord};
use oam_graph::GraphQuery;

/// Type tag and label derived for one asset record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    pub kind: AssetKind,
    pub label: String,
}

impl NodeIdentity {
    pub fn title(&self) -> String {
        format!("{}: {}", self.kind, self.label)
    }
}

/// Display label for an asset, or `None` when the asset never becomes a node.
///
/// Pure: does not consult the store. See [`derive_identity`] for the full rule.
pub fn display_label(asset: &Asset) -> Option<String> {
    let key = asset.key();
    if key.is_empty() {
        return None;
    }

    let label = match asset {
        Asset::Source { .. } => return None,
        Asset::AutnumRecord { handle, .. } => format!("{handle} - {key}"),
        Asset::ContactRecord { .. } => format!("Found->{key}"),
        // Empty fields still contribute their separator.
        Asset::Location {
            building_number,
            street_name,
            city,
            province,
            postal_code,
            ..
        } => [
            building_number.as_str(),
            street_name.as_str(),
            city.as_str(),
            province.as_str(),
            postal_code.as_str(),
        ]
        .join(" "),
        Asset::DomainRecord { .. } => format!("WHOIS: {key}"),
        Asset::TlsCertificate { serial_number, .. } => {
            format!("x509 Serial Number: {serial_number}")
        }
        _ => key,
    };
    Some(label)
}

/// Endpoint kinds that only become nodes when bound to a service.
fn requires_service(kind: AssetKind) -> bool {
    matches!(kind, AssetKind::NetworkEndpoint | AssetKind::SocketAddress)
}

/// Derive the node identity of a record as of `cutoff`.
///
/// Network endpoints and socket addresses are kept only when they have at
/// least one outgoing "service" relation; a store error while checking counts
/// as having none.
pub fn derive_identity<G: GraphQuery>(
    store: &G,
    record: &AssetRecord,
    cutoff: Option<DateTime<Utc>>,
) -> Option<NodeIdentity> {
    let label = display_label(&record.asset)?;
    let kind = record.kind();

    if requires_service(kind) {
        match store.outgoing_relations(record, cutoff, &["service"]) {
            Ok(rels) if !rels.is_empty() => {}
            Ok(_) => return None,
            Err(e) => {
                tracing::debug!(id = %record.id, error = %e, "Service check failed");
                return None;
            }
        }
    }

    Some(NodeIdentity { kind, label })
}
