//! Read operations: the graph query facade and its in-memory implementation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use oam_core::scope::domain_in_scope;
use oam_core::{Asset, AssetId, AssetKind, AssetRecord, Relation};

use crate::client::{MemoryGraph, StoreError};

/// Read-only query interface over an asset graph.
///
/// Every query takes an optional cutoff with "as of" semantics: records and
/// relations last seen before the cutoff are invisible. `None` applies no
/// time bound. Implementations must be safe to share for concurrent reads.
pub trait GraphQuery {
    /// Records matching any scope constraint. An FQDN constraint matches that
    /// name and every subdomain below it; other constraints match by content.
    fn find_by_scope(
        &self,
        scope: &[Asset],
        cutoff: Option<DateTime<Utc>>,
    ) -> Result<Vec<AssetRecord>, StoreError>;

    fn find_by_id(
        &self,
        id: &AssetId,
        cutoff: Option<DateTime<Utc>>,
    ) -> Result<AssetRecord, StoreError>;

    fn find_by_content(
        &self,
        asset: &Asset,
        cutoff: Option<DateTime<Utc>>,
    ) -> Result<Vec<AssetRecord>, StoreError>;

    fn find_by_type(
        &self,
        kind: AssetKind,
        cutoff: Option<DateTime<Utc>>,
    ) -> Result<Vec<AssetRecord>, StoreError>;

    /// Relations leaving `record`. An empty `labels` slice matches every label.
    fn outgoing_relations(
        &self,
        record: &AssetRecord,
        cutoff: Option<DateTime<Utc>>,
        labels: &[&str],
    ) -> Result<Vec<Relation>, StoreError>;

    /// Relations arriving at `record`. An empty `labels` slice matches every label.
    fn incoming_relations(
        &self,
        record: &AssetRecord,
        cutoff: Option<DateTime<Utc>>,
        labels: &[&str],
    ) -> Result<Vec<Relation>, StoreError>;
}

impl<G: GraphQuery + ?Sized> GraphQuery for &G {
    fn find_by_scope(
        &self,
        scope: &[Asset],
        cutoff: Option<DateTime<Utc>>,
    ) -> Result<Vec<AssetRecord>, StoreError> {
        (**self).find_by_scope(scope, cutoff)
    }

    fn find_by_id(
        &self,
        id: &AssetId,
        cutoff: Option<DateTime<Utc>>,
    ) -> Result<AssetRecord, StoreError> {
        (**self).find_by_id(id, cutoff)
    }

    fn find_by_content(
        &self,
        asset: &Asset,
        cutoff: Option<DateTime<Utc>>,
    ) -> Result<Vec<AssetRecord>, StoreError> {
        (**self).find_by_content(asset, cutoff)
    }

    fn find_by_type(
        &self,
        kind: AssetKind,
        cutoff: Option<DateTime<Utc>>,
    ) -> Result<Vec<AssetRecord>, StoreError> {
        (**self).find_by_type(kind, cutoff)
    }

    fn outgoing_relations(
        &self,
        record: &AssetRecord,
        cutoff: Option<DateTime<Utc>>,
        labels: &[&str],
    ) -> Result<Vec<Relation>, StoreError> {
        (**self).outgoing_relations(record, cutoff, labels)
    }

    fn incoming_relations(
        &self,
        record: &AssetRecord,
        cutoff: Option<DateTime<Utc>>,
        labels: &[&str],
    ) -> Result<Vec<Relation>, StoreError> {
        (**self).incoming_relations(record, cutoff, labels)
    }
}

impl GraphQuery for MemoryGraph {
    fn find_by_scope(
        &self,
        scope: &[Asset],
        cutoff: Option<DateTime<Utc>>,
    ) -> Result<Vec<AssetRecord>, StoreError> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.visible_at(cutoff))
            .filter(|r| scope.iter().any(|c| matches_constraint(&r.asset, c)))
            .cloned()
            .collect())
    }

    fn find_by_id(
        &self,
        id: &AssetId,
        cutoff: Option<DateTime<Utc>>,
    ) -> Result<AssetRecord, StoreError> {
        self.record(id)
            .filter(|r| r.visible_at(cutoff))
            .cloned()
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    fn find_by_content(
        &self,
        asset: &Asset,
        cutoff: Option<DateTime<Utc>>,
    ) -> Result<Vec<AssetRecord>, StoreError> {
        Ok(self
            .content_index
            .get(&(asset.kind(), asset.key()))
            .map(|&i| &self.records[i])
            .filter(|r| r.visible_at(cutoff))
            .cloned()
            .into_iter()
            .collect())
    }

    fn find_by_type(
        &self,
        kind: AssetKind,
        cutoff: Option<DateTime<Utc>>,
    ) -> Result<Vec<AssetRecord>, StoreError> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.kind() == kind && r.visible_at(cutoff))
            .cloned()
            .collect())
    }

    fn outgoing_relations(
        &self,
        record: &AssetRecord,
        cutoff: Option<DateTime<Utc>>,
        labels: &[&str],
    ) -> Result<Vec<Relation>, StoreError> {
        self.directed(&self.outgoing, &record.id, cutoff, labels)
    }

    fn incoming_relations(
        &self,
        record: &AssetRecord,
        cutoff: Option<DateTime<Utc>>,
        labels: &[&str],
    ) -> Result<Vec<Relation>, StoreError> {
        self.directed(&self.incoming, &record.id, cutoff, labels)
    }
}

impl MemoryGraph {
    fn directed(
        &self,
        adjacency: &HashMap<AssetId, Vec<usize>>,
        id: &AssetId,
        cutoff: Option<DateTime<Utc>>,
        labels: &[&str],
    ) -> Result<Vec<Relation>, StoreError> {
        if self.record(id).is_none() {
            return Err(StoreError::NotFound { id: id.to_string() });
        }

        Ok(adjacency
            .get(id)
            .map(|positions| {
                positions
                    .iter()
                    .map(|&i| &self.relations[i])
                    .filter(|rel| rel.visible_at(cutoff) && rel.matches_labels(labels))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

fn matches_constraint(asset: &Asset, constraint: &Asset) -> bool {
    match (asset, constraint) {
        (Asset::Fqdn { name }, Asset::Fqdn { name: root }) => {
            domain_in_scope(name, std::slice::from_ref(root))
        }
        _ => asset.same_content(constraint),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 5, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_scope_matches_subdomains_only() {
        let mut graph = MemoryGraph::new();
        graph.upsert_asset_at(Asset::fqdn("example.com"), ts(1));
        graph.upsert_asset_at(Asset::fqdn("www.example.com"), ts(1));
        graph.upsert_asset_at(Asset::fqdn("badexample.com"), ts(1));
        graph.upsert_asset_at(Asset::ip("93.184.216.34".parse().unwrap()), ts(1));

        let found = graph
            .find_by_scope(&[Asset::fqdn("example.com")], None)
            .unwrap();
        let names: Vec<String> = found.iter().map(|r| r.asset.key()).collect();
        assert_eq!(names, vec!["example.com", "www.example.com"]);
    }

    #[test]
    fn test_scope_respects_cutoff() {
        let mut graph = MemoryGraph::new();
        graph.upsert_asset_at(Asset::fqdn("old.example.com"), ts(1));
        graph.upsert_asset_at(Asset::fqdn("new.example.com"), ts(5));

        let found = graph
            .find_by_scope(&[Asset::fqdn("example.com")], Some(ts(3)))
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].asset.key(), "new.example.com");
    }

    #[test]
    fn test_find_by_id_hidden_before_cutoff() {
        let mut graph = MemoryGraph::new();
        let rec = graph.upsert_asset_at(Asset::fqdn("example.com"), ts(1));

        assert!(graph.find_by_id(&rec.id, Some(ts(1))).is_ok());
        let err = graph.find_by_id(&rec.id, Some(ts(2))).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn test_find_by_content_and_type() {
        let mut graph = MemoryGraph::new();
        let ip = Asset::ip("10.0.0.1".parse().unwrap());
        graph.upsert_asset_at(ip.clone(), ts(1));
        graph.upsert_asset_at(Asset::fqdn("example.com"), ts(1));

        assert_eq!(graph.find_by_content(&ip, None).unwrap().len(), 1);
        assert!(graph
            .find_by_content(&Asset::ip("10.0.0.2".parse().unwrap()), None)
            .unwrap()
            .is_empty());
        assert_eq!(graph.find_by_type(AssetKind::Fqdn, None).unwrap().len(), 1);
        assert!(graph
            .find_by_type(AssetKind::Netblock, None)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_relations_filtered_by_label_and_direction() {
        let mut graph = MemoryGraph::new();
        let nb = graph.upsert_asset_at(Asset::netblock("10.0.0.0/24".parse().unwrap()), ts(1));
        let ip = graph.upsert_asset_at(Asset::ip("10.0.0.1".parse().unwrap()), ts(1));
        let asn = graph.upsert_asset_at(Asset::autonomous_system(64512), ts(1));
        graph.link_at(&nb.id, "contains", &ip.id, ts(1)).unwrap();
        graph.link_at(&asn.id, "announces", &nb.id, ts(1)).unwrap();

        let incoming = graph.incoming_relations(&nb, None, &[]).unwrap();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].relation_type, "announces");

        let outgoing = graph.outgoing_relations(&nb, None, &["contains"]).unwrap();
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].to, ip.id);

        assert!(graph
            .outgoing_relations(&nb, None, &["announces"])
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_relations_of_unknown_record_error() {
        let graph = MemoryGraph::new();
        let stray = AssetRecord::new(Asset::fqdn("example.com"), ts(1), ts(1));
        assert!(graph.outgoing_relations(&stray, None, &[]).is_err());
        assert!(graph.incoming_relations(&stray, None, &[]).is_err());
    }
}
