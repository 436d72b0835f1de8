//! JSON snapshot persistence for [`MemoryGraph`].
//!
//! A snapshot is a flat dump of records and relations with their store ids
//! and timestamps. Loading replays them through the verbatim insert paths,
//! so a snapshot referencing an unknown asset id is rejected.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use oam_core::{AssetRecord, Relation};

use crate::client::{MemoryGraph, StoreError};

/// Serialized form of a graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub assets: Vec<AssetRecord>,
    #[serde(default)]
    pub relations: Vec<Relation>,
}

impl MemoryGraph {
    /// Build a graph from a snapshot. Records are inserted before relations.
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, StoreError> {
        let mut graph = Self::new();
        for record in snapshot.assets {
            graph.insert_record(record)?;
        }
        for relation in snapshot.relations {
            graph.insert_relation(relation)?;
        }
        Ok(graph)
    }

    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            assets: self.records.clone(),
            relations: self.relations.clone(),
        }
    }

    /// Read a snapshot file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let data = fs::read_to_string(path).map_err(|e| {
            StoreError::Snapshot(format!("failed to read {}: {e}", path.display()))
        })?;
        let snapshot: Snapshot = serde_json::from_str(&data)?;
        Self::from_snapshot(snapshot)
    }

    /// Write the graph as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.to_snapshot())?;
        fs::write(path.as_ref(), json)?;
        tracing::debug!(
            path = %path.as_ref().display(),
            assets = self.asset_count(),
            relations = self.relation_count(),
            "Saved graph snapshot"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use oam_core::{Asset, AssetId, RelationId};

    #[test]
    fn test_from_snapshot_preserves_ids() {
        let seen = Utc.with_ymd_and_hms(2024, 1, 5, 3, 0, 0).unwrap();
        let name = AssetRecord::new(Asset::fqdn("example.com"), seen, seen);
        let ip = AssetRecord::new(Asset::ip("93.184.216.34".parse().unwrap()), seen, seen);
        let relation = Relation {
            id: RelationId::new(),
            relation_type: "a_record".to_string(),
            from: name.id.clone(),
            to: ip.id.clone(),
            created_at: seen,
            last_seen: seen,
        };

        let graph = MemoryGraph::from_snapshot(Snapshot {
            assets: vec![name.clone(), ip],
            relations: vec![relation.clone()],
        })
        .unwrap();

        assert_eq!(graph.asset_count(), 2);
        assert_eq!(graph.records()[0].id, name.id);
        assert_eq!(graph.relations()[0], relation);
    }

    #[test]
    fn test_dangling_relation_rejected() {
        let seen = Utc::now();
        let name = AssetRecord::new(Asset::fqdn("example.com"), seen, seen);
        let relation = Relation {
            id: RelationId::new(),
            relation_type: "a_record".to_string(),
            from: name.id.clone(),
            to: AssetId::from("missing"),
            created_at: seen,
            last_seen: seen,
        };

        let err = MemoryGraph::from_snapshot(Snapshot {
            assets: vec![name],
            relations: vec![relation],
        })
        .unwrap_err();
        assert!(matches!(err, StoreError::Snapshot(_)));
    }

    #[test]
    fn test_empty_document_is_empty_graph() {
        let snapshot: Snapshot = serde_json::from_str("{}").unwrap();
        let graph = MemoryGraph::from_snapshot(snapshot).unwrap();
        assert_eq!(graph.asset_count(), 0);
        assert_eq!(graph.relation_count(), 0);
    }

    #[test]
    fn test_load_missing_file_errors() {
        let err = MemoryGraph::load("/nonexistent/oam-graph.json").unwrap_err();
        assert!(matches!(err, StoreError::Snapshot(_)));
    }
}
