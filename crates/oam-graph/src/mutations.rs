//! Write operations for the in-memory store.
//!
//! Upserts identify assets by (kind, content key) and relations by
//! (from, type, to), so re-recording an observation widens its time window
//! instead of duplicating it. The analysis engines never call these; they
//! exist for snapshot loading and for building fixtures.

use chrono::{DateTime, Utc};

use oam_core::{Asset, AssetId, AssetRecord, Relation, RelationId};

use crate::client::{MemoryGraph, StoreError};

impl MemoryGraph {
    // ── Asset Upserts ────────────────────────────────────────────

    /// Upsert an asset observed now.
    pub fn upsert_asset(&mut self, asset: Asset) -> AssetRecord {
        self.upsert_asset_at(asset, Utc::now())
    }

    /// Upsert an asset observed at `seen`.
    ///
    /// On create both timestamps are `seen`; on match `created_at` keeps the
    /// earliest observation and `last_seen` the latest.
    pub fn upsert_asset_at(&mut self, asset: Asset, seen: DateTime<Utc>) -> AssetRecord {
        let key = (asset.kind(), asset.key());
        if let Some(&i) = self.content_index.get(&key) {
            let record = &mut self.records[i];
            record.created_at = record.created_at.min(seen);
            record.last_seen = record.last_seen.max(seen);
            return record.clone();
        }

        let record = AssetRecord::new(asset, seen, seen);
        self.push_record(record.clone());
        record
    }

    /// Insert a record verbatim, keeping its id and timestamps.
    ///
    /// Content duplicates are allowed (content lookups return the first one);
    /// id duplicates are rejected.
    pub fn insert_record(&mut self, record: AssetRecord) -> Result<(), StoreError> {
        if self.record_index.contains_key(&record.id) {
            return Err(StoreError::Snapshot(format!(
                "duplicate asset id {}",
                record.id
            )));
        }
        self.push_record(record);
        Ok(())
    }

    fn push_record(&mut self, record: AssetRecord) {
        let pos = self.records.len();
        self.record_index.insert(record.id.clone(), pos);
        self.content_index
            .entry((record.asset.kind(), record.asset.key()))
            .or_insert(pos);
        self.records.push(record);
    }

    // ── Relation Upserts ─────────────────────────────────────────

    /// Link two existing assets, observed now.
    pub fn link(
        &mut self,
        from: &AssetId,
        relation_type: &str,
        to: &AssetId,
    ) -> Result<Relation, StoreError> {
        self.link_at(from, relation_type, to, Utc::now())
    }

    /// Link two existing assets, observed at `seen`.
    pub fn link_at(
        &mut self,
        from: &AssetId,
        relation_type: &str,
        to: &AssetId,
        seen: DateTime<Utc>,
    ) -> Result<Relation, StoreError> {
        self.ensure_endpoints(from, to)?;

        let key = (from.clone(), relation_type.to_string(), to.clone());
        if let Some(&i) = self.relation_index.get(&key) {
            let relation = &mut self.relations[i];
            relation.created_at = relation.created_at.min(seen);
            relation.last_seen = relation.last_seen.max(seen);
            return Ok(relation.clone());
        }

        let relation = Relation {
            id: RelationId::new(),
            relation_type: relation_type.to_string(),
            from: from.clone(),
            to: to.clone(),
            created_at: seen,
            last_seen: seen,
        };
        self.push_relation(relation.clone());
        Ok(relation)
    }

    /// Insert a relation verbatim. Both endpoints must already exist.
    pub fn insert_relation(&mut self, relation: Relation) -> Result<(), StoreError> {
        self.ensure_endpoints(&relation.from, &relation.to)
            .map_err(|e| StoreError::Snapshot(format!("relation {}: {e}", relation.id)))?;
        self.push_relation(relation);
        Ok(())
    }

    fn ensure_endpoints(&self, from: &AssetId, to: &AssetId) -> Result<(), StoreError> {
        for id in [from, to] {
            if self.record(id).is_none() {
                return Err(StoreError::NotFound { id: id.to_string() });
            }
        }
        Ok(())
    }

    fn push_relation(&mut self, relation: Relation) {
        let pos = self.relations.len();
        self.relation_index
            .entry((
                relation.from.clone(),
                relation.relation_type.clone(),
                relation.to.clone(),
            ))
            .or_insert(pos);
        self.outgoing
            .entry(relation.from.clone())
            .or_default()
            .push(pos);
        self.incoming.entry(relation.to.clone()).or_default().push(pos);
        self.relations.push(relation);
    }
}
