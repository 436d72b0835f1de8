//! Store configuration and the in-memory graph store.

use std::collections::HashMap;
use std::path::PathBuf;

use oam_core::{AssetId, AssetKind, AssetRecord, Relation};

/// Errors from graph store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Asset not found: {id}")]
    NotFound { id: String },

    /// A backend failed to answer a query. `MemoryGraph` never fails this way.
    #[error("Query error: {0}")]
    Query(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration for opening a graph store.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub snapshot: PathBuf,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            snapshot: PathBuf::from("./oam-graph.json"),
        }
    }
}

/// In-memory asset graph.
///
/// Records and relations live in insertion-ordered arenas; side maps give
/// O(1) lookup by id, by content, and by relation direction. Query results
/// always follow insertion order, so repeated queries are deterministic.
#[derive(Debug, Clone, Default)]
pub struct MemoryGraph {
    pub(crate) records: Vec<AssetRecord>,
    pub(crate) relations: Vec<Relation>,
    pub(crate) record_index: HashMap<AssetId, usize>,
    pub(crate) content_index: HashMap<(AssetKind, String), usize>,
    pub(crate) relation_index: HashMap<(AssetId, String, AssetId), usize>,
    pub(crate) outgoing: HashMap<AssetId, Vec<usize>>,
    pub(crate) incoming: HashMap<AssetId, Vec<usize>>,
}

impl MemoryGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the snapshot named by the configuration.
    pub fn open(config: &GraphConfig) -> Result<Self, StoreError> {
        let graph = Self::load(&config.snapshot)?;
        tracing::info!(
            snapshot = %config.snapshot.display(),
            assets = graph.asset_count(),
            relations = graph.relation_count(),
            "Loaded graph snapshot"
        );
        Ok(graph)
    }

    pub fn asset_count(&self) -> usize {
        self.records.len()
    }

    pub fn relation_count(&self) -> usize {
        self.relations.len()
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[AssetRecord] {
        &self.records
    }

    /// All relations in insertion order.
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub(crate) fn record(&self, id: &AssetId) -> Option<&AssetRecord> {
        self.record_index.get(id).map(|&i| &self.records[i])
    }
}
