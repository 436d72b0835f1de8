//! Scope-rooted breadth-first traversal producing the visualization projection.
//!
//! Expansion proceeds level by level from the records matching the scope.
//! Nodes are deduplicated by label; edges never are, so a relation reached
//! twice is emitted twice. Store errors below the scope query only prune the
//! branch they occur on.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use oam_core::scope::domain_in_scope;
use oam_core::{Asset, AssetKind, AssetRecord, Relation};
use oam_graph::{GraphQuery, StoreError};

use crate::identity::{derive_identity, NodeIdentity};
use crate::policy::policy_for;
use crate::types::{Edge, Node, VizData};

/// Reverse-lookup relations whose newly found sources are not expanded further.
const PTR_RELATION: &str = "ptr_record";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Outgoing,
    Incoming,
}

/// Walk the graph outward from `scope` as of `cutoff`.
///
/// Returns an empty projection when the scope is empty or the scope query
/// itself fails.
pub fn traverse<G: GraphQuery>(
    store: &G,
    scope: &[String],
    cutoff: Option<DateTime<Utc>>,
) -> VizData {
    if scope.is_empty() {
        return VizData::default();
    }

    let roots: Vec<Asset> = scope.iter().map(Asset::fqdn).collect();
    let frontier = match store.find_by_scope(&roots, cutoff) {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(error = %e, "Scope query failed; returning empty projection");
            return VizData::default();
        }
    };

    let mut traversal = Traversal {
        store,
        scope,
        cutoff,
        nodes: Vec::new(),
        node_index: HashMap::new(),
        edges: Vec::new(),
    };
    traversal.run(frontier);

    VizData {
        nodes: traversal.nodes,
        edges: traversal.edges,
    }
}

/// State local to one traversal call.
struct Traversal<'a, G> {
    store: &'a G,
    scope: &'a [String],
    cutoff: Option<DateTime<Utc>>,
    nodes: Vec<Node>,
    /// Label → index into `nodes`.
    node_index: HashMap<String, usize>,
    edges: Vec<Edge>,
}

impl<'a, G: GraphQuery> Traversal<'a, G> {
    fn run(&mut self, mut frontier: Vec<AssetRecord>) {
        let mut level = 0usize;
        while !frontier.is_empty() {
            tracing::debug!(level, frontier = frontier.len(), "Expanding traversal level");

            let mut next = Vec::new();
            for record in frontier {
                self.expand(&record, &mut next);
            }
            frontier = next;
            level += 1;
        }
        tracing::debug!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            levels = level,
            "Traversal complete"
        );
    }

    fn expand(&mut self, record: &AssetRecord, next: &mut Vec<AssetRecord>) {
        let Some(identity) = derive_identity(self.store, record, self.cutoff) else {
            return;
        };
        let (index, _) = self.intern(&identity);

        let policy = policy_for(identity.kind);
        if policy.follow_outgoing {
            self.follow(record, index, Direction::Outgoing, policy.outgoing_labels, next);
        }

        let in_scope =
            identity.kind == AssetKind::Fqdn && domain_in_scope(&identity.label, self.scope);
        if policy.follows_incoming(in_scope) {
            self.follow(record, index, Direction::Incoming, policy.incoming_labels, next);
        }
    }

    /// Follow the relations of `record` in one direction, recording an edge
    /// for every resolvable neighbor and queueing neighbors seen for the
    /// first time.
    fn follow(
        &mut self,
        record: &AssetRecord,
        index: usize,
        direction: Direction,
        labels: &[&str],
        next: &mut Vec<AssetRecord>,
    ) {
        let relations = match direction {
            Direction::Outgoing => self.store.outgoing_relations(record, self.cutoff, labels),
            Direction::Incoming => self.store.incoming_relations(record, self.cutoff, labels),
        };
        let relations = match relations {
            Ok(relations) => relations,
            Err(e) => {
                log_pruned(&e, record, "relation query");
                return;
            }
        };

        for relation in relations {
            let neighbor_id = match direction {
                Direction::Outgoing => &relation.to,
                Direction::Incoming => &relation.from,
            };
            let neighbor = match self.store.find_by_id(neighbor_id, self.cutoff) {
                Ok(neighbor) => neighbor,
                Err(e) => {
                    log_pruned(&e, record, "neighbor lookup");
                    continue;
                }
            };
            let Some(identity) = derive_identity(self.store, &neighbor, self.cutoff) else {
                continue;
            };

            let (neighbor_index, is_new) = self.intern(&identity);
            if is_new && expands_further(direction, &relation) {
                next.push(neighbor);
            }

            let (from, to) = match direction {
                Direction::Outgoing => (index, neighbor_index),
                Direction::Incoming => (neighbor_index, index),
            };
            self.edges.push(Edge {
                from,
                to,
                label: relation.relation_type.clone(),
                title: relation.relation_type,
            });
        }
    }

    /// Index for `identity`, assigning the next one on first sight.
    fn intern(&mut self, identity: &NodeIdentity) -> (usize, bool) {
        if let Some(&index) = self.node_index.get(&identity.label) {
            return (index, false);
        }

        let index = self.nodes.len();
        self.node_index.insert(identity.label.clone(), index);
        self.nodes.push(Node {
            id: index,
            node_type: identity.kind,
            label: identity.label.clone(),
            title: identity.title(),
        });
        (index, true)
    }
}

fn expands_further(direction: Direction, relation: &Relation) -> bool {
    direction == Direction::Outgoing || relation.relation_type != PTR_RELATION
}

fn log_pruned(error: &StoreError, record: &AssetRecord, step: &str) {
    match error {
        StoreError::NotFound { .. } => {
            tracing::debug!(id = %record.id, step, error = %error, "Pruned traversal branch")
        }
        _ => tracing::warn!(id = %record.id, step, error = %error, "Pruned traversal branch"),
    }
}
