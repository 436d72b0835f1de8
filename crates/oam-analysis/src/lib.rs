//! oam-analysis: traversal and aggregation over the OAM asset graph.
//!
//! Reads a discovery graph through the [`GraphQuery`] facade and answers
//! three questions for a scope of root domains: which names and addresses
//! were found (with an ASN summary), which names are new since a cutoff, and
//! how the discovered assets relate to each other for visualization. Every
//! operation is a synchronous, read-only pass; all working state is local
//! to one call.

pub mod aggregate;
pub mod delta;
pub mod error;
pub mod format;
pub mod identity;
pub mod policy;
pub mod resolve;
pub mod traversal;
pub mod types;

pub use error::AnalysisError;
pub use types::{AddressFilter, AsnInfo, AsnSummary, Edge, NameListing, Node, VizData};

use chrono::{DateTime, Utc};
use oam_core::scope::normalize_domains;
use oam_core::AssetKind;
use oam_graph::GraphQuery;

/// Entry point tying the engines to one graph store and one scope.
pub struct AnalysisEngine<G> {
    store: G,
    scope: Vec<String>,
    cutoff: Option<DateTime<Utc>>,
}

impl<G: GraphQuery> AnalysisEngine<G> {
    /// Create an engine over `store` with an empty scope and no cutoff.
    pub fn new(store: G) -> Self {
        Self {
            store,
            scope: Vec::new(),
            cutoff: None,
        }
    }

    /// Set the root domains. Blank and duplicate entries are dropped.
    pub fn with_scope<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.scope = normalize_domains(domains);
        self
    }

    /// Only consider records and relations last seen on or after `cutoff`.
    /// Times in other zones should be converted to UTC by the caller.
    pub fn with_cutoff(mut self, cutoff: Option<DateTime<Utc>>) -> Self {
        self.cutoff = cutoff;
        self
    }

    pub fn scope(&self) -> &[String] {
        &self.scope
    }

    pub fn store(&self) -> &G {
        &self.store
    }

    fn require_scope(&self) -> error::Result<()> {
        if self.scope.is_empty() {
            Err(AnalysisError::EmptyScope)
        } else {
            Ok(())
        }
    }

    /// Node and edge projection of everything reachable from the scope.
    pub fn visualize(&self) -> VizData {
        if self.require_scope().is_err() {
            return VizData::default();
        }
        traversal::traverse(&self.store, &self.scope, self.cutoff)
    }

    /// Names new since the cutoff, or since the start of the latest
    /// observation day when no cutoff is set.
    pub fn new_names(&self) -> Vec<String> {
        if self.require_scope().is_err() {
            return Vec::new();
        }
        delta::new_names(&self.store, &self.scope, self.cutoff)
    }

    /// Scope names with their resolved addresses and the ASN summary.
    pub fn discover_names(&self, filter: AddressFilter) -> NameListing {
        if self.require_scope().is_err() {
            return NameListing::default();
        }
        resolve::discover_names(&self.store, &self.scope, self.cutoff, filter)
    }

    /// ASN summary over every IP address reachable from the scope in the
    /// visualization traversal. A failed lookup drops only that address.
    pub fn asn_summary(&self) -> AsnSummary {
        if self.require_scope().is_err() {
            return AsnSummary::new();
        }

        let projection = self.visualize();
        let mut aggregator = aggregate::AsnAggregator::new(&self.store, self.cutoff);
        for node in projection
            .nodes
            .iter()
            .filter(|n| n.node_type == AssetKind::IpAddress)
        {
            let Ok(address) = node.label.parse() else {
                continue;
            };
            let records = match self
                .store
                .find_by_content(&oam_core::Asset::ip(address), self.cutoff)
            {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!(error = %e, %address, "Address lookup failed; skipping");
                    continue;
                }
            };
            for record in records {
                aggregator.add_address(&record);
            }
        }
        aggregator.finish()
    }
}
