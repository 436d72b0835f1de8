//! ASN summary aggregation.
//!
//! Each address is walked to its containing netblocks ("contains", incoming),
//! each netblock to its announcing autonomous systems ("announces", incoming),
//! and each system to its RIR organization ("managed_by", outgoing). Every
//! (address, netblock, ASN) triple bumps that netblock's count once.

use chrono::{DateTime, Utc};
use ipnet::IpNet;

use oam_core::{Asset, AssetKind, AssetRecord};
use oam_graph::GraphQuery;

use crate::error::{AnalysisError, Result};
use crate::types::AsnSummary;

/// Where one address was attributed during aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    pub asn: u32,
    pub netblock: IpNet,
    /// RIR name of the ASN at the time of attribution. Empty when unresolved.
    pub rir_name: String,
}

/// Incremental ASN summary builder.
///
/// Errors never abort aggregation: a failed query or an unexpected asset
/// kind is logged and only its branch is skipped.
pub struct AsnAggregator<'a, G> {
    store: &'a G,
    cutoff: Option<DateTime<Utc>>,
    summary: AsnSummary,
}

impl<'a, G: GraphQuery> AsnAggregator<'a, G> {
    pub fn new(store: &'a G, cutoff: Option<DateTime<Utc>>) -> Self {
        Self {
            store,
            cutoff,
            summary: AsnSummary::new(),
        }
    }

    /// Fold one IP address record into the summary.
    ///
    /// Returns the attributions made for it, in discovery order.
    pub fn add_address(&mut self, address: &AssetRecord) -> Vec<Attribution> {
        if let Err(e) = expect_kind(address, AssetKind::IpAddress) {
            tracing::warn!(id = %address.id, error = %e, "Skipping non-address record");
            return Vec::new();
        }

        let netblocks = match self.netblocks_of(address) {
            Ok(netblocks) => netblocks,
            Err(e) => {
                tracing::warn!(id = %address.id, error = %e, "Netblock lookup failed");
                return Vec::new();
            }
        };

        let mut attributions = Vec::new();
        for (netblock, cidr) in netblocks {
            match self.attribute(&netblock, cidr) {
                Ok(mut found) => attributions.append(&mut found),
                Err(e) => {
                    tracing::warn!(id = %netblock.id, error = %e, "ASN lookup failed");
                }
            }
        }
        attributions
    }

    pub fn summary(&self) -> &AsnSummary {
        &self.summary
    }

    pub fn finish(self) -> AsnSummary {
        self.summary
    }

    fn netblocks_of(&self, address: &AssetRecord) -> Result<Vec<(AssetRecord, IpNet)>> {
        let relations = self
            .store
            .incoming_relations(address, self.cutoff, &["contains"])?;

        let mut netblocks = Vec::new();
        for relation in relations {
            let record = match self.store.find_by_id(&relation.from, self.cutoff) {
                Ok(record) => record,
                Err(e) => {
                    tracing::debug!(id = %relation.from, error = %e, "Netblock not visible");
                    continue;
                }
            };
            let cidr = match &record.asset {
                Asset::Netblock { cidr } => *cidr,
                _ => {
                    log_mismatch(&record, AssetKind::Netblock);
                    continue;
                }
            };
            netblocks.push((record, cidr));
        }
        Ok(netblocks)
    }

    /// Credit `cidr` to every ASN announcing `netblock`.
    fn attribute(&mut self, netblock: &AssetRecord, cidr: IpNet) -> Result<Vec<Attribution>> {
        let relations = self
            .store
            .incoming_relations(netblock, self.cutoff, &["announces"])?;

        let mut attributions = Vec::new();
        for relation in relations {
            let record = match self.store.find_by_id(&relation.from, self.cutoff) {
                Ok(record) => record,
                Err(e) => {
                    tracing::debug!(id = %relation.from, error = %e, "ASN not visible");
                    continue;
                }
            };
            let Asset::AutonomousSystem { number } = record.asset else {
                log_mismatch(&record, AssetKind::AutonomousSystem);
                continue;
            };

            let rir = self.resolve_rir(&record, number);
            let info = self.summary.entry(number).or_default();
            *info.cidrs.entry(cidr).or_insert(0) += 1;
            if let Some(name) = rir {
                info.rir_name = name;
            }

            attributions.push(Attribution {
                asn: number,
                netblock: cidr,
                rir_name: info.rir_name.clone(),
            });
        }
        Ok(attributions)
    }

    /// Name of the RIR organization managing `asn`. The last one resolved
    /// wins, except that ASN 0 stops at the first.
    fn resolve_rir(&self, asn: &AssetRecord, number: u32) -> Option<String> {
        let relations = match self
            .store
            .outgoing_relations(asn, self.cutoff, &["managed_by"])
        {
            Ok(relations) => relations,
            Err(e) => {
                tracing::warn!(asn = number, error = %e, "RIR lookup failed");
                return None;
            }
        };

        let mut name = None;
        for relation in relations {
            let record = match self.store.find_by_id(&relation.to, self.cutoff) {
                Ok(record) => record,
                Err(e) => {
                    tracing::debug!(id = %relation.to, error = %e, "RIR organization not visible");
                    continue;
                }
            };
            match &record.asset {
                Asset::RirOrganization { name: org, .. } => {
                    name = Some(org.clone());
                    if number == 0 {
                        break;
                    }
                }
                _ => log_mismatch(&record, AssetKind::RirOrganization),
            }
        }
        name
    }
}

/// Build a summary from a batch of IP address records.
pub fn build_asn_summary<G: GraphQuery>(
    store: &G,
    addresses: &[AssetRecord],
    cutoff: Option<DateTime<Utc>>,
) -> AsnSummary {
    let mut aggregator = AsnAggregator::new(store, cutoff);
    for address in addresses {
        aggregator.add_address(address);
    }
    aggregator.finish()
}

fn expect_kind(record: &AssetRecord, expected: AssetKind) -> Result<()> {
    let found = record.kind();
    if found == expected {
        Ok(())
    } else {
        Err(AnalysisError::TypeMismatch { expected, found })
    }
}

fn log_mismatch(record: &AssetRecord, expected: AssetKind) {
    let err = AnalysisError::TypeMismatch {
        expected,
        found: record.kind(),
    };
    tracing::warn!(id = %record.id, error = %err, "Skipping relation");
}
