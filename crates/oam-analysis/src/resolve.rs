//! Name listing: scope names, the addresses they resolve to, and the ASN
//! summary of those addresses.

use std::collections::{HashSet, VecDeque};

use chrono::{DateTime, Utc};

use oam_core::{Asset, AssetId, AssetRecord};
use oam_graph::GraphQuery;

use crate::aggregate::{AsnAggregator, Attribution};
use crate::types::{AddressFilter, AddressInfo, NameListing, NameRecord};

const ADDRESS_RELATIONS: [&str; 2] = ["a_record", "aaaa_record"];
const ALIAS_RELATION: &str = "cname_record";

/// List every scope name with its resolved addresses.
///
/// When `filter` selects no family, names are listed without addresses and
/// the summary stays empty.
pub fn discover_names<G: GraphQuery>(
    store: &G,
    scope: &[String],
    cutoff: Option<DateTime<Utc>>,
    filter: AddressFilter,
) -> NameListing {
    if scope.is_empty() {
        return NameListing::default();
    }

    let roots: Vec<Asset> = scope.iter().map(Asset::fqdn).collect();
    let records = match store.find_by_scope(&roots, cutoff) {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(error = %e, "Scope query failed; no names listed");
            return NameListing::default();
        }
    };

    let mut seen = HashSet::new();
    let names: Vec<(String, AssetRecord)> = records
        .into_iter()
        .filter_map(|r| match &r.asset {
            Asset::Fqdn { name } => Some((name.clone(), r)),
            _ => None,
        })
        .filter(|(name, _)| seen.insert(name.clone()))
        .collect();

    if filter.is_empty() {
        return NameListing {
            names: names
                .into_iter()
                .map(|(name, _)| NameRecord {
                    name,
                    addresses: Vec::new(),
                })
                .collect(),
            summary: Default::default(),
        };
    }

    let mut aggregator = AsnAggregator::new(store, cutoff);
    let mut listing = Vec::with_capacity(names.len());
    for (name, record) in names {
        let mut addresses = Vec::new();
        for address in resolve_addresses(store, &record, cutoff) {
            let Asset::IpAddress { address: ip } = address.asset else {
                continue;
            };
            if !filter.accepts(&ip) {
                continue;
            }

            let found = match store.find_by_content(&address.asset, cutoff) {
                Ok(found) => found,
                Err(e) => {
                    tracing::debug!(%ip, error = %e, "Address lookup failed");
                    continue;
                }
            };
            for stored in found {
                let attributions = aggregator.add_address(&stored);
                addresses.push(address_info(ip, &attributions));
            }
        }
        listing.push(NameRecord { name, addresses });
    }

    tracing::debug!(names = listing.len(), "Name listing complete");
    NameListing {
        names: listing,
        summary: aggregator.finish(),
    }
}

/// IP address records a name resolves to, following alias chains.
pub fn resolve_addresses<G: GraphQuery>(
    store: &G,
    name: &AssetRecord,
    cutoff: Option<DateTime<Utc>>,
) -> Vec<AssetRecord> {
    let labels = [ADDRESS_RELATIONS[0], ADDRESS_RELATIONS[1], ALIAS_RELATION];

    let mut visited: HashSet<AssetId> = HashSet::from([name.id.clone()]);
    let mut found: HashSet<AssetId> = HashSet::new();
    let mut addresses = Vec::new();
    let mut queue = VecDeque::from([name.clone()]);

    while let Some(current) = queue.pop_front() {
        let relations = match store.outgoing_relations(&current, cutoff, &labels) {
            Ok(relations) => relations,
            Err(e) => {
                tracing::debug!(id = %current.id, error = %e, "Resolution query failed");
                continue;
            }
        };

        for relation in relations {
            let Ok(target) = store.find_by_id(&relation.to, cutoff) else {
                continue;
            };
            match &target.asset {
                Asset::Fqdn { .. } if relation.relation_type == ALIAS_RELATION => {
                    if visited.insert(target.id.clone()) {
                        queue.push_back(target);
                    }
                }
                Asset::IpAddress { .. } if relation.relation_type != ALIAS_RELATION => {
                    if found.insert(target.id.clone()) {
                        addresses.push(target);
                    }
                }
                _ => {}
            }
        }
    }
    addresses
}

/// Attribute an address to its most specific announced netblock, first on ties.
fn address_info(ip: std::net::IpAddr, attributions: &[Attribution]) -> AddressInfo {
    let best = attributions
        .iter()
        .rev()
        .max_by_key(|a| a.netblock.prefix_len());

    match best {
        Some(a) => AddressInfo {
            ip,
            asn: Some(a.asn),
            cidr: Some(a.netblock.to_string()),
            netblock: Some(a.netblock),
            description: (!a.rir_name.is_empty()).then(|| a.rir_name.clone()),
        },
        None => AddressInfo::unattributed(ip),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use oam_graph::MemoryGraph;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap()
    }

    fn add(graph: &mut MemoryGraph, asset: Asset) -> AssetRecord {
        graph.upsert_asset_at(asset, ts())
    }

    fn link(graph: &mut MemoryGraph, from: &AssetRecord, rel: &str, to: &AssetRecord) {
        graph.link_at(&from.id, rel, &to.id, ts()).unwrap();
    }

    fn ip(s: &str) -> Asset {
        Asset::ip(s.parse().unwrap())
    }

    fn scope() -> Vec<String> {
        vec!["example.com".to_string()]
    }

    #[test]
    fn test_alias_chain_with_cycle() {
        let mut graph = MemoryGraph::new();
        let www = add(&mut graph, Asset::fqdn("www.example.com"));
        let edge = add(&mut graph, Asset::fqdn("edge.cdn.net"));
        let v4 = add(&mut graph, ip("192.0.2.10"));
        let v6 = add(&mut graph, ip("2001:db8::10"));
        link(&mut graph, &www, "cname_record", &edge);
        link(&mut graph, &edge, "cname_record", &www);
        link(&mut graph, &edge, "a_record", &v4);
        link(&mut graph, &edge, "aaaa_record", &v6);
        link(&mut graph, &www, "a_record", &v4);

        let resolved = resolve_addresses(&graph, &www, None);
        let keys: Vec<String> = resolved.iter().map(|r| r.asset.key()).collect();
        assert_eq!(keys, vec!["192.0.2.10", "2001:db8::10"]);
    }

    #[test]
    fn test_listing_without_families_has_no_addresses() {
        let mut graph = MemoryGraph::new();
        let www = add(&mut graph, Asset::fqdn("www.example.com"));
        let addr = add(&mut graph, ip("192.0.2.10"));
        link(&mut graph, &www, "a_record", &addr);
        add(&mut graph, Asset::fqdn("mail.example.com"));

        let listing = discover_names(&graph, &scope(), None, AddressFilter::none());
        let names: Vec<&str> = listing.names.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["www.example.com", "mail.example.com"]);
        assert!(listing.names.iter().all(|n| n.addresses.is_empty()));
        assert!(listing.summary.is_empty());
    }

    #[test]
    fn test_family_filter_and_attribution() {
        let mut graph = MemoryGraph::new();
        let www = add(&mut graph, Asset::fqdn("www.example.com"));
        let v4 = add(&mut graph, ip("192.0.2.10"));
        let v6 = add(&mut graph, ip("2001:db8::10"));
        link(&mut graph, &www, "a_record", &v4);
        link(&mut graph, &www, "aaaa_record", &v6);

        let wide = add(&mut graph, Asset::netblock("192.0.0.0/16".parse().unwrap()));
        let narrow = add(&mut graph, Asset::netblock("192.0.2.0/24".parse().unwrap()));
        let as_wide = add(&mut graph, Asset::autonomous_system(64500));
        let as_narrow = add(&mut graph, Asset::autonomous_system(64501));
        let arin = add(&mut graph, Asset::rir_organization("ARIN"));
        link(&mut graph, &wide, "contains", &v4);
        link(&mut graph, &narrow, "contains", &v4);
        link(&mut graph, &as_wide, "announces", &wide);
        link(&mut graph, &as_narrow, "announces", &narrow);
        link(&mut graph, &as_narrow, "managed_by", &arin);

        let only_v4 = AddressFilter {
            ipv4: true,
            ipv6: false,
        };
        let listing = discover_names(&graph, &scope(), None, only_v4);
        assert_eq!(listing.names.len(), 1);

        let addresses = &listing.names[0].addresses;
        assert_eq!(addresses.len(), 1);
        assert_eq!(addresses[0].asn, Some(64501));
        assert_eq!(addresses[0].cidr.as_deref(), Some("192.0.2.0/24"));
        assert_eq!(addresses[0].description.as_deref(), Some("ARIN"));
        assert_eq!(listing.summary.len(), 2);
    }

    #[test]
    fn test_unattributed_address() {
        let mut graph = MemoryGraph::new();
        let www = add(&mut graph, Asset::fqdn("www.example.com"));
        let addr = add(&mut graph, ip("198.51.100.7"));
        link(&mut graph, &www, "a_record", &addr);

        let listing = discover_names(&graph, &scope(), None, AddressFilter::both());
        assert_eq!(
            listing.names[0].addresses,
            vec![AddressInfo::unattributed("198.51.100.7".parse().unwrap())]
        );
        assert!(listing.summary.is_empty());
    }
}
