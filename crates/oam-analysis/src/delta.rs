//! New-name selection relative to a cutoff.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};

use oam_core::{Asset, AssetRecord};
use oam_graph::GraphQuery;

/// Names in scope first created and last seen on or after `since`.
///
/// Without `since`, the cutoff is the latest FQDN observation in scope
/// truncated to UTC midnight. The result is sorted and free of duplicates.
pub fn new_names<G: GraphQuery>(
    store: &G,
    scope: &[String],
    since: Option<DateTime<Utc>>,
) -> Vec<String> {
    if scope.is_empty() {
        return Vec::new();
    }

    let roots: Vec<Asset> = scope.iter().map(Asset::fqdn).collect();
    let records = match store.find_by_scope(&roots, since) {
        Ok(records) => records,
        Err(e) => {
            tracing::warn!(error = %e, "Scope query failed; no names selected");
            return Vec::new();
        }
    };

    let Some(cutoff) = since.or_else(|| derive_cutoff(&records)) else {
        return Vec::new();
    };
    tracing::debug!(%cutoff, candidates = records.len(), "Selecting new names");

    records
        .iter()
        .filter(|r| r.created_at >= cutoff && r.last_seen >= cutoff)
        .filter_map(|r| match &r.asset {
            Asset::Fqdn { name } => Some(name.clone()),
            _ => None,
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Latest FQDN `last_seen` among `records`, truncated to the start of its day.
pub fn derive_cutoff(records: &[AssetRecord]) -> Option<DateTime<Utc>> {
    records
        .iter()
        .filter(|r| matches!(r.asset, Asset::Fqdn { .. }))
        .map(|r| r.last_seen)
        .max()
        .map(start_of_day)
}

/// Layout accepted for cutoffs besides RFC 3339, e.g. `01/05 00:00:00 2024 UTC`.
/// The trailing zone name is optional and ignored; the time is taken as UTC.
pub const CUTOFF_LAYOUT: &str = "%m/%d %H:%M:%S %Y";

/// Parse a user-supplied cutoff.
pub fn parse_cutoff(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    let without_zone = raw.rsplit_once(' ').map_or(raw, |(head, _)| head);
    [raw, without_zone]
        .into_iter()
        .find_map(|candidate| NaiveDateTime::parse_from_str(candidate, CUTOFF_LAYOUT).ok())
        .map(|naive| naive.and_utc())
}

fn start_of_day(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.date_naive().and_time(NaiveTime::MIN).and_utc()
}
